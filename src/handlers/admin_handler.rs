use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{
            CreateAssessmentRequest, CreateCourseRequest, CreateModuleRequest,
            CreateOfficeRequest, CreateQuestionRequest, ReorderModulesRequest,
        },
        response::{
            AssessmentDto, CourseDto, MessageResponse, ModuleDto, OfficeScheduleDto, QuestionDto,
        },
    },
    services::schedule_service::OfficeSchedule,
};

#[post("/admin/courses")]
pub async fn create_course(
    state: web::Data<AppState>,
    request: web::Json<CreateCourseRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    let course = state
        .content_service
        .create_course(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(CourseDto::from(course)))
}

#[post("/admin/courses/{id}/modules")]
pub async fn create_module(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<CreateModuleRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    let module = state
        .content_service
        .create_module(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ModuleDto::from(module)))
}

#[put("/admin/courses/{id}/modules/order")]
pub async fn reorder_modules(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<ReorderModulesRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    request.validate()?;
    let modules: Vec<ModuleDto> = state
        .content_service
        .reorder_modules(&id, &request.module_ids, Utc::now())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(modules))
}

#[post("/admin/modules/{id}/publish")]
pub async fn publish_module(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    let module = state
        .content_service
        .publish_module(&id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ModuleDto::from(module)))
}

#[post("/admin/assessments")]
pub async fn create_assessment(
    state: web::Data<AppState>,
    request: web::Json<CreateAssessmentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    let assessment = state
        .content_service
        .create_assessment(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(AssessmentDto::from(assessment)))
}

#[get("/admin/assessments/{id}/questions")]
pub async fn list_questions(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    let questions: Vec<QuestionDto> = state
        .content_service
        .list_questions(&id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(questions))
}

#[post("/admin/assessments/{id}/questions")]
pub async fn create_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<CreateQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    let question = state
        .content_service
        .create_question(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(QuestionDto::from(question)))
}

#[delete("/admin/questions/{id}")]
pub async fn deactivate_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    state.content_service.deactivate_question(&id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Question deactivated")))
}

#[post("/admin/offices")]
pub async fn create_office(
    state: web::Data<AppState>,
    request: web::Json<CreateOfficeRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;
    let office = state
        .content_service
        .create_office(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(OfficeScheduleDto::from(OfficeSchedule::from_office(office))))
}
