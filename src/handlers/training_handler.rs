use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::CompleteModuleRequest,
        response::{
            CompletionDto, CourseProgressDto, ModuleAccessDto, TrainingOverviewDto,
        },
    },
};

#[get("/training")]
pub async fn training_overview(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let overview = state.progression_service.overview(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(TrainingOverviewDto::from(overview)))
}

#[get("/training/courses/{id}")]
pub async fn course_progress(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let progress = state
        .progression_service
        .course_progress(auth.user_id(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(CourseProgressDto::from(progress)))
}

#[get("/training/modules/{id}")]
pub async fn access_module(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (module, completion) = state
        .progression_service
        .access_module(auth.user_id(), &id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(ModuleAccessDto {
        module: module.into(),
        completion: completion.into(),
    }))
}

#[post("/training/modules/{id}/complete")]
pub async fn complete_module(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<CompleteModuleRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let module = state.progression_service.get_published_module(&id).await?;
    let evidence = request.into_inner().into_evidence(module.content_type);
    let completion = state
        .progression_service
        .mark_completed(auth.user_id(), &module.id, evidence, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(CompletionDto::from(completion)))
}
