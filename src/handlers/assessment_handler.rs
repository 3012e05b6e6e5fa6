use actix_web::{get, post, put, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::RecordAnswerRequest,
        response::{
            AssessmentSummaryDto, AttemptDto, AttemptResultDto, AttemptSummaryDto,
            FinalizeResponse,
        },
    },
};

#[get("/assessments")]
pub async fn list_assessments(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let summaries: Vec<AssessmentSummaryDto> = state
        .assessment_service
        .list_for_user(auth.user_id())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(summaries))
}

#[post("/assessments/{id}/attempts")]
pub async fn start_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .assessment_service
        .begin_attempt(auth.user_id(), &id, Utc::now())
        .await?;
    let questions = state.assessment_service.presented_questions(&attempt).await?;
    Ok(HttpResponse::Created().json(AttemptDto::new(&attempt, questions)))
}

#[get("/attempts/{id}")]
pub async fn get_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .assessment_service
        .get_attempt(auth.user_id(), &id)
        .await?;
    let questions = state.assessment_service.presented_questions(&attempt).await?;
    Ok(HttpResponse::Ok().json(AttemptDto::new(&attempt, questions)))
}

#[put("/attempts/{id}/answers")]
pub async fn record_answer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<RecordAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let attempt = state
        .assessment_service
        .record_answer(
            auth.user_id(),
            &id,
            &request.question_id,
            request.selected_option,
            Utc::now(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(AttemptSummaryDto::from(&attempt)))
}

#[post("/attempts/{id}/finalize")]
pub async fn finalize_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (attempt, newly_certified) = state
        .finalize_attempt(auth.user_id(), &id, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(FinalizeResponse {
        attempt: (&attempt).into(),
        newly_certified,
    }))
}

#[get("/attempts/{id}/result")]
pub async fn attempt_result(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let review = state.assessment_service.review(auth.user_id(), &id).await?;
    Ok(HttpResponse::Ok().json(AttemptResultDto::from(review)))
}
