use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::response::{CertificationDto, OfficeScheduleDto},
};

#[get("/certification")]
pub async fn certification_status(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let certification = state.certification_service.status(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(CertificationDto::from(certification)))
}

#[get("/schedule")]
pub async fn list_schedules(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let schedules: Vec<OfficeScheduleDto> = state
        .schedule_service
        .list_schedules(auth.user_id())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(schedules))
}

#[get("/schedule/offices/{id}")]
pub async fn office_schedule(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let schedule = state
        .schedule_service
        .office_schedule(auth.user_id(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(OfficeScheduleDto::from(schedule)))
}
