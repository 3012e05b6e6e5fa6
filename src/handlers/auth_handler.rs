use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest},
        response::MessageResponse,
    },
};

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .user_service
        .register(request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(user))
}

#[get("/verify-email/{token}")]
pub async fn verify_email(
    state: web::Data<AppState>,
    token: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.verify_email(&token, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[post("/resend-verification")]
pub async fn resend_verification(
    state: web::Data<AppState>,
    request: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    state
        .user_service
        .resend_verification(&request.email, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Verification email sent")))
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state
        .user_service
        .login(request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<AppState>,
    request: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    state
        .user_service
        .request_password_reset(&request.email, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "If an account exists for that address, a reset link has been sent",
    )))
}

#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<AppState>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    state
        .user_service
        .reset_password(request.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password has been reset")))
}

#[get("/me")]
pub async fn me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.get_user(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(user))
}
