use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use async_graphql::ErrorExtensions;
use chrono::Duration;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Module '{module}' is locked until '{prerequisite}' is completed")]
    LockedModule { module: String, prerequisite: String },

    #[error("Incomplete evidence: {0}")]
    IncompleteEvidence(String),

    #[error("Not enough active questions: {available} available, {requested} requested")]
    InsufficientQuestions { available: usize, requested: usize },

    #[error("Attempt limit ({limit}) reached")]
    AttemptLimitExceeded { limit: u32 },

    #[error("Cooldown active: next attempt allowed in {}", format_wait(.remaining))]
    CooldownActive { remaining: Duration },

    #[error("Attempt is not active: {0}")]
    AttemptNotActive(String),

    #[error("Attempt '{0}' has already been finalized")]
    AlreadyFinalized(String),

    #[error("Certification required to view office schedules")]
    NotCertified,

    #[error("Account locked: try again in {}", format_wait(.remaining))]
    AccountLocked { remaining: Duration },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::LockedModule { .. } => "LOCKED_MODULE",
            AppError::IncompleteEvidence(_) => "INCOMPLETE_EVIDENCE",
            AppError::InsufficientQuestions { .. } => "INSUFFICIENT_QUESTIONS",
            AppError::AttemptLimitExceeded { .. } => "ATTEMPT_LIMIT_EXCEEDED",
            AppError::CooldownActive { .. } => "COOLDOWN_ACTIVE",
            AppError::AttemptNotActive(_) => "ATTEMPT_NOT_ACTIVE",
            AppError::AlreadyFinalized(_) => "ALREADY_FINALIZED",
            AppError::NotCertified => "NOT_CERTIFIED",
            AppError::AccountLocked { .. } => "ACCOUNT_LOCKED",
        }
    }
}

/// Renders a wait as "Xh Ym", rounding partial minutes up so a nonzero wait
/// never prints as "0h 0m".
fn format_wait(remaining: &Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    let minutes = (seconds + 59) / 60;
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::LockedModule { .. } => StatusCode::FORBIDDEN,
            AppError::IncompleteEvidence(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InsufficientQuestions { .. } => StatusCode::CONFLICT,
            AppError::AttemptLimitExceeded { .. } => StatusCode::FORBIDDEN,
            AppError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::AttemptNotActive(_) => StatusCode::CONFLICT,
            AppError::AlreadyFinalized(_) => StatusCode::CONFLICT,
            AppError::NotCertified => StatusCode::FORBIDDEN,
            AppError::AccountLocked { .. } => StatusCode::LOCKED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            kind: self.error_code().to_string(),
            code: self.status_code().as_u16(),
        })
    }
}
impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
impl From<async_graphql::Error> for AppError {
    fn from(err: async_graphql::Error) -> Self {
        AppError::InternalError(err.message)
    }
}
impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::InternalError(format!("Password hashing failed: {}", err))
    }
}
impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_err, e| {
            e.set("code", self.error_code());
            if let AppError::CooldownActive { remaining } = self {
                e.set("retry_after_seconds", remaining.num_seconds());
            }
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;
