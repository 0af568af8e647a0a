use rocket::serde::json::Json;
use thiserror::Error;

use crate::ApiError;
use crate::ErrorDetail;

/// Service-layer failure taxonomy, mapped onto HTTP responses in `lib.rs`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InternalError(String),
}

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::NotFound => ServiceError::NotFound("Record not found".to_string()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ServiceError::Conflict(info.message().to_string())
            }
            Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                ServiceError::InvalidInput(info.message().to_string())
            }
            other => ServiceError::InternalError(format!("DB error: {}", other)),
        }
    }
}

impl From<bcrypt::BcryptError> for ServiceError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ServiceError::InternalError(format!("Password hashing error: {}", err))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(detail) => ApiError::NotFound(Json(ErrorDetail { error: detail })),
            ServiceError::Unauthorized(detail) => {
                ApiError::Unauthorized(Json(ErrorDetail { error: detail }))
            }
            ServiceError::Conflict(detail) => ApiError::Conflict(Json(ErrorDetail { error: detail })),
            ServiceError::InvalidInput(detail) => {
                ApiError::BadRequest(Json(ErrorDetail { error: detail }))
            }
            ServiceError::InternalError(detail) => {
                ApiError::InternalError(Json(ErrorDetail { error: detail }))
            }
        }
    }
}
