use crate::models::Resource;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Every failure a handler can return. The client only ever sees the
/// `public_message`; database and hashing details go to the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String, raw: String },

    #[error("{0}")]
    Validation(String),

    #[error("Invalid {resource} id: {raw}")]
    InvalidId { resource: Resource, raw: String },

    #[error("{} not found", .0.label())]
    NotFound(Resource),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Record is still referenced by appointments")]
    StillReferenced,

    #[error("Referenced patient or doctor does not exist")]
    MissingReference,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Message safe to show to API clients.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) => "Database error".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Foreign-key violations mean different things on insert and on delete,
    /// so the caller picks the replacement.
    pub fn on_foreign_key(err: sqlx::Error, replacement: ApiError) -> ApiError {
        match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => replacement,
            _ => err.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // doctors_email_key is the only unique constraint besides primary keys
            sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::DuplicateEmail,
            _ => ApiError::Database(err),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .map(|e| match &e.message {
                Some(m) => m.to_string(),
                None => e.code.to_string(),
            })
            .collect();
        messages.sort();
        messages.dedup();
        ApiError::Validation(messages.join(", "))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson { .. } | ApiError::Validation(_) | ApiError::InvalidId { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::DuplicateEmail | ApiError::StillReferenced => StatusCode::CONFLICT,
            ApiError::MissingReference => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Database(e) => tracing::error!(error = %e, "database failure"),
            ApiError::Internal(msg) => tracing::error!(error = %msg, "internal failure"),
            _ => {}
        }

        let body = match self {
            ApiError::InvalidJson { raw, .. } => json!({
                "success": false,
                "error": self.public_message(),
                "raw": raw,
            }),
            _ => json!({
                "success": false,
                "error": self.public_message(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
