pub mod appointments;
pub mod credentials;
pub mod doctors;
pub mod patients;

use crate::auth::PasswordAuth;
use crate::error::ApiError;
use crate::models::Resource;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

/// Shared by every worker. The pool is the only handle to the database.
pub struct AppState {
    pub pool: PgPool,
    pub passwords: Arc<PasswordAuth>,
}

impl AppState {
    pub fn new(pool: PgPool, passwords: PasswordAuth) -> Self {
        Self {
            pool,
            passwords: Arc::new(passwords),
        }
    }
}

/// Parse a record id path segment. Anything but a positive integer is a client error.
pub fn parse_id(resource: Resource, raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::InvalidId {
            resource,
            raw: raw.to_string(),
        }),
    }
}

/// Decode and validate a JSON request body. The raw bytes are taken instead
/// of `web::Json` so a parse failure can echo the body back.
pub fn parse_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_slice(body).map_err(|e| ApiError::InvalidJson {
        message: e.to_string(),
        raw: String::from_utf8_lossy(body).into_owned(),
    })?;
    payload.validate()?;
    Ok(payload)
}

/// Empty string for absent optional text fields.
pub(crate) fn text_or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

// ============ Health Check ============

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();

    if db_ok {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected",
            "timestamp": Utc::now().to_rfc3339()
        }))
    } else {
        HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientRequest;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Resource::Patient, "42").unwrap(), 42);
        assert!(matches!(
            parse_id(Resource::Patient, "abc"),
            Err(ApiError::InvalidId { resource: Resource::Patient, .. })
        ));
        assert!(parse_id(Resource::Doctor, "0").is_err());
        assert!(parse_id(Resource::Doctor, "-3").is_err());
        assert!(parse_id(Resource::Doctor, "1.5").is_err());
    }

    #[test]
    fn test_parse_body_reports_invalid_json() {
        let err = parse_body::<PatientRequest>(b"{firstName: Ann").unwrap_err();
        match err {
            ApiError::InvalidJson { raw, .. } => assert_eq!(raw, "{firstName: Ann"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_body_reports_missing_fields() {
        let err = parse_body::<PatientRequest>(br#"{"phone":"555-0100"}"#).unwrap_err();
        assert_eq!(err.public_message(), "Missing firstName, Missing lastName");
    }

    #[test]
    fn test_text_or_empty() {
        assert_eq!(text_or_empty(None), "");
        assert_eq!(text_or_empty(Some("555".into())), "555");
    }
}
