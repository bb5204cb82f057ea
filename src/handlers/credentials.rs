//! Doctor registration and login.
//!
//! Login returns the doctor's identity only; no token or session is issued.

use super::{parse_body, AppState};
use crate::error::ApiError;
use crate::metrics::record_auth;
use crate::models::{
    normalize_email, DoctorCredentials, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse,
};
use actix_web::{web, HttpResponse};

pub async fn register(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let req: RegisterRequest = parse_body(&body)?;
    let email = normalize_email(&req.email.unwrap_or_default());
    if email.is_empty() {
        return Err(ApiError::Validation("Missing email".to_string()));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM doctors WHERE email = $1)")
        .bind(&email)
        .fetch_one(&state.pool)
        .await?;

    if exists {
        record_auth("register", false);
        crate::audit_log!("authentication", "doctor.register", None::<i64>, false, "duplicate_email");
        return Err(ApiError::DuplicateEmail);
    }

    let passwords = state.passwords.clone();
    let password = req.password.unwrap_or_default();
    let password_hash = web::block(move || passwords.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking pool error: {}", e)))??;

    // A concurrent registration can still win between the check and here;
    // the partial unique index turns that into "no row".
    let doctor_id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO doctors (first_name, last_name, specialization, phone, email, password_hash)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (email) WHERE email <> '' DO NOTHING
         RETURNING doctor_id",
    )
    .bind(req.first_name.unwrap_or_default())
    .bind(req.last_name.unwrap_or_default())
    .bind(req.specialization.unwrap_or_default())
    .bind(req.phone.unwrap_or_default())
    .bind(&email)
    .bind(&password_hash)
    .fetch_optional(&state.pool)
    .await?;

    let Some(doctor_id) = doctor_id else {
        record_auth("register", false);
        crate::audit_log!("authentication", "doctor.register", None::<i64>, false, "duplicate_email");
        return Err(ApiError::DuplicateEmail);
    };

    record_auth("register", true);
    crate::audit_log!("authentication", "doctor.register", Some(doctor_id), true);

    Ok(HttpResponse::Ok().json(RegisterResponse {
        success: true,
        doctor_id,
        message: "Doctor registered successfully".to_string(),
    }))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let req: LoginRequest = parse_body(&body)?;
    let email = normalize_email(&req.email.unwrap_or_default());

    let doctor: Option<DoctorCredentials> = sqlx::query_as(
        "SELECT doctor_id, first_name, last_name, password_hash FROM doctors WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&state.pool)
    .await?;

    let stored_hash = doctor.as_ref().and_then(|d| d.password_hash.clone());
    let passwords = state.passwords.clone();
    let password = req.password.unwrap_or_default();
    let matched = web::block(move || passwords.verify_optional(&password, stored_hash.as_deref()))
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking pool error: {}", e)))?;

    match doctor {
        Some(d) if matched => {
            record_auth("login", true);
            crate::audit_log!("authentication", "doctor.login", Some(d.doctor_id), true);

            Ok(HttpResponse::Ok().json(LoginResponse {
                success: true,
                doctor_id: d.doctor_id,
                first_name: d.first_name,
                last_name: d.last_name,
            }))
        }
        // Unknown email and wrong password must be indistinguishable
        other => {
            record_auth("login", false);
            crate::audit_log!(
                "authentication",
                "doctor.login",
                other.map(|d| d.doctor_id),
                false
            );
            Err(ApiError::InvalidCredentials)
        }
    }
}
