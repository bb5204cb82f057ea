use super::{parse_body, parse_id, text_or_empty, AppState};
use crate::error::ApiError;
use crate::metrics::record_write;
use crate::models::{normalize_email, Doctor, DoctorRequest, Resource};
use actix_web::{web, HttpResponse};
use serde_json::json;

// never includes password_hash
const DOCTOR_COLUMNS: &str = "doctor_id, first_name, last_name, specialization, phone, email";

pub async fn list_doctors(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let sql = format!(
        "SELECT {} FROM doctors ORDER BY last_name, first_name, doctor_id",
        DOCTOR_COLUMNS
    );
    let doctors: Vec<Doctor> = sqlx::query_as(&sql).fetch_all(&state.pool).await?;

    Ok(HttpResponse::Ok().json(doctors))
}

pub async fn get_doctor(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Doctor, &path)?;

    let sql = format!("SELECT {} FROM doctors WHERE doctor_id = $1", DOCTOR_COLUMNS);
    let doctor: Option<Doctor> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    doctor
        .map(|d| HttpResponse::Ok().json(d))
        .ok_or(ApiError::NotFound(Resource::Doctor))
}

/// Administrative create. The doctor has no credential until one is
/// registered, so login fails for this row.
pub async fn create_doctor(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let req: DoctorRequest = parse_body(&body)?;

    let doctor_id: i64 = sqlx::query_scalar(
        "INSERT INTO doctors (first_name, last_name, email, phone, specialization)
         VALUES ($1, $2, $3, $4, $5) RETURNING doctor_id",
    )
    .bind(text_or_empty(req.first_name))
    .bind(text_or_empty(req.last_name))
    .bind(normalize_email(&text_or_empty(req.email)))
    .bind(text_or_empty(req.phone))
    .bind(text_or_empty(req.specialization))
    .fetch_one(&state.pool)
    .await?;

    record_write("doctor", "create");
    crate::audit_log!("record", "doctor.create", Some(doctor_id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "message": "Doctor created successfully"
    })))
}

pub async fn update_doctor(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Doctor, &path)?;
    let req: DoctorRequest = parse_body(&body)?;

    let result = sqlx::query(
        "UPDATE doctors
         SET first_name = $1, last_name = $2, email = $3, phone = $4, specialization = $5
         WHERE doctor_id = $6",
    )
    .bind(text_or_empty(req.first_name))
    .bind(text_or_empty(req.last_name))
    .bind(normalize_email(&text_or_empty(req.email)))
    .bind(text_or_empty(req.phone))
    .bind(text_or_empty(req.specialization))
    .bind(id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(Resource::Doctor));
    }

    record_write("doctor", "update");
    crate::audit_log!("record", "doctor.update", Some(id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Doctor updated successfully"
    })))
}

pub async fn delete_doctor(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Doctor, &path)?;

    let result = sqlx::query("DELETE FROM doctors WHERE doctor_id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| ApiError::on_foreign_key(e, ApiError::StillReferenced))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(Resource::Doctor));
    }

    record_write("doctor", "delete");
    crate::audit_log!("record", "doctor.delete", Some(id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Doctor deleted successfully"
    })))
}
