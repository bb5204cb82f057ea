use super::{parse_body, parse_id, text_or_empty, AppState};
use crate::error::ApiError;
use crate::metrics::record_write;
use crate::models::{Patient, PatientRequest, Resource};
use actix_web::{web, HttpResponse};
use serde_json::json;

const PATIENT_COLUMNS: &str =
    "patient_id, first_name, last_name, phone, email, address, date_of_birth";

pub async fn list_patients(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let sql = format!(
        "SELECT {} FROM patients ORDER BY last_name, first_name, patient_id",
        PATIENT_COLUMNS
    );
    let patients: Vec<Patient> = sqlx::query_as(&sql).fetch_all(&state.pool).await?;

    Ok(HttpResponse::Ok().json(patients))
}

pub async fn get_patient(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Patient, &path)?;

    let sql = format!("SELECT {} FROM patients WHERE patient_id = $1", PATIENT_COLUMNS);
    let patient: Option<Patient> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    match patient {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Err(ApiError::NotFound(Resource::Patient)),
    }
}

pub async fn create_patient(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let req: PatientRequest = parse_body(&body)?;

    let patient_id: i64 = sqlx::query_scalar(
        "INSERT INTO patients (first_name, last_name, phone, email, address, date_of_birth)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING patient_id",
    )
    .bind(text_or_empty(req.first_name))
    .bind(text_or_empty(req.last_name))
    .bind(text_or_empty(req.phone))
    .bind(text_or_empty(req.email))
    .bind(text_or_empty(req.address))
    .bind(req.date_of_birth)
    .fetch_one(&state.pool)
    .await?;

    record_write("patient", "create");
    crate::audit_log!("record", "patient.create", Some(patient_id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "patient_id": patient_id,
        "message": "Patient created successfully"
    })))
}

pub async fn update_patient(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Patient, &path)?;
    let req: PatientRequest = parse_body(&body)?;

    let result = sqlx::query(
        "UPDATE patients
         SET first_name = $1, last_name = $2, phone = $3, email = $4, address = $5, date_of_birth = $6
         WHERE patient_id = $7",
    )
    .bind(text_or_empty(req.first_name))
    .bind(text_or_empty(req.last_name))
    .bind(text_or_empty(req.phone))
    .bind(text_or_empty(req.email))
    .bind(text_or_empty(req.address))
    .bind(req.date_of_birth)
    .bind(id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(Resource::Patient));
    }

    record_write("patient", "update");
    crate::audit_log!("record", "patient.update", Some(id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Patient updated successfully"
    })))
}

pub async fn delete_patient(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Patient, &path)?;

    let result = sqlx::query("DELETE FROM patients WHERE patient_id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| ApiError::on_foreign_key(e, ApiError::StillReferenced))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(Resource::Patient));
    }

    record_write("patient", "delete");
    crate::audit_log!("record", "patient.delete", Some(id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Patient deleted successfully"
    })))
}
