use super::{parse_body, parse_id, AppState};
use crate::error::ApiError;
use crate::metrics::record_write;
use crate::models::{
    AppointmentView, NewAppointmentRequest, Resource, UpcomingQuery, UpdateAppointmentRequest,
    DEFAULT_APPOINTMENT_STATUS,
};
use actix_web::{error::QueryPayloadError, web, HttpRequest, HttpResponse};
use chrono::{Duration, Local};
use serde_json::json;

const DEFAULT_UPCOMING_MINUTES: i64 = 60;
const MAX_UPCOMING_MINUTES: i64 = 24 * 60;

/// Appointment rows with patient/doctor display names joined in.
const APPOINTMENT_VIEW: &str = "
    SELECT a.appointment_id, a.patient_id, a.doctor_id,
           a.appointment_date, a.appointment_time, a.status, a.notes,
           p.first_name || ' ' || p.last_name AS patient_name,
           d.first_name || ' ' || d.last_name AS doctor_name,
           d.specialization
    FROM appointments a
    JOIN patients p ON a.patient_id = p.patient_id
    JOIN doctors d ON a.doctor_id = d.doctor_id";

pub async fn list_appointments(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let sql = format!(
        "{} ORDER BY a.appointment_date, a.appointment_time, a.appointment_id",
        APPOINTMENT_VIEW
    );
    let appointments: Vec<AppointmentView> = sqlx::query_as(&sql).fetch_all(&state.pool).await?;

    Ok(HttpResponse::Ok().json(appointments))
}

/// Malformed query strings get the same JSON error body as every other 400.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Invalid query: {}", err)).into()
}

/// Scheduled appointments starting between now and `within_minutes` from now.
pub async fn list_upcoming(
    state: web::Data<AppState>,
    query: web::Query<UpcomingQuery>,
) -> Result<HttpResponse, ApiError> {
    let minutes = query
        .within_minutes
        .unwrap_or(DEFAULT_UPCOMING_MINUTES)
        .clamp(1, MAX_UPCOMING_MINUTES);

    let now = Local::now().naive_local();
    let until = now + Duration::minutes(minutes);

    let sql = format!(
        "{} WHERE a.status = $1
             AND (a.appointment_date + a.appointment_time) BETWEEN $2 AND $3
           ORDER BY a.appointment_date, a.appointment_time, a.appointment_id",
        APPOINTMENT_VIEW
    );
    let appointments: Vec<AppointmentView> = sqlx::query_as(&sql)
        .bind(DEFAULT_APPOINTMENT_STATUS)
        .bind(now)
        .bind(until)
        .fetch_all(&state.pool)
        .await?;

    Ok(HttpResponse::Ok().json(appointments))
}

pub async fn get_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Appointment, &path)?;

    let sql = format!("{} WHERE a.appointment_id = $1", APPOINTMENT_VIEW);
    let appointment: Option<AppointmentView> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    appointment
        .map(|a| HttpResponse::Ok().json(a))
        .ok_or(ApiError::NotFound(Resource::Appointment))
}

pub async fn create_appointment(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let req: NewAppointmentRequest = parse_body(&body)?;

    // Foreign keys reject unknown patients/doctors within the same statement.
    let appointment_id: i64 = sqlx::query_scalar(
        "INSERT INTO appointments
           (patient_id, doctor_id, appointment_date, appointment_time, notes, status)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING appointment_id",
    )
    .bind(req.patient_id)
    .bind(req.doctor_id)
    .bind(req.appointment_date)
    .bind(req.appointment_time)
    .bind(req.notes)
    .bind(DEFAULT_APPOINTMENT_STATUS)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| ApiError::on_foreign_key(e, ApiError::MissingReference))?;

    record_write("appointment", "create");
    crate::audit_log!("record", "appointment.create", Some(appointment_id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "appointment_id": appointment_id,
        "message": "Appointment created successfully"
    })))
}

pub async fn update_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Appointment, &path)?;
    let req: UpdateAppointmentRequest = parse_body(&body)?;

    let status = req
        .status
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_APPOINTMENT_STATUS.to_string());

    let result = sqlx::query(
        "UPDATE appointments
         SET patient_id = $1, doctor_id = $2, appointment_date = $3,
             appointment_time = $4, status = $5, notes = $6
         WHERE appointment_id = $7",
    )
    .bind(req.patient_id)
    .bind(req.doctor_id)
    .bind(req.appointment_date)
    .bind(req.appointment_time)
    .bind(status)
    .bind(req.notes.unwrap_or_default())
    .bind(id)
    .execute(&state.pool)
    .await
    .map_err(|e| ApiError::on_foreign_key(e, ApiError::MissingReference))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(Resource::Appointment));
    }

    record_write("appointment", "update");
    crate::audit_log!("record", "appointment.update", Some(id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Appointment updated successfully"
    })))
}

pub async fn delete_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(Resource::Appointment, &path)?;

    let result = sqlx::query("DELETE FROM appointments WHERE appointment_id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(Resource::Appointment));
    }

    record_write("appointment", "delete");
    crate::audit_log!("record", "appointment.delete", Some(id), true);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Appointment deleted successfully"
    })))
}
