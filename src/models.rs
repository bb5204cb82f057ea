use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

pub const DEFAULT_APPOINTMENT_STATUS: &str = "scheduled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Patient,
    Doctor,
    Appointment,
}

impl Resource {
    pub fn label(self) -> &'static str {
        match self {
            Resource::Patient => "Patient",
            Resource::Doctor => "Doctor",
            Resource::Appointment => "Appointment",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Patient => "patient",
            Resource::Doctor => "doctor",
            Resource::Appointment => "appointment",
        })
    }
}

/// Emails are compared case-insensitively everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ============ Field Parsing ============

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid date '{}': {}", s, e))),
    }
}

/// Accepts `HH:MM` as sent by the desktop client as well as `HH:MM:SS`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn deserialize_optional_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_time(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}'", s))),
    }
}

/// Ids arrive as JSON numbers, or as numeric strings from the desktop client.
/// An empty string counts as absent.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(id)) => Ok(Some(id)),
        Some(NumberOrString::String(s)) => match s.trim() {
            "" => Ok(None),
            trimmed => trimmed
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid id '{}'", s))),
        },
    }
}

// ============ Patient Models ============

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatientRequest {
    #[validate(
        required(message = "Missing firstName"),
        length(min = 1, message = "Missing firstName")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "Missing lastName"),
        length(min = 1, message = "Missing lastName")
    )]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date_of_birth: Option<NaiveDate>,
}

// ============ Doctor Models ============

/// Public doctor row. The credential column is never selected into it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub phone: String,
    pub email: String,
}

/// Row fetched for login only.
#[derive(Debug, Clone, FromRow)]
pub struct DoctorCredentials {
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRequest {
    #[validate(
        required(message = "Missing firstName"),
        length(min = 1, message = "Missing firstName")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "Missing lastName"),
        length(min = 1, message = "Missing lastName")
    )]
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(required(message = "Missing firstName"), length(min = 1, message = "Missing firstName"))]
    pub first_name: Option<String>,
    #[validate(required(message = "Missing lastName"), length(min = 1, message = "Missing lastName"))]
    pub last_name: Option<String>,
    #[validate(
        required(message = "Missing specialization"),
        length(min = 1, message = "Missing specialization")
    )]
    pub specialization: Option<String>,
    #[validate(required(message = "Missing phone"), length(min = 1, message = "Missing phone"))]
    pub phone: Option<String>,
    #[validate(required(message = "Missing email"), length(min = 1, message = "Missing email"))]
    pub email: Option<String>,
    #[validate(required(message = "Missing password"), length(min = 1, message = "Missing password"))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "Missing email or password"),
        length(min = 1, message = "Missing email or password")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Missing email or password"),
        length(min = 1, message = "Missing email or password")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub doctor_id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
}

// ============ Appointment Models ============

/// Appointment joined with the display names of its patient and doctor.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct AppointmentView {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub status: String,
    pub notes: Option<String>,
    pub patient_name: String,
    pub doctor_name: String,
    pub specialization: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointmentRequest {
    #[validate(
        required(message = "Missing required patientId or doctorId"),
        range(min = 1, message = "Missing required patientId or doctorId")
    )]
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub patient_id: Option<i64>,
    #[validate(
        required(message = "Missing required patientId or doctorId"),
        range(min = 1, message = "Missing required patientId or doctorId")
    )]
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub doctor_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub appointment_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[validate(required(message = "Missing patientId"), range(min = 1, message = "Missing patientId"))]
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub patient_id: Option<i64>,
    #[validate(required(message = "Missing doctorId"), range(min = 1, message = "Missing doctorId"))]
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub doctor_id: Option<i64>,
    #[validate(required(message = "Missing appointmentDate"))]
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub appointment_date: Option<NaiveDate>,
    #[validate(required(message = "Missing appointmentTime"))]
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub appointment_time: Option<NaiveTime>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub within_minutes: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_request_uses_client_field_names() {
        let req: PatientRequest = serde_json::from_str(
            r#"{"firstName":"Ann","lastName":"Lee","dateOfBirth":"1990-04-12"}"#,
        )
        .unwrap();

        assert_eq!(req.first_name.as_deref(), Some("Ann"));
        assert_eq!(req.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert!(req.phone.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_date_of_birth_is_null() {
        let req: PatientRequest =
            serde_json::from_str(r#"{"firstName":"Ann","lastName":"Lee","dateOfBirth":""}"#).unwrap();
        assert!(req.date_of_birth.is_none());

        let req: PatientRequest =
            serde_json::from_str(r#"{"firstName":"Ann","lastName":"Lee","dateOfBirth":null}"#).unwrap();
        assert!(req.date_of_birth.is_none());
    }

    #[test]
    fn test_patient_request_requires_names() {
        let req: PatientRequest = serde_json::from_str(r#"{"firstName":"","phone":"555"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_appointment_time_accepts_short_form() {
        let req: NewAppointmentRequest = serde_json::from_str(
            r#"{"patientId":1,"doctorId":2,"appointmentDate":"2025-03-01","appointmentTime":"09:30"}"#,
        )
        .unwrap();
        assert_eq!(req.appointment_time, NaiveTime::from_hms_opt(9, 30, 0));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_malformed_time_is_rejected() {
        let res: Result<NewAppointmentRequest, _> =
            serde_json::from_str(r#"{"patientId":1,"doctorId":2,"appointmentTime":"half past nine"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_new_appointment_requires_both_references() {
        let req: NewAppointmentRequest = serde_json::from_str(r#"{"patientId":1}"#).unwrap();
        assert!(req.validate().is_err());

        let req: NewAppointmentRequest = serde_json::from_str(r#"{"patientId":0,"doctorId":3}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_appointment_ids_accept_numeric_strings() {
        let req: NewAppointmentRequest =
            serde_json::from_str(r#"{"patientId":"5","doctorId":" 2 ","notes":"Checkup"}"#).unwrap();
        assert_eq!(req.patient_id, Some(5));
        assert_eq!(req.doctor_id, Some(2));
        assert!(req.validate().is_ok());

        let req: UpdateAppointmentRequest = serde_json::from_str(
            r#"{"patientId":"5","doctorId":2,"appointmentDate":"2025-03-01","appointmentTime":"09:30"}"#,
        )
        .unwrap();
        assert_eq!(req.patient_id, Some(5));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_string_id_is_missing() {
        let req: NewAppointmentRequest = serde_json::from_str(r#"{"patientId":"","doctorId":"2"}"#).unwrap();
        assert!(req.patient_id.is_none());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_non_numeric_string_id_is_rejected() {
        let res: Result<NewAppointmentRequest, _> =
            serde_json::from_str(r#"{"patientId":"five","doctorId":"2"}"#);
        assert!(res.unwrap_err().to_string().contains("invalid id 'five'"));
    }

    #[test]
    fn test_update_appointment_requires_schedule() {
        let req: UpdateAppointmentRequest =
            serde_json::from_str(r#"{"patientId":1,"doctorId":2,"appointmentDate":"2025-03-01"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().len() == 1);
    }

    #[test]
    fn test_appointment_view_serializes_time_with_seconds() {
        let view = AppointmentView {
            appointment_id: 7,
            patient_id: 1,
            doctor_id: 2,
            appointment_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            appointment_time: NaiveTime::from_hms_opt(9, 30, 0),
            status: DEFAULT_APPOINTMENT_STATUS.to_string(),
            notes: None,
            patient_name: "Ann Lee".to_string(),
            doctor_name: "Gregory House".to_string(),
            specialization: "Diagnostics".to_string(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["appointment_date"], "2025-03-01");
        assert_eq!(json["appointment_time"], "09:30:00");
        assert_eq!(json["status"], "scheduled");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  House@Clinic.ORG "), "house@clinic.org");
    }
}
