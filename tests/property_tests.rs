// Property-based tests for request parsing helpers

use chrono::{NaiveTime, Timelike};
use clinic_backend::error::ApiError;
use clinic_backend::handlers::{parse_body, parse_id};
use clinic_backend::models::{normalize_email, parse_time, PatientRequest, Resource};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_positive_ids_parse(id in 1i64..i64::MAX) {
        prop_assert_eq!(parse_id(Resource::Patient, &id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_non_numeric_ids_rejected(raw in "[a-zA-Z_-][a-zA-Z0-9_-]{0,12}") {
        let rejected = matches!(
            parse_id(Resource::Appointment, &raw),
            Err(ApiError::InvalidId { .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn test_email_normalization_idempotent(email in "[ ]{0,3}[A-Za-z0-9.]{1,12}@[A-Za-z]{2,8}\\.[A-Za-z]{2,4}[ ]{0,3}") {
        let once = normalize_email(&email);
        prop_assert_eq!(normalize_email(&once), once.clone());
        prop_assert_eq!(once.trim(), once.as_str());
    }

    #[test]
    fn test_short_and_long_time_forms_agree(h in 0u32..24, m in 0u32..60) {
        let short = parse_time(&format!("{:02}:{:02}", h, m)).unwrap();
        let long = parse_time(&format!("{:02}:{:02}:00", h, m)).unwrap();
        prop_assert_eq!(short, long);
        prop_assert_eq!(short, NaiveTime::from_hms_opt(h, m, 0).unwrap());
        prop_assert_eq!(short.hour(), h);
    }

    #[test]
    fn test_named_patients_always_validate(first in "[A-Za-z]{1,20}", last in "[A-Za-z]{1,20}") {
        let body = serde_json::json!({"firstName": first, "lastName": last}).to_string();
        let parsed = parse_body::<PatientRequest>(body.as_bytes());
        prop_assert!(parsed.is_ok());
    }
}
