//! Validation rules for patients and clinical records.
//!
//! The record rule is cross-field: whether a `value` is well-formed depends
//! on the record's `type`. Validators take the whole document so the rule
//! can be applied identically on create, on bulk insert and after merging a
//! patch into a stored record.

use crate::error::{Error, Result};
use crate::patient::Patient;
use crate::record::{Record, RecordType};

/// Oldest age a patient record may carry.
pub const MAX_AGE: u8 = 150;

/// Minimum length of a patient name, in characters, after trimming.
pub const MIN_NAME_CHARS: usize = 2;

/// Digit bounds of a phone number (`^\+?\d{7,15}$`).
pub const MIN_PHONE_DIGITS: usize = 7;
/// Upper digit bound of a phone number.
pub const MAX_PHONE_DIGITS: usize = 15;

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Is `value` well-formed for a record of type `record_type`?
///
/// - Blood Pressure: `<digits>/<digits>`
/// - everything else: `<digits>` or `<digits>.<digits>`
pub fn is_valid_value(record_type: RecordType, value: &str) -> bool {
    match record_type {
        RecordType::BloodPressure => match value.split_once('/') {
            Some((systolic, diastolic)) => is_digits(systolic) && is_digits(diastolic),
            None => false,
        },
        _ => match value.split_once('.') {
            Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
            None => is_digits(value),
        },
    }
}

/// Does `phone` match `^\+?\d{7,15}$`?
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    is_digits(digits) && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len())
}

/// Validate a complete record, including the type/value rule.
pub fn validate_record(record: &Record) -> Result<()> {
    if record.value.is_empty() {
        return Err(Error::validation("Value is required"));
    }
    if !is_valid_value(record.record_type, &record.value) {
        return Err(Error::validation(format!(
            "{} is not a valid value for {}",
            record.value, record.record_type
        )));
    }
    Ok(())
}

/// Validate every field constraint of a patient.
///
/// All violations are reported together, separated by `"; "`.
pub fn validate_patient(patient: &Patient) -> Result<()> {
    let mut violations = Vec::new();

    let name_chars = patient.name.chars().count();
    if name_chars == 0 {
        violations.push("Patient name is required".to_string());
    } else if name_chars < MIN_NAME_CHARS {
        violations.push("Name must be at least 2 characters".to_string());
    }
    if patient.age > MAX_AGE {
        violations.push("Age seems unrealistic".to_string());
    }
    if patient.contact.is_empty() {
        violations.push("Contact number is required".to_string());
    } else if !is_valid_phone(&patient.contact) {
        violations.push("Please enter a valid contact number (7-15 digits)".to_string());
    }
    let emergency_phone = &patient.emergency_contact.phone;
    if !emergency_phone.is_empty() && !is_valid_phone(emergency_phone) {
        violations
            .push("Please enter a valid emergency contact number (7-15 digits)".to_string());
    }
    if patient.timestamp.is_empty() {
        violations.push("Timestamp is required".to_string());
    }
    if let Some(email) = &patient.email {
        if !email.contains('@') {
            violations.push(format!("{} is not a valid email", email));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(violations.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{EmergencyContact, Gender};
    use crate::types::DocId;
    use chrono::Utc;
    use proptest::prelude::*;

    const NUMERIC_TYPES: [RecordType; 4] = [
        RecordType::RespiratoryRate,
        RecordType::BloodOxygenLevel,
        RecordType::HeartbeatRate,
        RecordType::HeartRate,
    ];

    fn patient() -> Patient {
        let now = Utc::now();
        Patient {
            id: DocId::new(),
            name: "Ada Obi".to_string(),
            age: 40,
            gender: Gender::Female,
            contact: "+2348012345678".to_string(),
            history: String::new(),
            address: String::new(),
            emergency_contact: EmergencyContact::default(),
            timestamp: "2024-05-01T08:30:00Z".to_string(),
            email: None,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn record(record_type: RecordType, value: &str) -> Record {
        let now = Utc::now();
        Record {
            id: DocId::new(),
            patient_id: DocId::new(),
            record_type,
            value: value.to_string(),
            notes: String::new(),
            timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }

    // ========================================================================
    // Record values
    // ========================================================================

    #[test]
    fn test_numeric_types_accept_integers_and_decimals() {
        for t in NUMERIC_TYPES {
            for v in ["0", "0.5", "123.456", "72"] {
                assert!(is_valid_value(t, v), "{} should accept {:?}", t, v);
            }
        }
    }

    #[test]
    fn test_numeric_types_reject_malformed() {
        for t in NUMERIC_TYPES {
            for v in ["", "-1", "1.2.3", "12/34", "98.6.1", "+5", "1e3", ".5", "5.", " 5", "abc"] {
                assert!(!is_valid_value(t, v), "{} should reject {:?}", t, v);
            }
        }
    }

    #[test]
    fn test_blood_pressure_accepts_pairs() {
        assert!(is_valid_value(RecordType::BloodPressure, "120/80"));
        assert!(is_valid_value(RecordType::BloodPressure, "8/5"));
    }

    #[test]
    fn test_blood_pressure_rejects_malformed() {
        for v in ["120", "120/", "/80", "120.5/80", "/", "", "120/80/60", "-120/80", "120 /80"] {
            assert!(
                !is_valid_value(RecordType::BloodPressure, v),
                "Blood Pressure should reject {:?}",
                v
            );
        }
    }

    #[test]
    fn test_validate_record_message_names_type() {
        let err = validate_record(&record(RecordType::HeartRate, "not-a-number")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "not-a-number is not a valid value for Heart Rate"
        );
    }

    #[test]
    fn test_validate_record_empty_value() {
        let err = validate_record(&record(RecordType::BloodPressure, "")).unwrap_err();
        assert_eq!(err.to_string(), "Value is required");
    }

    // ========================================================================
    // Phones
    // ========================================================================

    #[test]
    fn test_phone_bounds() {
        assert!(is_valid_phone("1234567"));
        assert!(is_valid_phone("+123456789012345"));
        assert!(!is_valid_phone("123456"));
        assert!(!is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("++1234567"));
        assert!(!is_valid_phone("555-1234567"));
    }

    // ========================================================================
    // Patients
    // ========================================================================

    #[test]
    fn test_valid_patient_passes() {
        assert!(validate_patient(&patient()).is_ok());
    }

    #[test]
    fn test_patient_violations_are_collected() {
        let mut p = patient();
        p.name = "A".to_string();
        p.age = 151;
        p.contact = "12".to_string();
        let reason = validate_patient(&p).unwrap_err().to_string();
        assert!(reason.contains("Name must be at least 2 characters"));
        assert!(reason.contains("Age seems unrealistic"));
        assert!(reason.contains("valid contact number"));
    }

    #[test]
    fn test_patient_emergency_phone_optional() {
        let mut p = patient();
        p.emergency_contact.name = "Kin".to_string();
        assert!(validate_patient(&p).is_ok());
        p.emergency_contact.phone = "abc".to_string();
        assert!(validate_patient(&p).is_err());
    }

    #[test]
    fn test_patient_timestamp_required() {
        let mut p = patient();
        p.timestamp.clear();
        assert_eq!(
            validate_patient(&p).unwrap_err().to_string(),
            "Timestamp is required"
        );
    }

    proptest! {
        #[test]
        fn prop_digit_pairs_are_blood_pressure(a in 0u32..100_000, b in 0u32..100_000) {
            let v = format!("{}/{}", a, b);
            prop_assert!(is_valid_value(RecordType::BloodPressure, &v));
            prop_assert!(!is_valid_value(RecordType::HeartRate, &v));
        }

        #[test]
        fn prop_decimals_are_numeric(whole in 0u32..100_000, frac in 0u32..100_000) {
            let v = format!("{}.{}", whole, frac);
            prop_assert!(is_valid_value(RecordType::BloodOxygenLevel, &v));
            prop_assert!(!is_valid_value(RecordType::BloodPressure, &v));
        }

        #[test]
        fn prop_negative_numbers_rejected(n in 1i64..1_000_000) {
            let v = format!("-{}", n);
            prop_assert!(!is_valid_value(RecordType::RespiratoryRate, &v));
        }
    }
}
