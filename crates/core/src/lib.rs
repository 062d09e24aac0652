//! Core types and validation rules for HealthTrack
//!
//! This crate defines the foundational types used throughout the system:
//! - DocId: system-assigned document identity
//! - Patient, Record, User: the stored document kinds
//! - RawRecord / RecordPatch / PatientFields: client payloads before casting
//! - Validation rules, including the record type/value cross-field rule
//! - Error: the error taxonomy shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod patient;
pub mod record;
pub mod types;
pub mod user;
pub mod validation;

pub use error::{Error, Result};
pub use patient::{
    EmergencyContact, EmergencyContactFields, Gender, Patient, PatientFields, PatientRegistration,
};
pub use record::{newest_first, RawRecord, Record, RecordPatch, RecordType, RecordWithOwner};
pub use types::{parse_timestamp, DocId};
pub use user::{Credentials, User, UserSummary};
pub use validation::{is_valid_phone, is_valid_value, validate_patient, validate_record};
