//! Clinical measurement records.
//!
//! A [`Record`] is a single measurement (blood pressure, heart rate, ...)
//! taken for a patient. Clients submit records as loosely-typed
//! [`RawRecord`] payloads; converting one into a `Record` casts the identity,
//! type and timestamp, and [`crate::validation::validate_record`] then checks
//! the type-dependent value format.

use crate::error::{Error, Result};
use crate::patient::Patient;
use crate::types::{parse_timestamp, DocId};
use crate::validation::validate_record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Clinical measurement category. Determines the value format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Systolic/diastolic pair, e.g. `120/80`
    #[serde(rename = "Blood Pressure")]
    BloodPressure,
    /// Breaths per minute
    #[serde(rename = "Respiratory Rate")]
    RespiratoryRate,
    /// SpO2 percentage
    #[serde(rename = "Blood Oxygen Level")]
    BloodOxygenLevel,
    /// Beats per minute
    #[serde(rename = "Heartbeat Rate")]
    HeartbeatRate,
    /// Beats per minute
    #[serde(rename = "Heart Rate")]
    HeartRate,
}

impl RecordType {
    /// All record types, in declaration order
    pub const ALL: [RecordType; 5] = [
        RecordType::BloodPressure,
        RecordType::RespiratoryRate,
        RecordType::BloodOxygenLevel,
        RecordType::HeartbeatRate,
        RecordType::HeartRate,
    ];

    /// Canonical string form
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordType::BloodPressure => "Blood Pressure",
            RecordType::RespiratoryRate => "Respiratory Rate",
            RecordType::BloodOxygenLevel => "Blood Oxygen Level",
            RecordType::HeartbeatRate => "Heartbeat Rate",
            RecordType::HeartRate => "Heart Rate",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::validation(format!("{} is not a valid record type", s)))
    }
}

/// A persisted clinical record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// System-assigned identity
    pub id: DocId,
    /// Owning patient
    pub patient_id: DocId,
    /// Measurement category
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Measurement value, format depends on `record_type`
    pub value: String,
    /// Free-text notes
    pub notes: String,
    /// Measurement time
    pub timestamp: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Merge a type/value patch and re-validate against the merged state.
    ///
    /// # Errors
    /// `EmptyPatch` when the patch carries nothing, `ValidationFailed` when
    /// the merged type/value pair is malformed.
    pub fn apply_patch(&self, patch: &RecordPatch, now: DateTime<Utc>) -> Result<Record> {
        if patch.is_empty() {
            return Err(Error::EmptyPatch);
        }
        let mut merged = self.clone();
        if let Some(t) = patch.record_type.as_deref().filter(|t| !t.is_empty()) {
            merged.record_type = t.parse()?;
        }
        if let Some(v) = patch.value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            merged.value = v.to_string();
        }
        merged.updated_at = now;
        validate_record(&merged)?;
        Ok(merged)
    }
}

/// Update payload for a record. Only `type` and `value` are mutable; any
/// other field a client sends is dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// New measurement category
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    /// New measurement value
    #[serde(default)]
    pub value: Option<String>,
}

impl RecordPatch {
    /// Lenient extraction from an arbitrary JSON value. Numeric values are
    /// read as text, the same as record creation.
    pub fn from_json(value: &JsonValue) -> Self {
        RecordPatch {
            record_type: scalar_text(value.get("type")),
            value: scalar_text(value.get("value")),
        }
    }

    /// True when neither field carries a non-empty value.
    pub fn is_empty(&self) -> bool {
        let blank = |f: &Option<String>| f.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.record_type) && blank(&self.value)
    }
}

/// A record payload as submitted by a client, before casting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Owning patient identity
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Measurement category
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    /// Measurement value
    #[serde(default)]
    pub value: Option<String>,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Measurement time
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Read a JSON scalar as text. Numbers are accepted for string fields;
/// `null`, booleans, arrays and objects count as absent.
fn scalar_text(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().map_or(false, |s| !s.trim().is_empty())
}

impl RawRecord {
    /// Lenient extraction from an arbitrary JSON value.
    ///
    /// Non-object values yield an empty payload, which the presence filter
    /// then drops.
    pub fn from_json(value: &JsonValue) -> Self {
        let field = |name: &str| scalar_text(value.get(name));
        RawRecord {
            patient_id: field("patientId"),
            record_type: field("type"),
            value: field("value"),
            notes: field("notes"),
            timestamp: field("timestamp"),
        }
    }

    /// Names of the required fields this payload lacks.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !present(&self.patient_id) {
            missing.push("patientId");
        }
        if !present(&self.record_type) {
            missing.push("type");
        }
        if !present(&self.value) {
            missing.push("value");
        }
        missing
    }

    /// Does this payload carry `patientId`, `type` and `value`?
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Cast into a record with a fresh identity.
    ///
    /// Casts identity, type and timestamp; `fallback_timestamp` is used when
    /// the payload has none. The type/value format rule is NOT applied here.
    pub fn into_record(self, fallback_timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Result<Record> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(Error::validation(
                "Fields patientId, type, and value are required.",
            ));
        }
        let patient_id = DocId::parse("patient", self.patient_id.as_deref().unwrap_or_default())?;
        let record_type = self.record_type.as_deref().unwrap_or_default().trim().parse()?;
        let timestamp = match self.timestamp.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(t) => parse_timestamp(t)?,
            None => fallback_timestamp,
        };
        Ok(Record {
            id: DocId::new(),
            patient_id,
            record_type,
            value: self.value.unwrap_or_default().trim().to_string(),
            notes: self.notes.unwrap_or_default().trim().to_string(),
            timestamp,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A record with its owning patient inlined in place of `patientId`.
///
/// `patient_id` is `None` when the owner has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordWithOwner {
    /// Record identity
    pub id: DocId,
    /// Owning patient, credential stripped
    pub patient_id: Option<Patient>,
    /// Measurement category
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Measurement value
    pub value: String,
    /// Free-text notes
    pub notes: String,
    /// Measurement time
    pub timestamp: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl RecordWithOwner {
    /// Join a record with its owner.
    pub fn new(record: Record, owner: Option<Patient>) -> Self {
        RecordWithOwner {
            id: record.id,
            patient_id: owner.map(|p| p.redacted()),
            record_type: record.record_type,
            value: record.value,
            notes: record.notes,
            timestamp: record.timestamp,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Newest-first ordering used by every record listing.
pub fn newest_first(a: &Record, b: &Record) -> std::cmp::Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
