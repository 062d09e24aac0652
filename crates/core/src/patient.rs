//! Patient documents and the payloads that create or replace them.

use crate::error::{Error, Result};
use crate::types::DocId;
use crate::validation::{validate_patient, MAX_AGE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other
    Other,
}

impl Gender {
    /// Canonical string form
    pub const fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            other => Err(Error::validation(format!(
                "{} is not a valid gender",
                other
            ))),
        }
    }
}

/// Who to call in an emergency. Empty strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Contact name
    #[serde(default)]
    pub name: String,
    /// Contact phone, same format as the patient contact
    #[serde(default)]
    pub phone: String,
}

/// A registered patient
///
/// `contact` is unique across all patients; `email` is unique across the
/// patients that carry one. `password_hash` is only set for patients created
/// through registration and is stripped by [`Patient::redacted`] before a
/// patient leaves the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// System-assigned identity
    pub id: DocId,
    /// Full name
    pub name: String,
    /// Age in years
    pub age: u8,
    /// Gender
    pub gender: Gender,
    /// Contact phone number
    pub contact: String,
    /// Medical history notes
    pub history: String,
    /// Postal address
    pub address: String,
    /// Emergency contact
    pub emergency_contact: EmergencyContact,
    /// Client-supplied capture time, kept verbatim
    pub timestamp: String,
    /// Login email for registered patients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Credential digest for registered patients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Copy of this patient without its credential digest.
    pub fn redacted(&self) -> Patient {
        Patient {
            password_hash: None,
            ..self.clone()
        }
    }
}

/// Emergency contact as submitted by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContactFields {
    /// Contact name
    #[serde(default)]
    pub name: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
}

/// Patient fields as submitted by a client.
///
/// Every field is optional here so the same payload serves both creation
/// (where required fields are enforced) and replace-style updates (where
/// absent fields keep their stored value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientFields {
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// Age in years
    #[serde(default)]
    pub age: Option<i64>,
    /// Gender, one of Male/Female/Other
    #[serde(default)]
    pub gender: Option<String>,
    /// Contact phone number
    #[serde(default)]
    pub contact: Option<String>,
    /// Medical history notes
    #[serde(default)]
    pub history: Option<String>,
    /// Postal address
    #[serde(default)]
    pub address: Option<String>,
    /// Emergency contact
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContactFields>,
    /// Client capture time
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string())
}

fn parse_age(age: i64) -> Result<u8> {
    if age < 0 {
        return Err(Error::validation("Age cannot be negative"));
    }
    if age > i64::from(MAX_AGE) {
        return Err(Error::validation("Age seems unrealistic"));
    }
    Ok(age as u8)
}

impl PatientFields {
    /// Build a new patient, enforcing required fields and all constraints.
    pub fn into_patient(self, id: DocId, now: DateTime<Utc>) -> Result<Patient> {
        let mut missing = Vec::new();
        let name = trimmed(self.name).unwrap_or_default();
        if name.is_empty() {
            missing.push("Patient name is required");
        }
        if self.age.is_none() {
            missing.push("Age is required");
        }
        if self.gender.is_none() {
            missing.push("Gender is required");
        }
        let contact = trimmed(self.contact).unwrap_or_default();
        if contact.is_empty() {
            missing.push("Contact number is required");
        }
        let timestamp = trimmed(self.timestamp).unwrap_or_default();
        if timestamp.is_empty() {
            missing.push("Timestamp is required");
        }
        if !missing.is_empty() {
            return Err(Error::validation(missing.join("; ")));
        }

        let emergency = self.emergency_contact.unwrap_or_default();
        let patient = Patient {
            id,
            name,
            age: parse_age(self.age.unwrap_or_default())?,
            gender: self.gender.as_deref().unwrap_or_default().parse()?,
            contact,
            history: trimmed(self.history).unwrap_or_default(),
            address: trimmed(self.address).unwrap_or_default(),
            emergency_contact: EmergencyContact {
                name: trimmed(emergency.name).unwrap_or_default(),
                phone: trimmed(emergency.phone).unwrap_or_default(),
            },
            timestamp,
            email: None,
            password_hash: None,
            created_at: now,
            updated_at: now,
        };
        validate_patient(&patient)?;
        Ok(patient)
    }

    /// Replace the provided fields of `existing` and re-validate the result.
    ///
    /// Identity, credentials and `created_at` never change through this path.
    pub fn apply_to(self, existing: &Patient, now: DateTime<Utc>) -> Result<Patient> {
        let mut patient = existing.clone();
        if let Some(name) = trimmed(self.name) {
            patient.name = name;
        }
        if let Some(age) = self.age {
            patient.age = parse_age(age)?;
        }
        if let Some(gender) = self.gender {
            patient.gender = gender.parse()?;
        }
        if let Some(contact) = trimmed(self.contact) {
            patient.contact = contact;
        }
        if let Some(history) = trimmed(self.history) {
            patient.history = history;
        }
        if let Some(address) = trimmed(self.address) {
            patient.address = address;
        }
        if let Some(emergency) = self.emergency_contact {
            if let Some(name) = trimmed(emergency.name) {
                patient.emergency_contact.name = name;
            }
            if let Some(phone) = trimmed(emergency.phone) {
                patient.emergency_contact.phone = phone;
            }
        }
        if let Some(timestamp) = trimmed(self.timestamp) {
            patient.timestamp = timestamp;
        }
        patient.updated_at = now;
        validate_patient(&patient)?;
        Ok(patient)
    }
}

/// Registration payload: patient fields plus login credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRegistration {
    /// Patient fields
    #[serde(flatten)]
    pub fields: PatientFields,
    /// Login email
    #[serde(default)]
    pub email: Option<String>,
    /// Plain-text password, hashed before it is stored
    #[serde(default)]
    pub password: Option<String>,
}
