//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use healthtrack_core::{PatientFields, RawRecord, Result};
use healthtrack_engine::{Database, PasswordHasher};
use healthtrack_storage::DocumentStore;
use std::sync::Arc;

/// Reversible "hash" so tests do not pay for Argon2.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, secret: &str) -> Result<String> {
        Ok(format!("plain${}", secret))
    }

    fn verify(&self, secret: &str, digest: &str) -> bool {
        digest.strip_prefix("plain$") == Some(secret)
    }
}

pub fn database() -> Database {
    Database::with_store(Arc::new(DocumentStore::ephemeral()), Arc::new(PlainHasher))
}

pub fn patient_fields(name: &str, contact: &str) -> PatientFields {
    PatientFields {
        name: Some(name.to_string()),
        age: Some(42),
        gender: Some("Male".to_string()),
        contact: Some(contact.to_string()),
        timestamp: Some("2024-06-01T09:00:00Z".to_string()),
        ..Default::default()
    }
}

pub fn raw(patient_id: Option<&str>, record_type: Option<&str>, value: Option<&str>) -> RawRecord {
    RawRecord {
        patient_id: patient_id.map(str::to_string),
        record_type: record_type.map(str::to_string),
        value: value.map(str::to_string),
        ..Default::default()
    }
}
