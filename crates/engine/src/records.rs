//! Single-record paths: create, list, per-patient list, type/value update.

use chrono::Utc;
use healthtrack_core::{DocId, Error, RawRecord, Record, RecordPatch, RecordWithOwner, Result};
use healthtrack_storage::{PatientStore, RecordStore};
use std::sync::Arc;
use tracing::info;

/// Record-facing operations
pub struct RecordService {
    records: Arc<dyn RecordStore>,
    patients: Arc<dyn PatientStore>,
}

impl RecordService {
    /// Create a service over the given stores.
    pub fn new(records: Arc<dyn RecordStore>, patients: Arc<dyn PatientStore>) -> Self {
        RecordService { records, patients }
    }

    /// Create one record.
    ///
    /// A missing timestamp defaults to now. The store checks the type/value
    /// rule and that the patient exists.
    ///
    /// # Errors
    /// - `ValidationFailed` for a missing required field, a bad type, a bad
    ///   value for the type, an unparseable timestamp or an unknown patient
    /// - `MalformedIdentity` for an unparseable `patientId`
    pub fn create_record(&self, raw: RawRecord) -> Result<Record> {
        if !raw.is_complete() {
            return Err(Error::validation(
                "Fields patientId, type, and value are required.",
            ));
        }
        let now = Utc::now();
        let record = self.records.insert_record(raw.into_record(now, now)?)?;
        info!(
            target: "healthtrack::records",
            record = %record.id,
            patient = %record.patient_id,
            record_type = %record.record_type,
            "Record created"
        );
        Ok(record)
    }

    /// Every record, newest first, owner inlined.
    pub fn list_records(&self) -> Result<Vec<RecordWithOwner>> {
        self.records.list_records_with_owner()
    }

    /// One patient's records, newest first, owner inlined.
    ///
    /// No records is `Ok(vec![])`, never an error.
    pub fn records_for_patient(&self, patient_id: &str) -> Result<Vec<RecordWithOwner>> {
        let patient_id = DocId::parse("patient", patient_id)?;
        let owner = self.patients.get_patient(patient_id)?;
        Ok(self
            .records
            .records_for_patient(patient_id)?
            .into_iter()
            .map(|record| RecordWithOwner::new(record, owner.clone()))
            .collect())
    }

    /// Change a record's type and/or value.
    ///
    /// # Errors
    /// - `EmptyPatch` when neither field is given
    /// - `MalformedIdentity` / `NotFound` for the record id
    /// - `ValidationFailed` when the merged type/value pair is malformed
    pub fn update_record(&self, id: &str, patch: RecordPatch) -> Result<Record> {
        if patch.is_empty() {
            return Err(Error::EmptyPatch);
        }
        let id = DocId::parse("record", id)?;
        let record = self
            .records
            .update_record(id, &patch)?
            .ok_or_else(|| Error::not_found("record", id.to_string()))?;
        info!(target: "healthtrack::records", record = %id, "Record updated");
        Ok(record)
    }
}
