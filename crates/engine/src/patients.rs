//! Patient registry
//!
//! Creation, replace-style update, deletion and the credential flow for
//! patients. Contact and email lookups here are early exits that produce a
//! clean error; the store's unique index is what actually guarantees
//! uniqueness when two requests race.

use crate::credentials::{normalize_email, required, PasswordHasher};
use chrono::Utc;
use healthtrack_core::{
    validate_patient, Credentials, DocId, Error, Patient, PatientFields, PatientRegistration,
    Result,
};
use healthtrack_storage::{PatientStore, RecordStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Acknowledgement returned by the mock password reset.
pub const PATIENT_RESET_MESSAGE: &str = "Password reset link sent (mock)";

/// Patient-facing operations
pub struct PatientRegistry {
    patients: Arc<dyn PatientStore>,
    records: Arc<dyn RecordStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl PatientRegistry {
    /// Create a registry over the given stores.
    pub fn new(
        patients: Arc<dyn PatientStore>,
        records: Arc<dyn RecordStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        PatientRegistry {
            patients,
            records,
            hasher,
        }
    }

    /// All patients, oldest first, credentials stripped.
    pub fn list(&self) -> Result<Vec<Patient>> {
        Ok(self
            .patients
            .list_patients()?
            .iter()
            .map(Patient::redacted)
            .collect())
    }

    /// Fetch one patient by its identity string.
    ///
    /// # Errors
    /// `MalformedIdentity` for an unparseable id, `NotFound` for an unknown one.
    pub fn get(&self, id: &str) -> Result<Patient> {
        let id = DocId::parse("patient", id)?;
        self.patients
            .get_patient(id)?
            .map(|p| p.redacted())
            .ok_or_else(|| Error::not_found("patient", id.to_string()))
    }

    /// Direct creation: name and contact must be present before anything else
    /// is checked.
    pub fn create(&self, fields: PatientFields) -> Result<Patient> {
        if required(&fields.name).is_none() || required(&fields.contact).is_none() {
            return Err(Error::validation("Name and contact are required"));
        }
        self.register_patient(fields)
    }

    /// Validate and persist a new patient.
    ///
    /// # Errors
    /// - `ValidationFailed` for any field constraint violation
    /// - `DuplicateContact` if another patient already uses the contact
    pub fn register_patient(&self, fields: PatientFields) -> Result<Patient> {
        let patient = fields.into_patient(DocId::new(), Utc::now())?;
        self.ensure_contact_free(&patient)?;
        let patient = self.patients.insert_patient(patient)?;
        info!(target: "healthtrack::patients", patient = %patient.id, "Patient registered");
        Ok(patient.redacted())
    }

    /// Registration with a login credential.
    ///
    /// The patient fields go through the same validation as `register_patient`;
    /// the password is hashed before it reaches the store.
    pub fn register_with_credential(&self, registration: PatientRegistration) -> Result<Patient> {
        let PatientRegistration {
            fields,
            email,
            password,
        } = registration;
        let (Some(_), Some(email), Some(password)) =
            (required(&fields.name), required(&email), required(&password))
        else {
            return Err(Error::validation("Name, email, and password are required."));
        };
        let email = normalize_email(email);
        if self.patients.find_patient_by_email(&email)?.is_some() {
            return Err(Error::DuplicateEmail { email });
        }

        let mut patient = fields.into_patient(DocId::new(), Utc::now())?;
        patient.email = Some(email);
        validate_patient(&patient)?;
        self.ensure_contact_free(&patient)?;

        patient.password_hash = Some(self.hasher.hash(password)?);
        let patient = self.patients.insert_patient(patient)?;
        info!(target: "healthtrack::patients", patient = %patient.id, "Patient registered with credential");
        Ok(patient.redacted())
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    /// `InvalidCredentials` for a missing field, an unknown email, a patient
    /// without a credential, or a wrong password.
    pub fn login(&self, credentials: &Credentials) -> Result<Patient> {
        let (Some(email), Some(password)) =
            (required(&credentials.email), required(&credentials.password))
        else {
            return Err(Error::InvalidCredentials);
        };
        let patient = self
            .patients
            .find_patient_by_email(&normalize_email(email))?
            .ok_or(Error::InvalidCredentials)?;
        let digest = patient
            .password_hash
            .as_deref()
            .ok_or(Error::InvalidCredentials)?;
        if !self.hasher.verify(password, digest) {
            debug!(target: "healthtrack::patients", patient = %patient.id, "Password mismatch");
            return Err(Error::InvalidCredentials);
        }
        Ok(patient.redacted())
    }

    /// Mock password reset. Nothing is sent.
    pub fn forgot_password(&self, email: Option<&str>) -> Result<&'static str> {
        let email = email.map(normalize_email).unwrap_or_default();
        match self.patients.find_patient_by_email(&email)? {
            Some(patient) => {
                info!(target: "healthtrack::patients", patient = %patient.id, "Password reset requested");
                Ok(PATIENT_RESET_MESSAGE)
            }
            None => Err(Error::not_found("email", email)),
        }
    }

    /// Replace the provided fields of a stored patient.
    ///
    /// The merged document is re-validated; the contact must stay unique
    /// among the other patients.
    pub fn update(&self, id: &str, fields: PatientFields) -> Result<Patient> {
        let id = DocId::parse("patient", id)?;
        let existing = self
            .patients
            .get_patient(id)?
            .ok_or_else(|| Error::not_found("patient", id.to_string()))?;
        let merged = fields.apply_to(&existing, Utc::now())?;
        if merged.contact != existing.contact {
            self.ensure_contact_free(&merged)?;
        }
        let updated = self
            .patients
            .replace_patient(merged)?
            .ok_or_else(|| Error::not_found("patient", id.to_string()))?;
        info!(target: "healthtrack::patients", patient = %id, "Patient updated");
        Ok(updated.redacted())
    }

    /// Remove a patient. Its records stay behind.
    pub fn delete(&self, id: &str) -> Result<Patient> {
        let id = DocId::parse("patient", id)?;
        let removed = self
            .patients
            .delete_patient(id)?
            .ok_or_else(|| Error::not_found("patient", id.to_string()))?;

        let orphaned = self.records.count_records_for_patient(id)?;
        if orphaned > 0 {
            warn!(
                target: "healthtrack::patients",
                patient = %id,
                orphaned_records = orphaned,
                "Patient deleted; records kept"
            );
        } else {
            info!(target: "healthtrack::patients", patient = %id, "Patient deleted");
        }
        Ok(removed.redacted())
    }

    fn ensure_contact_free(&self, patient: &Patient) -> Result<()> {
        match self.patients.find_patient_by_contact(&patient.contact)? {
            Some(owner) if owner.id != patient.id => Err(Error::DuplicateContact {
                contact: patient.contact.clone(),
            }),
            _ => Ok(()),
        }
    }
}
