//! Persistence contracts consumed by the service layer.
//!
//! Each trait covers one document kind. All methods are synchronous and the
//! implementations are `Send + Sync`, so a single store instance can be
//! shared by every request handler.

use healthtrack_core::{DocId, Patient, Record, RecordPatch, RecordWithOwner, Result, User};

/// Patient persistence
pub trait PatientStore: Send + Sync {
    /// Insert a new patient.
    ///
    /// # Errors
    /// `DuplicateContact` / `DuplicateEmail` if another patient owns the
    /// contact or email. The check and the write are atomic.
    fn insert_patient(&self, patient: Patient) -> Result<Patient>;

    /// Fetch a patient by identity.
    fn get_patient(&self, id: DocId) -> Result<Option<Patient>>;

    /// All patients, oldest first.
    fn list_patients(&self) -> Result<Vec<Patient>>;

    /// Lookup by contact number.
    fn find_patient_by_contact(&self, contact: &str) -> Result<Option<Patient>>;

    /// Lookup by login email.
    fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>>;

    /// Overwrite a stored patient. Returns `None` if the identity is unknown.
    ///
    /// # Errors
    /// `DuplicateContact` / `DuplicateEmail` if the new values collide with
    /// a different patient.
    fn replace_patient(&self, patient: Patient) -> Result<Option<Patient>>;

    /// Remove a patient. Returns the removed document, if any.
    ///
    /// Records owned by the patient are left in place.
    fn delete_patient(&self, id: DocId) -> Result<Option<Patient>>;
}

/// Clinical record persistence
pub trait RecordStore: Send + Sync {
    /// Insert one record after whole-record validation.
    ///
    /// # Errors
    /// `ValidationFailed` if the type/value rule fails or the owning patient
    /// does not exist.
    fn insert_record(&self, record: Record) -> Result<Record>;

    /// Insert many records, each independently.
    ///
    /// The inner results carry per-document outcomes, in input order. The
    /// outer error is a storage failure that stopped the batch; documents
    /// inserted before it remain.
    fn insert_records(&self, records: Vec<Record>) -> Result<Vec<Result<Record>>>;

    /// Fetch a record by identity.
    fn get_record(&self, id: DocId) -> Result<Option<Record>>;

    /// Records of one patient, newest first. Empty when there are none.
    fn records_for_patient(&self, patient_id: DocId) -> Result<Vec<Record>>;

    /// Number of records owned by a patient.
    fn count_records_for_patient(&self, patient_id: DocId) -> Result<usize>;

    /// Every record, newest first, with its owner inlined.
    fn list_records_with_owner(&self) -> Result<Vec<RecordWithOwner>>;

    /// Merge a type/value patch into a stored record and re-validate.
    ///
    /// Returns `None` if the identity is unknown.
    fn update_record(&self, id: DocId, patch: &RecordPatch) -> Result<Option<Record>>;
}

/// User account persistence
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    ///
    /// # Errors
    /// `DuplicateEmail` if another user owns the email.
    fn insert_user(&self, user: User) -> Result<User>;

    /// Lookup by login email.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}
