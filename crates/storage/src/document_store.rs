//! DocumentStore: the patient, record and user collections
//!
//! ## Design
//!
//! - Collections are `DashMap<DocId, Stored<T>>`: lock-free reads, per-shard
//!   write locks.
//! - Patient mutations serialize on the `patient_keys` mutex, which also
//!   guards the contact/email unique indexes. The uniqueness check and the
//!   write happen under that one lock, so the index is the authoritative
//!   guard even when two registrations race.
//! - Every mutation is journaled before it is applied in memory when the
//!   store is durable. Ephemeral stores skip the journal.
//! - Each stored document carries a version counter that is bumped on every
//!   write and never leaves the store.

use crate::index::{OwnerIndex, UniqueIndex};
use crate::journal::{Journal, JournalEntry, SyncMode};
use crate::traits::{PatientStore, RecordStore, UserStore};
use chrono::Utc;
use dashmap::DashMap;
use healthtrack_core::{
    newest_first, validate_record, DocId, Error, Patient, Record, RecordPatch, RecordWithOwner,
    Result, User,
};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use tracing::{debug, info};

/// A document plus its internal version
#[derive(Debug, Clone)]
struct Stored<T> {
    doc: T,
    version: u64,
}

impl<T> Stored<T> {
    fn first(doc: T) -> Self {
        Stored { doc, version: 1 }
    }
}

#[derive(Debug, Default)]
struct PatientKeys {
    contacts: UniqueIndex,
    emails: UniqueIndex,
}

/// Document counts, for startup logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    /// Stored patients
    pub patients: usize,
    /// Stored records
    pub records: usize,
    /// Stored users
    pub users: usize,
}

/// In-memory document store with an optional journal
///
/// # Example
///
/// ```ignore
/// use healthtrack_storage::{DocumentStore, PatientStore};
///
/// let store = DocumentStore::ephemeral();
/// store.insert_patient(patient)?;
/// ```
pub struct DocumentStore {
    patients: DashMap<DocId, Stored<Patient>>,
    records: DashMap<DocId, Stored<Record>>,
    users: DashMap<DocId, Stored<User>>,
    patient_keys: Mutex<PatientKeys>,
    user_emails: Mutex<UniqueIndex>,
    owners: RwLock<OwnerIndex>,
    journal: Option<Journal>,
}

impl DocumentStore {
    /// Create a store that lives only in memory.
    pub fn ephemeral() -> Self {
        DocumentStore {
            patients: DashMap::new(),
            records: DashMap::new(),
            users: DashMap::new(),
            patient_keys: Mutex::new(PatientKeys::default()),
            user_emails: Mutex::new(UniqueIndex::new()),
            owners: RwLock::new(OwnerIndex::new()),
            journal: None,
        }
    }

    /// Open a journaled store in `dir`, replaying any existing journal.
    pub fn open(dir: &Path, sync_mode: SyncMode) -> Result<Self> {
        let (journal, entries) = Journal::open(dir, sync_mode)?;
        let mut store = DocumentStore::ephemeral();
        store.replay(entries);
        store.journal = Some(journal);

        let counts = store.counts();
        info!(
            target: "healthtrack::store",
            path = ?dir,
            patients = counts.patients,
            records = counts.records,
            users = counts.users,
            "Document store opened"
        );
        Ok(store)
    }

    /// Does this store persist writes?
    pub fn is_durable(&self) -> bool {
        self.journal.is_some()
    }

    /// Journal file location, for durable stores
    pub fn journal_path(&self) -> Option<&Path> {
        self.journal.as_ref().map(Journal::path)
    }

    /// Number of documents per collection
    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            patients: self.patients.len(),
            records: self.records.len(),
            users: self.users.len(),
        }
    }

    /// Internal version of a patient document
    pub fn patient_version(&self, id: DocId) -> Option<u64> {
        self.patients.get(&id).map(|s| s.version)
    }

    /// Internal version of a record document
    pub fn record_version(&self, id: DocId) -> Option<u64> {
        self.records.get(&id).map(|s| s.version)
    }

    fn log(&self, entry: &JournalEntry) -> Result<()> {
        match &self.journal {
            Some(journal) => journal.append(entry),
            None => Ok(()),
        }
    }

    fn replay(&mut self, entries: Vec<JournalEntry>) {
        for entry in entries {
            match entry {
                JournalEntry::PutPatient { patient, version } => {
                    self.patients
                        .insert(patient.id, Stored { doc: patient, version });
                }
                JournalEntry::DeletePatient { id } => {
                    self.patients.remove(&id);
                }
                JournalEntry::PutRecord { record, version } => {
                    self.records.insert(record.id, Stored { doc: record, version });
                }
                JournalEntry::PutUser { user, version } => {
                    self.users.insert(user.id, Stored { doc: user, version });
                }
            }
        }

        let keys = self.patient_keys.get_mut();
        for p in self.patients.iter() {
            keys.contacts.claim(&p.doc.contact, p.doc.id);
            if let Some(email) = &p.doc.email {
                keys.emails.claim(email, p.doc.id);
            }
        }
        let owners = self.owners.get_mut();
        for r in self.records.iter() {
            owners.insert(r.doc.patient_id, r.doc.id);
        }
        let emails = self.user_emails.get_mut();
        for u in self.users.iter() {
            emails.claim(&u.doc.email, u.doc.id);
        }
    }

    fn check_patient_keys(keys: &PatientKeys, patient: &Patient) -> Result<()> {
        if !keys.contacts.is_available(&patient.contact, patient.id) {
            return Err(Error::DuplicateContact {
                contact: patient.contact.clone(),
            });
        }
        if let Some(email) = &patient.email {
            if !keys.emails.is_available(email, patient.id) {
                return Err(Error::DuplicateEmail {
                    email: email.clone(),
                });
            }
        }
        Ok(())
    }

    /// The storage-side schema check every record write goes through.
    fn check_record(&self, record: &Record) -> Result<()> {
        validate_record(record)?;
        if !self.patients.contains_key(&record.patient_id) {
            return Err(Error::validation(format!(
                "Patient {} does not exist",
                record.patient_id
            )));
        }
        Ok(())
    }

    fn put_new_record(&self, record: Record) -> Result<Record> {
        if self.records.contains_key(&record.id) {
            return Err(Error::storage(format!("record {} already exists", record.id)));
        }
        self.log(&JournalEntry::PutRecord {
            record: record.clone(),
            version: 1,
        })?;
        self.owners.write().insert(record.patient_id, record.id);
        self.records.insert(record.id, Stored::first(record.clone()));
        debug!(target: "healthtrack::store", record = %record.id, patient = %record.patient_id, "Record inserted");
        Ok(record)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::ephemeral()
    }
}

// =============================================================================
// Patients
// =============================================================================

impl PatientStore for DocumentStore {
    fn insert_patient(&self, patient: Patient) -> Result<Patient> {
        let mut keys = self.patient_keys.lock();
        Self::check_patient_keys(&keys, &patient)?;
        if self.patients.contains_key(&patient.id) {
            return Err(Error::storage(format!("patient {} already exists", patient.id)));
        }

        self.log(&JournalEntry::PutPatient {
            patient: patient.clone(),
            version: 1,
        })?;
        keys.contacts.claim(&patient.contact, patient.id);
        if let Some(email) = &patient.email {
            keys.emails.claim(email, patient.id);
        }
        self.patients.insert(patient.id, Stored::first(patient.clone()));

        debug!(target: "healthtrack::store", patient = %patient.id, "Patient inserted");
        Ok(patient)
    }

    fn get_patient(&self, id: DocId) -> Result<Option<Patient>> {
        Ok(self.patients.get(&id).map(|s| s.doc.clone()))
    }

    fn list_patients(&self) -> Result<Vec<Patient>> {
        let mut patients: Vec<Patient> = self.patients.iter().map(|s| s.doc.clone()).collect();
        patients.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(patients)
    }

    fn find_patient_by_contact(&self, contact: &str) -> Result<Option<Patient>> {
        let owner = self.patient_keys.lock().contacts.owner(contact);
        Ok(owner.and_then(|id| self.patients.get(&id).map(|s| s.doc.clone())))
    }

    fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>> {
        let owner = self.patient_keys.lock().emails.owner(email);
        Ok(owner.and_then(|id| self.patients.get(&id).map(|s| s.doc.clone())))
    }

    fn replace_patient(&self, patient: Patient) -> Result<Option<Patient>> {
        let mut keys = self.patient_keys.lock();
        let current = self
            .patients
            .get(&patient.id)
            .map(|s| (s.doc.clone(), s.version));
        let Some((previous, version)) = current else {
            return Ok(None);
        };
        Self::check_patient_keys(&keys, &patient)?;

        let version = version + 1;
        self.log(&JournalEntry::PutPatient {
            patient: patient.clone(),
            version,
        })?;

        keys.contacts.release(&previous.contact, patient.id);
        keys.contacts.claim(&patient.contact, patient.id);
        if let Some(email) = &previous.email {
            keys.emails.release(email, patient.id);
        }
        if let Some(email) = &patient.email {
            keys.emails.claim(email, patient.id);
        }
        self.patients
            .insert(patient.id, Stored { doc: patient.clone(), version });

        debug!(target: "healthtrack::store", patient = %patient.id, version, "Patient replaced");
        Ok(Some(patient))
    }

    fn delete_patient(&self, id: DocId) -> Result<Option<Patient>> {
        let mut keys = self.patient_keys.lock();
        if !self.patients.contains_key(&id) {
            return Ok(None);
        }

        self.log(&JournalEntry::DeletePatient { id })?;
        let removed = self.patients.remove(&id).map(|(_, s)| s.doc);
        if let Some(patient) = &removed {
            keys.contacts.release(&patient.contact, id);
            if let Some(email) = &patient.email {
                keys.emails.release(email, id);
            }
        }

        debug!(target: "healthtrack::store", patient = %id, "Patient deleted");
        Ok(removed)
    }
}

// =============================================================================
// Records
// =============================================================================

impl RecordStore for DocumentStore {
    fn insert_record(&self, record: Record) -> Result<Record> {
        self.check_record(&record)?;
        self.put_new_record(record)
    }

    fn insert_records(&self, records: Vec<Record>) -> Result<Vec<Result<Record>>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            match self.check_record(&record) {
                Ok(()) => outcomes.push(Ok(self.put_new_record(record)?)),
                Err(e) => outcomes.push(Err(e)),
            }
        }
        Ok(outcomes)
    }

    fn get_record(&self, id: DocId) -> Result<Option<Record>> {
        Ok(self.records.get(&id).map(|s| s.doc.clone()))
    }

    fn records_for_patient(&self, patient_id: DocId) -> Result<Vec<Record>> {
        let ids: Vec<DocId> = self
            .owners
            .read()
            .get(&patient_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        let mut records: Vec<Record> = ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|s| s.doc.clone()))
            .collect();
        records.sort_by(newest_first);
        Ok(records)
    }

    fn count_records_for_patient(&self, patient_id: DocId) -> Result<usize> {
        Ok(self.owners.read().count(&patient_id))
    }

    fn list_records_with_owner(&self) -> Result<Vec<RecordWithOwner>> {
        let mut records: Vec<Record> = self.records.iter().map(|s| s.doc.clone()).collect();
        records.sort_by(newest_first);
        Ok(records
            .into_iter()
            .map(|record| {
                let owner = self.patients.get(&record.patient_id).map(|s| s.doc.clone());
                RecordWithOwner::new(record, owner)
            })
            .collect())
    }

    fn update_record(&self, id: DocId, patch: &RecordPatch) -> Result<Option<Record>> {
        let Some(mut entry) = self.records.get_mut(&id) else {
            return Ok(None);
        };
        let merged = entry.doc.apply_patch(patch, Utc::now())?;
        let version = entry.version + 1;
        self.log(&JournalEntry::PutRecord {
            record: merged.clone(),
            version,
        })?;
        *entry = Stored {
            doc: merged.clone(),
            version,
        };

        debug!(target: "healthtrack::store", record = %id, version, "Record updated");
        Ok(Some(merged))
    }
}

// =============================================================================
// Users
// =============================================================================

impl UserStore for DocumentStore {
    fn insert_user(&self, user: User) -> Result<User> {
        let mut emails = self.user_emails.lock();
        if !emails.is_available(&user.email, user.id) {
            return Err(Error::DuplicateEmail {
                email: user.email.clone(),
            });
        }
        self.log(&JournalEntry::PutUser {
            user: user.clone(),
            version: 1,
        })?;
        emails.claim(&user.email, user.id);
        self.users.insert(user.id, Stored::first(user.clone()));

        debug!(target: "healthtrack::store", user = %user.id, "User inserted");
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let owner = self.user_emails.lock().owner(email);
        Ok(owner.and_then(|id| self.users.get(&id).map(|s| s.doc.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthtrack_core::{EmergencyContact, Gender, RecordType};

    fn patient(contact: &str) -> Patient {
        let now = Utc::now();
        Patient {
            id: DocId::new(),
            name: "Ada Obi".to_string(),
            age: 40,
            gender: Gender::Female,
            contact: contact.to_string(),
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

    fn record(patient_id: DocId, record_type: RecordType, value: &str) -> Record {
        let now = Utc::now();
        Record {
            id: DocId::new(),
            patient_id,
            record_type,
            value: value.to_string(),
            notes: String::new(),
            timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_get_patient() {
        let store = DocumentStore::ephemeral();
        let p = store.insert_patient(patient("5551234567")).unwrap();
        assert_eq!(store.get_patient(p.id).unwrap(), Some(p.clone()));
        assert_eq!(store.patient_version(p.id), Some(1));
        assert!(!store.is_durable());
    }

    #[test]
    fn test_duplicate_contact_rejected() {
        let store = DocumentStore::ephemeral();
        store.insert_patient(patient("5551234567")).unwrap();
        let err = store.insert_patient(patient("5551234567")).unwrap_err();
        assert!(matches!(err, Error::DuplicateContact { .. }));
        assert_eq!(store.counts().patients, 1);
    }

    #[test]
    fn test_duplicate_patient_email_rejected() {
        let store = DocumentStore::ephemeral();
        let mut a = patient("5551234567");
        a.email = Some("ada@example.com".to_string());
        let mut b = patient("5559876543");
        b.email = Some("ada@example.com".to_string());
        store.insert_patient(a).unwrap();
        assert!(matches!(
            store.insert_patient(b),
            Err(Error::DuplicateEmail { .. })
        ));
    }

    #[test]
    fn test_replace_moves_contact_claim() {
        let store = DocumentStore::ephemeral();
        let p = store.insert_patient(patient("5551234567")).unwrap();
        let mut changed = p.clone();
        changed.contact = "5550000000".to_string();
        store.replace_patient(changed).unwrap().unwrap();

        assert!(store.find_patient_by_contact("5551234567").unwrap().is_none());
        assert_eq!(
            store.find_patient_by_contact("5550000000").unwrap().unwrap().id,
            p.id
        );
        assert_eq!(store.patient_version(p.id), Some(2));
        // The released contact is free again.
        store.insert_patient(patient("5551234567")).unwrap();
    }

    #[test]
    fn test_replace_rejects_foreign_contact() {
        let store = DocumentStore::ephemeral();
        store.insert_patient(patient("5551234567")).unwrap();
        let p = store.insert_patient(patient("5559876543")).unwrap();
        let mut changed = p.clone();
        changed.contact = "5551234567".to_string();
        assert!(matches!(
            store.replace_patient(changed),
            Err(Error::DuplicateContact { .. })
        ));
        assert_eq!(store.get_patient(p.id).unwrap().unwrap().contact, "5559876543");
    }

    #[test]
    fn test_replace_unknown_patient() {
        let store = DocumentStore::ephemeral();
        assert!(store.replace_patient(patient("5551234567")).unwrap().is_none());
    }

    #[test]
    fn test_delete_patient_keeps_records() {
        let store = DocumentStore::ephemeral();
        let p = store.insert_patient(patient("5551234567")).unwrap();
        store
            .insert_record(record(p.id, RecordType::HeartRate, "72"))
            .unwrap();

        let removed = store.delete_patient(p.id).unwrap();
        assert_eq!(removed.map(|r| r.id), Some(p.id));
        assert!(store.delete_patient(p.id).unwrap().is_none());

        assert_eq!(store.records_for_patient(p.id).unwrap().len(), 1);
        let all = store.list_records_with_owner().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].patient_id.is_none());
    }

    #[test]
    fn test_insert_record_validates() {
        let store = DocumentStore::ephemeral();
        let p = store.insert_patient(patient("5551234567")).unwrap();
        let err = store
            .insert_record(record(p.id, RecordType::BloodPressure, "120"))
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { .. }));

        let err = store
            .insert_record(record(DocId::new(), RecordType::HeartRate, "72"))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert_eq!(store.counts().records, 0);
    }

    #[test]
    fn test_insert_records_per_document_outcomes() {
        let store = DocumentStore::ephemeral();
        let p = store.insert_patient(patient("5551234567")).unwrap();
        let outcomes = store
            .insert_records(vec![
                record(p.id, RecordType::HeartRate, "72"),
                record(p.id, RecordType::HeartRate, "fast"),
                record(p.id, RecordType::BloodPressure, "120/80"),
            ])
            .unwrap();
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok());
        assert_eq!(store.count_records_for_patient(p.id).unwrap(), 2);
    }

    #[test]
    fn test_records_for_patient_newest_first() {
        let store = DocumentStore::ephemeral();
        let p = store.insert_patient(patient("5551234567")).unwrap();
        let mut old = record(p.id, RecordType::HeartRate, "60");
        old.timestamp = Utc::now() - chrono::Duration::days(2);
        let new = record(p.id, RecordType::HeartRate, "80");
        store.insert_record(old.clone()).unwrap();
        store.insert_record(new.clone()).unwrap();

        let records = store.records_for_patient(p.id).unwrap();
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new.id, old.id]);
    }

    #[test]
    fn test_records_for_unknown_patient_is_empty() {
        let store = DocumentStore::ephemeral();
        assert!(store.records_for_patient(DocId::new()).unwrap().is_empty());
    }

    #[test]
    fn test_update_record_bumps_version() {
        let store = DocumentStore::ephemeral();
        let p = store.insert_patient(patient("5551234567")).unwrap();
        let r = store
            .insert_record(record(p.id, RecordType::HeartRate, "72"))
            .unwrap();
        let patch = RecordPatch {
            value: Some("91".to_string()),
            ..Default::default()
        };
        let updated = store.update_record(r.id, &patch).unwrap().unwrap();
        assert_eq!(updated.value, "91");
        assert_eq!(store.record_version(r.id), Some(2));

        let bad = RecordPatch {
            value: Some("not-a-number".to_string()),
            ..Default::default()
        };
        assert!(store.update_record(r.id, &bad).is_err());
        assert_eq!(store.get_record(r.id).unwrap().unwrap().value, "91");
        assert_eq!(store.record_version(r.id), Some(2));

        assert!(store.update_record(DocId::new(), &patch).unwrap().is_none());
    }

    #[test]
    fn test_user_email_unique() {
        let store = DocumentStore::ephemeral();
        let now = Utc::now();
        let user = |email: &str| User {
            id: DocId::new(),
            name: "Nurse".to_string(),
            email: email.to_string(),
            password_hash: "digest".to_string(),
            created_at: now,
            updated_at: now,
        };
        store.insert_user(user("joy@example.com")).unwrap();
        assert!(matches!(
            store.insert_user(user("joy@example.com")),
            Err(Error::DuplicateEmail { .. })
        ));
        assert!(store.find_user_by_email("joy@example.com").unwrap().is_some());
        assert!(store.find_user_by_email("nobody@example.com").unwrap().is_none());
    }
}
