//! Journal recovery tests
//!
//! Reopening a durable store must reproduce every acknowledged write,
//! including the unique and owner indices rebuilt from the journal.

use chrono::{Duration, Utc};
use healthtrack_core::{
    DocId, EmergencyContact, Error, Gender, Patient, Record, RecordPatch, RecordType, User,
};
use healthtrack_storage::{
    DocumentStore, PatientStore, RecordStore, SyncMode, UserStore, JOURNAL_FILE_NAME,
};
use std::fs::OpenOptions;
use std::io::Write;
use tempfile::tempdir;

fn patient(contact: &str, email: Option<&str>) -> Patient {
    let now = Utc::now();
    Patient {
        id: DocId::new(),
        name: "Kemi Ade".to_string(),
        age: 29,
        gender: Gender::Female,
        contact: contact.to_string(),
        history: "asthma".to_string(),
        address: "12 Marina Rd".to_string(),
        emergency_contact: EmergencyContact {
            name: "Tunde".to_string(),
            phone: "5557654321".to_string(),
        },
        timestamp: "2024-05-01T08:30:00Z".to_string(),
        email: email.map(str::to_string),
        password_hash: None,
        created_at: now,
        updated_at: now,
    }
}

fn record(patient_id: DocId, record_type: RecordType, value: &str, age_hours: i64) -> Record {
    let now = Utc::now();
    Record {
        id: DocId::new(),
        patient_id,
        record_type,
        value: value.to_string(),
        notes: String::new(),
        timestamp: now - Duration::hours(age_hours),
        created_at: now,
        updated_at: now,
    }
}

// === Replay ===

#[test]
fn reopen_restores_documents_and_indices() {
    let dir = tempdir().unwrap();
    let (kept, deleted, rec) = {
        let store = DocumentStore::open(dir.path(), SyncMode::Always).unwrap();
        assert!(store.is_durable());

        let kept = store
            .insert_patient(patient("5551112222", Some("kemi@example.com")))
            .unwrap();
        let deleted = store.insert_patient(patient("5553334444", None)).unwrap();
        let rec = store
            .insert_record(record(kept.id, RecordType::BloodPressure, "120/80", 1))
            .unwrap();
        store.delete_patient(deleted.id).unwrap();
        (kept, deleted, rec)
    };

    let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
    assert_eq!(store.get_patient(kept.id).unwrap(), Some(kept.clone()));
    assert!(store.get_patient(deleted.id).unwrap().is_none());
    assert_eq!(store.get_record(rec.id).unwrap(), Some(rec.clone()));
    assert_eq!(store.count_records_for_patient(kept.id).unwrap(), 1);

    // Unique keys survive the restart; the deleted patient's contact is free.
    assert!(matches!(
        store.insert_patient(patient("5551112222", None)),
        Err(Error::DuplicateContact { .. })
    ));
    assert!(matches!(
        store.insert_patient(patient("5559990000", Some("kemi@example.com"))),
        Err(Error::DuplicateEmail { .. })
    ));
    store.insert_patient(patient("5553334444", None)).unwrap();
}

#[test]
fn reopen_keeps_latest_version_of_updated_record() {
    let dir = tempdir().unwrap();
    let rec_id = {
        let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
        let p = store.insert_patient(patient("5551112222", None)).unwrap();
        let rec = store
            .insert_record(record(p.id, RecordType::HeartRate, "72", 2))
            .unwrap();
        let patch = RecordPatch {
            value: Some("91".to_string()),
            ..Default::default()
        };
        store.update_record(rec.id, &patch).unwrap().unwrap();
        rec.id
    };

    let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
    assert_eq!(store.get_record(rec_id).unwrap().unwrap().value, "91");
    assert_eq!(store.record_version(rec_id), Some(2));
}

#[test]
fn reopen_restores_users() {
    let dir = tempdir().unwrap();
    {
        let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
        let now = Utc::now();
        store
            .insert_user(User {
                id: DocId::new(),
                name: "Dr. Bello".to_string(),
                email: "bello@example.com".to_string(),
                password_hash: "digest".to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }
    let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
    let user = store.find_user_by_email("bello@example.com").unwrap().unwrap();
    assert_eq!(user.name, "Dr. Bello");
    assert_eq!(store.counts().users, 1);
}

#[test]
fn batch_insert_survives_restart() {
    let dir = tempdir().unwrap();
    let patient_id = {
        let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
        let p = store.insert_patient(patient("5551112222", None)).unwrap();
        let outcomes = store
            .insert_records(vec![
                record(p.id, RecordType::HeartRate, "70", 3),
                record(p.id, RecordType::HeartRate, "abc", 2),
                record(p.id, RecordType::BloodOxygenLevel, "97.5", 1),
            ])
            .unwrap();
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 2);
        p.id
    };

    let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
    let records = store.records_for_patient(patient_id).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].value, "97.5");
    assert_eq!(records[1].value, "70");
}

// === Corruption ===

#[test]
fn garbage_tail_is_dropped_on_reopen() {
    let dir = tempdir().unwrap();
    let id = {
        let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
        store.insert_patient(patient("5551112222", None)).unwrap().id
    };
    {
        let mut f = OpenOptions::new()
            .append(true)
            .open(dir.path().join(JOURNAL_FILE_NAME))
            .unwrap();
        f.write_all(b"\x20\x00\x00\x00partial").unwrap();
    }

    let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
    assert!(store.get_patient(id).unwrap().is_some());
    store.insert_patient(patient("5553334444", None)).unwrap();
    drop(store);

    let store = DocumentStore::open(dir.path(), SyncMode::Standard).unwrap();
    assert_eq!(store.counts().patients, 2);
}
