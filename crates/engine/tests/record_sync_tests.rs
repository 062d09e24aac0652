//! Record service and Sync Coordinator behavior

mod common;

use common::{database, patient_fields, raw};
use healthtrack_core::{Error, RawRecord, RecordPatch, RecordType};
use healthtrack_engine::Database;

fn with_patient() -> (Database, String) {
    let db = database();
    let p = db
        .patients()
        .register_patient(patient_fields("Musa Bako", "5551234567"))
        .unwrap();
    (db, p.id.to_string())
}

// ============================================================================
// Single-record create / list
// ============================================================================

#[test]
fn test_create_record_defaults_timestamp() {
    let (db, pid) = with_patient();
    let before = chrono::Utc::now();
    let r = db
        .records()
        .create_record(raw(Some(&pid), Some("Blood Pressure"), Some("120/80")))
        .unwrap();
    assert_eq!(r.record_type, RecordType::BloodPressure);
    assert!(r.timestamp >= before);
    assert_eq!(r.notes, "");
}

#[test]
fn test_create_record_requires_fields() {
    let (db, pid) = with_patient();
    let err = db
        .records()
        .create_record(raw(Some(&pid), Some("Heart Rate"), None))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Fields patientId, type, and value are required."
    );
}

#[test]
fn test_create_record_rejects_bad_value_and_unknown_patient() {
    let (db, pid) = with_patient();
    let err = db
        .records()
        .create_record(raw(Some(&pid), Some("Blood Pressure"), Some("120")))
        .unwrap_err();
    assert_eq!(err.to_string(), "120 is not a valid value for Blood Pressure");

    let err = db
        .records()
        .create_record(raw(
            Some("6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f"),
            Some("Heart Rate"),
            Some("72"),
        ))
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed { .. }));

    let err = db
        .records()
        .create_record(raw(Some("p1"), Some("Heart Rate"), Some("72")))
        .unwrap_err();
    assert!(matches!(err, Error::MalformedIdentity { .. }));
}

#[test]
fn test_records_for_patient_empty_is_ok() {
    let (db, pid) = with_patient();
    assert!(db.records().records_for_patient(&pid).unwrap().is_empty());
}

#[test]
fn test_list_records_newest_first_with_owner() {
    let (db, pid) = with_patient();
    let mut older = raw(Some(&pid), Some("Heart Rate"), Some("60"));
    older.timestamp = Some("2024-01-01T00:00:00Z".to_string());
    let mut newer = raw(Some(&pid), Some("Heart Rate"), Some("90"));
    newer.timestamp = Some("2024-03-01T00:00:00Z".to_string());
    db.records().create_record(older).unwrap();
    db.records().create_record(newer).unwrap();

    let all = db.records().list_records().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].value, "90");
    assert_eq!(all[1].value, "60");
    assert_eq!(all[0].patient_id.as_ref().unwrap().name, "Musa Bako");
}

// ============================================================================
// Update (type/value narrowing)
// ============================================================================

#[test]
fn test_update_value() {
    let (db, pid) = with_patient();
    let r = db
        .records()
        .create_record(raw(Some(&pid), Some("Heart Rate"), Some("72")))
        .unwrap();
    let id = r.id.to_string();

    let patch = |value: &str| RecordPatch {
        value: Some(value.to_string()),
        ..Default::default()
    };
    let updated = db.records().update_record(&id, patch("91")).unwrap();
    assert_eq!(updated.value, "91");
    assert_eq!(updated.patient_id, r.patient_id);

    let err = db.records().update_record(&id, patch("not-a-number")).unwrap_err();
    assert!(matches!(err, Error::ValidationFailed { .. }));
}

#[test]
fn test_update_type_revalidates_against_stored_value() {
    let (db, pid) = with_patient();
    let r = db
        .records()
        .create_record(raw(Some(&pid), Some("Heart Rate"), Some("72")))
        .unwrap();
    let err = db
        .records()
        .update_record(
            &r.id.to_string(),
            RecordPatch {
                record_type: Some("Blood Pressure".to_string()),
                value: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "72 is not a valid value for Blood Pressure");
}

#[test]
fn test_update_errors() {
    let (db, _) = with_patient();
    assert!(matches!(
        db.records().update_record("x", RecordPatch::default()),
        Err(Error::EmptyPatch)
    ));
    let patch = RecordPatch {
        value: Some("80".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        db.records().update_record("x", patch.clone()),
        Err(Error::MalformedIdentity { .. })
    ));
    assert!(matches!(
        db.records()
            .update_record("6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f", patch),
        Err(Error::NotFound { .. })
    ));
}

// ============================================================================
// Sync
// ============================================================================

#[test]
fn test_sync_drops_incomplete_candidates() {
    let (db, pid) = with_patient();
    let report = db
        .sync()
        .sync_records(vec![
            raw(Some(&pid), Some("Heart Rate"), Some("72")),
            raw(None, Some("Heart Rate"), Some("80")),
        ])
        .unwrap();
    assert_eq!(report.accepted_count, 1);
    assert!(report.is_partial());
    assert_eq!(report.rejected[0].index, 1);
    assert!(report.rejected[0].reason.contains("patientId"));
}

#[test]
fn test_sync_no_valid_records() {
    let db = database();
    let err = db
        .sync()
        .sync_records(vec![raw(None, Some("x"), None)])
        .unwrap_err();
    assert!(matches!(err, Error::NoValidRecords));
    assert_eq!(db.store().counts().records, 0);
}

#[test]
fn test_sync_empty_batch() {
    let db = database();
    let err = db.sync().sync_records(Vec::new()).unwrap_err();
    assert_eq!(err.to_string(), "No records provided for sync.");
}

#[test]
fn test_sync_partial_store_rejection_is_not_rolled_back() {
    let (db, pid) = with_patient();
    let report = db
        .sync()
        .sync_records(vec![
            raw(Some(&pid), Some("Heart Rate"), Some("72")),
            raw(Some(&pid), Some("Blood Pressure"), Some("120")),
            raw(Some(&pid), Some("Teleport"), Some("1")),
            raw(Some(&pid), Some("Blood Pressure"), Some("118/76")),
        ])
        .unwrap();
    assert_eq!(report.accepted_count, 2);
    assert_eq!(
        report.rejected.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(db.records().records_for_patient(&pid).unwrap().len(), 2);
}

#[test]
fn test_sync_all_rejected_by_store() {
    let (db, pid) = with_patient();
    let err = db
        .sync()
        .sync_records(vec![
            raw(Some(&pid), Some("Heart Rate"), Some("fast")),
            raw(Some(&pid), Some("Heart Rate"), Some("slow")),
        ])
        .unwrap_err();
    assert_eq!(err.to_string(), "fast is not a valid value for Heart Rate");
    assert_eq!(db.store().counts().records, 0);
}

#[test]
fn test_sync_stamps_missing_timestamps_and_keeps_given_ones() {
    let (db, pid) = with_patient();
    let before = chrono::Utc::now();
    let mut dated = raw(Some(&pid), Some("Heart Rate"), Some("64"));
    dated.timestamp = Some("2023-12-31T23:00:00Z".to_string());
    let report = db
        .sync()
        .sync_records(vec![raw(Some(&pid), Some("Heart Rate"), Some("72")), dated])
        .unwrap();

    assert!(report.accepted_records[0].timestamp >= before);
    assert_eq!(
        report.accepted_records[1].timestamp.to_rfc3339(),
        "2023-12-31T23:00:00+00:00"
    );
}

#[test]
fn test_sync_accepts_json_numbers() {
    let (db, pid) = with_patient();
    let candidate = RawRecord::from_json(&serde_json::json!({
        "patientId": pid,
        "type": "Heart Rate",
        "value": 72,
    }));
    let report = db.sync().sync_records(vec![candidate]).unwrap();
    assert_eq!(report.accepted_records[0].value, "72");
}
