//! Sync Coordinator: bulk ingestion of offline-captured records
//!
//! ## Pipeline
//!
//! 1. Reject an empty batch outright.
//! 2. Presence filter: candidates without `patientId`, `type` or `value`
//!    are dropped and reported. A missing timestamp is stamped with the
//!    time of filtering.
//! 3. No survivors: `NoValidRecords`, nothing written.
//! 4. Survivors are cast and handed to the store as one bulk insert. Each
//!    document is validated and written on its own; a bad document never
//!    blocks the others and nothing is rolled back.
//!
//! The report carries every rejected candidate with its batch index, so a
//! partial batch is distinguishable from full success.

use chrono::Utc;
use healthtrack_core::{Error, RawRecord, Record, Result};
use healthtrack_storage::RecordStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// One candidate that did not make it into the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Position in the submitted batch
    pub index: usize,
    /// Why it was dropped
    pub reason: String,
}

/// Outcome of a sync batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Number of records written
    pub accepted_count: usize,
    /// The written records, in batch order
    pub accepted_records: Vec<Record>,
    /// Every dropped candidate, in batch order
    pub rejected: Vec<Rejection>,
}

impl SyncReport {
    /// Were some candidates dropped?
    pub fn is_partial(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Drives bulk sync against a record store
pub struct SyncCoordinator {
    records: Arc<dyn RecordStore>,
}

impl SyncCoordinator {
    /// Create a coordinator over the given store.
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        SyncCoordinator { records }
    }

    /// Filter, stamp and bulk-insert a batch of raw records.
    ///
    /// # Errors
    /// - `ValidationFailed` for an empty batch, or when every survivor of
    ///   the presence filter is rejected by the store (the first store
    ///   rejection is named)
    /// - `NoValidRecords` when no candidate passes the presence filter
    /// - `StorageFailure` when the store fails mid-batch; records already
    ///   written stay written
    pub fn sync_records(&self, candidates: Vec<RawRecord>) -> Result<SyncReport> {
        if candidates.is_empty() {
            return Err(Error::validation("No records provided for sync."));
        }
        let submitted = candidates.len();
        let filtered_at = Utc::now();

        let mut rejected = Vec::new();
        let mut survivors = Vec::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            let missing = candidate.missing_fields();
            if missing.is_empty() {
                survivors.push((index, candidate));
            } else {
                rejected.push(Rejection {
                    index,
                    reason: format!("Missing required fields: {}", missing.join(", ")),
                });
            }
        }
        if survivors.is_empty() {
            warn!(target: "healthtrack::sync", submitted, "Sync batch had no admissible records");
            return Err(Error::NoValidRecords);
        }

        // Everything past the presence filter is the store's verdict.
        let mut store_rejections = Vec::new();
        let mut indices = Vec::with_capacity(survivors.len());
        let mut documents = Vec::with_capacity(survivors.len());
        for (index, raw) in survivors {
            match raw.into_record(filtered_at, filtered_at) {
                Ok(record) => {
                    indices.push(index);
                    documents.push(record);
                }
                Err(e) => store_rejections.push(Rejection {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        let outcomes = if documents.is_empty() {
            Vec::new()
        } else {
            self.records.insert_records(documents)?
        };

        let mut accepted_records = Vec::new();
        for (index, outcome) in indices.into_iter().zip(outcomes) {
            match outcome {
                Ok(record) => accepted_records.push(record),
                Err(e) => store_rejections.push(Rejection {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        if accepted_records.is_empty() {
            store_rejections.sort_by_key(|r| r.index);
            let first = store_rejections
                .first()
                .map(|r| r.reason.clone())
                .unwrap_or_else(|| Error::NoValidRecords.to_string());
            warn!(target: "healthtrack::sync", submitted, reason = %first, "Sync batch rejected by store");
            return Err(Error::validation(first));
        }

        rejected.extend(store_rejections);
        rejected.sort_by_key(|r| r.index);

        info!(
            target: "healthtrack::sync",
            submitted,
            accepted = accepted_records.len(),
            rejected = rejected.len(),
            "Sync batch applied"
        );
        Ok(SyncReport {
            accepted_count: accepted_records.len(),
            accepted_records,
            rejected,
        })
    }
}
