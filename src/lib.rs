//! HealthTrack - patient health-record service
//!
//! HealthTrack stores patients, clinical measurement records and staff user
//! accounts. Record values are validated by record type, and offline-captured
//! records can be bulk-synced with per-record outcomes.
//!
//! # Quick Start
//!
//! ```ignore
//! use healthtrack::{Database, HealthTrackConfig, PatientFields};
//!
//! let db = Database::open(&HealthTrackConfig::in_memory())?;
//! let patient = db.patients().register_patient(fields)?;
//! let records = db.records().records_for_patient(&patient.id.to_string())?;
//! ```
//!
//! # Architecture
//!
//! - `healthtrack-core`: data model, validation rules, error taxonomy
//! - `healthtrack-storage`: document store and journal
//! - `healthtrack-engine`: services and configuration
//!
//! The HTTP layer lives in the `healthtrack-server` crate.

pub use healthtrack_core::*;
pub use healthtrack_engine::*;
pub use healthtrack_storage::{DocumentStore, PatientStore, RecordStore, SyncMode, UserStore};
