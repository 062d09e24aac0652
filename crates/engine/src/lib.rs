//! Service layer for HealthTrack
//!
//! This crate orchestrates the store and the validation rules:
//! - Database: opens the configured store and wires the services
//! - PatientRegistry: patient CRUD, uniqueness, credential flow
//! - RecordService: single-record create/list/update
//! - SyncCoordinator: filtered bulk ingestion with per-candidate outcomes
//! - UserAccounts: staff registration and login
//! - PasswordHasher: injected credential hashing (Argon2id by default)
//!
//! The engine is the only component that knows about:
//! - Configuration (`healthtrack.toml` + environment)
//! - Which store backs the services

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod credentials;
pub mod database;
pub mod patients;
pub mod records;
pub mod sync;
pub mod users;

pub use credentials::{normalize_email, Argon2Hasher, PasswordHasher};
pub use database::{
    ConfigError, Database, Environment, HealthTrackConfig, OpenError, StoreLocation, StoreUri,
    TlsIdentity,
};
pub use patients::{PatientRegistry, PATIENT_RESET_MESSAGE};
pub use records::RecordService;
pub use sync::{Rejection, SyncCoordinator, SyncReport};
pub use users::{UserAccounts, USER_RESET_MESSAGE};
