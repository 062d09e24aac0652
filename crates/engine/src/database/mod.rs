//! Database struct and open logic
//!
//! This module provides the `Database` that the API layer holds for the
//! lifetime of the process. It:
//! - Opens the document store named by the configuration
//! - Checks the certificate bundle when certificate mode is on
//! - Wires the services (patients, records, sync, users) over that store
//!
//! There is no global connection; the API layer passes the `Database` to
//! handlers through router state.

pub mod config;

pub use config::{
    ConfigError, Environment, HealthTrackConfig, StoreLocation, StoreUri, TlsIdentity,
    CONFIG_FILE_NAME, DEFAULT_PORT, DEFAULT_TLS_CERT,
};

use crate::credentials::{Argon2Hasher, PasswordHasher};
use crate::patients::PatientRegistry;
use crate::records::RecordService;
use crate::sync::SyncCoordinator;
use crate::users::UserAccounts;
use healthtrack_storage::DocumentStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Startup failure
#[derive(Debug, Error)]
pub enum OpenError {
    /// Invalid or incomplete configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The store could not be opened
    #[error(transparent)]
    Store(#[from] healthtrack_core::Error),
}

/// The store plus every service built on it
///
/// # Example
///
/// ```text
/// use healthtrack_engine::{Database, HealthTrackConfig};
///
/// let db = Database::open(&HealthTrackConfig::in_memory())?;
/// let patient = db.patients().register_patient(fields)?;
/// ```
pub struct Database {
    store: Arc<DocumentStore>,
    patients: PatientRegistry,
    records: RecordService,
    sync: SyncCoordinator,
    users: UserAccounts,
}

impl Database {
    /// Open the store described by `config`.
    ///
    /// # Errors
    /// `OpenError::Config` for a missing/invalid store URI, an invalid
    /// durability mode or an unusable certificate bundle;
    /// `OpenError::Store` if the journal cannot be opened.
    pub fn open(config: &HealthTrackConfig) -> Result<Self, OpenError> {
        let uri = config.store_uri()?;
        let sync_mode = config.durability_mode()?;
        if let Some(identity) = config.tls_identity()? {
            info!(
                target: "healthtrack::db",
                path = ?identity.path,
                sha256 = %identity.fingerprint,
                "Certificate mode enabled"
            );
        }

        let store = match &uri.location {
            StoreLocation::Memory => DocumentStore::ephemeral(),
            StoreLocation::Directory(dir) => DocumentStore::open(dir, sync_mode)?,
        };
        info!(
            target: "healthtrack::db",
            durable = store.is_durable(),
            environment = %config.environment,
            "Database opened"
        );
        Ok(Self::with_store(
            Arc::new(store),
            Arc::new(Argon2Hasher::new()),
        ))
    }

    /// In-memory database with the default hasher.
    pub fn ephemeral() -> Self {
        Self::with_store(
            Arc::new(DocumentStore::ephemeral()),
            Arc::new(Argon2Hasher::new()),
        )
    }

    /// Wire the services over an existing store and hasher.
    pub fn with_store(store: Arc<DocumentStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Database {
            patients: PatientRegistry::new(store.clone(), store.clone(), hasher.clone()),
            records: RecordService::new(store.clone(), store.clone()),
            sync: SyncCoordinator::new(store.clone()),
            users: UserAccounts::new(store.clone(), hasher),
            store,
        }
    }

    /// Patient registry
    pub fn patients(&self) -> &PatientRegistry {
        &self.patients
    }

    /// Record service
    pub fn records(&self) -> &RecordService {
        &self.records
    }

    /// Sync coordinator
    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    /// User accounts
    pub fn users(&self) -> &UserAccounts {
        &self.users
    }

    /// Underlying document store
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }
}
