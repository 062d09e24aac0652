//! Error types for HealthTrack
//!
//! This module defines the error taxonomy shared by the store, the services
//! and the HTTP layer. We use `thiserror` for automatic `Display` and `Error`
//! trait implementations.
//!
//! | Category | Variants |
//! |----------|----------|
//! | Validation | `ValidationFailed`, `MalformedIdentity`, `EmptyPatch` |
//! | Not Found | `NotFound` |
//! | Uniqueness | `DuplicateContact`, `DuplicateEmail` |
//! | Sync | `NoValidRecords` |
//! | Credentials | `InvalidCredentials` |
//! | System | `StorageFailure`, `Io`, `Serialization` |

use std::io;
use thiserror::Error;

/// Result type alias for HealthTrack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for HealthTrack
#[derive(Debug, Error)]
pub enum Error {
    // ==================== Validation ====================
    /// Missing or malformed field, including the record type/value rule
    #[error("{reason}")]
    ValidationFailed {
        /// Human readable description of every violated constraint
        reason: String,
    },

    /// Identity string is not in the store's expected format
    #[error("invalid {entity} ID format: {id}")]
    MalformedIdentity {
        /// Entity kind ("patient", "record", ...)
        entity: &'static str,
        /// The offending identity string
        id: String,
    },

    /// Record update carried neither `type` nor `value`
    #[error("At least type or value must be provided for update.")]
    EmptyPatch,

    // ==================== Not Found ====================
    /// Identity does not resolve
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("patient", "record", ...)
        entity: &'static str,
        /// The identity or lookup key that did not resolve
        id: String,
    },

    // ==================== Uniqueness ====================
    /// A patient with this contact number already exists
    #[error("contact number already registered: {contact}")]
    DuplicateContact {
        /// The colliding contact number
        contact: String,
    },

    /// An account with this email already exists
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The colliding email
        email: String,
    },

    // ==================== Sync ====================
    /// Bulk sync had zero admissible payloads
    #[error("Invalid record data provided.")]
    NoValidRecords,

    // ==================== Credentials ====================
    /// Unknown account or password mismatch
    #[error("Invalid credentials.")]
    InvalidCredentials,

    // ==================== System ====================
    /// Store unreachable or rejected a write for an uncategorized reason
    #[error("Storage error: {0}")]
    StorageFailure(String),

    /// I/O error (journal files, certificates)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a `ValidationFailed` error
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::ValidationFailed {
            reason: reason.into(),
        }
    }

    /// Build a `NotFound` error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Build a `StorageFailure` error
    pub fn storage(reason: impl Into<String>) -> Self {
        Error::StorageFailure(reason.into())
    }

    /// True for failures caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Error::StorageFailure(_) | Error::Io(_) | Error::Serialization(_)
        )
    }
}
