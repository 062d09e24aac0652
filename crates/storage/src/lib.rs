//! Storage layer for HealthTrack
//!
//! This crate implements the document store behind every service:
//! - DocumentStore: DashMap collections for patients, records and users
//! - Secondary indices (unique contact/email, patient → records)
//! - Journal: append-only, CRC-framed mutation log replayed on open
//! - PatientStore / RecordStore / UserStore: the contracts services consume
//!
//! # Durability
//!
//! `DocumentStore::ephemeral()` keeps everything in memory.
//! `DocumentStore::open(dir, mode)` journals every mutation before applying
//! it, and rebuilds state and indices from the journal on the next open.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document_store;
pub mod encoding;
pub mod index;
pub mod journal;
pub mod traits;

pub use document_store::{DocumentStore, StoreCounts};
pub use index::{OwnerIndex, UniqueIndex};
pub use journal::{Journal, JournalEntry, SyncMode, JOURNAL_FILE_NAME};
pub use traits::{PatientStore, RecordStore, UserStore};
