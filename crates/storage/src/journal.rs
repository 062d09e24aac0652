//! Append-only document journal
//!
//! Every store mutation is appended here before it is applied in memory.
//! Opening a journal replays it; a torn or corrupt tail (a crash mid-append)
//! is cut off at the last complete entry.

use crate::encoding::{decode_entry, encode_entry};
use healthtrack_core::{DocId, Error, Patient, Record, Result, User};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Journal file name inside the data directory
pub const JOURNAL_FILE_NAME: &str = "healthtrack.wal";

/// A single journaled mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// Patient inserted or replaced
    PutPatient {
        /// Full document after the write
        patient: Patient,
        /// Document version after the write
        version: u64,
    },
    /// Patient deleted
    DeletePatient {
        /// Deleted identity
        id: DocId,
    },
    /// Record inserted or updated
    PutRecord {
        /// Full document after the write
        record: Record,
        /// Document version after the write
        version: u64,
    },
    /// User inserted
    PutUser {
        /// Full document after the write
        user: User,
        /// Document version after the write
        version: u64,
    },
}

/// When appended entries are forced to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Hand each entry to the OS; the OS decides when it reaches disk
    #[default]
    Standard,
    /// fsync after every entry
    Always,
}

/// Append-only journal file
pub struct Journal {
    path: PathBuf,
    file: Mutex<File>,
    sync_mode: SyncMode,
}

impl Journal {
    /// Open (or create) the journal in `dir` and replay it.
    ///
    /// Returns the journal positioned for appends plus every intact entry in
    /// file order.
    pub fn open(dir: &Path, sync_mode: SyncMode) -> Result<(Journal, Vec<JournalEntry>)> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(JOURNAL_FILE_NAME);

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let mut entries = Vec::new();
        let mut offset = 0usize;
        while offset < buf.len() {
            match decode_entry(&buf[offset..], offset as u64) {
                Ok((entry, consumed)) => {
                    entries.push(entry);
                    offset += consumed;
                }
                Err(e) => {
                    warn!(
                        target: "healthtrack::journal",
                        path = ?path,
                        error = %e,
                        discarded_bytes = buf.len() - offset,
                        "Truncating journal at last intact entry"
                    );
                    file.set_len(offset as u64)?;
                    break;
                }
            }
        }

        info!(
            target: "healthtrack::journal",
            path = ?path,
            entries = entries.len(),
            "Journal replayed"
        );

        Ok((
            Journal {
                path,
                file: Mutex::new(file),
                sync_mode,
            },
            entries,
        ))
    }

    /// Append one entry, honoring the sync mode.
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        let encoded = encode_entry(entry)?;
        let mut file = self.file.lock();
        let end = file
            .metadata()
            .map_err(|e| Error::storage(format!("failed to stat journal: {}", e)))?
            .len();
        if let Err(e) = write_frame(&mut *file, &encoded) {
            // A partial frame would hide every later entry from replay.
            if let Err(trunc) = file.set_len(end) {
                warn!(
                    target: "healthtrack::journal",
                    path = ?self.path,
                    error = %trunc,
                    "Failed to roll back partial journal entry"
                );
            }
            return Err(Error::storage(format!("failed to append journal entry: {}", e)));
        }
        if self.sync_mode == SyncMode::Always {
            file.sync_data()
                .map_err(|e| Error::storage(format!("failed to sync journal: {}", e)))?;
        }
        Ok(())
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get sync mode
    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }
}

fn write_frame<W: Write>(out: &mut W, frame: &[u8]) -> std::io::Result<()> {
    out.write_all(frame)?;
    out.flush()
}

impl Drop for Journal {
    fn drop(&mut self) {
        let _ = self.file.get_mut().sync_all();
    }
}
