//! Journal entry encoding and decoding
//!
//! ## Entry Format
//!
//! ```text
//! [length: u32][type: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: Total size of type + payload + crc (NOT including length itself)
//! - **type**: Entry type tag (0x10 patient put, 0x11 patient delete, 0x20 record put, 0x30 user put)
//! - **payload**: MessagePack-serialized `JournalEntry` (named fields)
//! - **crc32**: CRC32 checksum over \[type\]\[payload\]

use crate::journal::JournalEntry;
use crc32fast::Hasher;
use healthtrack_core::{Error, Result};

/// Patient insert or replace
pub const TYPE_PUT_PATIENT: u8 = 0x10;
/// Patient delete
pub const TYPE_DELETE_PATIENT: u8 = 0x11;
/// Record insert or update
pub const TYPE_PUT_RECORD: u8 = 0x20;
/// User insert
pub const TYPE_PUT_USER: u8 = 0x30;

/// Size of the length prefix
const LEN_BYTES: usize = 4;
/// Minimum value of the length field: type(1) + crc(4)
const MIN_ENTRY_LEN: usize = 5;

fn type_tag(entry: &JournalEntry) -> u8 {
    match entry {
        JournalEntry::PutPatient { .. } => TYPE_PUT_PATIENT,
        JournalEntry::DeletePatient { .. } => TYPE_DELETE_PATIENT,
        JournalEntry::PutRecord { .. } => TYPE_PUT_RECORD,
        JournalEntry::PutUser { .. } => TYPE_PUT_USER,
    }
}

fn checksum(type_tag: u8, payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[type_tag]);
    hasher.update(payload);
    hasher.finalize()
}

/// Encode a journal entry to bytes ready for file I/O.
pub fn encode_entry(entry: &JournalEntry) -> Result<Vec<u8>> {
    let tag = type_tag(entry);
    let payload =
        rmp_serde::to_vec_named(entry).map_err(|e| Error::Serialization(e.to_string()))?;

    let total_len = 1 + payload.len() + 4;
    let mut buf = Vec::with_capacity(LEN_BYTES + total_len);
    buf.extend_from_slice(&(total_len as u32).to_le_bytes());
    buf.push(tag);
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(&checksum(tag, &payload).to_le_bytes());
    Ok(buf)
}

/// Decode one entry from the front of `buf`.
///
/// Returns the entry and the number of bytes consumed. `offset` is the file
/// offset of `buf[0]` and only appears in error messages.
///
/// # Errors
///
/// `Serialization` when the buffer holds a truncated frame, the CRC does not
/// match, the type tag is unknown or disagrees with the payload.
pub fn decode_entry(buf: &[u8], offset: u64) -> Result<(JournalEntry, usize)> {
    let corrupt = |what: String| Error::Serialization(format!("offset {}: {}", offset, what));

    let len_bytes: [u8; LEN_BYTES] = buf
        .get(..LEN_BYTES)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| corrupt(format!("incomplete length prefix ({} bytes)", buf.len())))?;
    let total_len = u32::from_le_bytes(len_bytes) as usize;

    if total_len < MIN_ENTRY_LEN {
        return Err(corrupt(format!("invalid entry length {}", total_len)));
    }
    let frame = buf
        .get(LEN_BYTES..LEN_BYTES + total_len)
        .ok_or_else(|| corrupt(format!("incomplete entry, need {} bytes", LEN_BYTES + total_len)))?;

    let tag = frame[0];
    let payload = &frame[1..total_len - 4];
    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&frame[total_len - 4..]);
    let expected_crc = u32::from_le_bytes(crc_bytes);
    let actual_crc = checksum(tag, payload);
    if actual_crc != expected_crc {
        return Err(corrupt(format!(
            "CRC mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    let entry: JournalEntry = rmp_serde::from_slice(payload)
        .map_err(|e| corrupt(format!("deserialization failed: {}", e)))?;
    if type_tag(&entry) != tag {
        return Err(corrupt(format!("type tag {:#04x} does not match payload", tag)));
    }

    Ok((entry, LEN_BYTES + total_len))
}
