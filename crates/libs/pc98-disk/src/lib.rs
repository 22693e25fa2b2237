#![forbid(unsafe_code)]

//! Reading PC-98 partition tables and deriving equivalent MBR partition tables.
//!
//! PC-98 machines store their partition table in the second sector of a disk, at byte
//! offset `0x200`, as a sequence of 32-byte entries addressed by cylinder, head, and
//! sector. Modern systems expect an MBR partition table with four 16-byte entries at
//! offset `0x1BE` followed by the `0x55, 0xAA` signature. Both tables fit into the first
//! two sectors without overlapping, so a PC-98 disk can carry an MBR equivalent of its
//! partition table and remain bootable on PC-98 hardware.
//!
//! The conversion is a best-effort guess: partition types are mapped heuristically (see
//! [`types`]) and addresses are derived from cylinder numbers under a fixed geometry
//! (see [`geometry`]).

use thiserror::Error;

pub mod convert;
pub mod geometry;
pub mod mbr;
pub mod pc98;
pub mod types;

pub use convert::suggest_mbr;
pub use mbr::{MbrEntry, MbrTable, WriteError};
pub use pc98::{Pc98Entry, Pc98Table};

/// Error indicating that fewer bytes than the width of a record were available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("truncated record, expected {expected} bytes but got {actual}")]
pub struct TruncatedRecordError {
    /// Width of the record.
    pub expected: usize,
    /// Number of bytes that were available.
    pub actual: usize,
}

/// Error indicating that a partition table cannot hold any more entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("partition table is full, it can hold at most {capacity} entries")]
pub struct TableFullError {
    /// Maximal number of entries of the table.
    pub capacity: usize,
}

/// Check that `bytes` holds at least `N` bytes and return them as an array.
pub(crate) fn record_bytes<const N: usize>(
    bytes: &[u8],
) -> Result<&[u8; N], TruncatedRecordError> {
    bytes
        .get(..N)
        .and_then(|record| record.try_into().ok())
        .ok_or(TruncatedRecordError {
            expected: N,
            actual: bytes.len(),
        })
}

/// Error reading a partition table.
#[derive(Debug, Error)]
pub enum ReadError {
    /// I/O error while positioning or reading the source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The source ended in the middle of a partition entry.
    #[error(transparent)]
    Truncated(#[from] TruncatedRecordError),
}

/// Read one record of `N` bytes from the current position of the reader.
///
/// Reads until `N` bytes are available or the reader is exhausted. Returns the number of
/// bytes read, which is less than `N` only if the reader is exhausted.
pub(crate) fn read_record<const N: usize>(
    reader: &mut impl std::io::Read,
    buffer: &mut [u8; N],
) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < N {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}
