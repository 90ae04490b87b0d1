//! Native `.dlab` snapshot format.
//!
//! A snapshot is a single opaque binary file: a 32-byte header followed by a
//! Postcard-encoded payload holding whichever dataset fields were present at
//! save time.
//!
//! # Format Structure
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("DLAB")
//! 4       1     Version major
//! 5       1     Version minor
//! 6       2     Reserved
//! 8       2     Flags (field-presence bitfield)
//! 10      2     Reserved
//! 12      4     Payload size (bytes)
//! 16      4     CRC32 checksum of payload
//! 20      4     Feature row count
//! 24      4     Feature column count
//! 28      4     Reserved
//! ```
//!
//! Floating-point values round-trip bit-for-bit, the NaN missing sentinel
//! included. Readers tolerate absent payload fields; they verify magic,
//! version, length and checksum, and cross-check the presence flags against
//! the decoded payload. The payload wins a disagreement; the mismatch is
//! logged rather than rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::data::Matrix;

/// Magic bytes identifying a datalab snapshot file.
pub const MAGIC: &[u8; 4] = b"DLAB";

/// Current format version (major).
pub const CURRENT_VERSION_MAJOR: u8 = 1;

/// Current format version (minor).
pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 32;

// ============================================================================
// Format Flags
// ============================================================================

/// Bitfield recording which payload fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags(u16);

impl FormatFlags {
    /// Snapshot carries the working feature table.
    pub const HAS_FEATURES: u16 = 1 << 0;
    /// Snapshot carries the label column.
    pub const HAS_LABELS: u16 = 1 << 1;
    /// Snapshot carries the train partition.
    pub const HAS_TRAIN: u16 = 1 << 2;
    /// Snapshot carries the test partition.
    pub const HAS_TEST: u16 = 1 << 3;

    /// Create empty flags.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Create flags from raw value.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Get raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if a flag is set.
    pub const fn contains(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    /// Set a flag.
    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// 32-byte header for the snapshot format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    /// Format version (major).
    pub version_major: u8,
    /// Format version (minor).
    pub version_minor: u8,
    /// Field-presence flags.
    pub flags: FormatFlags,
    /// Size of the payload in bytes.
    pub payload_size: u32,
    /// CRC32 checksum of the payload.
    pub checksum: u32,
    /// Feature table row count (0 when features are absent).
    pub num_rows: u32,
    /// Feature table column count (0 when features are absent).
    pub num_cols: u32,
}

impl FormatHeader {
    /// Create a new header with the current version.
    pub fn new(flags: FormatFlags, num_rows: u32, num_cols: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            flags,
            payload_size: 0,
            checksum: 0,
            num_rows,
            num_cols,
        }
    }

    /// Serialize the header to 32 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[8..10].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[12..16].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.checksum.to_le_bytes());
        buf[20..24].copy_from_slice(&self.num_rows.to_le_bytes());
        buf[24..28].copy_from_slice(&self.num_cols.to_le_bytes());
        buf
    }

    /// Parse a header from 32 bytes.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DeserializeError> {
        if &buf[0..4] != MAGIC {
            return Err(DeserializeError::NotASnapshot);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(DeserializeError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        Ok(Self {
            version_major,
            version_minor,
            flags: FormatFlags::from_bits(u16::from_le_bytes([buf[8], buf[9]])),
            payload_size: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            checksum: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
            num_rows: u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]),
            num_cols: u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]),
        })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while writing a snapshot.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Postcard encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),
}

/// Errors that can occur while reading a snapshot.
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// File is not a datalab snapshot (wrong magic).
    #[error("not a datalab snapshot file")]
    NotASnapshot,

    /// Snapshot requires a newer version of datalab.
    #[error("snapshot requires datalab format {major}.{minor} or later", major = .major, minor = .minor)]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Payload checksum doesn't match.
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// File was truncated or incomplete.
    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Payload is corrupt or malformed.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// I/O error during reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Postcard decoding error.
    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),
}

// ============================================================================
// Payload
// ============================================================================

/// A feature table as stored in the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableData {
    /// Row count.
    pub num_rows: u32,
    /// Column count.
    pub num_cols: u32,
    /// Row-major cell values.
    pub values: Vec<f64>,
}

impl From<&Matrix> for TableData {
    fn from(m: &Matrix) -> Self {
        Self {
            num_rows: m.num_rows() as u32,
            num_cols: m.num_cols() as u32,
            values: m.as_slice().to_vec(),
        }
    }
}

impl TableData {
    /// Convert back into a [`Matrix`], validating the cell count.
    pub fn into_matrix(self) -> Result<Matrix, DeserializeError> {
        let expected = self.num_rows as usize * self.num_cols as usize;
        if self.values.len() != expected {
            return Err(DeserializeError::CorruptPayload(format!(
                "table claims {}x{} but holds {} values",
                self.num_rows,
                self.num_cols,
                self.values.len()
            )));
        }
        Ok(Matrix::from_vec(
            self.values,
            self.num_rows as usize,
            self.num_cols as usize,
        ))
    }
}

/// The serialized dataset state: whichever fields were present at save time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Working feature table.
    pub features: Option<TableData>,
    /// Label column.
    pub labels: Option<Vec<f64>>,
    /// Train-partition features.
    pub train_features: Option<TableData>,
    /// Train-partition labels.
    pub train_labels: Option<Vec<f64>>,
    /// Test-partition features.
    pub test_features: Option<TableData>,
    /// Test-partition labels.
    pub test_labels: Option<Vec<f64>>,
}

impl Snapshot {
    fn presence_flags(&self) -> FormatFlags {
        let mut flags = FormatFlags::empty();
        if self.features.is_some() {
            flags.set(FormatFlags::HAS_FEATURES);
        }
        if self.labels.is_some() {
            flags.set(FormatFlags::HAS_LABELS);
        }
        if self.train_features.is_some() || self.train_labels.is_some() {
            flags.set(FormatFlags::HAS_TRAIN);
        }
        if self.test_features.is_some() || self.test_labels.is_some() {
            flags.set(FormatFlags::HAS_TEST);
        }
        flags
    }
}

// ============================================================================
// Encode / Decode
// ============================================================================

/// Compute the CRC32 checksum of payload bytes.
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Encode a snapshot into header + payload bytes.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, SerializeError> {
    let payload = postcard::to_allocvec(snapshot)?;

    let (num_rows, num_cols) = snapshot
        .features
        .as_ref()
        .map(|t| (t.num_rows, t.num_cols))
        .unwrap_or((0, 0));

    let mut header = FormatHeader::new(snapshot.presence_flags(), num_rows, num_cols);
    header.payload_size = payload.len() as u32;
    header.checksum = compute_checksum(&payload);

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a snapshot from header + payload bytes.
pub fn decode(bytes: &[u8]) -> Result<Snapshot, DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        });
    }

    let mut header_buf = [0u8; HEADER_SIZE];
    header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = FormatHeader::from_bytes(&header_buf)?;

    let payload = &bytes[HEADER_SIZE..];
    let expected = header.payload_size as usize;
    if payload.len() < expected {
        return Err(DeserializeError::Truncated {
            expected: HEADER_SIZE + expected,
            actual: bytes.len(),
        });
    }
    let payload = &payload[..expected];

    let actual = compute_checksum(payload);
    if actual != header.checksum {
        return Err(DeserializeError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    let snapshot: Snapshot = postcard::from_bytes(payload)?;
    let payload_flags = snapshot.presence_flags();
    if payload_flags != header.flags {
        warn!(
            header_flags = header.flags.bits(),
            payload_flags = payload_flags.bits(),
            "presence flags disagree with payload fields; trusting the payload"
        );
    }
    Ok(snapshot)
}

/// Encode and write a snapshot to `path` in a single write.
///
/// The buffer is built entirely in memory first, so an encoding failure
/// leaves the filesystem untouched.
pub fn write_file(path: &Path, snapshot: &Snapshot) -> Result<(), SerializeError> {
    let bytes = encode(snapshot)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read and decode a snapshot from `path`.
pub fn read_file(path: &Path) -> Result<Snapshot, DeserializeError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            features: Some(TableData {
                num_rows: 2,
                num_cols: 3,
                values: vec![1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0],
            }),
            labels: Some(vec![1.0, 0.0]),
            ..Default::default()
        }
    }

    #[test]
    fn header_round_trip() {
        let mut flags = FormatFlags::empty();
        flags.set(FormatFlags::HAS_FEATURES);
        flags.set(FormatFlags::HAS_TEST);
        let mut header = FormatHeader::new(flags, 100, 15);
        header.payload_size = 1234;
        header.checksum = 0xdeadbeef;

        let parsed = FormatHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.flags.contains(FormatFlags::HAS_FEATURES));
        assert!(!parsed.flags.contains(FormatFlags::HAS_LABELS));
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut buf = FormatHeader::new(FormatFlags::empty(), 0, 0).to_bytes();
        buf[0] = b'X';
        assert!(matches!(
            FormatHeader::from_bytes(&buf),
            Err(DeserializeError::NotASnapshot)
        ));
    }

    #[test]
    fn rejects_newer_major_version() {
        let mut buf = FormatHeader::new(FormatFlags::empty(), 0, 0).to_bytes();
        buf[4] = CURRENT_VERSION_MAJOR + 1;
        assert!(matches!(
            FormatHeader::from_bytes(&buf),
            Err(DeserializeError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn encode_decode_round_trip_preserves_nan_bits() {
        let bytes = encode(&sample_snapshot()).unwrap();
        let decoded = decode(&bytes).unwrap();

        let table = decoded.features.unwrap();
        assert_eq!((table.num_rows, table.num_cols), (2, 3));
        assert!(table.values[1].is_nan());
        assert_eq!(&table.values[..1], &[1.0]);
        assert_eq!(&table.values[2..], &[3.0, 4.0, 5.0, 6.0]);
        assert_eq!(decoded.labels.unwrap(), vec![1.0, 0.0]);
        assert!(decoded.train_features.is_none());
        assert!(decoded.test_labels.is_none());
    }

    #[test]
    fn decode_trusts_payload_over_tampered_flags() {
        // The checksum only covers the payload, so the header flags can lie.
        let mut bytes = encode(&sample_snapshot()).unwrap();
        bytes[8] = FormatFlags::HAS_TRAIN as u8;

        let decoded = decode(&bytes).unwrap();
        assert!(decoded.features.is_some());
        assert!(decoded.labels.is_some());
        assert!(decoded.train_features.is_none());
    }

    #[test]
    fn decode_rejects_flipped_payload_bit() {
        let mut bytes = encode(&sample_snapshot()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(
            decode(&bytes),
            Err(DeserializeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn decode_rejects_truncation() {
        let bytes = encode(&sample_snapshot()).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 4]),
            Err(DeserializeError::Truncated { .. })
        ));
        assert!(matches!(
            decode(&bytes[..10]),
            Err(DeserializeError::Truncated { .. })
        ));
    }

    #[test]
    fn table_data_validates_cell_count() {
        let bad = TableData {
            num_rows: 2,
            num_cols: 2,
            values: vec![1.0, 2.0, 3.0],
        };
        assert!(matches!(
            bad.into_matrix(),
            Err(DeserializeError::CorruptPayload(_))
        ));
    }
}
