//! # Snapshot Persistence Format
//!
//! Binary serialization for sale snapshots.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot data.
//! - 4 bytes: Magic ("TSSL")
//! - 1 byte: Version
//!
//! Payload size is validated before deserialization so a corrupted or
//! hostile file cannot trigger oversized allocations.

use crate::engine::SaleSnapshot;
use crate::types::SaleError;

/// Magic bytes identifying a Tessel snapshot.
pub const MAGIC_BYTES: &[u8; 4] = b"TSSL";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum allowed payload size for the snapshot format.
///
/// A sale snapshot is a few entries per participating account; 16 MB is a
/// generous upper bound.
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Minimum valid file size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all snapshot data.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), SaleError> {
        if &self.magic != MAGIC_BYTES {
            return Err(SaleError::Serialization("invalid magic bytes".to_string()));
        }
        if self.version != FORMAT_VERSION {
            return Err(SaleError::Serialization(format!(
                "unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SaleError> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(SaleError::Serialization("header too short".to_string()));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn snapshot_to_bytes(snapshot: &SaleSnapshot) -> Result<Vec<u8>, SaleError> {
    let header = SnapshotHeader::new();
    let payload =
        postcard::to_stdvec(snapshot).map_err(|e| SaleError::Serialization(e.to_string()))?;

    let mut bytes = Vec::with_capacity(5 + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize a snapshot from bytes, validating header and size first.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<SaleSnapshot, SaleError> {
    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[MIN_FILE_SIZE..];
    if payload.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(SaleError::Serialization(format!(
            "payload size {} exceeds maximum {} bytes",
            payload.len(),
            MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    postcard::from_bytes(payload).map_err(|e| SaleError::Serialization(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
