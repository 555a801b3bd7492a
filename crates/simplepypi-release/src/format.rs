//! REL binary format implementation.
//!
//! The format uses a fixed-size header with magic bytes, version, and flags,
//! followed by a JSON-serialized release payload, terminated by a SHA-256
//! content hash for integrity verification.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::record::ReleaseRecord;

/// Magic bytes identifying a REL file: "SPR\0"
pub const MAGIC: [u8; 4] = [0x53, 0x50, 0x52, 0x00];

/// 4 (magic) + 3 (version) + 1 (flags) + 8 (payload_len) = 16 bytes
const HEADER_SIZE: usize = 16;

/// Size of the trailing content hash.
const HASH_SIZE: usize = 32;

/// Errors that can occur while encoding or decoding a sidecar.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid magic bytes: expected SPR\\0")]
    InvalidMagic,

    #[error("unsupported format version {major}.{minor}.{patch}")]
    UnsupportedVersion { major: u8, minor: u8, patch: u8 },

    #[error("content hash mismatch: record is corrupted")]
    HashMismatch,

    #[error("record too small to be a valid REL file")]
    Truncated,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// REL format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl RelVersion {
    /// The current format version.
    pub const CURRENT: RelVersion = RelVersion {
        major: 1,
        minor: 0,
        patch: 0,
    };

    /// Any container with the same major version can be read: the payload is
    /// keyed, so newer minor versions only add fields.
    pub fn is_compatible(&self) -> bool {
        self.major == Self::CURRENT.major
    }
}

impl std::fmt::Display for RelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// REL format flags. None are defined yet; the byte is carried through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelFlags {
    bits: u8,
}

impl RelFlags {
    pub const NONE: RelFlags = RelFlags { bits: 0 };

    pub fn new(bits: u8) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }
}

/// Serialize a record into REL bytes. Output is deterministic for a given record.
pub fn encode(record: &ReleaseRecord) -> Result<Vec<u8>, CodecError> {
    let payload =
        serde_json::to_vec(record).map_err(|e| CodecError::Serialization(e.to_string()))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + HASH_SIZE);
    buf.extend_from_slice(&MAGIC);
    let version = RelVersion::CURRENT;
    buf.extend_from_slice(&[version.major, version.minor, version.patch]);
    buf.push(RelFlags::NONE.bits());
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(&payload);

    let hash: [u8; 32] = Sha256::digest(&buf).into();
    buf.extend_from_slice(&hash);
    Ok(buf)
}

/// Parse REL bytes back into a record.
pub fn decode(data: &[u8]) -> Result<ReleaseRecord, CodecError> {
    if data.len() < HEADER_SIZE + HASH_SIZE {
        return Err(CodecError::Truncated);
    }

    if data[0..4] != MAGIC {
        return Err(CodecError::InvalidMagic);
    }

    let version = RelVersion {
        major: data[4],
        minor: data[5],
        patch: data[6],
    };
    if !version.is_compatible() {
        return Err(CodecError::UnsupportedVersion {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
        });
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&data[8..16]);
    let payload_len =
        usize::try_from(u64::from_le_bytes(len_bytes)).map_err(|_| CodecError::Truncated)?;

    let payload_end = HEADER_SIZE
        .checked_add(payload_len)
        .ok_or(CodecError::Truncated)?;
    let total = payload_end
        .checked_add(HASH_SIZE)
        .ok_or(CodecError::Truncated)?;
    if data.len() < total {
        return Err(CodecError::Truncated);
    }

    let stored_hash = &data[payload_end..total];
    let computed_hash: [u8; 32] = Sha256::digest(&data[..payload_end]).into();
    if computed_hash != stored_hash {
        return Err(CodecError::HashMismatch);
    }

    serde_json::from_slice(&data[HEADER_SIZE..payload_end])
        .map_err(|e| CodecError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_record() -> ReleaseRecord {
        ReleaseRecord {
            package: "demo".to_string(),
            version: "1.0.0".to_string(),
            filename: "demo-1.0.0.tar.gz".to_string(),
            checksum: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
                .to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            summary: "A demo package".to_string(),
            description: "Longer text\nwith <markup> & lines".to_string(),
            author: "Ada".to_string(),
            author_email: "ada@example.com".to_string(),
        }
    }

    /// Frame an arbitrary payload the way `encode` does.
    fn frame(payload: &[u8], major: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&[major, 0, 0, 0]);
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(payload);
        let hash: [u8; 32] = Sha256::digest(&buf).into();
        buf.extend_from_slice(&hash);
        buf
    }

    #[test]
    fn round_trip() {
        let record = sample_record();
        let bytes = encode(&record).unwrap();
        assert_eq!(decode(&bytes).unwrap(), record);
    }

    #[test]
    fn encoding_is_deterministic() {
        let record = sample_record();
        assert_eq!(encode(&record).unwrap(), encode(&record).unwrap());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = br#"{"package":"demo","version":"1.0","filename":"demo-1.0.zip","checksum":"ab","created_at":"2024-05-01T12:30:00Z","summary":"s","license":"MIT","classifiers":["a","b"]}"#;
        let record = decode(&frame(payload, RelVersion::CURRENT.major)).unwrap();
        assert_eq!(record.package, "demo");
        assert_eq!(record.summary, "s");
        assert!(record.description.is_empty());
    }

    #[test]
    fn missing_required_field_rejected() {
        let payload = br#"{"package":"demo","version":"1.0","filename":"demo-1.0.zip","created_at":"2024-05-01T12:30:00Z"}"#;
        let result = decode(&frame(payload, RelVersion::CURRENT.major));
        assert!(matches!(result, Err(CodecError::Serialization(_))));
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = encode(&sample_record()).unwrap();
        bytes[0] = 0xFF;
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidMagic)));
    }

    #[test]
    fn other_major_version_rejected() {
        let bytes = frame(b"{}", RelVersion::CURRENT.major + 1);
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn corrupted_payload_rejected() {
        let mut bytes = encode(&sample_record()).unwrap();
        bytes[HEADER_SIZE + 5] ^= 0xFF;
        assert!(matches!(decode(&bytes), Err(CodecError::HashMismatch)));
    }

    #[test]
    fn truncated_input_rejected() {
        assert!(matches!(decode(&MAGIC), Err(CodecError::Truncated)));

        let bytes = encode(&sample_record()).unwrap();
        let cut = &bytes[..bytes.len() - 1];
        assert!(matches!(decode(cut), Err(CodecError::Truncated)));
    }

    #[test]
    fn oversized_length_field_rejected() {
        let mut bytes = encode(&sample_record()).unwrap();
        bytes[8..16].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(CodecError::Truncated)));

        // Header plus payload fits in usize, but adding the trailer does not.
        let mut bytes = vec![0u8; 64];
        bytes[0..4].copy_from_slice(&MAGIC);
        bytes[4] = RelVersion::CURRENT.major;
        bytes[8..16].copy_from_slice(&(u64::MAX - 20).to_le_bytes());
        assert!(matches!(decode(&bytes), Err(CodecError::Truncated)));
    }

    #[test]
    fn version_display() {
        assert_eq!(RelVersion::CURRENT.to_string(), "1.0.0");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// Property: free text of any shape survives encode/decode.
            #[test]
            fn prop_free_text_preserved(
                summary in ".*",
                description in ".*",
                author in ".*",
            ) {
                let mut record = sample_record();
                record.summary = summary;
                record.description = description;
                record.author = author;
                let bytes = encode(&record).unwrap();
                prop_assert_eq!(decode(&bytes).unwrap(), record);
            }

            /// Property: flipping any single byte never yields a different record.
            #[test]
            fn prop_single_byte_corruption_detected(index in 0usize..200, mask in 1u8..=255) {
                let record = sample_record();
                let mut bytes = encode(&record).unwrap();
                let index = index % bytes.len();
                bytes[index] ^= mask;
                match decode(&bytes) {
                    Ok(decoded) => prop_assert_eq!(decoded, record),
                    Err(_) => {}
                }
            }
        }
    }
}
