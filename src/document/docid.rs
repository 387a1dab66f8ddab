//! Document identifiers
//!
//! Layout of the 8 bytes:
//!
//! ```text
//! +--------+----------------+--------+
//! | random | unix seconds   | pid    |
//! | 2 B    | u32 LE (4 B)   | u16 LE |
//! +--------+----------------+--------+
//! ```
//!
//! Ids are probabilistically unique only: two ids minted by the same process
//! in the same second collide with probability 1/65536 per pair.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{DbError, Result};

/// 8-byte document identifier. Equality and ordering are byte-wise.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId([u8; DocId::SIZE]);

impl DocId {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    /// Mints a fresh id from randomness, the wall clock and the process id.
    pub fn new() -> Self {
        let mut bytes = [0u8; Self::SIZE];
        rand::thread_rng().fill_bytes(&mut bytes[0..2]);

        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        bytes[2..6].copy_from_slice(&seconds.to_le_bytes());

        // Only the low 16 bits of the pid fit.
        let pid = (std::process::id() & 0xFFFF) as u16;
        bytes[6..8].copy_from_slice(&pid.to_le_bytes());

        Self(bytes)
    }

    /// Builds an id from exactly 8 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; Self::SIZE] =
            bytes.try_into().map_err(|_| DbError::InvalidLength {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Parses the 16-character hex form produced by [`DocId::to_hex`].
    ///
    /// Non-hex input fails with `InvalidEncoding`; well-formed hex that does
    /// not decode to 8 bytes fails with `InvalidLength`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let decoded =
            hex::decode(s).map_err(|e| DbError::InvalidEncoding(format!("'{}': {}", s, e)))?;
        Self::from_bytes(&decoded)
    }

    /// Lower-case hex form, 16 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    /// Unix timestamp (seconds) embedded at creation.
    pub fn timestamp(&self) -> u32 {
        u32::from_le_bytes([self.0[2], self.0[3], self.0[4], self.0[5]])
    }

    /// Low 16 bits of the creating process id.
    pub fn pid(&self) -> u16 {
        u16::from_le_bytes([self.0[6], self.0[7]])
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocId({})", self.to_hex())
    }
}

impl FromStr for DocId {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for DocId {
    type Error = DbError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl From<[u8; DocId::SIZE]> for DocId {
    fn from(bytes: [u8; DocId::SIZE]) -> Self {
        Self(bytes)
    }
}

// Hex string on the wire, so ids also work as JSON map keys.
impl Serialize for DocId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DocId::from_hex(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_new_id_layout() {
        let before = Utc::now().timestamp() as u32;
        let id = DocId::new();
        let after = Utc::now().timestamp() as u32;

        assert_eq!(id.as_bytes().len(), DocId::SIZE);
        assert!(id.timestamp() >= before && id.timestamp() <= after);
        assert_eq!(id.pid(), (std::process::id() & 0xFFFF) as u16);
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let id = DocId::new();
        assert_eq!(DocId::from_bytes(id.as_bytes()).unwrap(), id);
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        for len in [0usize, 4, 7, 9, 16] {
            let err = DocId::from_bytes(&vec![0u8; len]).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidLength);
        }
    }

    #[test]
    fn test_hex_matches_bytes() {
        let id = DocId::from_bytes(b"12345678").unwrap();
        assert_eq!(id.to_hex(), "3132333435363738");
        assert_eq!(id.to_string(), "3132333435363738");
    }

    #[test]
    fn test_hex_roundtrip() {
        for _ in 0..32 {
            let id = DocId::new();
            assert_eq!(DocId::from_hex(&id.to_hex()).unwrap(), id);
        }
    }

    #[test]
    fn test_from_hex_accepts_upper_case() {
        let id = DocId::from_hex("0A0B0C0D0E0F1011").unwrap();
        assert_eq!(id.to_hex(), "0a0b0c0d0e0f1011");
    }

    #[test]
    fn test_from_hex_invalid_encoding() {
        assert_eq!(DocId::from_hex("test").unwrap_err().code(), ErrorCode::InvalidEncoding);
        assert_eq!(
            DocId::from_hex("0102030405060").unwrap_err().code(),
            ErrorCode::InvalidEncoding
        );
        assert_eq!(
            DocId::from_hex("é1020304050607").unwrap_err().code(),
            ErrorCode::InvalidEncoding
        );
    }

    #[test]
    fn test_from_hex_invalid_length() {
        assert_eq!(DocId::from_hex("0102").unwrap_err().code(), ErrorCode::InvalidLength);
        assert_eq!(
            DocId::from_hex("010203040506070809").unwrap_err().code(),
            ErrorCode::InvalidLength
        );
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = DocId::from_bytes(b"abcdefgh").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6162636465666768\"");
        let back: DocId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
