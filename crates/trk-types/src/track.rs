use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{decode_fixed, TypeError};

/// Opaque 32-byte key naming one tracked item or batch.
///
/// A track is never created explicitly: the first step appended under an
/// identifier establishes it. The all-zero identifier is empty and is
/// rejected by the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId([u8; 32]);

impl TrackId {
    /// The empty identifier.
    pub const ZERO: Self = Self([0; 32]);

    /// Derive an identifier from a caller-side label such as a serial
    /// number or a UUID string.
    ///
    /// The same label always produces the same identifier.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"trk-track-v1:");
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Derive an identifier from a UUID via its hyphenated string form.
    pub fn from_uuid(uuid: &uuid::Uuid) -> Self {
        Self::derive(&uuid.hyphenated().to_string())
    }

    /// Create from a raw 32-byte value.
    pub const fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns `true` for the all-zero identifier.
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_fixed::<32>(s).map(Self)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("trk:{}", hex::encode(&self.0[..4]))
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for TrackId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackId({})", self.short_id())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_id())
    }
}

impl Serialize for TrackId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
