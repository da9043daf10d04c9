use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{decode_fixed, TypeError};

/// Fixed-width 32-byte text field used for step actions and timestamps.
///
/// Text shorter than the buffer is right-padded with zero bytes by the
/// caller. The ledger treats the buffer as opaque apart from the emptiness
/// check; readers reverse the padding with [`FixedText::decode`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedText([u8; 32]);

impl FixedText {
    /// Capacity in bytes.
    pub const LEN: usize = 32;

    /// The all-zero buffer, i.e. the empty string once padded.
    pub const EMPTY: Self = Self([0; 32]);

    /// Wrap an already padded buffer.
    pub const fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Right-pad `text` with zero bytes to 32 bytes.
    pub fn encode(text: &str) -> Result<Self, TypeError> {
        let bytes = text.as_bytes();
        if bytes.len() > Self::LEN {
            return Err(TypeError::TooLong {
                max: Self::LEN,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; 32];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Returns `true` when every byte is zero.
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    /// The raw 32 bytes, padding included.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The buffer with trailing zero bytes removed.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        &self.0[..end]
    }

    /// Reverse the padding and interpret the remainder as UTF-8.
    pub fn decode(&self) -> Result<String, TypeError> {
        std::str::from_utf8(self.trimmed())
            .map(str::to_owned)
            .map_err(|_| TypeError::InvalidUtf8)
    }

    /// `0x`-prefixed lowercase hex of the full buffer.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl Default for FixedText {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for FixedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(text) => write!(f, "FixedText({text:?})"),
            Err(_) => write!(f, "FixedText({})", self.to_hex()),
        }
    }
}

impl fmt::Display for FixedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.trimmed()))
    }
}

impl Serialize for FixedText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FixedText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_pads_right_with_zeros() {
        let text = FixedText::encode("FISH_CAUGHT").unwrap();
        assert_eq!(&text.as_bytes()[..11], b"FISH_CAUGHT");
        assert!(text.as_bytes()[11..].iter().all(|b| *b == 0));
    }

    #[test]
    fn empty_string_encodes_to_empty_buffer() {
        let text = FixedText::encode("").unwrap();
        assert!(text.is_empty());
        assert_eq!(text, FixedText::EMPTY);
    }

    #[test]
    fn exactly_32_bytes_fits() {
        let s = "RECEIVED_IN_PACKAGING_FACILITY!!";
        assert_eq!(s.len(), 32);
        let text = FixedText::encode(s).unwrap();
        assert_eq!(text.decode().unwrap(), s);
    }

    #[test]
    fn over_32_bytes_is_rejected() {
        let err = FixedText::encode(&"x".repeat(33)).unwrap_err();
        assert_eq!(err, TypeError::TooLong { max: 32, actual: 33 });
    }

    #[test]
    fn decode_trims_only_trailing_zeros() {
        let mut raw = [0u8; 32];
        raw[0] = b'a';
        raw[2] = b'b';
        let text = FixedText::from_raw(raw);
        assert_eq!(text.trimmed(), b"a\0b");
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let mut raw = [0u8; 32];
        raw[0] = 0xff;
        assert_eq!(
            FixedText::from_raw(raw).decode().unwrap_err(),
            TypeError::InvalidUtf8
        );
    }

    #[test]
    fn display_and_debug() {
        let text = FixedText::encode("2016-06-03T03:56:39Z").unwrap();
        assert_eq!(text.to_string(), "2016-06-03T03:56:39Z");
        assert_eq!(format!("{text:?}"), "FixedText(\"2016-06-03T03:56:39Z\")");
    }

    proptest! {
        #[test]
        fn decode_reverses_encode(s in "[A-Za-z0-9_:.-]{0,32}") {
            let text = FixedText::encode(&s).unwrap();
            prop_assert_eq!(text.decode().unwrap(), s.clone());
            prop_assert_eq!(text.is_empty(), s.is_empty());
        }
    }
}
