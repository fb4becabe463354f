use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};

use crate::generator;
use crate::OidError;

/// A note-store object identifier.
///
/// Either 40 lowercase hex characters, or the nil sentinel (empty) meaning
/// "no identifier". Nil round-trips through serialization as `""`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Oid(String);

impl Oid {
    pub const LEN: usize = 40;

    /// The nil sentinel.
    pub fn nil() -> Self {
        Oid(String::new())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_empty()
    }

    /// Allocate a fresh random OID from the installed generator.
    ///
    /// Identity-stable objects (files, notes, packs, …) use random OIDs so
    /// that editing content never changes the identifier.
    pub fn random() -> Self {
        generator::next()
    }

    /// Content-hash OID: SHA-1 of the bytes, used for blobs.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(Self::LEN);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Oid(hex)
    }

    /// Parse a 40-hex string. Uppercase input is normalized to lowercase.
    pub fn parse(s: &str) -> Result<Self, OidError> {
        if s.len() != Self::LEN {
            return Err(OidError::InvalidLength(s.len()));
        }
        if let Some(bad) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(OidError::InvalidHex(bad));
        }
        Ok(Oid(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fan-out path component: `"aa/<full-oid>"`.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", &self.0[..2], self.0)
    }

    /// Abbreviated form for human output.
    pub fn short(&self) -> &str {
        if self.is_nil() {
            ""
        } else {
            &self.0[..8]
        }
    }

    pub(crate) fn from_raw_hex(hex: String) -> Self {
        debug_assert_eq!(hex.len(), Self::LEN);
        Oid(hex)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            write!(f, "Oid(nil)")
        } else {
            write!(f, "Oid({})", self.short())
        }
    }
}

impl FromStr for Oid {
    type Err = OidError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Oid::nil());
        }
        Self::parse(s)
    }
}

impl serde::Serialize for Oid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Oid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_is_sha1() {
        // SHA-1 of the empty input.
        let oid = Oid::from_bytes(b"");
        assert_eq!(oid.as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(Oid::parse("abcd"), Err(OidError::InvalidLength(4))));
        let too_long = "a".repeat(41);
        assert!(Oid::parse(&too_long).is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        let bad = "z".repeat(40);
        assert!(matches!(Oid::parse(&bad), Err(OidError::InvalidHex('z'))));
    }

    #[test]
    fn parse_normalizes_case() {
        let upper = "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709";
        let oid = Oid::parse(upper).unwrap();
        assert_eq!(oid.as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn relative_path_fans_out() {
        let oid = Oid::from_bytes(b"");
        assert_eq!(
            oid.relative_path(),
            "da/da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn nil_round_trip() {
        let nil: Oid = "".parse().unwrap();
        assert!(nil.is_nil());
        assert_eq!(nil.to_string(), "");
    }

    #[test]
    fn identical_content_identical_oid() {
        assert_eq!(Oid::from_bytes(b"gopher"), Oid::from_bytes(b"gopher"));
        assert_ne!(Oid::from_bytes(b"gopher"), Oid::from_bytes(b"ferris"));
    }
}
