//! Object identifiers.
//!
//! An [`Oid`] is 12 bytes:
//!
//! ```text
//! | unix millis (6, big endian) | counter (2) | random (4) |
//! ```
//!
//! Byte order and hex order agree, so sorting the string form sorts by
//! creation. An [`OidGenerator`] hands out strictly increasing
//! `(millis, counter)` prefixes: the counter restarts at zero each
//! millisecond and, if it runs out inside one millisecond, carries into the
//! timestamp. A clock that steps backwards never reorders identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Length of an OID in bytes.
pub const OID_LEN: usize = 12;

/// Length of the hex string form.
pub const OID_HEX_LEN: usize = OID_LEN * 2;

/// Bits of the prefix taken by the per-millisecond counter.
const COUNTER_BITS: u32 = 16;

/// Largest timestamp the 6-byte field holds.
const MAX_MILLIS: u64 = (1 << 48) - 1;

/// A globally unique, sortable object identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid([u8; OID_LEN]);

/// Source of strictly increasing identifiers.
///
/// The last issued prefix is packed as `millis << 16 | counter` in one
/// atomic, so concurrent callers never see the same prefix twice.
#[derive(Debug, Default)]
pub struct OidGenerator {
    last: AtomicU64,
}

static GLOBAL: OidGenerator = OidGenerator::new();

impl OidGenerator {
    /// A generator that has issued nothing yet.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// The process-wide generator behind [`Oid::new`].
    pub fn global() -> &'static OidGenerator {
        &GLOBAL
    }

    /// Next identifier at the wall-clock time.
    pub fn generate(&self) -> Oid {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.generate_at(millis)
    }

    /// Next identifier for a clock reading of `millis`.
    ///
    /// The result sorts after everything this generator issued before. It
    /// embeds `millis` unless an earlier call already used that millisecond
    /// up or came from a later one.
    pub fn generate_at(&self, millis: u64) -> Oid {
        let floor = millis.min(MAX_MILLIS) << COUNTER_BITS;
        let advance = |last: u64| floor.max(last.saturating_add(1));

        let prev = match self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(advance(last)))
        {
            Ok(prev) | Err(prev) => prev,
        };

        let mut bytes = [0u8; OID_LEN];
        bytes[..8].copy_from_slice(&advance(prev).to_be_bytes());
        rand::thread_rng().fill_bytes(&mut bytes[8..]);
        Oid(bytes)
    }
}

impl Oid {
    /// Generate a new identifier from the process-wide generator.
    pub fn new() -> Self {
        OidGenerator::global().generate()
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    /// The creation time embedded in the identifier (Unix ms).
    pub fn timestamp_millis(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf[2..].copy_from_slice(&self.0[..6]);
        u64::from_be_bytes(buf)
    }

    /// Convert to the 24 character hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form. Fails with [`CoreError::InvalidIdentifier`].
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.len() != OID_HEX_LEN {
            return Err(CoreError::InvalidIdentifier(format!(
                "expected {} hex characters, got {}",
                OID_HEX_LEN,
                s.len()
            )));
        }
        let mut bytes = [0u8; OID_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| CoreError::InvalidIdentifier(format!("{:?}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl Default for Oid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.to_hex())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Oid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; OID_LEN]> for Oid {
    fn from(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Oid::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_oid_hex_roundtrip() {
        let id = Oid::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), OID_HEX_LEN);
        assert_eq!(Oid::parse(&hex).unwrap(), id);
    }

    #[test]
    fn test_oid_parse_accepts_uppercase() {
        let id = Oid::from_bytes([0xab; OID_LEN]);
        let parsed: Oid = "ABABABABABABABABABABABAB".parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_oid_parse_rejects_malformed() {
        for bad in ["", "abc", "zzzzzzzzzzzzzzzzzzzzzzzz", "0123456789abcdef012345678"] {
            assert!(
                matches!(Oid::parse(bad), Err(CoreError::InvalidIdentifier(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_oid_embeds_timestamp() {
        let id = OidGenerator::new().generate_at(1_700_000_000_123);
        assert_eq!(id.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_oid_generation_order_survives_counter_carry() {
        let generator = OidGenerator::new();
        let ids: Vec<Oid> = (0..70_000).map(|_| generator.generate_at(42)).collect();

        let inversions = ids.windows(2).filter(|w| w[0] >= w[1]).count();
        assert_eq!(inversions, 0);
        assert!(ids.windows(2).all(|w| w[0].to_hex() < w[1].to_hex()));

        // 65,536 ids fit in millisecond 42; the rest carried into 43.
        assert_eq!(ids[65_535].timestamp_millis(), 42);
        assert_eq!(ids[65_536].timestamp_millis(), 43);

        // A reading of 43 now still sorts after the carried ids.
        let next = generator.generate_at(43);
        assert!(next > ids[ids.len() - 1]);
    }

    #[test]
    fn test_oid_clock_step_back_keeps_order() {
        let generator = OidGenerator::new();
        let first = generator.generate_at(1_000);
        let second = generator.generate_at(999);
        assert!(second > first);
        assert_eq!(second.timestamp_millis(), 1_000);
    }

    #[test]
    fn test_global_generator_is_monotonic() {
        let ids: Vec<Oid> = (0..1_000).map(|_| Oid::new()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_oid_serde_as_string() {
        let id = Oid::from_bytes([0x01; OID_LEN]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"010101010101010101010101\"");
        let back: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_oid_unique() {
        let a = Oid::new();
        let b = Oid::new();
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn test_oid_order_matches_timestamp(t1 in 0u64..(1 << 47), t2 in 0u64..(1 << 47)) {
            prop_assume!(t1 != t2);
            let a = OidGenerator::new().generate_at(t1);
            let b = OidGenerator::new().generate_at(t2);
            prop_assert_eq!(t1 < t2, a < b);
            prop_assert_eq!(t1 < t2, a.to_hex() < b.to_hex());
        }
    }
}
