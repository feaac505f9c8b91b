//! Share manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest share lifetime a request may ask for, in seconds.
pub const DEFAULT_MIN_EXPIRE_SECS: u64 = 10;

/// What a listing does when it meets a record it cannot use.
///
/// A record is unusable when it fails to decode, or when its contents do
/// not carry the term it was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptRecordPolicy {
    /// Log a warning and keep scanning.
    #[default]
    Skip,
    /// Stop and fail the whole listing with a storage error.
    Abort,
}

/// Configuration for the share manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Minimum accepted `expire` on a share request.
    pub min_expire_secs: u64,
    /// Listing behavior on unusable records.
    pub on_corrupt_record: CorruptRecordPolicy,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            min_expire_secs: DEFAULT_MIN_EXPIRE_SECS,
            on_corrupt_record: CorruptRecordPolicy::Skip,
        }
    }
}

impl ShareConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Minimum share lifetime as a duration.
    pub fn min_expire(&self) -> Duration {
        Duration::from_secs(self.min_expire_secs)
    }
}
