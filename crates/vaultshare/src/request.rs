//! Incoming share requests.

use serde::{Deserialize, Serialize};

use vaultshare_core::UserId;

use crate::config::ShareConfig;
use crate::error::{Result, ShareError};

/// Length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

/// A request to share an entry with another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Human label for the share.
    pub name: String,
    /// Share password, pre-hashed by the client with SHA-256.
    pub pass: String,
    /// The recipient.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Lifetime in seconds.
    #[serde(rename = "expire")]
    pub expire_secs: u64,
}

impl ShareRequest {
    /// Check the request shape. Failures are `InvalidInput`.
    pub fn validate(&self, config: &ShareConfig) -> Result<()> {
        if self.name.is_empty() {
            return Err(ShareError::InvalidInput("invalid share name".into()));
        }
        if !is_hash_string(&self.pass) {
            return Err(ShareError::InvalidInput(
                "invalid share pass, pass should be hashed by sha256".into(),
            ));
        }
        if self.user_id.is_empty() {
            return Err(ShareError::InvalidInput("invalid user ID to share".into()));
        }
        if self.expire_secs < config.min_expire_secs {
            return Err(ShareError::InvalidInput(format!(
                "invalid share expire time, minimum is {}s",
                config.min_expire_secs
            )));
        }
        Ok(())
    }
}

fn is_hash_string(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
