//! Share records: time-limited grants of one entry to one recipient.
//!
//! A [`Share`] is write-once. There is no update path, so `updated` always
//! equals `created`; "changing" a share means deleting and re-creating it.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Result;
use crate::oid::Oid;
use crate::types::UserId;

/// Key prefix of share records.
pub const SHARE_KEY_PREFIX: &str = "share:";

/// Index of shares by recipient user id.
pub const SHARE_BY_USER: &str = "share_by_user";

/// Index of shares by entry id.
pub const SHARE_BY_ENTRY: &str = "share_by_entry";

/// Index of shares by owning team id.
pub const SHARE_BY_TEAM: &str = "share_by_team";

/// A persisted share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Assigned at creation, unique for the lifetime of the record.
    pub id: Oid,

    /// The shared secret entry.
    #[serde(rename = "entryID")]
    pub entry_id: Oid,

    /// Team owning the entry, denormalized at creation.
    #[serde(rename = "teamID")]
    pub team_id: Oid,

    /// Recipient.
    #[serde(rename = "userID")]
    pub user_id: UserId,

    /// Human label.
    pub name: String,

    /// Signed-then-encrypted pass. Never part of a [`ShareResult`].
    pub token: String,

    /// Creation time (Unix ms).
    pub created: i64,

    /// Equal to `created`.
    pub updated: i64,
}

/// Caller-supplied part of a new share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareDraft {
    pub team_id: Oid,
    pub user_id: UserId,
    pub name: String,
}

/// The exposed projection of a share. Carries no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareResult {
    pub id: Oid,
    #[serde(rename = "entryID")]
    pub entry_id: Oid,
    #[serde(rename = "teamID")]
    pub team_id: Oid,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub name: String,
    pub created: i64,
    pub updated: i64,
}

impl Share {
    /// Assemble a share from a draft. `created` and `updated` are both `now`.
    pub fn from_draft(id: Oid, entry_id: Oid, draft: ShareDraft, token: String, now: i64) -> Self {
        Self {
            id,
            entry_id,
            team_id: draft.team_id,
            user_id: draft.user_id,
            name: draft.name,
            token,
            created: now,
            updated: now,
        }
    }

    /// Storage key of this share.
    pub fn key(&self) -> String {
        share_key(&self.id)
    }

    /// Project to a [`ShareResult`], dropping the token.
    pub fn result(&self) -> ShareResult {
        ShareResult {
            id: self.id,
            entry_id: self.entry_id,
            team_id: self.team_id,
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            created: self.created,
            updated: self.updated,
        }
    }

    /// The `(index, term)` pairs this share is listed under.
    pub fn index_terms(&self) -> [(&'static str, String); 3] {
        [
            (SHARE_BY_USER, self.user_id.as_str().to_string()),
            (SHARE_BY_ENTRY, self.entry_id.to_hex()),
            (SHARE_BY_TEAM, self.team_id.to_hex()),
        ]
    }

    /// Whether this share carries `term` in `index`.
    pub fn matches(&self, index: &str, term: &str) -> bool {
        self.index_terms()
            .iter()
            .any(|(name, value)| *name == index && value == term)
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

/// Storage key of the share with the given id.
pub fn share_key(id: &Oid) -> String {
    format!("{}{}", SHARE_KEY_PREFIX, id)
}

/// Recover the share id from a storage key.
pub fn share_id_from_key(key: &str) -> Option<Oid> {
    key.strip_prefix(SHARE_KEY_PREFIX)
        .and_then(|id| Oid::parse(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Share {
        Share::from_draft(
            Oid::new(),
            Oid::new(),
            ShareDraft {
                team_id: Oid::new(),
                user_id: UserId::from("u1"),
                name: "Github".to_string(),
            },
            "token".to_string(),
            1_700_000_000_000,
        )
    }

    #[test]
    fn test_share_bytes_roundtrip() {
        let share = sample();
        let bytes = share.to_bytes().unwrap();
        assert_eq!(Share::from_bytes(&bytes).unwrap(), share);
    }

    #[test]
    fn test_share_created_equals_updated() {
        let share = sample();
        assert_eq!(share.created, share.updated);
    }

    #[test]
    fn test_result_omits_token() {
        let share = sample();
        let json = serde_json::to_value(share.result()).unwrap();
        assert!(json.get("token").is_none());
        assert_eq!(json["userID"], "u1");
        assert_eq!(json["entryID"], share.entry_id.to_hex());
    }

    #[test]
    fn test_share_key_roundtrip() {
        let share = sample();
        assert_eq!(share_id_from_key(&share.key()), Some(share.id));
        assert_eq!(share_id_from_key("team:abc"), None);
        assert_eq!(share_id_from_key("share:nothex"), None);
    }

    #[test]
    fn test_share_matches_index_terms() {
        let share = sample();
        assert!(share.matches(SHARE_BY_USER, "u1"));
        assert!(share.matches(SHARE_BY_TEAM, &share.team_id.to_hex()));
        assert!(!share.matches(SHARE_BY_USER, "u2"));
        assert!(!share.matches(SHARE_BY_ENTRY, "u1"));
    }
}
