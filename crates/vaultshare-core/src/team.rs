//! Team records as the membership collaborator stores them.
//!
//! Only the fields the sharing subsystem reads are modelled. Membership is
//! read at delete time, never cached on a share.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Result;
use crate::oid::Oid;
use crate::types::UserId;

/// Key prefix of team records.
pub const TEAM_KEY_PREFIX: &str = "team:";

/// A stored team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: Oid,
    pub name: String,
    pub members: Vec<UserId>,
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
    pub created: i64,
    pub updated: i64,
}

impl TeamRecord {
    /// A live team with the given members.
    pub fn new(id: Oid, name: impl Into<String>, members: Vec<UserId>, now: i64) -> Self {
        Self {
            id,
            name: name.into(),
            members,
            is_deleted: false,
            created: now,
            updated: now,
        }
    }

    /// Storage key of this team.
    pub fn key(&self) -> String {
        team_key(&self.id)
    }

    /// Whether `user` is a current member.
    pub fn has_member(&self, user: &UserId) -> bool {
        self.members.iter().any(|m| m == user)
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

/// Storage key of the team with the given id.
pub fn team_key(id: &Oid) -> String {
    format!("{}{}", TEAM_KEY_PREFIX, id)
}
