//! Error types for the share manager.

use thiserror::Error;
use vaultshare_core::CoreError;
use vaultshare_store::StoreError;
use vaultshare_token::TokenError;

/// Errors that can occur during share operations.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Share, entry or team absent or expired.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requester is not a current member of the owning team.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed object identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Request failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Token crypto failed while opening a token.
    #[error("crypto error: {0}")]
    Crypto(#[from] TokenError),

    /// Token crypto failed while creating a share. Reported as a storage
    /// failure to the caller.
    #[error("storage error: sealing share token: {0}")]
    Sealing(#[source] TokenError),

    /// A stored record could not be encoded or decoded.
    #[error("storage error: record codec: {0}")]
    Codec(#[source] CoreError),

    /// A record found during a scan is unreadable or not what its index says.
    #[error("storage error: corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Underlying store failure.
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

/// The error kinds callers map to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidIdentifier,
    InvalidInput,
    Crypto,
    Storage,
}

impl ErrorKind {
    /// The HTTP-style status a transport layer should answer with.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::InvalidIdentifier | ErrorKind::InvalidInput => 400,
            ErrorKind::Crypto | ErrorKind::Storage => 500,
        }
    }
}

impl ShareError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShareError::NotFound(_) => ErrorKind::NotFound,
            ShareError::Forbidden(_) => ErrorKind::Forbidden,
            ShareError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            ShareError::InvalidInput(_) => ErrorKind::InvalidInput,
            ShareError::Crypto(_) => ErrorKind::Crypto,
            ShareError::Sealing(_)
            | ShareError::Codec(_)
            | ShareError::Corrupt { .. }
            | ShareError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<StoreError> for ShareError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => ShareError::NotFound(key),
            other => ShareError::Storage(other),
        }
    }
}

impl From<CoreError> for ShareError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidIdentifier(msg) => ShareError::InvalidIdentifier(msg),
            other => ShareError::Codec(other),
        }
    }
}

/// Result type for share operations.
pub type Result<T> = std::result::Result<T, ShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_keeps_kind() {
        let e: ShareError = StoreError::NotFound("share:x".into()).into();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        let e: ShareError = StoreError::Task("join".into()).into();
        assert_eq!(e.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_sealing_is_storage_kind() {
        let e = ShareError::Sealing(TokenError::InvalidKey("short".into()));
        assert_eq!(e.kind(), ErrorKind::Storage);
        assert_eq!(e.kind().status_code(), 500);
    }

    #[test]
    fn test_invalid_identifier_from_core() {
        let e: ShareError = CoreError::InvalidIdentifier("zz".into()).into();
        assert_eq!(e.kind(), ErrorKind::InvalidIdentifier);
        assert_eq!(e.kind().status_code(), 400);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Forbidden.status_code(), 403);
        assert_eq!(ErrorKind::Crypto.status_code(), 500);
    }
}
