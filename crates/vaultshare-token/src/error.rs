//! Error types for the token module.

use thiserror::Error;

/// Errors that can occur while sealing or opening a share token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The entry access key is not 32 hex-encoded bytes.
    #[error("invalid access key: {0}")]
    InvalidKey(String),

    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Authentication failed: wrong key or the token was altered.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// The token is not in the expected format.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token is shorter than its header and tag.
    #[error("truncated token: {len} bytes")]
    Truncated { len: usize },

    /// The token opened, but was not issued for this recipient and pass.
    #[error("token was not issued for this recipient")]
    RecipientMismatch,
}

/// Result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;
