//! Symmetric primitives: entry access keys and ChaCha20-Poly1305.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use crate::error::{Result, TokenError};

/// A 256-bit entry access key.
///
/// Entry keys arrive from the entry collaborator as 64 hex characters.
#[derive(Clone)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// A fresh random key.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse the hex form used by entry records.
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| TokenError::InvalidKey(format!("expected 64 hex characters: {}", e)))?;
        Ok(Self(bytes))
    }

    /// Render as 64 hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Seal `plaintext` under this key. The output carries the 16-byte tag.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        self.cipher()
            .encrypt(Nonce::from_slice(nonce.as_bytes()), plaintext)
            .map_err(|_| TokenError::EncryptionError("aead seal failed".into()))
    }

    /// Open a sealed buffer. Any tampering or a wrong key fails.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        self.cipher()
            .decrypt(Nonce::from_slice(nonce.as_bytes()), ciphertext)
            .map_err(|_| TokenError::DecryptionError("authentication failed".into()))
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionNonce([u8; 12]);

impl EncryptionNonce {
    /// Nonce length in bytes.
    pub const LEN: usize = 12;

    /// A fresh random nonce. Never reuse one under the same key.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = EncryptionKey::generate();
        let nonce = EncryptionNonce::generate();
        let plaintext = b"hello, world!";

        let ciphertext = key.encrypt(plaintext, &nonce).unwrap();
        assert_ne!(ciphertext, plaintext);

        let decrypted = key.decrypt(&ciphertext, &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = EncryptionKey::generate();
        let key2 = EncryptionKey::generate();
        let nonce = EncryptionNonce::generate();

        let ciphertext = key1.encrypt(b"secret", &nonce).unwrap();

        assert!(key2.decrypt(&ciphertext, &nonce).is_err());
    }

    #[test]
    fn test_key_hex_roundtrip() {
        let key = EncryptionKey::generate();
        let parsed = EncryptionKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_key_hex_rejects_bad_shape() {
        let not_hex = "zz".repeat(32);
        let too_long = "ab".repeat(33);
        for bad in ["", "abcd", not_hex.as_str(), too_long.as_str()] {
            assert!(matches!(
                EncryptionKey::from_hex(bad),
                Err(TokenError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_key_hex_rejects_padding() {
        let valid = EncryptionKey::generate().to_hex();
        assert!(EncryptionKey::from_hex(&valid).is_ok());
        for padded in [format!(" {}", valid), format!("{}\n", valid), format!("\t{} ", valid)] {
            assert!(matches!(
                EncryptionKey::from_hex(&padded),
                Err(TokenError::InvalidKey(_))
            ));
        }
    }
}
