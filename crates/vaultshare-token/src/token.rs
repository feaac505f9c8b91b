//! The token crypto context.
//!
//! A share token is produced in two steps:
//!
//! 1. `sign_pass(recipient, pass)` binds the one-time pass to the recipient.
//! 2. `encrypt_text(signed, entry_key)` encrypts the signature under the
//!    entry's access key.
//!
//! Token layout, hex encoded:
//!
//! ```text
//! | version (1) | nonce (12) | ciphertext + tag (16) |
//! ```

use rand::RngCore;
use vaultshare_core::UserId;

use crate::crypto::{EncryptionKey, EncryptionNonce};
use crate::error::{Result, TokenError};
use crate::sign::{SignedPass, SigningKey};

/// Current token format version.
pub const TOKEN_VERSION: u8 = 1;

/// Poly1305 tag length.
const TAG_LEN: usize = 16;

/// Shortest possible token in bytes (empty plaintext).
pub const MIN_TOKEN_LEN: usize = 1 + EncryptionNonce::LEN + TAG_LEN;

/// Key material for signing and sealing share tokens.
///
/// Constructed once from the deployment salt and handed to whoever issues or
/// redeems tokens.
#[derive(Debug, Clone)]
pub struct TokenCrypto {
    signing_key: SigningKey,
}

impl TokenCrypto {
    /// Build a context from a salt.
    pub fn new(salt: &[u8]) -> Self {
        Self {
            signing_key: SigningKey::derive(salt),
        }
    }

    /// Build a context with a random salt. Tokens it issues cannot be
    /// verified by any other context.
    pub fn generate() -> Self {
        let mut salt = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::new(&salt)
    }

    /// Bind `pass` to `user`.
    pub fn sign_pass(&self, user: &UserId, pass: &str) -> SignedPass {
        self.signing_key.sign(user, pass)
    }

    /// Encrypt `plaintext` under the hex entry key.
    pub fn encrypt_text(&self, plaintext: &str, key_hex: &str) -> Result<String> {
        let key = EncryptionKey::from_hex(key_hex)?;
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.encrypt(plaintext.as_bytes(), &nonce)?;

        let mut buf = Vec::with_capacity(1 + EncryptionNonce::LEN + ciphertext.len());
        buf.push(TOKEN_VERSION);
        buf.extend_from_slice(nonce.as_bytes());
        buf.extend_from_slice(&ciphertext);
        Ok(hex::encode(buf))
    }

    /// Decrypt a token produced by [`encrypt_text`](Self::encrypt_text).
    ///
    /// Fails on any alteration, truncation or wrong key.
    pub fn decrypt_text(&self, token: &str, key_hex: &str) -> Result<String> {
        let key = EncryptionKey::from_hex(key_hex)?;
        let raw = hex::decode(token).map_err(|e| TokenError::Malformed(e.to_string()))?;

        if raw.len() < MIN_TOKEN_LEN {
            return Err(TokenError::Truncated { len: raw.len() });
        }
        if raw[0] != TOKEN_VERSION {
            return Err(TokenError::Malformed(format!(
                "unsupported token version {}",
                raw[0]
            )));
        }

        let (nonce, ciphertext) = raw[1..].split_at(EncryptionNonce::LEN);
        let mut nonce_bytes = [0u8; EncryptionNonce::LEN];
        nonce_bytes.copy_from_slice(nonce);

        let plaintext = key.decrypt(ciphertext, &EncryptionNonce::from_bytes(nonce_bytes))?;
        String::from_utf8(plaintext).map_err(|e| TokenError::Malformed(e.to_string()))
    }

    /// Sign `pass` for `user` and encrypt the signature under the entry key.
    pub fn seal(&self, user: &UserId, pass: &str, key_hex: &str) -> Result<String> {
        self.encrypt_text(&self.sign_pass(user, pass).to_hex(), key_hex)
    }

    /// Check that `token` was issued for `user` with `pass`.
    pub fn verify_token(&self, user: &UserId, pass: &str, token: &str, key_hex: &str) -> Result<()> {
        let opened = SignedPass::from_hex(&self.decrypt_text(token, key_hex)?)?;
        if opened == self.sign_pass(user, pass) {
            Ok(())
        } else {
            Err(TokenError::RecipientMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PASS: &str = "15e2536def2490c115759ceabf012872fddbd7887fbe67e5074d1e66148d5d00";

    fn setup() -> (TokenCrypto, String) {
        (TokenCrypto::new(b"test-salt"), EncryptionKey::generate().to_hex())
    }

    #[test]
    fn test_seal_and_verify() {
        let (crypto, key) = setup();
        let user = UserId::from("jeo");
        let token = crypto.seal(&user, PASS, &key).unwrap();

        crypto.verify_token(&user, PASS, &token, &key).unwrap();
    }

    #[test]
    fn test_token_does_not_contain_signature() {
        let (crypto, key) = setup();
        let user = UserId::from("jeo");
        let signed = crypto.sign_pass(&user, PASS).to_hex();
        let token = crypto.encrypt_text(&signed, &key).unwrap();
        assert!(!token.contains(&signed));
        assert_eq!(crypto.decrypt_text(&token, &key).unwrap(), signed);
    }

    #[test]
    fn test_verify_rejects_other_recipient() {
        let (crypto, key) = setup();
        let token = crypto.seal(&UserId::from("alice"), PASS, &key).unwrap();
        assert!(matches!(
            crypto.verify_token(&UserId::from("bob"), PASS, &token, &key),
            Err(TokenError::RecipientMismatch)
        ));
    }

    #[test]
    fn test_verify_rejects_other_salt() {
        let (crypto, key) = setup();
        let user = UserId::from("jeo");
        let token = crypto.seal(&user, PASS, &key).unwrap();
        let other = TokenCrypto::new(b"another-salt");
        assert!(matches!(
            other.verify_token(&user, PASS, &token, &key),
            Err(TokenError::RecipientMismatch)
        ));
    }

    #[test]
    fn test_encrypt_rejects_malformed_key() {
        let crypto = TokenCrypto::generate();
        assert!(matches!(
            crypto.encrypt_text("x", "not-a-key"),
            Err(TokenError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let (crypto, key) = setup();
        let token = crypto.encrypt_text("secret", &key).unwrap();
        let other = EncryptionKey::generate().to_hex();
        assert!(matches!(
            crypto.decrypt_text(&token, &other),
            Err(TokenError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_decrypt_truncated_fails() {
        let (crypto, key) = setup();
        let token = crypto.encrypt_text("secret", &key).unwrap();
        let short = &token[..(MIN_TOKEN_LEN - 1) * 2];
        assert!(matches!(
            crypto.decrypt_text(short, &key),
            Err(TokenError::Truncated { .. })
        ));
        // Dropping tag bytes still leaves a long enough token that fails authentication.
        let clipped = &token[..token.len() - 2];
        assert!(crypto.decrypt_text(clipped, &key).is_err());
    }

    #[test]
    fn test_decrypt_bad_version_fails() {
        let (crypto, key) = setup();
        let token = crypto.encrypt_text("secret", &key).unwrap();
        let bumped = format!("02{}", &token[2..]);
        assert!(matches!(
            crypto.decrypt_text(&bumped, &key),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_decrypt_not_hex_fails() {
        let (crypto, key) = setup();
        assert!(matches!(
            crypto.decrypt_text("not hex at all", &key),
            Err(TokenError::Malformed(_))
        ));
    }

    proptest! {
        #[test]
        fn test_any_flipped_byte_fails(index in 0usize..64, flip in 1u8..=255) {
            let (crypto, key) = setup();
            let token = crypto.seal(&UserId::from("jeo"), PASS, &key).unwrap();
            let mut raw = hex::decode(&token).unwrap();
            let index = index % raw.len();
            raw[index] ^= flip;
            let tampered = hex::encode(raw);
            prop_assert!(crypto.decrypt_text(&tampered, &key).is_err());
        }
    }
}
