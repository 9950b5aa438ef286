//! Authenticated encryption: AES-256-GCM-SIV
//!
//! Nonce-misuse-resistant mode, chosen because item nonces are random
//! per call with no central counter. A repeated nonce leaks only the
//! equality of equal plaintexts, never the key stream.

use aes_gcm_siv::{
    aead::{Aead, KeyInit},
    Aes256GcmSiv, Nonce,
};

use crate::error::CryptoError;
use crate::kdf::DerivedKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Encrypt `plaintext` under `key` with the given 96-bit nonce.
///
/// Returns ciphertext with the 16-byte tag appended. Empty plaintext is
/// valid and produces a tag-only ciphertext.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256GcmSiv::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Encrypt)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Encrypt)
}

/// Decrypt `ciphertext` (tag appended) under `key` and `nonce`.
///
/// Fails closed: tag mismatch or truncated input is `CryptoError::Decrypt`,
/// never partial plaintext.
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::Decrypt);
    }
    let cipher = Aes256GcmSiv::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Decrypt)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;

    fn test_key(fill: u8) -> DerivedKey {
        DerivedKey::from_bytes([fill; KEY_SIZE])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key(42);
        let nonce = [1u8; NONCE_SIZE];
        let sealed = seal(&key, &nonce, b"hunter2").unwrap();
        let opened = open(&key, &nonce, &sealed).unwrap();
        assert_eq!(opened, b"hunter2");
    }

    #[test]
    fn test_empty_plaintext_is_tag_only() {
        let key = test_key(42);
        let nonce = [1u8; NONCE_SIZE];
        let sealed = seal(&key, &nonce, b"").unwrap();
        assert_eq!(sealed.len(), TAG_SIZE);
        assert_eq!(open(&key, &nonce, &sealed).unwrap(), b"");
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let nonce = [1u8; NONCE_SIZE];
        let sealed = seal(&test_key(1), &nonce, b"secret").unwrap();
        assert!(matches!(
            open(&test_key(2), &nonce, &sealed),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn test_open_wrong_nonce_fails() {
        let key = test_key(1);
        let sealed = seal(&key, &[1u8; NONCE_SIZE], b"secret").unwrap();
        assert!(open(&key, &[2u8; NONCE_SIZE], &sealed).is_err());
    }

    #[test]
    fn test_open_truncated_fails_closed() {
        let key = test_key(1);
        assert!(matches!(
            open(&key, &[0u8; NONCE_SIZE], b"short"),
            Err(CryptoError::Decrypt)
        ));
        assert!(open(&key, &[0u8; NONCE_SIZE], b"").is_err());
    }

    #[test]
    fn test_tampered_tag_fails() {
        let key = test_key(1);
        let nonce = [1u8; NONCE_SIZE];
        let mut sealed = seal(&key, &nonce, b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(open(&key, &nonce, &sealed).is_err());
    }

    #[test]
    fn test_nonce_reuse_equal_plaintexts_equal_ciphertexts() {
        // SIV property: deterministic under (key, nonce, plaintext)
        let key = test_key(9);
        let nonce = [3u8; NONCE_SIZE];
        let a = seal(&key, &nonce, b"same").unwrap();
        let b = seal(&key, &nonce, b"same").unwrap();
        assert_eq!(a, b);
    }
}
