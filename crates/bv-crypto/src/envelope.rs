//! Envelope codec: the two binary layouts the server stores verbatim
//!
//! Item envelope (per encrypted item field):
//! ```text
//! [iv (12, random)][message salt (32, SHA-256(seed16 || plaintext))][ciphertext + tag]
//! ```
//! The message salt doubles as the Argon2id salt deriving the per-item
//! AES key from the recovery key. Its 16-byte random seed is the only
//! unlinkability guarantee between identical plaintexts.
//!
//! Master-key envelope (wraps the recovery key under the account password):
//! ```text
//! [kdf salt (8, random)][iv (12, random)][ciphertext + tag]
//! ```
//!
//! Both are base64-encoded for storage and transit. Decoders slice at
//! fixed offsets; a too-short envelope is rejected before any KDF work.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use secrecy::SecretString;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;
use crate::kdf::{derive_key, KdfParams};
use crate::{aead, KDF_SALT_SIZE, MESSAGE_SALT_SIZE, NONCE_SIZE, TAG_SIZE};

/// Bytes of independent randomness hashed into the message salt.
const SALT_SEED_SIZE: usize = 16;

const ITEM_MIN_LEN: usize = NONCE_SIZE + MESSAGE_SALT_SIZE + TAG_SIZE;
const MASTER_KEY_MIN_LEN: usize = KDF_SALT_SIZE + NONCE_SIZE + TAG_SIZE;

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Message salt: SHA-256 over a fresh 16-byte seed and the plaintext.
///
/// Content-derived but effectively unique per encryption because of the
/// random seed; never reused across envelopes.
fn message_salt(plaintext: &[u8]) -> [u8; MESSAGE_SALT_SIZE] {
    let seed = random_bytes::<SALT_SEED_SIZE>();
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(plaintext);
    hasher.finalize().into()
}

/// Encrypt one item field under the unwrapped master key.
///
/// Returns the base64 item envelope. A replacement envelope is produced
/// on every call — updates replace, never mutate.
pub fn encrypt_item(
    master_key: &str,
    plaintext: &str,
    params: &KdfParams,
) -> Result<String, CryptoError> {
    let iv = random_bytes::<NONCE_SIZE>();
    let salt = message_salt(plaintext.as_bytes());

    let aes_key = derive_key(master_key.as_bytes(), &salt, params)?;
    let ciphertext = aead::seal(&aes_key, &iv, plaintext.as_bytes())?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + MESSAGE_SALT_SIZE + ciphertext.len());
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(&envelope))
}

/// Decrypt one item envelope under the unwrapped master key.
///
/// Authentication failure is the distinguished `CryptoError::Decrypt`
/// so callers can report "wrong key or corrupted item" per item rather
/// than a generic failure.
pub fn decrypt_item(
    master_key: &str,
    envelope_b64: &str,
    params: &KdfParams,
) -> Result<String, CryptoError> {
    let bytes = BASE64
        .decode(envelope_b64)
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    if bytes.len() < ITEM_MIN_LEN {
        return Err(CryptoError::TruncatedEnvelope {
            len: bytes.len(),
            min: ITEM_MIN_LEN,
        });
    }

    let iv: [u8; NONCE_SIZE] = bytes[..NONCE_SIZE].try_into().expect("fixed slice");
    let salt = &bytes[NONCE_SIZE..NONCE_SIZE + MESSAGE_SALT_SIZE];
    let ciphertext = &bytes[NONCE_SIZE + MESSAGE_SALT_SIZE..];

    let aes_key = derive_key(master_key.as_bytes(), salt, params)?;
    let plaintext = aead::open(&aes_key, &iv, ciphertext)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::NotUtf8)
}

/// Wrap the recovery key under a key derived from the account password.
///
/// Returns the base64 master-key envelope, the only form in which the
/// recovery key may ever be persisted.
pub fn wrap_recovery_key(
    password: &str,
    recovery_key: &str,
    params: &KdfParams,
) -> Result<String, CryptoError> {
    let kdf_salt = random_bytes::<KDF_SALT_SIZE>();
    let iv = random_bytes::<NONCE_SIZE>();

    let wrap_key = derive_key(password.as_bytes(), &kdf_salt, params)?;
    let ciphertext = aead::seal(&wrap_key, &iv, recovery_key.as_bytes())?;

    let mut envelope = Vec::with_capacity(KDF_SALT_SIZE + NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&kdf_salt);
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(&envelope))
}

/// Unwrap the recovery key from a master-key envelope.
///
/// `CryptoError::Decrypt` here means wrong password *or* an envelope
/// wrapped for a different account — callers surface those differently
/// from transport failures.
pub fn unwrap_recovery_key(
    password: &str,
    envelope_b64: &str,
    params: &KdfParams,
) -> Result<SecretString, CryptoError> {
    let bytes = BASE64
        .decode(envelope_b64)
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    if bytes.len() < MASTER_KEY_MIN_LEN {
        return Err(CryptoError::TruncatedEnvelope {
            len: bytes.len(),
            min: MASTER_KEY_MIN_LEN,
        });
    }

    let kdf_salt = &bytes[..KDF_SALT_SIZE];
    let iv: [u8; NONCE_SIZE] = bytes[KDF_SALT_SIZE..KDF_SALT_SIZE + NONCE_SIZE]
        .try_into()
        .expect("fixed slice");
    let ciphertext = &bytes[KDF_SALT_SIZE + NONCE_SIZE..];

    let wrap_key = derive_key(password.as_bytes(), kdf_salt, params)?;
    let plaintext = aead::open(&wrap_key, &iv, ciphertext)?;

    String::from_utf8(plaintext)
        .map(SecretString::from)
        .map_err(|_| CryptoError::NotUtf8)
}
