//! Key derivation: Argon2id secret + salt → 256-bit AES key

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::KEY_SIZE;

/// A 256-bit symmetric key derived from a password or recovery key.
///
/// Held only in volatile memory for one operation or one session;
/// zeroized on drop.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id cost parameters.
///
/// The defaults are protocol constants: every persisted envelope was
/// written under them, so a change here orphans existing data and
/// would need envelope versioning. Non-default values exist for tests
/// and benchmarks only.
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Cheap costs for tests. Never valid for real envelopes.
    pub fn insecure_fast() -> Self {
        Self {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Derive a 256-bit key from a low-entropy secret and a salt.
///
/// The salt length varies by call site: 8 random bytes for master-key
/// wrapping, 32 content-derived bytes for item encryption. Failure
/// (parameter rejection, resource exhaustion) propagates as an error,
/// never as a silently zeroed key.
pub fn derive_key(secret: &[u8], salt: &[u8], params: &KdfParams) -> Result<DerivedKey, CryptoError> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::Kdf(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(secret, salt, &mut key)
        .map_err(|e| CryptoError::Kdf(format!("Argon2id failed: {e}")))?;

    Ok(DerivedKey::from_bytes(key))
}
