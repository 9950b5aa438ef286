use thiserror::Error;

/// Failures of the cryptographic core.
///
/// `Decrypt` is the one callers branch on: it means "wrong key or
/// corrupted data" as opposed to malformed input, which is rejected
/// before any key derivation runs.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed: invalid key or corrupted data")]
    Decrypt,

    #[error("envelope too short: {len} bytes (minimum {min})")]
    TruncatedEnvelope { len: usize, min: usize },

    #[error("invalid base64 envelope: {0}")]
    Encoding(String),

    #[error("decrypted payload is not valid UTF-8")]
    NotUtf8,
}

impl CryptoError {
    /// True for failures that mean the input never reached the cipher.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CryptoError::TruncatedEnvelope { .. } | CryptoError::Encoding(_)
        )
    }
}
