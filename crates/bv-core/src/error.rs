use thiserror::Error;

use crate::status;

pub type VaultResult<T> = Result<T, VaultError>;

/// Top-level error taxonomy for the vault client.
///
/// Crypto and validation failures are recovered close to where they
/// occur and carried here as plain strings so that leaf crates stay
/// independent of each other.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Network/server failure, numeric status forwarded unchanged.
    #[error("transport error: status {0}")]
    Transport(u16),

    /// Malformed input rejected before any cryptographic work.
    #[error("validation error: {0}")]
    Validation(String),

    /// AEAD authentication failure: wrong key or corrupted envelope.
    #[error("decryption failed: {0}")]
    Crypto(String),

    /// No wrapped master key has been persisted yet.
    #[error("no master key set")]
    NoKey,

    /// An operation that needs the unwrapped key was attempted while locked.
    #[error("vault is locked")]
    Locked,

    /// The worker channel was terminated with this request in flight.
    #[error("crypto channel error: {0}")]
    Channel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VaultError {
    /// Map onto the status sentinels the calling layer interprets.
    pub fn status(&self) -> u16 {
        match self {
            VaultError::Transport(code) => *code,
            VaultError::Validation(_) => status::BAD_REQUEST,
            VaultError::Crypto(_) => status::DECRYPT_FAILED,
            VaultError::NoKey => status::NOT_FOUND,
            VaultError::Locked => status::UNAUTHORIZED,
            VaultError::Channel(_) => status::SERVER_ERROR,
            VaultError::Io(_) => status::SERVER_ERROR,
            VaultError::Other(_) => status::SERVER_ERROR,
        }
    }
}
