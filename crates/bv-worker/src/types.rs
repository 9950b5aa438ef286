//! Request/response schema for the crypto worker
//!
//! The operation set is a closed enum: adding a fifth operation is a
//! compile error until every match arm handles it. Failures cross the
//! thread boundary as a structured kind + message, never as a sniffable
//! string prefix.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bv_crypto::CryptoError;

/// One of the four cryptographic operations.
///
/// Serialized form matches the wire schema:
/// `{ "type": "item-encryption", "payload": { "masterKey": ..., ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum CryptoOp {
    ItemEncryption {
        master_key: String,
        item_plaintext: String,
    },
    ItemDecryption {
        master_key: String,
        encrypted_item: String,
    },
    /// Wrap the recovery key under the account password.
    KeyEncryption {
        master_password: String,
        key: String,
    },
    /// Unwrap the recovery key from a master-key envelope.
    KeyDecryption {
        master_password: String,
        key: String,
    },
}

impl CryptoOp {
    pub fn type_name(&self) -> &'static str {
        match self {
            CryptoOp::ItemEncryption { .. } => "item-encryption",
            CryptoOp::ItemDecryption { .. } => "item-decryption",
            CryptoOp::KeyEncryption { .. } => "key-encryption",
            CryptoOp::KeyDecryption { .. } => "key-decryption",
        }
    }
}

/// A request in flight to the worker. The id is generated fresh per
/// submission and is the sole correlation key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub op: CryptoOp,
}

/// The worker's answer to one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Outcome {
    Success { result: String },
    Failure { error: OpError },
}

/// Structured operation failure: the kind lets the calling layer map
/// "wrong key / corrupted data" to its own diagnostics instead of a
/// generic transport error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpError {
    pub kind: OpErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpErrorKind {
    /// AEAD authentication failure or post-auth corruption.
    Crypto,
    /// Input rejected before any cryptographic work.
    Validation,
    /// KDF or other internal failure.
    Internal,
}

impl std::fmt::Display for OpErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OpErrorKind::Crypto => "crypto",
            OpErrorKind::Validation => "validation",
            OpErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<CryptoError> for OpError {
    fn from(err: CryptoError) -> Self {
        let kind = match &err {
            CryptoError::Decrypt | CryptoError::Encrypt | CryptoError::NotUtf8 => {
                OpErrorKind::Crypto
            }
            CryptoError::TruncatedEnvelope { .. } | CryptoError::Encoding(_) => {
                OpErrorKind::Validation
            }
            CryptoError::Kdf(_) => OpErrorKind::Internal,
        };
        OpError {
            kind,
            message: err.to_string(),
        }
    }
}
