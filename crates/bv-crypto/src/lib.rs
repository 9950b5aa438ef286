//! bv-crypto: client-side encryption for BranchVault
//!
//! Everything the server stores is opaque: items and the master key
//! leave the client only as sealed envelopes.
//!
//! Key hierarchy:
//! ```text
//! Recovery Key (24-char token, user-held, shown once at signup)
//!   ├── wrapped at rest by a key Argon2id-derived from the account password
//!   │     envelope: [kdf salt (8)][iv (12)][ciphertext + tag]
//!   └── KDF input for per-item AES keys (salt = per-item message salt)
//!         envelope: [iv (12)][message salt (32)][ciphertext + tag]
//! ```
//!
//! AEAD is AES-256-GCM-SIV: item nonces are independent randoms with no
//! central counter, so the cipher must tolerate an accidental repeat.

pub mod aead;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod recovery;

pub use aead::{open, seal};
pub use envelope::{decrypt_item, encrypt_item, unwrap_recovery_key, wrap_recovery_key};
pub use error::CryptoError;
pub use kdf::{derive_key, DerivedKey, KdfParams};
pub use recovery::{generate_key, validate_key};

/// Size of a derived symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM-SIV nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the per-item message salt (SHA-256 output)
pub const MESSAGE_SALT_SIZE: usize = 32;

/// Size of the random master-key KDF salt
pub const KDF_SALT_SIZE: usize = 8;
