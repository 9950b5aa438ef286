//! bv-vault: custody of the master key
//!
//! The recovery key exists in exactly two forms: wrapped at rest inside
//! a master-key envelope in the local store, or unwrapped in volatile
//! session memory. Nothing here ever persists it in plaintext.

pub mod lifecycle;
pub mod store;

pub use lifecycle::{KeyStateKind, MasterKeyManager};
pub use store::{FileStore, KeyValueStore, MemoryStore};
