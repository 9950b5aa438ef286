//! Opaque key-value string store
//!
//! Stands in for whatever durable storage the host environment offers
//! (browser localStorage, a keychain, a dotfile). The vault only ever
//! writes wrapped envelopes here — the trait deliberately has no way to
//! express anything else.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use bv_core::{VaultError, VaultResult};

/// Well-known entry names
pub mod entries {
    /// The wrapped master-key envelope (base64)
    pub const MASTER_KEY: &str = "branch_vault_master_key";
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> VaultResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> VaultResult<()>;
    fn remove(&self, key: &str) -> VaultResult<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all values, for invariant checks in tests.
    pub fn values(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .remove(key);
        Ok(())
    }
}

/// JSON-file-backed store. Every mutation writes through.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: PathBuf) -> VaultResult<Self> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)
                .map_err(|e| VaultError::Validation(format!("corrupt store file: {e}")))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, String>) -> VaultResult<()> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| VaultError::Other(anyhow::anyhow!("store serialization: {e}")))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> VaultResult<()> {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.remove(key);
        self.flush(&entries)
    }
}
