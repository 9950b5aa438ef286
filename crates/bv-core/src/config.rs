use serde::{Deserialize, Serialize};

/// Top-level client configuration (loaded from branchvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub crypto: CryptoConfig,
    pub store: StoreConfig,
}

/// Argon2id cost parameters.
///
/// The defaults are protocol constants: envelopes written under one set
/// of costs cannot be opened under another, so changing these orphans
/// every previously persisted envelope. Exposed in config solely for
/// tests and benchmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Entry name the wrapped master-key envelope persists under.
    pub master_key_entry: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            master_key_entry: "branch_vault_master_key".to_string(),
        }
    }
}

impl VaultConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).map_err(|e| anyhow::anyhow!("config parse error: {e}"))
    }

    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.display()))?;
        Self::from_toml_str(&raw)
    }
}
