//! bv: BranchVault client CLI
//!
//! Commands:
//!   keygen            - generate a recovery key (shown once, write it down)
//!   check <key>       - validate a recovery key's checksum
//!   init              - wrap a new recovery key under the account password
//!   status            - show the master-key state for the local store
//!   encrypt <text>    - unlock, then encrypt one item
//!   decrypt <env>     - unlock, then decrypt one item envelope
//!   reset             - discard the wrapped master key

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use bv_core::config::VaultConfig;
use bv_crypto::kdf::KdfParams;
use bv_crypto::{generate_key, validate_key};
use bv_vault::{FileStore, KeyValueStore, MasterKeyManager};
use bv_worker::CryptoChannel;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bv",
    version,
    about = "BranchVault client",
    long_about = "bv: manage the BranchVault master key and encrypt/decrypt item envelopes locally"
)]
struct Cli {
    /// Path to branchvault.toml configuration file
    #[arg(long, short = 'c', env = "BV_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the local key-value store file
    #[arg(long, env = "BV_STORE", default_value = "branchvault.json")]
    store: PathBuf,

    /// Log level (e.g. info, debug)
    #[arg(long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a recovery key. It is shown once and never stored.
    Keygen,

    /// Validate a recovery key's checksum (typo detection only)
    Check {
        /// The 24-character recovery key
        key: String,
    },

    /// Generate and wrap a recovery key under the account password
    Init,

    /// Show the master-key state for the local store
    Status,

    /// Encrypt one item under the unlocked master key
    Encrypt {
        /// Item plaintext
        plaintext: String,
    },

    /// Decrypt one base64 item envelope
    Decrypt {
        /// Item envelope (base64)
        envelope: String,
    },

    /// Discard the wrapped master key (switch accounts / start over)
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let config = match &cli.config {
        Some(path) => VaultConfig::load(path)?,
        None => VaultConfig::default(),
    };
    debug!(store = %cli.store.display(), "bv starting");

    match cli.command {
        Commands::Keygen => {
            let key = generate_key();
            println!("{key}");
            eprintln!("write this down - it is shown once and cannot be recovered");
            Ok(())
        }
        Commands::Check { key } => {
            if validate_key(&key) {
                println!("ok");
                Ok(())
            } else {
                anyhow::bail!("checksum mismatch: the key has a typo or wrong length");
            }
        }
        command => {
            let manager = build_manager(&cli.store, &config)?;
            run_command(command, &manager).await
        }
    }
}

async fn run_command(command: Commands, manager: &MasterKeyManager) -> Result<()> {
    match command {
        Commands::Init => {
            let key = generate_key();
            let password = prompt_password("Account password: ")?;
            let confirm = prompt_password("Confirm password: ")?;
            anyhow::ensure!(password == confirm, "passwords do not match");

            manager
                .set_key(&password, &key)
                .await
                .map_err(status_context)?;
            println!("{key}");
            eprintln!("write this down - it is shown once and cannot be recovered");
            Ok(())
        }
        Commands::Status => {
            println!("{:?}", manager.state());
            Ok(())
        }
        Commands::Encrypt { plaintext } => {
            unlock(manager).await?;
            let envelope = manager
                .encrypt_item(&plaintext)
                .await
                .map_err(status_context)?;
            println!("{envelope}");
            Ok(())
        }
        Commands::Decrypt { envelope } => {
            unlock(manager).await?;
            let plaintext = manager
                .decrypt_item(&envelope)
                .await
                .map_err(status_context)?;
            println!("{plaintext}");
            Ok(())
        }
        Commands::Reset => {
            manager.reset().map_err(status_context)?;
            println!("master key reset");
            Ok(())
        }
        Commands::Keygen | Commands::Check { .. } => unreachable!("handled before manager setup"),
    }
}

fn build_manager(store_path: &PathBuf, config: &VaultConfig) -> Result<MasterKeyManager> {
    let params = KdfParams {
        mem_cost_kib: config.crypto.argon2_mem_cost_kib,
        time_cost: config.crypto.argon2_time_cost,
        parallelism: config.crypto.argon2_parallelism,
    };
    let channel = Arc::new(CryptoChannel::spawn(params));
    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(store_path.clone())
            .with_context(|| format!("opening store {}", store_path.display()))?,
    );
    MasterKeyManager::new(channel, store, config.store.master_key_entry.clone())
        .map_err(status_context)
}

async fn unlock(manager: &MasterKeyManager) -> Result<()> {
    let password = prompt_password("Account password: ")?;
    manager.unlock(&password).await.map_err(status_context)?;
    Ok(())
}

fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("reading password")
}

/// Fold the status sentinel into the error chain so scripts can grep it.
fn status_context(err: bv_core::VaultError) -> anyhow::Error {
    let status = err.status();
    anyhow::anyhow!(err).context(format!("status {status}"))
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
