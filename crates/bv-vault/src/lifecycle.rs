//! Master-key lifecycle: NoKeySet → WrappedAtRest → Unlocked (or Invalid)
//!
//! `Invalid` is reachable only from `WrappedAtRest` when unwrapping
//! fails: the account password may be perfectly valid server-side while
//! the locally wrapped key is corrupted or belongs to a different
//! account. Those are different failure causes and get different
//! diagnostics — an unlock failure must never be reported as "wrong
//! password at login".

use std::sync::{Arc, Mutex};

use secrecy::{ExposeSecret, SecretString};

use bv_core::{VaultError, VaultResult};
use bv_crypto::validate_key;
use bv_worker::{ChannelError, CryptoChannel, CryptoOp, OpErrorKind};

use crate::store::KeyValueStore;

enum KeyState {
    NoKeySet,
    WrappedAtRest,
    Unlocked(SecretString),
    Invalid,
}

/// Diagnostic view of the state machine (no key material).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStateKind {
    NoKeySet,
    WrappedAtRest,
    Unlocked,
    Invalid,
}

/// Orchestrates derivation, wrapping, unwrapping, and in-memory custody
/// of the session's master key. All cryptographic work goes through the
/// channel; only the wrapped envelope ever reaches the store.
pub struct MasterKeyManager {
    channel: Arc<CryptoChannel>,
    store: Arc<dyn KeyValueStore>,
    entry: String,
    state: Mutex<KeyState>,
}

impl MasterKeyManager {
    pub fn new(channel: Arc<CryptoChannel>, store: Arc<dyn KeyValueStore>, entry: String) -> VaultResult<Self> {
        let state = if store.get(&entry)?.is_some() {
            KeyState::WrappedAtRest
        } else {
            KeyState::NoKeySet
        };
        Ok(Self {
            channel,
            store,
            entry,
            state: Mutex::new(state),
        })
    }

    pub fn state(&self) -> KeyStateKind {
        match &*self.state.lock().expect("state lock poisoned") {
            KeyState::NoKeySet => KeyStateKind::NoKeySet,
            KeyState::WrappedAtRest => KeyStateKind::WrappedAtRest,
            KeyState::Unlocked(_) => KeyStateKind::Unlocked,
            KeyState::Invalid => KeyStateKind::Invalid,
        }
    }

    /// Set (NoKeySet → WrappedAtRest): wrap a fresh or user-supplied
    /// recovery key under the account password and persist the envelope.
    pub async fn set_key(&self, password: &str, recovery_key: &str) -> VaultResult<()> {
        if self.state() != KeyStateKind::NoKeySet {
            return Err(VaultError::Validation(
                "a master key is already set; reset it first".into(),
            ));
        }
        // Checksum gate before any KDF work
        if !validate_key(recovery_key) {
            return Err(VaultError::Validation(
                "recovery key failed checksum".into(),
            ));
        }

        let envelope = self
            .channel
            .submit(CryptoOp::KeyEncryption {
                master_password: password.to_string(),
                key: recovery_key.to_string(),
            })
            .await
            .map_err(channel_to_vault)?;

        self.store.set(&self.entry, &envelope)?;
        *self.state.lock().expect("state lock poisoned") = KeyState::WrappedAtRest;
        tracing::debug!("master key wrapped and persisted");
        Ok(())
    }

    /// Unlock (WrappedAtRest → Unlocked | Invalid): unwrap the persisted
    /// envelope with the account password.
    ///
    /// Failure leaves the envelope in place — the user may retry with
    /// another password or explicitly reset.
    pub async fn unlock(&self, password: &str) -> VaultResult<()> {
        let envelope = self.store.get(&self.entry)?.ok_or(VaultError::NoKey)?;

        let result = self
            .channel
            .submit(CryptoOp::KeyDecryption {
                master_password: password.to_string(),
                key: envelope,
            })
            .await;

        let recovered = match result {
            Ok(recovered) => recovered,
            Err(err) => {
                let vault_err = channel_to_vault(err);
                if matches!(vault_err, VaultError::Crypto(_)) {
                    *self.state.lock().expect("state lock poisoned") = KeyState::Invalid;
                    tracing::warn!("master-key unwrap failed: wrong password or foreign envelope");
                }
                return Err(vault_err);
            }
        };

        // Authenticated but implausible: the envelope decrypted cleanly
        // yet does not contain a recovery key.
        if !validate_key(&recovered) {
            *self.state.lock().expect("state lock poisoned") = KeyState::Invalid;
            return Err(VaultError::Crypto(
                "unwrapped payload is not a recovery key".into(),
            ));
        }

        *self.state.lock().expect("state lock poisoned") =
            KeyState::Unlocked(SecretString::from(recovered));
        tracing::debug!("master key unlocked for this session");
        Ok(())
    }

    /// Encrypt one item field; requires `Unlocked`.
    pub async fn encrypt_item(&self, plaintext: &str) -> VaultResult<String> {
        let master_key = self.session_key()?;
        self.channel
            .submit(CryptoOp::ItemEncryption {
                master_key,
                item_plaintext: plaintext.to_string(),
            })
            .await
            .map_err(channel_to_vault)
    }

    /// Decrypt one item envelope; requires `Unlocked`.
    ///
    /// A failure here is per-item: it does not change the session state,
    /// so one corrupted item never blocks the rest.
    pub async fn decrypt_item(&self, envelope: &str) -> VaultResult<String> {
        let master_key = self.session_key()?;
        self.channel
            .submit(CryptoOp::ItemDecryption {
                master_key,
                encrypted_item: envelope.to_string(),
            })
            .await
            .map_err(channel_to_vault)
    }

    /// Lock/Reset (any state → NoKeySet): discard the persisted envelope
    /// and the in-memory key. Used when switching accounts or explicitly
    /// resetting after `Invalid`.
    pub fn reset(&self) -> VaultResult<()> {
        self.store.remove(&self.entry)?;
        *self.state.lock().expect("state lock poisoned") = KeyState::NoKeySet;
        tracing::debug!("master key reset");
        Ok(())
    }

    fn session_key(&self) -> VaultResult<String> {
        match &*self.state.lock().expect("state lock poisoned") {
            KeyState::Unlocked(key) => Ok(key.expose_secret().to_string()),
            _ => Err(VaultError::Locked),
        }
    }
}

fn channel_to_vault(err: ChannelError) -> VaultError {
    match err {
        ChannelError::Terminated => {
            VaultError::Channel("terminated with request in flight".into())
        }
        ChannelError::Failure(op_err) => match op_err.kind {
            OpErrorKind::Crypto => VaultError::Crypto(op_err.message),
            OpErrorKind::Validation => VaultError::Validation(op_err.message),
            OpErrorKind::Internal => VaultError::Other(anyhow::anyhow!(op_err.message)),
        },
    }
}
