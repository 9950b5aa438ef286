//! Full lifecycle tests: real channel, real store, reduced Argon2id costs.

use std::sync::Arc;

use bv_core::{status, VaultError};
use tokio_test::assert_err;
use bv_crypto::kdf::KdfParams;
use bv_crypto::generate_key;
use bv_vault::store::entries;
use bv_vault::{KeyStateKind, KeyValueStore, MasterKeyManager, MemoryStore};
use bv_worker::CryptoChannel;

fn manager() -> (MasterKeyManager, Arc<MemoryStore>) {
    let channel = Arc::new(CryptoChannel::spawn(KdfParams::insecure_fast()));
    let store = Arc::new(MemoryStore::new());
    let mgr = MasterKeyManager::new(
        channel,
        store.clone() as Arc<dyn KeyValueStore>,
        entries::MASTER_KEY.to_string(),
    )
    .unwrap();
    (mgr, store)
}

#[tokio::test]
async fn set_then_unlock_recovers_the_key() {
    let (mgr, _store) = manager();
    let recovery_key = generate_key();

    assert_eq!(mgr.state(), KeyStateKind::NoKeySet);
    mgr.set_key("account password", &recovery_key).await.unwrap();
    assert_eq!(mgr.state(), KeyStateKind::WrappedAtRest);

    mgr.unlock("account password").await.unwrap();
    assert_eq!(mgr.state(), KeyStateKind::Unlocked);

    // The session key works end to end
    let envelope = mgr.encrypt_item("login: hunter2").await.unwrap();
    assert_eq!(mgr.decrypt_item(&envelope).await.unwrap(), "login: hunter2");
}

#[tokio::test]
async fn wrong_password_transitions_to_invalid() {
    let (mgr, store) = manager();
    mgr.set_key("right password", &generate_key()).await.unwrap();

    let err = mgr.unlock("wrong password").await.unwrap_err();
    assert_eq!(err.status(), status::DECRYPT_FAILED);
    assert_eq!(mgr.state(), KeyStateKind::Invalid);

    // The envelope survives the failure: retry stays possible
    assert!(store.get(entries::MASTER_KEY).unwrap().is_some());

    mgr.unlock("right password").await.unwrap();
    assert_eq!(mgr.state(), KeyStateKind::Unlocked);
}

#[tokio::test]
async fn unlock_without_envelope_is_not_found() {
    let (mgr, _store) = manager();
    let err = mgr.unlock("any password").await.unwrap_err();
    assert!(matches!(err, VaultError::NoKey));
    assert_eq!(err.status(), status::NOT_FOUND);
    assert_eq!(mgr.state(), KeyStateKind::NoKeySet);
}

#[tokio::test]
async fn bad_recovery_key_rejected_before_any_crypto() {
    let (mgr, store) = manager();
    let err =
        tokio_test::assert_err!(mgr.set_key("pw", "typoed-recovery-key-0000").await);
    assert!(matches!(err, VaultError::Validation(_)));
    assert_eq!(err.status(), status::BAD_REQUEST);
    assert!(store.get(entries::MASTER_KEY).unwrap().is_none());
}

#[tokio::test]
async fn double_set_requires_reset() {
    let (mgr, _store) = manager();
    mgr.set_key("pw", &generate_key()).await.unwrap();
    assert!(mgr.set_key("pw", &generate_key()).await.is_err());

    mgr.reset().unwrap();
    mgr.set_key("pw", &generate_key()).await.unwrap();
}

#[tokio::test]
async fn reset_discards_envelope_and_session_key() {
    let (mgr, store) = manager();
    mgr.set_key("pw", &generate_key()).await.unwrap();
    mgr.unlock("pw").await.unwrap();

    mgr.reset().unwrap();
    assert_eq!(mgr.state(), KeyStateKind::NoKeySet);
    assert!(store.get(entries::MASTER_KEY).unwrap().is_none());
    assert!(matches!(
        mgr.encrypt_item("x").await.unwrap_err(),
        VaultError::Locked
    ));
}

#[tokio::test]
async fn plaintext_recovery_key_never_reaches_the_store() {
    let (mgr, store) = manager();
    let recovery_key = generate_key();
    mgr.set_key("pw", &recovery_key).await.unwrap();
    mgr.unlock("pw").await.unwrap();
    let _ = mgr.encrypt_item("an item").await.unwrap();

    for value in store.values() {
        assert!(
            !value.contains(&recovery_key),
            "recovery key leaked into the store"
        );
    }
}

#[tokio::test]
async fn corrupt_item_failure_does_not_poison_session() {
    let (mgr, _store) = manager();
    mgr.set_key("pw", &generate_key()).await.unwrap();
    mgr.unlock("pw").await.unwrap();

    let envelope = mgr.encrypt_item("good item").await.unwrap();
    let err = mgr.decrypt_item("AAAA").await.unwrap_err();
    assert_eq!(err.status(), status::BAD_REQUEST);

    // The session is still usable
    assert_eq!(mgr.state(), KeyStateKind::Unlocked);
    assert_eq!(mgr.decrypt_item(&envelope).await.unwrap(), "good item");
}

#[tokio::test]
async fn manager_restored_from_persisted_envelope() {
    let channel = Arc::new(CryptoChannel::spawn(KdfParams::insecure_fast()));
    let store = Arc::new(MemoryStore::new());

    {
        let mgr = MasterKeyManager::new(
            channel.clone(),
            store.clone() as Arc<dyn KeyValueStore>,
            entries::MASTER_KEY.to_string(),
        )
        .unwrap();
        mgr.set_key("pw", &generate_key()).await.unwrap();
    }

    // A fresh manager over the same store starts wrapped, not empty
    let mgr = MasterKeyManager::new(
        channel,
        store as Arc<dyn KeyValueStore>,
        entries::MASTER_KEY.to_string(),
    )
    .unwrap();
    assert_eq!(mgr.state(), KeyStateKind::WrappedAtRest);
    mgr.unlock("pw").await.unwrap();
}
