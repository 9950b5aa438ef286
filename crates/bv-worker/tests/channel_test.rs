//! End-to-end tests for the crypto channel: real worker thread, real
//! Argon2id (reduced costs), concurrent submissions.

use bv_crypto::kdf::KdfParams;
use bv_worker::{ChannelError, CryptoChannel, CryptoOp, OpErrorKind};
use tokio_test::assert_ok;

fn spawn_channel() -> CryptoChannel {
    CryptoChannel::spawn(KdfParams::insecure_fast())
}

fn encrypt_op(plaintext: &str) -> CryptoOp {
    CryptoOp::ItemEncryption {
        master_key: "session-master-key".into(),
        item_plaintext: plaintext.into(),
    }
}

fn decrypt_op(envelope: String) -> CryptoOp {
    CryptoOp::ItemDecryption {
        master_key: "session-master-key".into(),
        encrypted_item: envelope,
    }
}

#[tokio::test]
async fn item_roundtrip_through_channel() {
    let channel = spawn_channel();

    let envelope = tokio_test::assert_ok!(channel.submit(encrypt_op("hunter2")).await);
    let plaintext = tokio_test::assert_ok!(channel.submit(decrypt_op(envelope)).await);

    assert_eq!(plaintext, "hunter2");
    channel.terminate();
}

#[tokio::test]
async fn concurrent_submissions_correlate_by_id() {
    let channel = spawn_channel();

    // Submit A and B simultaneously; whichever completes first, the
    // caller that asked for A must never see B's result.
    let (env_a, env_b) = tokio::join!(
        channel.submit(encrypt_op("secret A")),
        channel.submit(encrypt_op("secret B")),
    );
    let (plain_a, plain_b) = tokio::join!(
        channel.submit(decrypt_op(env_a.unwrap())),
        channel.submit(decrypt_op(env_b.unwrap())),
    );

    assert_eq!(plain_a.unwrap(), "secret A");
    assert_eq!(plain_b.unwrap(), "secret B");
    channel.terminate();
}

#[tokio::test]
async fn many_concurrent_submissions_each_get_their_own_result() {
    let channel = std::sync::Arc::new(spawn_channel());

    let mut handles = Vec::new();
    for i in 0..8 {
        let channel = channel.clone();
        handles.push(tokio::spawn(async move {
            let plaintext = format!("item number {i}");
            let envelope = channel.submit(encrypt_op(&plaintext)).await.unwrap();
            let decrypted = channel.submit(decrypt_op(envelope)).await.unwrap();
            assert_eq!(decrypted, plaintext);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn key_wrap_unwrap_through_channel() {
    let channel = spawn_channel();

    let envelope = channel
        .submit(CryptoOp::KeyEncryption {
            master_password: "account password".into(),
            key: "recovery-key-token-value".into(),
        })
        .await
        .unwrap();

    let recovered = channel
        .submit(CryptoOp::KeyDecryption {
            master_password: "account password".into(),
            key: envelope,
        })
        .await
        .unwrap();

    assert_eq!(recovered, "recovery-key-token-value");
    channel.terminate();
}

#[tokio::test]
async fn crypto_failure_is_tagged_not_transportlike() {
    let channel = spawn_channel();

    let envelope = channel
        .submit(CryptoOp::KeyEncryption {
            master_password: "right password".into(),
            key: "recovery-key-token-value".into(),
        })
        .await
        .unwrap();

    let err = channel
        .submit(CryptoOp::KeyDecryption {
            master_password: "wrong password".into(),
            key: envelope,
        })
        .await
        .unwrap_err();

    match err {
        ChannelError::Failure(op_err) => assert_eq!(op_err.kind, OpErrorKind::Crypto),
        ChannelError::Terminated => panic!("wrong password is a crypto failure, not termination"),
    }
    channel.terminate();
}

#[tokio::test]
async fn submit_after_terminate_reports_terminated() {
    let channel = spawn_channel();
    channel.terminate();

    let err = channel.submit(encrypt_op("too late")).await.unwrap_err();
    assert!(matches!(err, ChannelError::Terminated));
}

#[tokio::test]
async fn terminate_is_idempotent() {
    let channel = spawn_channel();
    channel.terminate();
    channel.terminate();
}
