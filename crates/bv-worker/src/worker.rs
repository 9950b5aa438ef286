//! The worker loop: sequential execution on a dedicated thread
//!
//! Blocking from its own point of view, non-blocking from the caller's.
//! Every failure is converted to a `Failure` outcome before crossing
//! the thread boundary; no panic or raw error escapes silently.

use std::sync::mpsc::{Receiver, Sender};

use secrecy::ExposeSecret;

use bv_crypto::kdf::KdfParams;
use bv_crypto::{decrypt_item, encrypt_item, unwrap_recovery_key, wrap_recovery_key};

use crate::types::{CryptoOp, CryptoRequest, CryptoResponse, Outcome};

/// Process requests to completion, one at a time in arrival order,
/// until the request sender is dropped.
pub fn run(requests: Receiver<CryptoRequest>, responses: Sender<CryptoResponse>, params: KdfParams) {
    while let Ok(request) = requests.recv() {
        let op_name = request.op.type_name();
        let outcome = execute(&request.op, &params);
        if let Outcome::Failure { error } = &outcome {
            tracing::debug!(id = %request.id, op = op_name, kind = %error.kind, "operation failed");
        }
        let response = CryptoResponse {
            id: request.id,
            outcome,
        };
        if responses.send(response).is_err() {
            // Dispatcher gone; nobody is left to correlate results.
            break;
        }
    }
    tracing::debug!("crypto worker: request channel closed, exiting");
}

fn execute(op: &CryptoOp, params: &KdfParams) -> Outcome {
    let result = match op {
        CryptoOp::ItemEncryption {
            master_key,
            item_plaintext,
        } => encrypt_item(master_key, item_plaintext, params),
        CryptoOp::ItemDecryption {
            master_key,
            encrypted_item,
        } => decrypt_item(master_key, encrypted_item, params),
        CryptoOp::KeyEncryption {
            master_password,
            key,
        } => wrap_recovery_key(master_password, key, params),
        CryptoOp::KeyDecryption {
            master_password,
            key,
        } => unwrap_recovery_key(master_password, key, params)
            .map(|recovered| recovered.expose_secret().to_string()),
    };

    match result {
        Ok(result) => Outcome::Success { result },
        Err(err) => Outcome::Failure { error: err.into() },
    }
}
