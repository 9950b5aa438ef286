//! Caller-side channel: pending map, correlation, termination
//!
//! One `CryptoChannel` owns one worker thread and one dispatcher
//! thread. The pending map is mutated only here — submissions insert,
//! the dispatcher removes — so no other lock discipline is needed.
//!
//! There is no timeout or cancellation primitive: a caller that needs a
//! timeout races the future against its own timer and discards the
//! loser. The worker computation is never interrupted; an abandoned
//! Argon2id derivation still runs to completion.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use bv_crypto::kdf::KdfParams;

use crate::types::{CryptoOp, CryptoRequest, CryptoResponse, OpError, Outcome};
use crate::worker;

type PendingMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<Result<String, OpError>>>>>;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel was terminated with this request in flight, or the
    /// submission arrived after termination. Distinct from an operation
    /// failure: no result exists and none ever will.
    #[error("crypto channel terminated")]
    Terminated,

    /// The worker executed the operation and it failed.
    #[error("crypto operation failed: {0}")]
    Failure(OpError),
}

/// An explicitly owned handle to the crypto worker.
///
/// Pass it (or an `Arc` of it) to whatever needs cryptographic
/// services; lifetime and termination are explicit, not process-wide.
pub struct CryptoChannel {
    requests: Mutex<Option<mpsc::Sender<CryptoRequest>>>,
    pending: PendingMap,
    worker: Mutex<Option<JoinHandle<()>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl CryptoChannel {
    /// Start the worker and dispatcher threads.
    pub fn spawn(params: KdfParams) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<CryptoRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<CryptoResponse>();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let worker = std::thread::Builder::new()
            .name("bv-crypto-worker".into())
            .spawn(move || worker::run(req_rx, resp_tx, params))
            .expect("spawning crypto worker thread");

        let dispatch_pending = Arc::clone(&pending);
        let dispatcher = std::thread::Builder::new()
            .name("bv-crypto-dispatch".into())
            .spawn(move || dispatch_loop(resp_rx, dispatch_pending))
            .expect("spawning crypto dispatcher thread");

        Self {
            requests: Mutex::new(Some(req_tx)),
            pending,
            worker: Mutex::new(Some(worker)),
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Submit an operation; resolves when the worker's response for this
    /// request id arrives. Concurrent submissions are fine — results are
    /// matched by id, never by order.
    pub async fn submit(&self, op: CryptoOp) -> Result<String, ChannelError> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        // Insert before sending so a fast response always finds its entry.
        self.pending
            .lock()
            .expect("pending map lock poisoned")
            .insert(id, tx);

        let sent = {
            let guard = self.requests.lock().expect("request sender lock poisoned");
            match guard.as_ref() {
                Some(sender) => sender.send(CryptoRequest { id, op }).is_ok(),
                None => false,
            }
        };
        if !sent {
            self.pending
                .lock()
                .expect("pending map lock poisoned")
                .remove(&id);
            return Err(ChannelError::Terminated);
        }

        match rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(error)) => Err(ChannelError::Failure(error)),
            // Sender dropped without resolving: channel wound down.
            Err(_) => Err(ChannelError::Terminated),
        }
    }

    /// Shut the channel down.
    ///
    /// The worker finishes its current operation, then exits; the
    /// dispatcher abandons every still-pending entry. Their callers
    /// observe `ChannelError::Terminated` — never a fabricated result.
    pub fn terminate(&self) {
        let sender = self
            .requests
            .lock()
            .expect("request sender lock poisoned")
            .take();
        drop(sender);

        if let Some(handle) = self.worker.lock().expect("worker handle lock poisoned").take() {
            let _ = handle.join();
        }
        if let Some(handle) = self
            .dispatcher
            .lock()
            .expect("dispatcher handle lock poisoned")
            .take()
        {
            let _ = handle.join();
        }
        tracing::debug!("crypto channel terminated");
    }
}

impl Drop for CryptoChannel {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn dispatch_loop(responses: mpsc::Receiver<CryptoResponse>, pending: PendingMap) {
    while let Ok(response) = responses.recv() {
        resolve_response(&pending, response);
    }
    // Worker gone: abandon whatever is still pending. Dropping the
    // oneshot senders is what the callers observe as termination.
    let abandoned: usize = {
        let mut map = pending.lock().expect("pending map lock poisoned");
        let n = map.len();
        map.clear();
        n
    };
    if abandoned > 0 {
        tracing::warn!(abandoned, "crypto channel closed with requests in flight");
    }
}

/// Look up and remove the matching pending entry; duplicate or stale
/// responses are discarded silently.
fn resolve_response(pending: &PendingMap, response: CryptoResponse) {
    let entry = pending
        .lock()
        .expect("pending map lock poisoned")
        .remove(&response.id);
    match entry {
        Some(tx) => {
            let result = match response.outcome {
                Outcome::Success { result } => Ok(result),
                Outcome::Failure { error } => Err(error),
            };
            // Caller may have dropped its future; that is its business.
            let _ = tx.send(result);
        }
        None => {
            tracing::debug!(id = %response.id, "discarding stale response");
        }
    }
}
