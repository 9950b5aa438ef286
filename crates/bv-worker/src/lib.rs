//! bv-worker: runs every cryptographic operation off the caller's thread
//!
//! Argon2id at protocol costs blocks for hundreds of milliseconds, so
//! nothing interactive may run it inline. A `CryptoChannel` owns one
//! dedicated worker thread; callers submit an operation and await a
//! future, correlated back by a random 128-bit request id. The worker
//! processes requests one at a time in arrival order, but callers must
//! never assume response order equals request order — delivery is
//! strictly by id match.

pub mod channel;
pub mod types;
pub mod worker;

pub use channel::{ChannelError, CryptoChannel};
pub use types::{CryptoOp, CryptoRequest, CryptoResponse, OpError, OpErrorKind, Outcome};
