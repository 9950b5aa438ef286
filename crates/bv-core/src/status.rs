//! Status sentinels shared between the vault layer and its callers.
//!
//! The 3-digit values mirror transport statuses forwarded unchanged from
//! the server. `DECRYPT_FAILED` is deliberately outside the HTTP range:
//! it means "transport succeeded but local decryption of the payload
//! failed" and is produced only by the master-key lifecycle and the
//! envelope codec failure paths.

pub const OK: u16 = 200;
pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const SERVER_ERROR: u16 = 500;

/// Transport succeeded, local decryption failed. Must never collide with
/// a real transport status.
pub const DECRYPT_FAILED: u16 = 1403;
