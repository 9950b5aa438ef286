pub mod config;
pub mod error;
pub mod status;

pub use error::{VaultError, VaultResult};
