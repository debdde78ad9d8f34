//! CLI command implementations
//!
//! Every command returns its process exit code; `Err` is reserved for fatal
//! errors (exit code 5).

pub mod check;
pub mod init;
pub mod insert;
pub mod ping;
