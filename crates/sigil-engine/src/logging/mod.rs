//! Logging utilities.
//!
//! Centralizes logger initialization. The engine itself only depends on the
//! `log` facade; `env_logger` is wired up here for binaries that want it.

mod init;

pub use init::{init_logging, LoggingConfig};
