//! Logging setup.
//!
//! The engine logs through the `log` facade only; hosts install a backend.
//! [`init_logging`] installs `env_logger` for binaries that have none.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
