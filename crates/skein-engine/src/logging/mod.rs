//! Logging utilities.
//!
//! Centralizes logger initialization. The engine itself only uses the `log`
//! facade; embedders that already install their own logger can skip this.

mod init;

pub use init::{LoggingConfig, init_logging};
