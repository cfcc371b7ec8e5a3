//! Logging setup.
//!
//! The core only talks to the `log` facade. GPU validation errors, failed
//! resource loads and dropped glyphs all end up here rather than being
//! returned to the caller.

mod init;

pub use init::{init_logging, LoggingConfig};
