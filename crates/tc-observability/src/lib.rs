//! # tc-observability
//!
//! Structured logging for the Triage Console.
//!
//! Log output goes to stderr so that command output on stdout stays
//! machine-readable in `--format json` mode.

pub mod logging;

pub use logging::{init_logging_with_config, parse_level, LoggingConfig};
