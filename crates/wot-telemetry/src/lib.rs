//! # WoT Telemetry
//!
//! Structured logging for the web-of-trust updater.
//!
//! The updater itself only emits `tracing` events; this crate installs the
//! subscriber that formats and filters them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wot_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_logging(&config).expect("failed to init logging");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WOT_SERVICE_NAME` | `wot-updater` | Service name attached to logs |
//! | `WOT_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `WOT_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `WOT_JSON_LOGS` | `false` (`true` in containers) | JSON instead of pretty output |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed
    #[error("Invalid log filter '{directive}': {reason}")]
    Filter {
        /// Directive that failed to parse
        directive: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed
    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),
}
