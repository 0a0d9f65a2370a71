//! cPOP Logging
//!
//! One place to install the `tracing` subscriber for cPOP binaries.
//!
//! ## Usage
//!
//! ```no_run
//! use cpop_logging::{init, LogLevel};
//!
//! // Quiet by default, debug with -v, trace with -vv
//! init(LogLevel::from_verbosity(1)).expect("logging already initialized");
//! ```
//!
//! `RUST_LOG` overrides the level when set.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    /// Default: placeholder-hasher warnings stay visible
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map a `-v` count onto a level
    ///
    /// - `0` → `Warn`
    /// - `1` → `Info`
    /// - `2` → `Debug`
    /// - `3+` → `Trace`
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn as_directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Error, Debug)]
#[error("Failed to initialize logging: {0}")]
pub struct LoggingError(String);

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays machine-readable.
///
/// Fails if a subscriber is already installed.
pub fn init(level: LogLevel) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| LoggingError(e.to_string()))
}

/// Initialize logging for tests (captured by the test harness)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
