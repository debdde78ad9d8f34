//! Logging and observability
//!
//! Structured logging via `tracing`:
//! - human-readable console output on stderr
//! - optional JSON log files with rotation
//!
//! Plugin log lines carry a `plugin` field with the plugin id.
//!
//! # Example
//!
//! ```no_run
//! use svckit::logging::init_logging;
//! use svckit::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(plugin = "orders-db", "Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use svckit::log_error_with_context;
/// use svckit::domain::SvckitError;
///
/// let error = SvckitError::Connection("refused".to_string());
/// log_error_with_context!(&error, "Failed to activate plugins");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a plugin lifecycle transition
///
/// # Example
///
/// ```no_run
/// use svckit::log_plugin_state;
///
/// log_plugin_state!("orders-db", "connected");
/// ```
#[macro_export]
macro_rules! log_plugin_state {
    ($plugin:expr, $state:expr) => {
        tracing::debug!(
            plugin = %$plugin,
            state = %$state,
            "Plugin state changed"
        );
    };
}
