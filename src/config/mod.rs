//! Configuration management for svckit.
//!
//! Two layers live here:
//!
//! - The **option registry** ([`OptionRegistry`]): typed options declared by
//!   plugins at startup, each remembering whether its value was supplied
//!   explicitly, came from the config file, from the environment, or is still
//!   the default.
//! - The **service configuration file** ([`ServiceConfig`]): a TOML file with
//!   application, logging and environment settings, plus an `[options]` table
//!   of plugin option values.
//!
//! # Precedence
//!
//! From strongest to weakest: command line, environment, config file,
//! registered default. The environment resolver ([`resolve`]) only touches
//! options that were not set explicitly.
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [env]
//! prefix = "APP_"
//!
//! [options]
//! db_uri = "mongodb://localhost:27017"
//! db_db_name = "orders"
//! db_pwd = "${ORDERS_DB_PASSWORD}"
//! ```
//!
//! With the file above, `APP_DB_MAX_CON=75` raises the pool size and
//! `--db_uri mongodb://other:27017` on the command line wins over both the
//! file and `APP_DB_URI`.

pub mod env;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use env::{env_var_name, resolve, resolve_with};
pub use loader::{load_config, load_config_or_default};
pub use registry::{ConfigOption, OptionRegistry, OptionSource, OptionValue};
pub use schema::{ApplicationConfig, EnvConfig, LoggingConfig, ServiceConfig};
pub use secret::{secret_string, SecretString, SecretValue};
