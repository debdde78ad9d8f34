// svckit - service host with environment-configurable plugins
// Copyright (c) 2025 svckit Contributors
// Licensed under the MIT License

//! # svckit - service host with environment-configurable plugins
//!
//! svckit hosts plugins whose options can be set on the command line, in a
//! TOML file, or through environment variables, and ships a MongoDB storage
//! plugin.
//!
//! ## Overview
//!
//! This library provides:
//! - **Options**: a typed registry that remembers where each value came from
//! - **Environment overrides**: `<PREFIX><OPTION_NAME>` variables applied to
//!   every option not set explicitly
//! - **Plugin lifecycle**: register options, activate, stop
//! - **Storage**: a pooled MongoDB client with index creation and inserts
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - The service host driving plugins
//! - [`adapters`] - Plugins (MongoDB storage)
//! - [`domain`] - Errors, identifiers and operation context
//! - [`config`] - Option registry, environment resolver, configuration file
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svckit::adapters::mongodb::MongoStore;
//! use svckit::config::EnvConfig;
//! use svckit::core::ServiceHost;
//! use svckit::domain::context::OpContext;
//! use mongodb::bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut host = ServiceHost::new("orders").with_env(EnvConfig::new("ORDERS_"));
//!     host.add_plugin(MongoStore::new("orders-db", "db")?)?;
//!     host.init_flags()?;
//!
//!     // ORDERS_DB_URI=mongodb://localhost:27017 ORDERS_DB_DB_NAME=orders
//!     host.resolve_env()?;
//!     host.activate_all().await?;
//!
//!     if let Some(handle) = host.plugin::<MongoStore>("orders-db").and_then(|s| s.handle()) {
//!         handle.create_index("orders", doc! { "order_no": 1 }, true).await;
//!         handle
//!             .insert_one(&OpContext::background(), "orders", &doc! { "order_no": 1 })
//!             .await?;
//!     }
//!
//!     host.stop_all().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], an alias over
//! [`domain::SvckitError`]. Registry and resolver failures are
//! [`domain::ConfigError`]s and convert with `?`:
//!
//! ```rust
//! use svckit::config::{resolve_with, OptionRegistry};
//! use svckit::domain::ConfigError;
//!
//! let mut registry = OptionRegistry::new();
//! registry.register_int("max.con", 50, "max connections").unwrap();
//!
//! let err = resolve_with("APP_", &mut registry, |name: &str| {
//!     (name == "APP_MAX_CON").then(|| "abc".to_string())
//! })
//! .unwrap_err();
//! assert_eq!(
//!     err,
//!     ConfigError::Conversion { name: "max.con".to_string(), value: "abc".to_string() }
//! );
//! ```
//!
//! ## Logging
//!
//! svckit uses structured logging with the `tracing` crate. Plugin log lines
//! carry the plugin id:
//!
//! ```rust,no_run
//! tracing::info!(plugin = "orders-db", database = "orders", "Connected to database");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
