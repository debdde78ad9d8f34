//! Service host orchestration for svckit.
//!
//! # Modules
//!
//! - [`host`] - plugin registration, option resolution and lifecycle
//!
//! # Example
//!
//! ```rust,no_run
//! use svckit::adapters::mongodb::MongoStore;
//! use svckit::config::EnvConfig;
//! use svckit::core::ServiceHost;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut host = ServiceHost::new("orders").with_env(EnvConfig::new("ORDERS_"));
//! host.add_plugin(MongoStore::new("orders-db", "db")?)?;
//! host.init_flags()?;
//! host.resolve_env()?;
//! host.activate_all().await?;
//!
//! // ... serve ...
//!
//! host.stop_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod host;

pub use host::ServiceHost;
