//! Plugins managed by the service host.
//!
//! - [`plugin`] - the lifecycle trait every plugin implements
//! - [`mongodb`] - MongoDB storage plugin
//!
//! # Design Pattern
//!
//! Plugins follow the **Adapter Pattern** to isolate external dependencies.
//! The host only sees the [`plugin::Plugin`] trait; application code reaches
//! the concrete plugin by downcasting:
//!
//! ```rust,no_run
//! use svckit::adapters::mongodb::MongoStore;
//! use svckit::core::ServiceHost;
//!
//! # async fn example(host: &ServiceHost) -> Option<()> {
//! let store = host.plugin::<MongoStore>("orders-db")?;
//! let handle = store.handle()?;
//! println!("bound to {}", handle.database_name());
//! # Some(())
//! # }
//! ```

pub mod mongodb;
pub mod plugin;
