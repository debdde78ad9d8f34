//! MongoDB storage plugin
//!
//! [`MongoStore`] is the plugin the host drives; [`MongoHandle`] is what
//! application code uses once the plugin is connected.

pub mod config;
pub mod handle;
pub mod store;

pub use config::{MongoConfig, MongoOptionNames, OPERATION_TIMEOUT};
pub use handle::MongoHandle;
pub use store::{AdapterState, MongoStore};
