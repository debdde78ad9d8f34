//! Domain types for svckit.
//!
//! The domain layer provides:
//! - **Error types** ([`SvckitError`], [`ConfigError`])
//! - **Result type alias** ([`Result`])
//! - **Identifiers** ([`PluginId`])
//! - **Operation context** ([`context::OpContext`])
//!
//! # Error Handling
//!
//! Library operations return [`Result<T, SvckitError>`]; registry and resolver
//! operations return [`ConfigError`] directly, which converts into
//! [`SvckitError`] with the `?` operator:
//!
//! ```rust
//! use svckit::config::OptionRegistry;
//! use svckit::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let mut registry = OptionRegistry::new();
//!     registry.register_int("max.con", 50, "max connections")?;
//!     registry.set("max.con", "75")?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod result;

pub use errors::{ConfigError, SvckitError};
pub use ids::PluginId;
pub use result::Result;
