//! Plugin lifecycle trait
//!
//! Every plugin the service host manages goes through the same lifecycle:
//!
//! 1. `init_flags` registers the plugin's options in the shared registry
//! 2. the host parses the command line, applies the config file and resolves
//!    environment overrides
//! 3. `activate` reads the final option values and acquires resources
//! 4. `stop` releases them at shutdown
//!
//! Activation failures are returned to the host; the plugin itself never
//! decides to abort the process.

use crate::config::OptionRegistry;
use crate::domain::errors::ConfigError;
use crate::domain::ids::PluginId;
use crate::domain::Result;
use async_trait::async_trait;
use std::any::Any;

/// What the host hands to a plugin during activation
#[derive(Debug, Clone, Copy)]
pub struct ServiceContext<'a> {
    service_name: &'a str,
    registry: &'a OptionRegistry,
}

impl<'a> ServiceContext<'a> {
    pub fn new(service_name: &'a str, registry: &'a OptionRegistry) -> Self {
        Self {
            service_name,
            registry,
        }
    }

    pub fn service_name(&self) -> &'a str {
        self.service_name
    }

    /// Fully resolved options
    pub fn registry(&self) -> &'a OptionRegistry {
        self.registry
    }
}

/// A component whose lifecycle is driven by the service host
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Downcast to Any for type-specific operations
    ///
    /// Lets application code reach the concrete plugin (for example to obtain
    /// a storage handle) through [`ServiceHost::plugin`](crate::core::ServiceHost::plugin).
    fn as_any(&self) -> &dyn Any;

    /// Identifier used to address this plugin instance
    fn id(&self) -> &PluginId;

    /// Register this plugin's options
    ///
    /// # Errors
    ///
    /// Returns an error if an option name is already taken.
    fn init_flags(&mut self, registry: &mut OptionRegistry) -> std::result::Result<(), ConfigError>;

    /// Acquire resources using the resolved options
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin could not be brought up. The plugin
    /// stays inactive and may be activated again.
    async fn activate(&mut self, ctx: &ServiceContext<'_>) -> Result<()>;

    /// Release resources. Calling `stop` more than once is allowed.
    async fn stop(&mut self) -> Result<()>;
}
