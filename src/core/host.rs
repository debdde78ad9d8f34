//! Service host - drives the plugin lifecycle
//!
//! The host owns the option registry and the plugins. A typical startup:
//!
//! 1. [`ServiceHost::add_plugin`] for every plugin
//! 2. [`ServiceHost::init_flags`] so each plugin registers its options
//! 3. command line parsing ([`ServiceHost::augment_command`],
//!    [`ServiceHost::apply_matches`])
//! 4. [`ServiceHost::apply_config`] for the `[options]` table of the config file
//! 5. [`ServiceHost::resolve_env`] for environment overrides
//! 6. [`ServiceHost::activate_all`], then [`ServiceHost::stop_all`] at shutdown

use crate::adapters::plugin::{Plugin, ServiceContext};
use crate::config::{env, EnvConfig, OptionRegistry, ServiceConfig};
use crate::domain::errors::{ConfigError, SvckitError};
use crate::domain::ids::PluginId;
use crate::domain::Result;
use clap::{ArgMatches, Command};

/// Owner of the option registry and of every plugin
pub struct ServiceHost {
    name: String,
    env: EnvConfig,
    registry: OptionRegistry,
    plugins: Vec<Box<dyn Plugin>>,
    flags_initialized: bool,
}

impl ServiceHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            env: EnvConfig::default(),
            registry: OptionRegistry::new(),
            plugins: Vec::new(),
            flags_initialized: false,
        }
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env = env;
        self
    }

    pub fn set_env(&mut self, env: EnvConfig) {
        self.env = env;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &EnvConfig {
        &self.env
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OptionRegistry {
        &mut self.registry
    }

    /// Adds a plugin; plugins are activated in the order they are added
    ///
    /// # Errors
    ///
    /// Returns [`SvckitError::Plugin`] if the id is taken or options were
    /// already registered.
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) -> Result<()> {
        if self.flags_initialized {
            return Err(SvckitError::Plugin(format!(
                "plugin {} added after options were registered",
                plugin.id()
            )));
        }
        if self.plugins.iter().any(|p| p.id() == plugin.id()) {
            return Err(SvckitError::Plugin(format!(
                "plugin {} is already registered",
                plugin.id()
            )));
        }
        tracing::debug!(plugin = %plugin.id(), "Plugin added");
        self.plugins.push(Box::new(plugin));
        Ok(())
    }

    pub fn plugin_ids(&self) -> impl Iterator<Item = &PluginId> {
        self.plugins.iter().map(|p| p.id())
    }

    /// The plugin with this id, if it exists and is a `P`
    pub fn plugin<P: Plugin + 'static>(&self, id: &str) -> Option<&P> {
        self.plugins
            .iter()
            .find(|p| p.id().as_str() == id)
            .and_then(|p| p.as_any().downcast_ref::<P>())
    }

    /// Lets every plugin register its options
    ///
    /// # Errors
    ///
    /// Returns the first registration error, e.g. two plugins sharing a prefix.
    pub fn init_flags(&mut self) -> std::result::Result<(), ConfigError> {
        for plugin in &mut self.plugins {
            plugin.init_flags(&mut self.registry)?;
        }
        self.flags_initialized = true;
        tracing::debug!(options = self.registry.len(), "Plugin options registered");
        Ok(())
    }

    /// Adds one argument per registered option to `cmd`
    pub fn augment_command(&self, cmd: Command) -> Command {
        self.registry.augment_command(cmd)
    }

    /// Records options given on the command line as explicit
    pub fn apply_matches(&mut self, matches: &ArgMatches) -> std::result::Result<(), ConfigError> {
        self.registry.apply_matches(matches)
    }

    /// Applies the `[options]` table of a loaded configuration file
    pub fn apply_config(&mut self, config: &ServiceConfig) -> std::result::Result<(), ConfigError> {
        if config.options.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = config.options.len(), "Applying options from configuration file");
        self.registry.apply_file_options(&config.options)
    }

    /// Applies environment overrides to every option not set explicitly
    ///
    /// # Errors
    ///
    /// Returns the first conversion failure; options after it are untouched.
    pub fn resolve_env(&mut self) -> std::result::Result<(), ConfigError> {
        env::resolve(&self.env.prefix, &mut self.registry)
    }

    /// Same as [`resolve_env`](Self::resolve_env) with a custom variable lookup
    pub fn resolve_env_with<F>(&mut self, lookup: F) -> std::result::Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        env::resolve_with(&self.env.prefix, &mut self.registry, lookup)
    }

    /// Activates plugins in insertion order
    ///
    /// # Errors
    ///
    /// Stops at the first failing plugin and returns its error. Plugins
    /// activated before it stay active; call [`stop_all`](Self::stop_all).
    pub async fn activate_all(&mut self) -> Result<()> {
        if !self.flags_initialized {
            return Err(SvckitError::Plugin(
                "plugins activated before their options were registered".to_string(),
            ));
        }
        let ctx = ServiceContext::new(&self.name, &self.registry);
        for plugin in &mut self.plugins {
            tracing::debug!(plugin = %plugin.id(), "Activating plugin");
            plugin.activate(&ctx).await?;
        }
        tracing::info!(service = %self.name, plugins = self.plugins.len(), "All plugins activated");
        Ok(())
    }

    /// Stops every plugin in reverse insertion order
    ///
    /// All plugins are stopped even if some fail; the first error is returned.
    pub async fn stop_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for plugin in self.plugins.iter_mut().rev() {
            if let Err(e) = plugin.stop().await {
                tracing::error!(plugin = %plugin.id(), error = %e, "Failed to stop plugin");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mongodb::{AdapterState, MongoStore};
    use crate::config::OptionSource;
    use std::collections::HashMap;

    fn host() -> ServiceHost {
        let mut host = ServiceHost::new("svc").with_env(EnvConfig::new("APP_"));
        host.add_plugin(MongoStore::new("orders-db", "db").unwrap())
            .unwrap();
        host.init_flags().unwrap();
        host
    }

    #[test]
    fn test_duplicate_plugin_id() {
        let mut host = ServiceHost::new("svc");
        host.add_plugin(MongoStore::new("store", "a").unwrap()).unwrap();
        let err = host
            .add_plugin(MongoStore::new("store", "b").unwrap())
            .unwrap_err();
        assert!(matches!(err, SvckitError::Plugin(_)));
    }

    #[test]
    fn test_shared_prefix_rejected() {
        let mut host = ServiceHost::new("svc");
        host.add_plugin(MongoStore::new("one", "db").unwrap()).unwrap();
        host.add_plugin(MongoStore::new("two", "db").unwrap()).unwrap();
        let err = host.init_flags().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateOption(_)));
    }

    #[test]
    fn test_add_after_init_flags() {
        let mut host = host();
        let err = host
            .add_plugin(MongoStore::new("late", "late").unwrap())
            .unwrap_err();
        assert!(matches!(err, SvckitError::Plugin(_)));
    }

    #[test]
    fn test_plugin_downcast() {
        let host = host();
        let store = host.plugin::<MongoStore>("orders-db").unwrap();
        assert_eq!(store.state(), AdapterState::Configured);
        assert!(host.plugin::<MongoStore>("missing").is_none());
        assert_eq!(
            host.plugin_ids().map(|id| id.as_str()).collect::<Vec<_>>(),
            vec!["orders-db"]
        );
    }

    #[test]
    fn test_resolve_env_uses_prefix() {
        let mut host = host();
        let vars: HashMap<&str, &str> = [("APP_DB_MAX_CON", "75")].into_iter().collect();
        host.resolve_env_with(|name: &str| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        let option = host.registry().get("db_max_con").unwrap();
        assert_eq!(host.registry().get_int("db_max_con").unwrap(), 75);
        assert_eq!(option.source(), OptionSource::Env);
    }

    #[test]
    fn test_apply_config_options() {
        let mut host = host();
        let config = crate::config::loader::parse_config(
            "[options]\ndb_db_name = \"orders\"\ndb_max_con = 20\n",
        )
        .unwrap();
        host.apply_config(&config).unwrap();
        assert_eq!(host.registry().get_string("db_db_name").unwrap(), "orders");
        assert_eq!(host.registry().get_int("db_max_con").unwrap(), 20);
    }

    #[tokio::test]
    async fn test_activate_before_init_flags() {
        let mut host = ServiceHost::new("svc");
        host.add_plugin(MongoStore::new("store", "db").unwrap()).unwrap();
        assert!(host.activate_all().await.is_err());
    }

    #[tokio::test]
    async fn test_activate_and_stop_disabled() {
        let mut host = host();
        host.activate_all().await.unwrap();
        assert!(host.plugin::<MongoStore>("orders-db").unwrap().is_disabled());

        host.stop_all().await.unwrap();
        host.stop_all().await.unwrap();
        assert_eq!(
            host.plugin::<MongoStore>("orders-db").unwrap().state(),
            AdapterState::Stopped
        );
    }
}
