//! MongoDB storage plugin

use super::config::{MongoConfig, MongoOptionNames, OPERATION_TIMEOUT};
use super::handle::MongoHandle;
use crate::adapters::plugin::{Plugin, ServiceContext};
use crate::config::OptionRegistry;
use crate::domain::errors::{ConfigError, SvckitError};
use crate::domain::ids::PluginId;
use crate::domain::Result;
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ReadPreference, SelectionCriteria};
use mongodb::Client;
use std::any::Any;
use std::fmt;

/// Lifecycle position of a [`MongoStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Created, options not registered yet
    Uninitialized,
    /// Options registered; activation has not succeeded yet
    Configured,
    /// Activated with an empty URI, nothing was connected
    Disabled,
    Connected,
    Stopped,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdapterState::Uninitialized => "uninitialized",
            AdapterState::Configured => "configured",
            AdapterState::Disabled => "disabled",
            AdapterState::Connected => "connected",
            AdapterState::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// Storage plugin backed by a pooled MongoDB client
///
/// Registers six options under its prefix (see [`MongoOptionNames`]) and, on
/// activation, connects to the configured database and pings the primary.
/// An empty URI disables the plugin without error.
///
/// # Examples
///
/// ```rust
/// use svckit::adapters::mongodb::{AdapterState, MongoStore};
/// use svckit::adapters::plugin::{Plugin, ServiceContext};
/// use svckit::config::OptionRegistry;
///
/// # async fn example() -> svckit::domain::Result<()> {
/// let mut store = MongoStore::new("orders-db", "db")?;
/// let mut registry = OptionRegistry::new();
/// store.init_flags(&mut registry)?;
///
/// // db_uri was left empty, so activation is a no-op
/// store.activate(&ServiceContext::new("orders", &registry)).await?;
/// assert_eq!(store.state(), AdapterState::Disabled);
/// assert!(store.handle().is_none());
/// # Ok(())
/// # }
/// ```
pub struct MongoStore {
    id: PluginId,
    names: MongoOptionNames,
    state: AdapterState,
    client: Option<Client>,
    handle: Option<MongoHandle>,
}

impl MongoStore {
    /// Creates a plugin whose options are named `{prefix}_<option>`
    ///
    /// # Errors
    ///
    /// Returns [`SvckitError::Plugin`] if `id` is blank.
    pub fn new(id: impl Into<String>, prefix: &str) -> Result<Self> {
        let id = PluginId::new(id).map_err(SvckitError::Plugin)?;
        Ok(Self {
            id,
            names: MongoOptionNames::new(prefix),
            state: AdapterState::Uninitialized,
            client: None,
            handle: None,
        })
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn option_names(&self) -> &MongoOptionNames {
        &self.names
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// True once activation found an empty URI
    pub fn is_disabled(&self) -> bool {
        self.state == AdapterState::Disabled
    }

    /// Handle to the bound database, present only while connected
    pub fn handle(&self) -> Option<MongoHandle> {
        self.handle.clone()
    }

    fn set_state(&mut self, state: AdapterState) {
        if self.state != state {
            crate::log_plugin_state!(self.id, state);
            self.state = state;
        }
    }

    async fn connect(&self, config: &MongoConfig, app_name: &str) -> Result<(Client, MongoHandle)> {
        let (options, database_name) =
            tokio::time::timeout(OPERATION_TIMEOUT, config.client_options(app_name))
                .await
                .map_err(|_| {
                    SvckitError::Connection(format!(
                        "resolving connection string timed out after {}s",
                        OPERATION_TIMEOUT.as_secs()
                    ))
                })??;

        let client = Client::with_options(options)
            .map_err(|e| SvckitError::Connection(format!("failed to create client: {e}")))?;

        let admin = client.database("admin");
        let ping = admin
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary));

        let outcome = match tokio::time::timeout(OPERATION_TIMEOUT, ping).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(SvckitError::Reachability(format!(
                "primary did not answer ping: {e}"
            ))),
            Err(_) => Err(SvckitError::Reachability(format!(
                "ping timed out after {}s",
                OPERATION_TIMEOUT.as_secs()
            ))),
        };

        if let Err(e) = outcome {
            client.shutdown().await;
            return Err(e);
        }

        let handle = MongoHandle::new(self.id.clone(), client.database(&database_name));
        Ok((client, handle))
    }
}

impl fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStore")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("database", &self.handle.as_ref().map(|h| h.database_name()))
            .finish()
    }
}

#[async_trait]
impl Plugin for MongoStore {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn id(&self) -> &PluginId {
        &self.id
    }

    fn init_flags(&mut self, registry: &mut OptionRegistry) -> std::result::Result<(), ConfigError> {
        self.names.register(registry)?;
        self.set_state(AdapterState::Configured);
        tracing::debug!(plugin = %self.id, uri_option = %self.names.uri, "Storage options registered");
        Ok(())
    }

    async fn activate(&mut self, ctx: &ServiceContext<'_>) -> Result<()> {
        match self.state {
            AdapterState::Uninitialized => {
                return Err(SvckitError::Plugin(format!(
                    "plugin {} activated before its options were registered",
                    self.id
                )));
            }
            AdapterState::Stopped => {
                return Err(SvckitError::Plugin(format!(
                    "plugin {} cannot be activated after stop",
                    self.id
                )));
            }
            AdapterState::Connected | AdapterState::Disabled => return Ok(()),
            AdapterState::Configured => {}
        }

        let config = MongoConfig::from_registry(&self.names, ctx.registry())?;
        if config.is_disabled() {
            tracing::info!(
                plugin = %self.id,
                option = %self.names.uri,
                "No connection string configured, storage disabled"
            );
            self.set_state(AdapterState::Disabled);
            return Ok(());
        }

        let uri = config.redacted_uri();
        match self.connect(&config, ctx.service_name()).await {
            Ok((client, handle)) => {
                tracing::info!(
                    plugin = %self.id,
                    database = %handle.database_name(),
                    uri = %uri,
                    max_connections = config.max_connections,
                    "Connected to database"
                );
                self.client = Some(client);
                self.handle = Some(handle);
                self.set_state(AdapterState::Connected);
                Ok(())
            }
            Err(e) => {
                tracing::error!(plugin = %self.id, uri = %uri, error = %e, "Failed to activate storage");
                Err(e)
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        self.handle = None;
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            tracing::info!(plugin = %self.id, "Database connection closed");
        }
        if self.state != AdapterState::Uninitialized {
            self.set_state(AdapterState::Stopped);
        }
        Ok(())
    }
}
