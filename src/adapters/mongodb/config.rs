//! Storage plugin options and connection configuration

use crate::config::{OptionRegistry, SecretString};
use crate::domain::errors::{ConfigError, SvckitError};
use crate::domain::Result;
use mongodb::options::{ClientOptions, Credential};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Bound on every network step of activation (connect, ping) and on index creation
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_MAX_CONNECTIONS: i64 = 50;
pub const DEFAULT_MAX_IDLE_TIME_MS: i64 = 1000;

/// Registry names of one plugin instance's options
///
/// With prefix `db` the names are `db_uri`, `db_db_name`, `db_user_name`,
/// `db_pwd`, `db_max_con` and `db_idle_time`; with an empty prefix the
/// leading `db_` is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoOptionNames {
    pub uri: String,
    pub database_name: String,
    pub username: String,
    pub password: String,
    pub max_connections: String,
    pub max_idle_time: String,
}

impl MongoOptionNames {
    pub fn new(prefix: &str) -> Self {
        let name = |suffix: &str| {
            if prefix.is_empty() {
                suffix.to_string()
            } else {
                format!("{prefix}_{suffix}")
            }
        };
        Self {
            uri: name("uri"),
            database_name: name("db_name"),
            username: name("user_name"),
            password: name("pwd"),
            max_connections: name("max_con"),
            max_idle_time: name("idle_time"),
        }
    }

    /// Declares the options with their defaults
    pub fn register(&self, registry: &mut OptionRegistry) -> std::result::Result<(), ConfigError> {
        registry.register_string(&*self.uri, "", "uri connection string")?;
        registry.register_string(&*self.database_name, "", "name of database")?;
        registry.register_string(
            &*self.username,
            "",
            "user name used to connect to the database",
        )?;
        registry.register_secret(
            &*self.password,
            "",
            "password of the user used to connect to the database",
        )?;
        registry.register_int(
            &*self.max_connections,
            DEFAULT_MAX_CONNECTIONS,
            "maximum number of pooled connections to the database",
        )?;
        registry.register_int(
            &*self.max_idle_time,
            DEFAULT_MAX_IDLE_TIME_MS,
            "maximum idle time of a pooled connection, in milliseconds",
        )?;
        Ok(())
    }
}

/// Connection settings of one storage plugin instance
///
/// Read from the registry once, during activation.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database_name: String,
    pub username: String,
    pub password: SecretString,
    pub max_connections: u32,
    pub max_idle_time: Duration,
}

impl MongoConfig {
    /// Reads and validates the options named by `names`
    pub fn from_registry(
        names: &MongoOptionNames,
        registry: &OptionRegistry,
    ) -> std::result::Result<Self, ConfigError> {
        let max_connections = registry.get_int(&names.max_connections)?;
        let max_connections = u32::try_from(max_connections)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "{} must be between 1 and {}, got {max_connections}",
                    names.max_connections,
                    u32::MAX
                ))
            })?;

        let idle_ms = registry.get_int(&names.max_idle_time)?;
        let idle_ms = u64::try_from(idle_ms).map_err(|_| {
            ConfigError::Validation(format!(
                "{} cannot be negative, got {idle_ms}",
                names.max_idle_time
            ))
        })?;

        Ok(Self {
            uri: registry.get_string(&names.uri)?,
            database_name: registry.get_string(&names.database_name)?,
            username: registry.get_string(&names.username)?,
            password: registry.get_secret(&names.password)?,
            max_connections,
            max_idle_time: Duration::from_millis(idle_ms),
        })
    }

    /// An empty URI switches the plugin off
    pub fn is_disabled(&self) -> bool {
        self.uri.is_empty()
    }

    /// The URI with any password removed, for log lines
    pub fn redacted_uri(&self) -> String {
        match url::Url::parse(&self.uri) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("***"));
                parsed.to_string()
            }
            Ok(_) => self.uri.clone(),
            // Multi-host URIs are not valid URLs; strip everything before '@'
            Err(_) => match (self.uri.find("://"), self.uri.rfind('@')) {
                (Some(scheme_end), Some(at)) if at > scheme_end => {
                    format!("{}***{}", &self.uri[..scheme_end + 3], &self.uri[at..])
                }
                _ => self.uri.clone(),
            },
        }
    }

    /// Credential for the configured user, authenticating against `source`
    ///
    /// `None` when no user name is configured, in which case credentials
    /// embedded in the URI (if any) are used as-is.
    pub fn credential(&self, source: &str) -> Option<Credential> {
        if self.username.is_empty() {
            return None;
        }
        Some(
            Credential::builder()
                .username(self.username.clone())
                .password(self.password.expose_secret().as_ref().to_string())
                .source(source.to_string())
                .build(),
        )
    }

    /// Builds client options and picks the database to bind to
    ///
    /// The configured database name wins; otherwise the database in the URI
    /// path is used.
    ///
    /// # Errors
    ///
    /// Returns [`SvckitError::Connection`] if the URI cannot be parsed and a
    /// configuration error if no database name is available.
    pub async fn client_options(&self, app_name: &str) -> Result<(ClientOptions, String)> {
        let mut options = ClientOptions::parse(self.uri.as_str())
            .await
            .map_err(|e| SvckitError::Connection(format!("invalid connection string: {e}")))?;

        let database_name = if self.database_name.is_empty() {
            options.default_database.clone().ok_or_else(|| {
                ConfigError::Validation(
                    "no database name configured and none in the connection string".to_string(),
                )
            })?
        } else {
            self.database_name.clone()
        };

        options.app_name = Some(app_name.to_string());
        options.max_connecting = Some(self.max_connections);
        options.max_idle_time = Some(self.max_idle_time);
        options.connect_timeout = Some(OPERATION_TIMEOUT);
        options.server_selection_timeout = Some(OPERATION_TIMEOUT);

        match self.credential(&database_name) {
            Some(credential) => options.credential = Some(credential),
            None if !self.password.expose_secret().is_empty() => {
                tracing::warn!("Password configured without a user name, ignoring it");
            }
            None => {}
        }

        Ok((options, database_name))
    }
}
