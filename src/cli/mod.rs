//! CLI interface and argument parsing
//!
//! The static arguments are declared with clap's derive API. Plugin options
//! are only known at runtime, so the derived command is augmented with one
//! argument per registered option before parsing (see [`parse_from`]).

pub mod commands;

use crate::config::{EnvConfig, ServiceConfig};
use crate::core::ServiceHost;
use crate::domain::errors::ConfigError;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::ffi::OsString;

/// svckit - service host with environment-configurable plugins
#[derive(Parser, Debug)]
#[command(name = "svckit")]
#[command(version, about, long_about = None)]
#[command(author = "svckit Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "svckit.toml", env = "SVCKIT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SVCKIT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Prefix of environment variables that override options
    #[arg(long, env = "SVCKIT_ENV_PREFIX")]
    pub env_prefix: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every option with its resolved value and where it came from
    Check(commands::check::CheckArgs),

    /// Activate all plugins, report reachability and stop them again
    Ping(commands::ping::PingArgs),

    /// Insert JSON documents into a collection of a storage plugin
    Insert(commands::insert::InsertArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Parses `args` with the host's plugin options added to the command line
///
/// Options given on the command line are marked explicit in the host's
/// registry.
///
/// # Errors
///
/// Returns a [`clap::Error`] for malformed arguments and a
/// [`ConfigError`] if an option value has the wrong type.
pub fn parse_from<I, T>(host: &mut ServiceHost, args: I) -> anyhow::Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = host.augment_command(Cli::command()).try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;

    host.apply_matches(&matches)?;
    if let Some((_, sub_matches)) = matches.subcommand() {
        host.apply_matches(sub_matches)?;
    }
    Ok(cli)
}

/// Layers the configuration file and the environment onto the registry
///
/// The command line prefix wins over `env.prefix` from the file.
///
/// # Errors
///
/// Returns the first file option or environment override that could not be
/// applied.
pub fn prepare(host: &mut ServiceHost, cli: &Cli, config: &ServiceConfig) -> Result<(), ConfigError> {
    let prefix = cli
        .env_prefix
        .clone()
        .unwrap_or_else(|| config.env.prefix.clone());
    let env = EnvConfig::new(prefix);
    env.validate().map_err(ConfigError::Validation)?;
    host.set_env(env);

    host.apply_config(config)?;
    host.resolve_env()
}
