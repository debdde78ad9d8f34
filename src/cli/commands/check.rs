//! Check command implementation
//!
//! Prints every registered option with its resolved value, where the value
//! came from and the environment variable that would override it.

use crate::adapters::mongodb::{MongoConfig, MongoStore};
use crate::config::env_var_name;
use crate::core::ServiceHost;
use clap::Args;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    /// Execute the check command
    ///
    /// The registry has already been resolved by the time this runs; what is
    /// left to verify is that each storage plugin's options form a usable
    /// connection configuration.
    pub async fn execute(&self, host: &ServiceHost) -> anyhow::Result<i32> {
        tracing::info!(service = %host.name(), "Checking configuration");

        println!("🔍 Resolved options (env prefix: {:?})", host.env().prefix);
        println!();
        for line in render_options(host) {
            println!("  {line}");
        }
        println!();

        let mut failures = 0usize;
        for id in host.plugin_ids() {
            let Some(store) = host.plugin::<MongoStore>(id.as_str()) else {
                continue;
            };
            match MongoConfig::from_registry(store.option_names(), host.registry()) {
                Ok(config) if config.is_disabled() => {
                    println!("⚪ {id}: disabled ({} is empty)", store.option_names().uri);
                }
                Ok(config) => {
                    println!("✅ {id}: {}", config.redacted_uri());
                }
                Err(e) => {
                    println!("❌ {id}: {e}");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            println!();
            println!("❌ Configuration has {failures} error(s)");
            return Ok(2);
        }
        Ok(0)
    }
}

/// One line per option, in lexicographic order
fn render_options(host: &ServiceHost) -> Vec<String> {
    let prefix = &host.env().prefix;
    host.registry()
        .iter()
        .map(|option| {
            format!(
                "{:<20} = {:<30} [{}] ({})",
                option.name(),
                format!("{:?}", option.value().display_redacted()),
                option.source(),
                env_var_name(prefix, option.name())
            )
        })
        .collect()
}
