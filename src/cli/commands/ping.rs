//! Ping command implementation
//!
//! Activates every plugin, which for storage plugins means connecting and
//! pinging the primary, then stops them again.

use crate::adapters::mongodb::{AdapterState, MongoStore};
use crate::core::ServiceHost;
use crate::log_error_with_context;
use clap::Args;
use std::time::Instant;

/// Arguments for the ping command
#[derive(Args, Debug)]
pub struct PingArgs {}

impl PingArgs {
    /// Execute the ping command
    pub async fn execute(&self, host: &mut ServiceHost) -> anyhow::Result<i32> {
        tracing::info!(service = %host.name(), "Checking plugin reachability");
        println!("🔌 Activating plugins");
        println!();

        let start = Instant::now();
        let activated = host.activate_all().await;
        let elapsed = start.elapsed();

        let exit_code = match &activated {
            Ok(()) => {
                for line in report(host) {
                    println!("{line}");
                }
                println!();
                println!("✅ All plugins activated in {}ms", elapsed.as_millis());
                0
            }
            Err(e) => {
                log_error_with_context!(e, "Plugin activation failed");
                println!("❌ Activation failed: {e}");
                3
            }
        };

        if let Err(e) = host.stop_all().await {
            log_error_with_context!(&e, "Failed to stop plugins");
            println!("⚠️  Failed to stop plugins cleanly: {e}");
        }

        Ok(exit_code)
    }
}

fn report(host: &ServiceHost) -> Vec<String> {
    host.plugin_ids()
        .map(|id| match host.plugin::<MongoStore>(id.as_str()) {
            Some(store) => match (store.state(), store.handle()) {
                (AdapterState::Connected, Some(handle)) => {
                    format!("  ✅ {id}: connected to database {:?}", handle.database_name())
                }
                (state, _) => format!("  ⚪ {id}: {state}"),
            },
            None => format!("  ✅ {id}: active"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(uri: &str) -> ServiceHost {
        let mut host = ServiceHost::new("svckit");
        host.add_plugin(MongoStore::new("mongodb", "db").unwrap())
            .unwrap();
        host.init_flags().unwrap();
        host.registry_mut().set("db_uri", uri).unwrap();
        host
    }

    #[tokio::test]
    async fn test_ping_disabled_store() {
        let mut host = host("");
        let code = PingArgs {}.execute(&mut host).await.unwrap();
        assert_eq!(code, 0);
        assert_eq!(
            host.plugin::<MongoStore>("mongodb").unwrap().state(),
            AdapterState::Stopped
        );
    }

    #[tokio::test]
    async fn test_ping_invalid_uri() {
        let mut host = host("not a connection string");
        let code = PingArgs {}.execute(&mut host).await.unwrap();
        assert_eq!(code, 3);
    }

    #[tokio::test]
    async fn test_report_disabled() {
        let mut host = host("");
        host.activate_all().await.unwrap();
        assert_eq!(report(&host), vec!["  ⚪ mongodb: disabled".to_string()]);
    }
}
