// svckit - service host with environment-configurable plugins
// Copyright (c) 2025 svckit Contributors
// Licensed under the MIT License

use svckit::adapters::mongodb::MongoStore;
use svckit::cli::{self, Cli, Commands};
use svckit::config::{load_config_or_default, LoggingConfig};
use svckit::core::ServiceHost;
use svckit::logging::init_logging;
use std::process;
use tokio::sync::watch;

/// Id and option prefix of the built-in storage plugin
const STORE_PLUGIN_ID: &str = "mongodb";
const STORE_OPTION_PREFIX: &str = "db";

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let mut host = ServiceHost::new(env!("CARGO_PKG_NAME"));
    if let Err(e) = register_plugins(&mut host) {
        eprintln!("Error: {e}");
        process::exit(5);
    }

    let cli = match cli::parse_from(&mut host, std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => match e.downcast::<clap::Error>() {
            Ok(clap_err) => clap_err.exit(),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(2);
            }
        },
    };

    // init must work even when the existing configuration is broken
    if let Commands::Init(args) = &cli.command {
        let log_level = cli.log_level.as_deref().unwrap_or("info");
        if let Err(e) = init_logging(log_level, &LoggingConfig::default()) {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
        process::exit(exit_code(args.execute().await));
    }

    let config = match load_config_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration file {}: {e}", cli.config);
            process::exit(2);
        }
    };

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.application.log_level.clone());
    let _logging_guard = match init_logging(&log_level, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %config.application.name,
        "svckit starting"
    );

    if let Err(e) = cli::prepare(&mut host, &cli, &config) {
        tracing::error!(error = %e, "Failed to resolve options");
        eprintln!("❌ {e}");
        process::exit(2);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown().await;
        let _ = shutdown_tx.send(true);
    });

    let code = exit_code(execute_command(&cli, &mut host, shutdown_rx).await);
    process::exit(code);
}

fn register_plugins(host: &mut ServiceHost) -> svckit::domain::Result<()> {
    host.add_plugin(MongoStore::new(STORE_PLUGIN_ID, STORE_OPTION_PREFIX)?)?;
    host.init_flags()?;
    Ok(())
}

/// Resolves once SIGINT (or SIGTERM on unix) arrives
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                    }
                }
                println!("\n⚠️  Shutdown signal received, abandoning current operation...");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl+C only");
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
    println!("\n⚠️  Shutdown signal received, abandoning current operation...");
}

fn exit_code(result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    }
}

async fn execute_command(
    cli: &Cli,
    host: &mut ServiceHost,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Check(args) => args.execute(host).await,
        Commands::Ping(args) => args.execute(host).await,
        Commands::Insert(args) => args.execute(host, shutdown_signal).await,
        Commands::Init(args) => args.execute().await,
    }
}
