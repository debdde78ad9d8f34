//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "svckit.toml")]
    pub output: String,

    /// Include explanatory comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing svckit configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set db_uri and db_db_name in {}", self.output);
                println!("  2. Put credentials in a .env file:");
                println!("     - SVCKIT_DB_USER_NAME and SVCKIT_DB_PWD");
                println!("  3. Check the resolved options: svckit check");
                println!("  4. Check connectivity: svckit ping");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# svckit configuration file

[application]
name = "svckit"
log_level = "info"

[env]
prefix = "SVCKIT_"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"

[options]
db_uri = "mongodb://localhost:27017"
db_db_name = "svckit"
db_max_con = 50
db_idle_time = 1000
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# svckit configuration file
#
# Option values are resolved in this order, strongest first:
#   1. command line        --db_uri mongodb://...
#   2. environment         <env.prefix><OPTION NAME IN UPPER CASE>, e.g. SVCKIT_DB_URI
#   3. the [options] table below
#   4. built-in defaults
#
# ${VAR} placeholders are replaced from the environment before parsing.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Service name (used in logging and as the MongoDB application name)
name = "svckit"

# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Environment Overrides
# ============================================================================
[env]
# Prepended to every derived variable name.
# With prefix "SVCKIT_" the option db_max_con is read from SVCKIT_DB_MAX_CON.
prefix = "SVCKIT_"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON file logging
local_enabled = false

# Directory for log files
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"

# ============================================================================
# Plugin Options
# ============================================================================
[options]
# MongoDB connection string; leave empty to disable the storage plugin
db_uri = "mongodb://localhost:27017"

# Database to bind to (falls back to the database in db_uri)
db_db_name = "svckit"

# Credentials are better supplied through the environment:
#   SVCKIT_DB_USER_NAME, SVCKIT_DB_PWD
# db_user_name = "svckit"
# db_pwd = "${SVCKIT_MONGO_PASSWORD}"

# Maximum number of pooled connections
db_max_con = 50

# Maximum idle time of a pooled connection, in milliseconds
db_idle_time = 1000
"#
        .to_string()
    }
}
