//! Configuration loader with TOML parsing and `${VAR}` substitution

use super::schema::ServiceConfig;
use crate::domain::errors::ConfigError;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ServiceConfig`]
/// 4. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced variable is not
/// set, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use svckit::config::loader::load_config;
///
/// let config = load_config("svckit.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::File(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::File(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Like [`load_config`], but a missing file yields the default configuration
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        return Ok(ServiceConfig::default());
    }
    load_config(path)
}

/// Parses and validates configuration text
pub fn parse_config(contents: &str) -> Result<ServiceConfig, ConfigError> {
    let contents = substitute_env_vars(contents)?;

    let config: ServiceConfig = toml::from_str(&contents)?;

    config.validate().map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set.
fn substitute_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ConfigError::File(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(ConfigError::File(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("SVCKIT_LOADER_TEST_VAR", "test_value");
        let input = "password = \"${SVCKIT_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"");
        std::env::remove_var("SVCKIT_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("SVCKIT_LOADER_MISSING_VAR");
        let input = "password = \"${SVCKIT_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("SVCKIT_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("SVCKIT_LOADER_COMMENTED_VAR");
        let input = "# uri = \"${SVCKIT_LOADER_COMMENTED_VAR}\"\nname = \"x\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(ConfigError::File(_))));
    }

    #[test]
    fn test_load_config_or_default_missing_file() {
        let config = load_config_or_default("nonexistent.toml").unwrap();
        assert_eq!(config.application.log_level, "info");
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
name = "orders"
log_level = "debug"

[env]
prefix = "ORDERS_"

[options]
db_uri = "mongodb://localhost:27017"
db_db_name = "orders"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.name, "orders");
        assert_eq!(config.env.prefix, "ORDERS_");
        assert_eq!(config.options.len(), 2);
    }

    #[test]
    fn test_parse_config_validation_error() {
        let err = parse_config("[application]\nlog_level = \"loud\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_config_syntax_error() {
        let err = parse_config("[application\nlog_level = 1").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }
}
