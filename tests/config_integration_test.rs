//! Integration tests for option resolution
//!
//! Tests that touch the process environment hold ENV_MUTEX so they do not
//! interfere with each other.

use svckit::config::{load_config, resolve, OptionRegistry, OptionSource};
use svckit::domain::ConfigError;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const PREFIX: &str = "SVCKIT_IT_";

fn cleanup_env_vars() {
    for name in [
        "SVCKIT_IT_MAX_CON",
        "SVCKIT_IT_MAX_IDLE",
        "SVCKIT_IT_DB_URI",
        "SVCKIT_IT_DB_MAX_CON",
        "SVCKIT_IT_DB_PWD",
        "SVCKIT_IT_A_FIRST",
        "SVCKIT_IT_B_BROKEN",
        "SVCKIT_IT_C_LATER",
        "SVCKIT_IT_TLS_ENABLED",
        "SVCKIT_IT_FILE_PASSWORD",
    ] {
        std::env::remove_var(name);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_env_overrides_default() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let mut registry = OptionRegistry::new();
    registry.register_int("max.con", 50, "max connections").unwrap();
    std::env::set_var("SVCKIT_IT_MAX_CON", "75");

    resolve(PREFIX, &mut registry).unwrap();
    assert_eq!(registry.get_int("max.con").unwrap(), 75);
    assert_eq!(registry.get("max.con").unwrap().source(), OptionSource::Env);

    cleanup_env_vars();
}

#[test]
fn test_explicit_option_not_overridden() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let mut registry = OptionRegistry::new();
    registry.register_int("max-con", 50, "max connections").unwrap();
    registry.set("max-con", "10").unwrap();
    std::env::set_var("SVCKIT_IT_MAX_CON", "75");

    resolve(PREFIX, &mut registry).unwrap();
    assert_eq!(registry.get_int("max-con").unwrap(), 10);
    assert!(registry.get("max-con").unwrap().is_explicit());

    cleanup_env_vars();
}

#[test]
fn test_empty_env_value_ignored() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let mut registry = OptionRegistry::new();
    registry.register_int("max_idle", 1000, "idle").unwrap();
    std::env::set_var("SVCKIT_IT_MAX_IDLE", "");

    resolve(PREFIX, &mut registry).unwrap();
    assert_eq!(registry.get_int("max_idle").unwrap(), 1000);
    assert_eq!(registry.get("max_idle").unwrap().source(), OptionSource::Default);

    cleanup_env_vars();
}

#[test]
fn test_first_failure_latched_later_options_untouched() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let mut registry = OptionRegistry::new();
    registry.register_string("a_first", "", "").unwrap();
    registry.register_int("b_broken", 1, "").unwrap();
    registry.register_string("c_later", "default", "").unwrap();
    std::env::set_var("SVCKIT_IT_A_FIRST", "applied");
    std::env::set_var("SVCKIT_IT_B_BROKEN", "abc");
    std::env::set_var("SVCKIT_IT_C_LATER", "ignored");

    let err = resolve(PREFIX, &mut registry).unwrap_err();
    assert_eq!(
        err,
        ConfigError::Conversion {
            name: "b_broken".to_string(),
            value: "abc".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "failed to set option \"b_broken\" with value \"abc\""
    );
    assert_eq!(registry.get_string("a_first").unwrap(), "applied");
    assert_eq!(registry.get_int("b_broken").unwrap(), 1);
    assert_eq!(registry.get_string("c_later").unwrap(), "default");

    cleanup_env_vars();
}

#[test]
fn test_bool_env_values() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let mut registry = OptionRegistry::new();
    registry.register_bool("tls.enabled", false, "").unwrap();
    std::env::set_var("SVCKIT_IT_TLS_ENABLED", "T");

    resolve(PREFIX, &mut registry).unwrap();
    assert!(registry.get_bool("tls.enabled").unwrap());

    cleanup_env_vars();
}

#[test]
fn test_file_then_env_then_cli_precedence() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[env]
prefix = "SVCKIT_IT_"

[options]
db_uri = "mongodb://file:27017"
db_max_con = 20
db_pwd = "${SVCKIT_IT_FILE_PASSWORD}"
"#,
    );
    std::env::set_var("SVCKIT_IT_FILE_PASSWORD", "from-file");
    let config = load_config(file.path()).unwrap();

    let mut registry = OptionRegistry::new();
    registry.register_string("db_uri", "", "").unwrap();
    registry.register_int("db_max_con", 50, "").unwrap();
    registry.register_secret("db_pwd", "", "").unwrap();

    // --db_uri on the command line
    registry.set("db_uri", "mongodb://cli:27017").unwrap();
    registry.apply_file_options(&config.options).unwrap();
    std::env::set_var("SVCKIT_IT_DB_MAX_CON", "30");
    resolve(&config.env.prefix, &mut registry).unwrap();

    assert_eq!(registry.get_string("db_uri").unwrap(), "mongodb://cli:27017");
    assert_eq!(registry.get("db_uri").unwrap().source(), OptionSource::Explicit);
    assert_eq!(registry.get_int("db_max_con").unwrap(), 30);
    assert_eq!(registry.get("db_max_con").unwrap().source(), OptionSource::Env);
    assert_eq!(registry.get("db_pwd").unwrap().source(), OptionSource::File);
    assert_eq!(
        registry.get("db_pwd").unwrap().value().display_redacted(),
        "********"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config("[options]\ndb_pwd = \"${SVCKIT_IT_FILE_PASSWORD}\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("SVCKIT_IT_FILE_PASSWORD"));
}
