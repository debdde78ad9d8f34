//! Environment variable overrides for registered options
//!
//! After the command line has been parsed, every option that was not set
//! explicitly may be overridden from the environment. The variable name is
//! derived from the option name: `.` and `-` become `_`, the prefix is
//! prepended and the whole name is upper-cased, so `max.con` with prefix
//! `APP_` is read from `APP_MAX_CON`.
//!
//! Conversion failures latch: the first failing option is reported, and no
//! option visited after it (in lexicographic order) receives an override,
//! even if its value would convert cleanly.
//!
//! # Example
//!
//! ```rust
//! use svckit::config::{resolve_with, OptionRegistry};
//!
//! let mut registry = OptionRegistry::new();
//! registry.register_int("max.con", 50, "max connections").unwrap();
//!
//! resolve_with("APP_", &mut registry, |name| {
//!     (name == "APP_MAX_CON").then(|| "75".to_string())
//! })
//! .unwrap();
//! assert_eq!(registry.get_int("max.con").unwrap(), 75);
//! ```

use crate::config::registry::{OptionRegistry, OptionSource};
use crate::domain::errors::ConfigError;
use std::collections::BTreeSet;

/// Derives the environment variable name for an option
pub fn env_var_name(prefix: &str, option_name: &str) -> String {
    let name = option_name.replace(['.', '-'], "_");
    format!("{prefix}{name}").to_uppercase()
}

/// Applies overrides from the process environment
pub fn resolve(prefix: &str, registry: &mut OptionRegistry) -> Result<(), ConfigError> {
    resolve_with(prefix, registry, |name| std::env::var(name).ok())
}

/// Applies overrides using `lookup` in place of the process environment
///
/// Variables that are unset or empty are ignored.
///
/// # Errors
///
/// Returns the first [`ConfigError::Conversion`] encountered.
pub fn resolve_with<F>(
    prefix: &str,
    registry: &mut OptionRegistry,
    lookup: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit: BTreeSet<String> = registry.explicit().map(|o| o.name().to_string()).collect();

    let mut latched: Option<ConfigError> = None;
    let mut skipped = 0usize;
    let mut applied = 0usize;

    for option in registry.iter_mut() {
        if explicit.contains(option.name()) {
            continue;
        }
        if latched.is_some() {
            skipped += 1;
            continue;
        }

        let var = env_var_name(prefix, option.name());
        let Some(raw) = lookup(&var).filter(|v| !v.is_empty()) else {
            continue;
        };

        match option.assign(&raw, OptionSource::Env) {
            Ok(()) => {
                applied += 1;
                tracing::debug!(option = %option.name(), env_var = %var, "Applied environment override");
            }
            Err(e) => {
                tracing::warn!(option = %option.name(), env_var = %var, error = %e, "Environment override rejected");
                latched = Some(e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(
            skipped,
            "Environment resolution stopped after a failed override"
        );
    }
    tracing::debug!(prefix = %prefix, applied, "Environment resolution finished");

    match latched {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| env.get(name).cloned()
    }

    #[test_case("", "uri", "URI" ; "no prefix")]
    #[test_case("APP_", "max.con", "APP_MAX_CON" ; "dotted name")]
    #[test_case("APP_", "idle-time", "APP_IDLE_TIME" ; "hyphenated name")]
    #[test_case("app_", "db.max-con", "APP_DB_MAX_CON" ; "prefix is upper-cased too")]
    #[test_case("SVC_", "db_uri", "SVC_DB_URI" ; "underscores kept")]
    fn test_env_var_name(prefix: &str, name: &str, expected: &str) {
        assert_eq!(env_var_name(prefix, name), expected);
    }

    #[test]
    fn test_override_applied_to_unset_option() {
        let mut registry = OptionRegistry::new();
        registry.register_int("max.con", 50, "").unwrap();

        resolve_with("APP_", &mut registry, lookup_from(&[("APP_MAX_CON", "75")])).unwrap();

        assert_eq!(registry.get_int("max.con").unwrap(), 75);
        assert_eq!(registry.get("max.con").unwrap().source(), OptionSource::Env);
    }

    #[test]
    fn test_explicit_option_untouched() {
        let mut registry = OptionRegistry::new();
        registry.register_int("max.con", 50, "").unwrap();
        registry.set("max.con", "10").unwrap();

        resolve_with("APP_", &mut registry, lookup_from(&[("APP_MAX_CON", "75")])).unwrap();

        assert_eq!(registry.get_int("max.con").unwrap(), 10);
        assert!(registry.get("max.con").unwrap().is_explicit());
    }

    #[test]
    fn test_explicit_option_untouched_even_with_bad_value() {
        let mut registry = OptionRegistry::new();
        registry.register_int("max.con", 50, "").unwrap();
        registry.set("max.con", "10").unwrap();

        let result = resolve_with("APP_", &mut registry, lookup_from(&[("APP_MAX_CON", "abc")]));

        assert!(result.is_ok());
        assert_eq!(registry.get_int("max.con").unwrap(), 10);
    }

    #[test]
    fn test_empty_variable_ignored() {
        let mut registry = OptionRegistry::new();
        registry.register_string("uri", "mongodb://default", "").unwrap();

        resolve_with("", &mut registry, lookup_from(&[("URI", "")])).unwrap();

        assert_eq!(registry.get_string("uri").unwrap(), "mongodb://default");
        assert_eq!(registry.get("uri").unwrap().source(), OptionSource::Default);
    }

    #[test]
    fn test_failure_latches_and_skips_later_options() {
        let mut registry = OptionRegistry::new();
        registry.register_string("a.name", "", "").unwrap();
        registry.register_int("max.con", 50, "").unwrap();
        registry.register_int("max.idle", 1000, "").unwrap();
        registry.register_string("z.uri", "", "").unwrap();

        let err = resolve_with(
            "APP_",
            &mut registry,
            lookup_from(&[
                ("APP_A_NAME", "before"),
                ("APP_MAX_CON", "abc"),
                ("APP_MAX_IDLE", "2000"),
                ("APP_Z_URI", "mongodb://after"),
            ]),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ConfigError::Conversion {
                name: "max.con".to_string(),
                value: "abc".to_string()
            }
        );
        // visited before the failure
        assert_eq!(registry.get_string("a.name").unwrap(), "before");
        // the failing option and everything after it keep their values
        assert_eq!(registry.get_int("max.con").unwrap(), 50);
        assert_eq!(registry.get_int("max.idle").unwrap(), 1000);
        assert_eq!(registry.get_string("z.uri").unwrap(), "");
        assert_eq!(registry.get("z.uri").unwrap().source(), OptionSource::Default);
    }

    #[test]
    fn test_only_first_error_reported() {
        let mut registry = OptionRegistry::new();
        registry.register_int("a", 1, "").unwrap();
        registry.register_int("b", 2, "").unwrap();

        let err = resolve_with("", &mut registry, lookup_from(&[("A", "x"), ("B", "y")]))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::Conversion {
                name: "a".to_string(),
                value: "x".to_string()
            }
        );
    }

    #[test]
    fn test_no_variables_is_ok() {
        let mut registry = OptionRegistry::new();
        registry.register_int("max.con", 50, "").unwrap();
        assert!(resolve_with("APP_", &mut registry, |_| None).is_ok());
        assert_eq!(registry.get_int("max.con").unwrap(), 50);
    }
}
