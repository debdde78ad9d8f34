//! Option registry
//!
//! Plugins declare their typed options here during `init_flags`. Each option
//! remembers where its current value came from, so later layers (the config
//! file and the environment resolver) can leave values supplied explicitly on
//! the command line alone.
//!
//! Options are kept sorted by name; every walk over the registry visits them
//! in lexicographic order.

use crate::config::secret::{secret_string, SecretString};
use crate::domain::errors::ConfigError;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::ExposeSecret;
use std::collections::BTreeMap;
use std::fmt;

/// Where an option's current value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptionSource {
    /// Registered default, untouched
    Default,
    /// `[options]` table of the configuration file
    File,
    /// Environment variable applied by the resolver
    Env,
    /// Supplied explicitly by the caller (command line or [`OptionRegistry::set`])
    Explicit,
}

impl fmt::Display for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OptionSource::Default => "default",
            OptionSource::File => "file",
            OptionSource::Env => "env",
            OptionSource::Explicit => "explicit",
        };
        f.write_str(label)
    }
}

/// Typed value cell of an option
#[derive(Debug, Clone)]
pub enum OptionValue {
    Str(String),
    Secret(SecretString),
    Int(i64),
    Bool(bool),
}

impl OptionValue {
    /// Type name used in error messages and CLI help
    pub fn kind(&self) -> &'static str {
        match self {
            OptionValue::Str(_) => "string",
            OptionValue::Secret(_) => "secret",
            OptionValue::Int(_) => "int",
            OptionValue::Bool(_) => "bool",
        }
    }

    /// Parses `raw` into a value of the same type as `self`
    fn parse_same_kind(&self, raw: &str) -> Option<OptionValue> {
        match self {
            OptionValue::Str(_) => Some(OptionValue::Str(raw.to_string())),
            OptionValue::Secret(_) => Some(OptionValue::Secret(secret_string(raw))),
            OptionValue::Int(_) => parse_int(raw).map(OptionValue::Int),
            OptionValue::Bool(_) => parse_bool(raw).map(OptionValue::Bool),
        }
    }

    /// Renders the value for display, masking secrets
    pub fn display_redacted(&self) -> String {
        match self {
            OptionValue::Str(s) => s.clone(),
            OptionValue::Secret(s) if s.expose_secret().is_empty() => String::new(),
            OptionValue::Secret(_) => "********".to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Bool(b) => b.to_string(),
        }
    }
}

/// Parses an integer literal with an optional sign and base prefix
///
/// `0x`/`0X` is hex, `0o`/`0O` or a bare leading `0` is octal, `0b`/`0B` is
/// binary. Underscores may separate digits, or follow a base prefix.
fn parse_int(raw: &str) -> Option<i64> {
    let (sign, unsigned) = match raw.as_bytes().first() {
        Some(b'+') | Some(b'-') => raw.split_at(1),
        _ => ("", raw),
    };

    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits, prefixed) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest, true)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest, true)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest, true)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..], true)
    } else {
        (10, lower.as_str(), false)
    };

    if digits.is_empty()
        || digits.ends_with('_')
        || digits.contains("__")
        || (!prefixed && digits.starts_with('_'))
    {
        return None;
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || cleaned.starts_with(['+', '-']) {
        return None;
    }
    i64::from_str_radix(&format!("{sign}{cleaned}"), radix).ok()
}

/// Accepts the same spellings as Go's `strconv.ParseBool`
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// A named, typed configuration option
#[derive(Debug, Clone)]
pub struct ConfigOption {
    name: String,
    usage: String,
    default: OptionValue,
    value: OptionValue,
    source: OptionSource,
}

impl ConfigOption {
    fn new(name: String, default: OptionValue, usage: String) -> Self {
        Self {
            name,
            usage,
            value: default.clone(),
            default,
            source: OptionSource::Default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn value(&self) -> &OptionValue {
        &self.value
    }

    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    pub fn source(&self) -> OptionSource {
        self.source
    }

    /// True iff a caller supplied the value explicitly
    pub fn is_explicit(&self) -> bool {
        self.source == OptionSource::Explicit
    }

    /// Parses `raw` into the option's type and records `source`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Conversion`] naming the option and the raw
    /// value when it cannot be converted. The option is left unchanged.
    pub(crate) fn assign(&mut self, raw: &str, source: OptionSource) -> Result<(), ConfigError> {
        let value = self
            .value
            .parse_same_kind(raw)
            .ok_or_else(|| ConfigError::Conversion {
                name: self.name.clone(),
                value: raw.to_string(),
            })?;
        self.value = value;
        self.source = source;
        Ok(())
    }
}

/// Registry of named options with explicit/default provenance tracking
///
/// # Example
///
/// ```rust
/// use svckit::config::{OptionRegistry, OptionSource};
///
/// let mut registry = OptionRegistry::new();
/// registry.register_string("db_uri", "", "uri connection string").unwrap();
/// registry.register_int("db_max_con", 50, "max connections").unwrap();
///
/// registry.set("db_max_con", "75").unwrap();
/// assert_eq!(registry.get_int("db_max_con").unwrap(), 75);
/// assert_eq!(registry.get("db_max_con").unwrap().source(), OptionSource::Explicit);
/// assert_eq!(registry.get("db_uri").unwrap().source(), OptionSource::Default);
/// ```
#[derive(Debug, Default)]
pub struct OptionRegistry {
    options: BTreeMap<String, ConfigOption>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new option with its default value
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateOption`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        default: OptionValue,
        usage: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.options.contains_key(&name) {
            return Err(ConfigError::DuplicateOption(name));
        }
        tracing::trace!(option = %name, kind = default.kind(), "Registering option");
        self.options
            .insert(name.clone(), ConfigOption::new(name, default, usage.into()));
        Ok(())
    }

    pub fn register_string(
        &mut self,
        name: impl Into<String>,
        default: &str,
        usage: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.register(name, OptionValue::Str(default.to_string()), usage)
    }

    pub fn register_secret(
        &mut self,
        name: impl Into<String>,
        default: &str,
        usage: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.register(name, OptionValue::Secret(secret_string(default)), usage)
    }

    pub fn register_int(
        &mut self,
        name: impl Into<String>,
        default: i64,
        usage: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.register(name, OptionValue::Int(default), usage)
    }

    pub fn register_bool(
        &mut self,
        name: impl Into<String>,
        default: bool,
        usage: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.register(name, OptionValue::Bool(default), usage)
    }

    /// Sets an option explicitly, as if it had been given on the command line
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), ConfigError> {
        self.assign(name, raw, OptionSource::Explicit)
    }

    /// Assigns a value with the given provenance
    pub fn assign(&mut self, name: &str, raw: &str, source: OptionSource) -> Result<(), ConfigError> {
        self.options
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?
            .assign(raw, source)
    }

    /// Applies the `[options]` table of the configuration file
    ///
    /// Explicit options are skipped. Unknown names are rejected so that a
    /// misspelled option does not go unnoticed.
    pub fn apply_file_options(
        &mut self,
        values: &BTreeMap<String, toml::Value>,
    ) -> Result<(), ConfigError> {
        for (name, value) in values {
            let option = self
                .options
                .get_mut(name)
                .ok_or_else(|| ConfigError::UnknownOption(name.clone()))?;
            if option.is_explicit() {
                continue;
            }
            let raw = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(ConfigError::Conversion {
                        name: name.clone(),
                        value: other.to_string(),
                    })
                }
            };
            option.assign(&raw, OptionSource::File)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ConfigOption> {
        self.options.get(name)
    }

    /// All options in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConfigOption> {
        self.options.values_mut()
    }

    /// Options a caller supplied explicitly, in lexicographic order
    pub fn explicit(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.values().filter(|o| o.is_explicit())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&OptionValue, ConfigError> {
        self.options
            .get(name)
            .map(ConfigOption::value)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))
    }

    fn mismatch(name: &str, expected: &'static str, actual: &OptionValue) -> ConfigError {
        ConfigError::TypeMismatch {
            name: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String, ConfigError> {
        match self.lookup(name)? {
            OptionValue::Str(s) => Ok(s.clone()),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    pub fn get_secret(&self, name: &str) -> Result<SecretString, ConfigError> {
        match self.lookup(name)? {
            OptionValue::Secret(s) => Ok(s.clone()),
            other => Err(Self::mismatch(name, "secret", other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, ConfigError> {
        match self.lookup(name)? {
            OptionValue::Int(i) => Ok(*i),
            other => Err(Self::mismatch(name, "int", other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ConfigError> {
        match self.lookup(name)? {
            OptionValue::Bool(b) => Ok(*b),
            other => Err(Self::mismatch(name, "bool", other)),
        }
    }

    /// Adds one global `--<name> <value>` argument per registered option
    ///
    /// Option names must not collide with the command's own arguments.
    pub fn augment_command(&self, mut cmd: Command) -> Command {
        for option in self.options.values() {
            let mut arg = Arg::new(option.name.clone())
                .long(option.name.clone())
                .help(option.usage.clone())
                .value_name(option.value.kind().to_uppercase())
                .global(true)
                .action(ArgAction::Set);
            if let OptionValue::Bool(_) = option.value {
                arg = arg.num_args(0..=1).default_missing_value("true");
            }
            cmd = cmd.arg(arg);
        }
        cmd
    }

    /// Marks every option given on the command line as explicit
    pub fn apply_matches(&mut self, matches: &ArgMatches) -> Result<(), ConfigError> {
        let names: Vec<String> = self.options.keys().cloned().collect();
        for name in names {
            if matches.value_source(&name) != Some(ValueSource::CommandLine) {
                continue;
            }
            if let Some(raw) = matches.get_one::<String>(&name) {
                self.set(&name, raw)?;
            }
        }
        Ok(())
    }
}
