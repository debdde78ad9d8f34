//! Domain error types
//!
//! This module defines the error hierarchy for svckit. Configuration problems
//! are reported through [`ConfigError`]. Everything else (plugin lifecycle,
//! storage, I/O) is an [`SvckitError`], which wraps `ConfigError` as well.

use thiserror::Error;

/// Main svckit error type
///
/// Connection and reachability failures carry a rendered message. Insert
/// failures carry the driver error untouched so callers can inspect it
/// (duplicate keys, write concern errors and so on).
#[derive(Debug, Error)]
pub enum SvckitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The pooled client could not be built or opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// The client was built but the primary did not answer the ping
    #[error("Reachability error: {0}")]
    Reachability(String),

    /// Error returned by the database driver, passed through unmodified
    #[error(transparent)]
    Operation(#[from] mongodb::error::Error),

    /// The caller's cancellation signal fired before the operation completed
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the operation completed
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    /// Plugin lifecycle errors (unknown plugin, wrong state)
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Configuration and option registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment or file value could not be converted to the option's type
    #[error("failed to set option {name:?} with value {value:?}")]
    Conversion { name: String, value: String },

    /// No option with this name is registered
    #[error("unknown option {0:?}")]
    UnknownOption(String),

    /// An option with this name is already registered
    #[error("option {0:?} is already registered")]
    DuplicateOption(String),

    /// The option exists but holds a different type than requested
    #[error("option {name:?} is a {actual} option, not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Configuration file could not be read or parsed
    #[error("{0}")]
    File(String),

    /// Configuration values failed validation
    #[error("validation failed: {0}")]
    Validation(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SvckitError {
    fn from(err: std::io::Error) -> Self {
        SvckitError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SvckitError {
    fn from(err: serde_json::Error) -> Self {
        SvckitError::Serialization(err.to_string())
    }
}

// Conversion from bson serialization errors
impl From<mongodb::bson::ser::Error> for SvckitError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        SvckitError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::File(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_names_option_and_value() {
        let err = ConfigError::Conversion {
            name: "max.con".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"failed to set option "max.con" with value "abc""#
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: SvckitError = ConfigError::UnknownOption("db_uri".to_string()).into();
        assert!(matches!(err, SvckitError::Configuration(_)));
        assert_eq!(err.to_string(), r#"Configuration error: unknown option "db_uri""#);
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = ConfigError::TypeMismatch {
            name: "db_max_con".to_string(),
            expected: "string",
            actual: "int",
        };
        assert_eq!(
            err.to_string(),
            r#"option "db_max_con" is a int option, not string"#
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: SvckitError = io_err.into();
        assert!(matches!(err, SvckitError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: SvckitError = json_err.into();
        assert!(matches!(err, SvckitError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(matches!(err, ConfigError::File(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_store_error_implements_std_error() {
        let err = SvckitError::Connection("refused".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
