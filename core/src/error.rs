//! Error types for ISA-Tab operations

use thiserror::Error;

/// Main error type for ISA-Tab parsing, mapping, validation and export
#[derive(Error, Debug)]
pub enum IsaTabError {
    /// Malformed headers, unmatched columns or cardinality violations.
    /// Aborts mapping of the current section.
    #[error("Structure error in section '{section}': {message}")]
    StructureError {
        /// Section identifier
        section: String,
        /// Error message
        message: String,
    },

    /// A required value is absent. Aborts the current record.
    #[error("Missing value for '{field}': {message}")]
    MissingValue {
        /// Field whose value is missing
        field: String,
        /// Error message
        message: String,
    },

    /// A value could not be interpreted. Aborts the current property mapping.
    #[error("Invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        /// Field being mapped
        field: String,
        /// Offending value
        value: String,
        /// Error message
        message: String,
    },

    /// Programmer or ordering error, never caused by user data
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation failed fatally
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for ISA-Tab operations
pub type Result<T> = std::result::Result<T, IsaTabError>;

impl IsaTabError {
    /// Create a new structure error
    #[must_use]
    pub fn structure(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StructureError {
            section: section.into(),
            message: message.into(),
        }
    }

    /// Create a new missing value error
    #[must_use]
    pub fn missing_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MissingValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid value error
    #[must_use]
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a new fatal validation error
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError(message.into())
    }
}

impl From<serde_json::Error> for IsaTabError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for IsaTabError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<regex::Error> for IsaTabError {
    fn from(err: regex::Error) -> Self {
        Self::ConfigError(format!("invalid pattern: {err}"))
    }
}
