//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating a [`HeraldConfig`](super::HeraldConfig).
///
/// Field names are dotted paths into the configuration, e.g.
/// `moderation.ban_penalty`, matching the `HERALD_MODERATION__BAN_PENALTY`
/// environment override.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The merged sources could not be parsed into the schema.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is empty.
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// A count, capacity or duration is zero.
    #[error("{field} must be greater than 0")]
    NotPositive { field: String },

    /// A field holds a value the relay can't use.
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// The bridge listen address doesn't parse.
    #[error("Invalid address: {addr} - {reason}")]
    InvalidAddress { addr: String, reason: String },

    /// The Bot API URL is not http(s).
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ConfigError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn not_positive(field: impl Into<String>) -> Self {
        Self::NotPositive {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_address(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// The dotted field this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::NotPositive { field }
            | Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = ConfigError::not_positive("bridge.capacity");
        assert_eq!(err.to_string(), "bridge.capacity must be greater than 0");
        assert_eq!(err.field(), Some("bridge.capacity"));
        assert_eq!(ConfigError::ParseError("x".into()).field(), None);
    }
}
