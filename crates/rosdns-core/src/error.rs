//! Error types for the RouterOS DNS bridge
//!
//! This module defines all error types used throughout the crate.
//!
//! The first four variants belong to record conversion and are raised by the
//! validator and translator. The rest come from the router API, configuration
//! and change application.

use thiserror::Error;

/// Result type alias for rosdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the RouterOS DNS bridge
#[derive(Error, Debug)]
pub enum Error {
    /// Record type outside of A, AAAA, CNAME, TXT, MX, SRV
    #[error("Unsupported DNS record type: {0}")]
    UnsupportedType(String),

    /// A field failed its type-specific grammar
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field (RouterOS spelling)
        field: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Malformed TTL duration or composite target string
    #[error("Format error: {0}")]
    Format(String),

    /// Provider-specific property key outside the recognized set
    #[error("Unsupported provider-specific property: {0}")]
    UnsupportedProperty(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Change targets a name outside the managed domains
    #[error("Domain filter rejected: {0}")]
    DomainFilter(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Change application finished but some items failed
    #[error("Partial failure: {failed} of {total} changes failed")]
    PartialFailure {
        /// Number of failed items
        failed: usize,
        /// Number of attempted items
        total: usize,
    },
}

impl Error {
    /// Create a validation error for `field`
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create an unsupported type error
    pub fn unsupported_type(record_type: impl Into<String>) -> Self {
        Self::UnsupportedType(record_type.into())
    }

    /// Create an unsupported property error
    pub fn unsupported_property(key: impl Into<String>) -> Self {
        Self::UnsupportedProperty(key.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a domain filter violation
    pub fn domain_filter(name: impl Into<String>) -> Self {
        Self::DomainFilter(name.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from record conversion rather than I/O
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType(_)
                | Self::Validation { .. }
                | Self::Format(_)
                | Self::UnsupportedProperty(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field() {
        let err = Error::validation("mx-preference", "70000 is out of range");
        assert_eq!(err.to_string(), "Invalid mx-preference: 70000 is out of range");
        assert!(err.is_conversion());
    }

    #[test]
    fn messages_start_capitalised() {
        let errors = [
            Error::unsupported_type("NS"),
            Error::validation("address", "cannot be empty"),
            Error::format("TTL cannot be empty"),
            Error::unsupported_property("owner"),
            Error::config("missing"),
            Error::http("timeout"),
            Error::auth("denied"),
            Error::not_found("*1"),
            Error::domain_filter("www.example.org"),
            Error::provider("routeros", "boom"),
            Error::PartialFailure { failed: 1, total: 2 },
        ];
        for err in errors {
            let message = err.to_string();
            assert!(message.starts_with(char::is_uppercase), "{message}");
        }
    }

    #[test]
    fn transport_errors_are_not_conversion_errors() {
        assert!(!Error::http("connection refused").is_conversion());
        assert!(!Error::PartialFailure { failed: 1, total: 3 }.is_conversion());
    }
}
