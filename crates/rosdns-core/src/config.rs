//! Configuration types for the RouterOS DNS bridge
//!
//! This module defines all configuration structures used throughout the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Main bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Router connection settings
    pub router: RouterOsConfig,

    /// Values the router backfills when a field is left unset
    #[serde(default)]
    pub defaults: DefaultValues,

    /// Names this bridge is allowed to manage
    #[serde(default)]
    pub domain_filter: DomainFilterConfig,

    /// Webhook listener settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl BridgeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.router.validate()?;
        self.defaults.validate()?;
        self.domain_filter.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

/// Router-side defaults for fields a desired record leaves unset
///
/// These are passed explicitly to the property resolver, the reconciler and
/// the provider. They never live in global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValues {
    /// TTL in seconds applied by the router when none is given
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Comment applied by the router when none is given; empty for none
    #[serde(default)]
    pub comment: String,
}

impl DefaultValues {
    /// Create defaults with the given TTL and comment
    pub fn new(ttl: u32, comment: impl Into<String>) -> Self {
        Self {
            ttl,
            comment: comment.into(),
        }
    }

    /// Validate the default values
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 {
            return Err(crate::Error::config("Default TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            comment: String::new(),
        }
    }
}

fn default_ttl() -> u32 {
    3600
}

/// RouterOS REST API connection settings
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RouterOsConfig {
    /// Base URL of the router, e.g. `https://192.168.88.1:443`
    pub base_url: String,

    /// API user
    pub username: String,

    /// API password
    pub password: String,

    /// Accept self-signed router certificates
    #[serde(default)]
    pub skip_tls_verify: bool,
}

impl RouterOsConfig {
    /// Validate the router configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.is_empty() {
            return Err(crate::Error::config("RouterOS base URL cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "RouterOS base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.username.is_empty() {
            return Err(crate::Error::config("RouterOS username cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for RouterOsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOsConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

/// Domain filter settings
///
/// Suffix lists and regular expressions are mutually exclusive: when
/// `regex` is set the suffix lists are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilterConfig {
    /// Managed domain suffixes
    #[serde(default)]
    pub filters: Vec<String>,

    /// Excluded domain suffixes
    #[serde(default)]
    pub exclusions: Vec<String>,

    /// Managed names pattern
    #[serde(default)]
    pub regex: Option<String>,

    /// Excluded names pattern
    #[serde(default)]
    pub regex_exclusion: Option<String>,
}

impl DomainFilterConfig {
    /// Validate the domain filter configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for pattern in [&self.regex, &self.regex_exclusion].into_iter().flatten() {
            regex::Regex::new(pattern).map_err(|e| {
                crate::Error::config(format!("Invalid domain filter regex '{pattern}': {e}"))
            })?;
        }
        if self.regex.is_none() && self.regex_exclusion.is_some() {
            return Err(crate::Error::config(
                "REGEXP_DOMAIN_FILTER_EXCLUSION requires REGEXP_DOMAIN_FILTER",
            ));
        }
        Ok(())
    }
}

/// Webhook server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the webhook API
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the webhook API
    #[serde(default = "default_port")]
    pub port: u16,

    /// Listen address for health and readiness probes
    #[serde(default = "default_health_host")]
    pub health_host: String,

    /// Port for health and readiness probes
    #[serde(default = "default_health_port")]
    pub health_port: u16,
}

impl ServerConfig {
    /// Validate the server configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.is_empty() || self.health_host.is_empty() {
            return Err(crate::Error::config("Server host cannot be empty"));
        }
        if self.port == 0 || self.health_port == 0 {
            return Err(crate::Error::config("Server ports must be > 0"));
        }
        if self.port == self.health_port {
            return Err(crate::Error::config(format!(
                "Webhook and health listeners cannot share port {}",
                self.port
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            health_host: default_health_host(),
            health_port: default_health_port(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_health_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_health_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> RouterOsConfig {
        RouterOsConfig {
            base_url: "https://192.168.88.1".into(),
            username: "admin".into(),
            password: "secret".into(),
            skip_tls_verify: true,
        }
    }

    #[test]
    fn test_defaults() {
        let defaults = DefaultValues::default();
        assert_eq!(defaults.ttl, 3600);
        assert!(defaults.comment.is_empty());

        let server = ServerConfig::default();
        assert_eq!(server.host, "localhost");
        assert_eq!(server.port, 8888);
        assert_eq!(server.health_host, "0.0.0.0");
        assert_eq!(server.health_port, 8080);
    }

    #[test]
    fn test_router_config_validation() {
        assert!(router().validate().is_ok());

        let mut config = router();
        config.base_url = "192.168.88.1".into();
        assert!(config.validate().is_err());

        let mut config = router();
        config.username.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let rendered = format!("{:?}", router());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_domain_filter_validation() {
        let config = DomainFilterConfig {
            regex: Some("(".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DomainFilterConfig {
            regex_exclusion: Some("internal".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(DomainFilterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_server_ports_must_differ() {
        let config = ServerConfig {
            health_port: 8888,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bridge_config_from_json() {
        let json = serde_json::json!({
            "router": {"base_url": "http://router", "username": "api", "password": "pw"},
            "defaults": {"comment": "external-dns"}
        });
        let config: BridgeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.defaults.ttl, 3600);
        assert_eq!(config.defaults.comment, "external-dns");
        assert_eq!(config.server.port, 8888);
        assert!(config.validate().is_ok());
    }
}
