//! Provider-specific property lookup
//!
//! ExternalDNS passes router-specific settings as free-form key/value
//! properties. Depending on how the controller was configured a key may
//! arrive bare (`comment`) or namespaced (`webhook/comment`). Everything that
//! reads a property goes through this module so the two spellings are always
//! resolved the same way.

use std::fmt;

use crate::config::DefaultValues;
use crate::endpoint::Endpoint;

/// Namespace prefix ExternalDNS adds to webhook provider properties
pub const PROVIDER_PREFIX: &str = "webhook/";

/// Property keys this bridge understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderProperty {
    Comment,
    Regexp,
    MatchSubdomain,
    AddressList,
    Disabled,
    /// Accepted but not used: the endpoint's own TTL is authoritative
    Ttl,
}

impl ProviderProperty {
    /// All recognized properties
    pub const ALL: [ProviderProperty; 6] = [
        ProviderProperty::Comment,
        ProviderProperty::Regexp,
        ProviderProperty::MatchSubdomain,
        ProviderProperty::AddressList,
        ProviderProperty::Disabled,
        ProviderProperty::Ttl,
    ];

    /// Bare key, identical to the RouterOS field name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderProperty::Comment => "comment",
            ProviderProperty::Regexp => "regexp",
            ProviderProperty::MatchSubdomain => "match-subdomain",
            ProviderProperty::AddressList => "address-list",
            ProviderProperty::Disabled => "disabled",
            ProviderProperty::Ttl => "ttl",
        }
    }

    /// Parse a bare or `webhook/`-prefixed key
    pub fn from_key(key: &str) -> Option<Self> {
        let bare = key.strip_prefix(PROVIDER_PREFIX).unwrap_or(key);
        Self::ALL.into_iter().find(|p| p.as_str() == bare)
    }

    /// The key under the `webhook/` namespace
    pub fn prefixed_key(&self) -> String {
        format!("{PROVIDER_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for ProviderProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up a property on an endpoint without applying defaults.
///
/// A non-empty bare key wins over a non-empty prefixed key. Empty values are
/// treated as absent.
pub fn lookup<'a>(endpoint: &'a Endpoint, property: ProviderProperty) -> Option<&'a str> {
    let non_empty = |v: &&str| !v.is_empty();

    endpoint
        .property(property.as_str())
        .filter(non_empty)
        .or_else(|| {
            endpoint
                .property(&property.prefixed_key())
                .filter(non_empty)
        })
}

/// Resolves properties against the configured router defaults
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'a> {
    defaults: &'a DefaultValues,
}

impl<'a> PropertyResolver<'a> {
    /// Create a resolver over `defaults`
    pub fn new(defaults: &'a DefaultValues) -> Self {
        Self { defaults }
    }

    /// Resolve `property` on `endpoint`.
    ///
    /// Lookup order: bare key, then `webhook/` key, then the configured
    /// default (only `comment` and `ttl` have one), then absent. An empty
    /// default comment counts as no default.
    ///
    /// # Returns
    ///
    /// The resolved value, or `None` when nothing applies
    pub fn resolve(&self, endpoint: &Endpoint, property: ProviderProperty) -> Option<String> {
        if let Some(value) = lookup(endpoint, property) {
            return Some(value.to_string());
        }
        match property {
            ProviderProperty::Comment if !self.defaults.comment.is_empty() => {
                Some(self.defaults.comment.clone())
            }
            ProviderProperty::Ttl => Some(self.defaults.ttl.to_string()),
            _ => None,
        }
    }

    /// Resolve `property`, falling back to `fallback` when absent
    pub fn resolve_or(&self, endpoint: &Endpoint, property: ProviderProperty, fallback: &str) -> String {
        self.resolve(endpoint, property)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Resolve `property` as a RouterOS boolean; absent or unparseable is `false`
    pub fn resolve_bool(&self, endpoint: &Endpoint, property: ProviderProperty) -> bool {
        self.resolve(endpoint, property)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "yes")
    }
}
