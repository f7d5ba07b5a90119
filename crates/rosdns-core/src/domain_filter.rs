//! Managed-domain filter
//!
//! Decides which names this bridge may read and write. Matches the ExternalDNS
//! domain filter semantics: suffix include/exclude lists, or an include regex
//! with an optional exclude regex. An empty filter matches every name.

use regex::Regex;
use serde::Serialize;

use crate::config::DomainFilterConfig;
use crate::error::{Error, Result};

/// Compiled domain filter
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    filters: Vec<String>,
    exclusions: Vec<String>,
    regex: Option<Regex>,
    regex_exclusion: Option<Regex>,
}

/// Negotiation payload, in the shape ExternalDNS expects
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DomainFilterJson<'a> {
    #[serde(skip_serializing_if = "is_empty")]
    include: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    exclude: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    regex_include: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regex_exclude: Option<&'a str>,
}

impl DomainFilter {
    /// Build a suffix filter
    pub fn new<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            filters: normalize_all(filters),
            ..Default::default()
        }
    }

    /// Add excluded suffixes
    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclusions = normalize_all(exclusions);
        self
    }

    /// Compile a filter from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either regular expression is invalid.
    pub fn from_config(config: &DomainFilterConfig) -> Result<Self> {
        let compile = |pattern: &Option<String>| -> Result<Option<Regex>> {
            pattern
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| {
                    Regex::new(p)
                        .map_err(|e| Error::config(format!("Invalid domain filter regex '{p}': {e}")))
                })
                .transpose()
        };

        let regex = compile(&config.regex)?;
        let regex_exclusion = compile(&config.regex_exclusion)?;
        if regex.is_some() {
            return Ok(Self {
                regex,
                regex_exclusion,
                ..Default::default()
            });
        }

        Ok(Self::new(&config.filters).with_exclusions(&config.exclusions))
    }

    /// Whether any include or exclude rule is set
    pub fn is_configured(&self) -> bool {
        !self.filters.is_empty() || !self.exclusions.is_empty() || self.regex.is_some()
    }

    /// Whether `name` is managed by this filter
    pub fn matches(&self, name: &str) -> bool {
        if let Some(regex) = &self.regex {
            let name = normalize(name);
            let excluded = self
                .regex_exclusion
                .as_ref()
                .is_some_and(|exclusion| exclusion.is_match(&name));
            return regex.is_match(&name) && !excluded;
        }

        match_suffix(&self.filters, name, true) && !match_suffix(&self.exclusions, name, false)
    }

    /// Render as the ExternalDNS negotiation JSON
    pub fn to_json(&self) -> serde_json::Value {
        let payload = DomainFilterJson {
            include: &self.filters,
            exclude: &self.exclusions,
            regex_include: self.regex.as_ref().map(Regex::as_str),
            regex_exclude: self.regex_exclusion.as_ref().map(Regex::as_str),
        };
        serde_json::to_value(payload).unwrap_or_else(|_| serde_json::json!({}))
    }
}

fn is_empty(list: &&[String]) -> bool {
    list.is_empty()
}

/// A suffix list matches `name` if any entry equals it or is a parent domain.
/// Entries starting with `.` only match strict subdomains.
fn match_suffix(filters: &[String], name: &str, when_empty: bool) -> bool {
    if filters.is_empty() {
        return when_empty;
    }

    let name = normalize(name);
    filters.iter().any(|filter| {
        if filter.starts_with('.') {
            name.ends_with(filter.as_str())
        } else {
            name == *filter || name.ends_with(&format!(".{filter}"))
        }
    })
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn normalize_all<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = names
        .into_iter()
        .map(|n| normalize(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}
