//! Field-level validation for DNS record payloads
//!
//! Every check returns [`Error::Validation`] naming the offending field using
//! its RouterOS spelling, so callers can report exactly which part of a record
//! was rejected. The same checks run on both conversion directions.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

/// Maximum length of a presentation-format domain name (RFC 1035)
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single label (RFC 1035)
const MAX_LABEL_LEN: usize = 63;

/// Require a non-blank value
pub fn require_non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "cannot be empty"));
    }
    Ok(value)
}

/// Parse an IPv4 literal. IPv6 literals are rejected explicitly.
pub fn ipv4(field: &'static str, value: &str) -> Result<Ipv4Addr> {
    require_non_empty(field, value)?;
    if value.parse::<Ipv6Addr>().is_ok() {
        return Err(Error::validation(
            field,
            format!("'{value}' is an IPv6 address, expected IPv4"),
        ));
    }
    value
        .parse()
        .map_err(|_| Error::validation(field, format!("'{value}' is not a valid IPv4 address")))
}

/// Parse an IPv6 literal. IPv4 literals are rejected explicitly.
pub fn ipv6(field: &'static str, value: &str) -> Result<Ipv6Addr> {
    require_non_empty(field, value)?;
    if value.parse::<Ipv4Addr>().is_ok() {
        return Err(Error::validation(
            field,
            format!("'{value}' is an IPv4 address, expected IPv6"),
        ));
    }
    value
        .parse()
        .map_err(|_| Error::validation(field, format!("'{value}' is not a valid IPv6 address")))
}

/// Parse an unsigned 16-bit field (preference, priority, weight, port)
pub fn u16_field(field: &'static str, value: &str) -> Result<u16> {
    require_non_empty(field, value)?;
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(field, format!("'{value}' is not a number")));
    }
    value
        .parse()
        .map_err(|_| Error::validation(field, format!("{value} is outside 0-65535")))
}

/// Validate a DNS name as used in record data (CNAME, MX exchange, SRV target).
///
/// This implements basic DNS domain name validation per RFC 1035, relaxed to
/// allow underscores (service labels such as `_sip._tcp`). A single trailing
/// dot is accepted.
pub fn domain_name(field: &'static str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;

    let name = value.strip_suffix('.').unwrap_or(value);
    if name.is_empty() {
        return Err(Error::validation(field, "root name is not a valid target"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::validation(
            field,
            format!("name too long: {} chars (max {MAX_NAME_LEN})", name.len()),
        ));
    }

    let labels: Vec<&str> = name.split('.').collect();
    for label in &labels {
        if label.is_empty() {
            return Err(Error::validation(field, format!("'{value}' has an empty label")));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::validation(
                field,
                format!("label '{label}' too long: {} chars (max {MAX_LABEL_LEN})", label.len()),
            ));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::validation(
                field,
                format!("label '{label}' contains invalid characters"),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::validation(
                field,
                format!("label '{label}' cannot start or end with a hyphen"),
            ));
        }
    }

    // labels is non-empty: split always yields at least one item
    let last = labels[labels.len() - 1];
    if last.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(
            field,
            format!("final label '{last}' cannot be numeric"),
        ));
    }

    Ok(())
}

/// Validate an MX exchange: a DNS name with a TLD-like final label of two or
/// more characters.
pub fn mx_exchange(field: &'static str, value: &str) -> Result<()> {
    domain_name(field, value)?;

    let name = value.strip_suffix('.').unwrap_or(value);
    match name.rsplit_once('.') {
        Some((_, tld)) if tld.len() >= 2 => Ok(()),
        Some((_, tld)) => Err(Error::validation(
            field,
            format!("top-level label '{tld}' must be at least 2 characters"),
        )),
        None => Err(Error::validation(
            field,
            format!("'{value}' must be a fully-qualified name"),
        )),
    }
}
