//! Record ↔ endpoint translation
//!
//! Decoding turns one RouterOS record into a single-target endpoint; encoding
//! turns an endpoint target back into one record. Both directions validate
//! the type-specific fields and fail without producing partial output.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::properties::{self, ProviderProperty};
use crate::record::{DnsRecord, RecordData};
use crate::ttl;
use crate::validate;

/// Properties that map one-to-one onto RouterOS record fields
const RECORD_PROPERTIES: [ProviderProperty; 5] = [
    ProviderProperty::Comment,
    ProviderProperty::Regexp,
    ProviderProperty::MatchSubdomain,
    ProviderProperty::AddressList,
    ProviderProperty::Disabled,
];

/// Convert a RouterOS record into a single-target endpoint.
///
/// Non-empty `comment`, `regexp`, `match-subdomain`, `address-list` and
/// `disabled` fields become bare-keyed properties.
///
/// # Errors
///
/// - [`Error::UnsupportedType`] for types this bridge does not manage
/// - [`Error::Validation`] when the name or a type field is missing or invalid
/// - [`Error::Format`] when the TTL is empty or malformed
pub fn to_endpoint(record: &DnsRecord) -> Result<Endpoint> {
    let data = RecordData::from_record(record)?;
    validate::require_non_empty("name", &record.name)?;
    let ttl = ttl::duration_to_seconds(&record.ttl)?;

    let mut endpoint = Endpoint::new(record.name.clone(), data.record_type(), [data.to_target()])
        .with_ttl(ttl);
    for property in RECORD_PROPERTIES {
        let value = record_field(record, property);
        if !value.is_empty() {
            endpoint = endpoint.with_property(property.as_str(), value);
        }
    }

    Ok(endpoint)
}

/// Convert a single-target endpoint into a RouterOS record.
///
/// The TTL is always written, `0` as `"0s"`. The record has no id.
///
/// # Errors
///
/// - [`Error::Validation`] on `targets` unless there is exactly one target,
///   or on the name or a type field
/// - [`Error::Format`] when an MX or SRV target has the wrong token count
/// - [`Error::UnsupportedProperty`] for property keys outside the recognized set
pub fn to_record(endpoint: &Endpoint) -> Result<DnsRecord> {
    match endpoint.targets.as_slice() {
        [target] => encode(endpoint, target),
        targets => Err(Error::validation(
            "targets",
            format!(
                "expected exactly one target for {}, got {}",
                endpoint.name,
                targets.len()
            ),
        )),
    }
}

/// Convert an endpoint into one RouterOS record per target.
///
/// Either every target encodes or an error is returned.
pub fn to_records(endpoint: &Endpoint) -> Result<Vec<DnsRecord>> {
    if endpoint.targets.is_empty() {
        return Err(Error::validation(
            "targets",
            format!("{} has no targets", endpoint.name),
        ));
    }
    endpoint
        .targets
        .iter()
        .map(|target| encode(endpoint, target))
        .collect()
}

fn encode(endpoint: &Endpoint, target: &str) -> Result<DnsRecord> {
    validate::require_non_empty("name", &endpoint.name)?;
    if let Some(key) = endpoint
        .properties
        .keys()
        .find(|key| ProviderProperty::from_key(key).is_none())
    {
        return Err(Error::unsupported_property(key.as_str()));
    }

    let data = RecordData::parse_target(&endpoint.record_type, target)?;

    let mut record = DnsRecord {
        name: endpoint.name.clone(),
        ttl: ttl::seconds_to_duration(endpoint.ttl),
        ..Default::default()
    };
    data.write_to(&mut record);

    for property in RECORD_PROPERTIES {
        if let Some(value) = properties::lookup(endpoint, property) {
            *record_field_mut(&mut record, property) = value.to_string();
        }
    }

    Ok(record)
}

fn record_field(record: &DnsRecord, property: ProviderProperty) -> &str {
    match property {
        ProviderProperty::Comment => &record.comment,
        ProviderProperty::Regexp => &record.regexp,
        ProviderProperty::MatchSubdomain => &record.match_subdomain,
        ProviderProperty::AddressList => &record.address_list,
        ProviderProperty::Disabled => &record.disabled,
        ProviderProperty::Ttl => &record.ttl,
    }
}

fn record_field_mut(record: &mut DnsRecord, property: ProviderProperty) -> &mut String {
    match property {
        ProviderProperty::Comment => &mut record.comment,
        ProviderProperty::Regexp => &mut record.regexp,
        ProviderProperty::MatchSubdomain => &mut record.match_subdomain,
        ProviderProperty::AddressList => &mut record.address_list,
        ProviderProperty::Disabled => &mut record.disabled,
        ProviderProperty::Ttl => &mut record.ttl,
    }
}
