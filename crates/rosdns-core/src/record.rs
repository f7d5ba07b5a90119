//! Router-side data model
//!
//! RouterOS exposes static DNS entries (`/ip/dns/static`) as flat JSON objects
//! with one string field per possible attribute. [`DnsRecord`] mirrors that
//! wire shape exactly. [`RecordData`] is the typed, per-record-type payload;
//! conversion between the two happens only in [`RecordData::from_record`] and
//! [`RecordData::write_to`], so the rest of the crate never looks at fields
//! that do not belong to a record's type.
//!
//! Reference: <https://help.mikrotik.com/docs/display/ROS/DNS#DNS-DNSStatic>

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::endpoint::RecordType;
use crate::error::{Error, Result};
use crate::validate;

/// Record types requested when a filter does not name one
pub const DEFAULT_FILTER_TYPES: &str = "A,AAAA,CNAME,TXT,MX,SRV,NS";

/// A RouterOS static DNS entry in its native flat JSON shape
///
/// Empty fields are omitted on serialization and default to empty on
/// deserialization. Fields RouterOS returns that this bridge does not use
/// (`dynamic`, `forward-to`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DnsRecord {
    /// Opaque RouterOS identifier (`*1A`), absent before creation
    #[serde(rename = ".id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Domain name
    #[serde(default)]
    pub name: String,

    /// Record type; RouterOS leaves this empty for A records
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub record_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cname: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mx_exchange: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mx_preference: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub srv_priority: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub srv_weight: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub srv_port: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub srv_target: String,

    /// Duration string (`"1h"`, `"1d"`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ttl: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    /// `"true"` or `"false"`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub disabled: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub match_subdomain: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regexp: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address_list: String,
}

impl DnsRecord {
    /// The record type with the RouterOS convention applied: empty means A
    pub fn effective_type(&self) -> &str {
        if self.record_type.is_empty() {
            "A"
        } else {
            &self.record_type
        }
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (id: {})",
            self.name,
            self.effective_type(),
            self.id.as_deref().unwrap_or("-")
        )
    }
}

/// A validated value together with the text it was parsed from
///
/// Rendering writes the source text back, so `"2001:DB8:0::1"` or an MX
/// preference of `"010"` reach the router exactly as the controller sent
/// them and read back identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spelled<T> {
    value: T,
    text: String,
}

impl<T> Spelled<T> {
    fn new(value: T, text: &str) -> Self {
        Self {
            value,
            text: text.to_string(),
        }
    }

    /// The parsed value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The source text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl<T: fmt::Display> From<T> for Spelled<T> {
    fn from(value: T) -> Self {
        let text = value.to_string();
        Self { value, text }
    }
}

impl<T> fmt::Display for Spelled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Typed record payload, one variant per supported record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Spelled<Ipv4Addr>),
    Aaaa(Spelled<Ipv6Addr>),
    Cname(String),
    Txt(String),
    Mx {
        preference: Spelled<u16>,
        exchange: String,
    },
    Srv {
        priority: Spelled<u16>,
        weight: Spelled<u16>,
        port: Spelled<u16>,
        target: String,
    },
}

impl RecordData {
    /// The record type of this payload
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::Aaaa,
            RecordData::Cname(_) => RecordType::Cname,
            RecordData::Txt(_) => RecordType::Txt,
            RecordData::Mx { .. } => RecordType::Mx,
            RecordData::Srv { .. } => RecordType::Srv,
        }
    }

    /// Parse an endpoint target string for `record_type`.
    ///
    /// MX targets are `"<preference> <exchange>"`, SRV targets are
    /// `"<priority> <weight> <port> <target>"`, separated by single spaces;
    /// all others are a single value.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedType`] for types outside A/AAAA/CNAME/TXT/MX/SRV
    /// - [`Error::Format`] when an MX/SRV target has the wrong token count
    /// - [`Error::Validation`] when a component fails its field grammar
    pub fn parse_target(record_type: &RecordType, target: &str) -> Result<Self> {
        match record_type {
            RecordType::A => Self::a(target),
            RecordType::Aaaa => Self::aaaa(target),
            RecordType::Cname => {
                validate::domain_name("cname", target)?;
                Ok(RecordData::Cname(target.to_string()))
            }
            RecordType::Txt => {
                validate::require_non_empty("text", target)?;
                Ok(RecordData::Txt(target.to_string()))
            }
            RecordType::Mx => {
                let [preference, exchange] = split_exact::<2>(record_type, target)?;
                Self::mx(preference, exchange)
            }
            RecordType::Srv => {
                let [priority, weight, port, srv_target] = split_exact::<4>(record_type, target)?;
                Self::srv(priority, weight, port, srv_target)
            }
            RecordType::Other(name) => Err(Error::unsupported_type(name.as_str())),
        }
    }

    /// Read the typed payload out of a flat RouterOS record.
    ///
    /// Only the fields belonging to the record's type are inspected.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedType`] for types outside A/AAAA/CNAME/TXT/MX/SRV
    /// - [`Error::Validation`] for missing or malformed type fields
    pub fn from_record(record: &DnsRecord) -> Result<Self> {
        let record_type: RecordType = record.effective_type().parse()?;
        match record_type {
            RecordType::A => Self::a(&record.address),
            RecordType::Aaaa => Self::aaaa(&record.address),
            RecordType::Cname => {
                validate::domain_name("cname", &record.cname)?;
                Ok(RecordData::Cname(record.cname.clone()))
            }
            RecordType::Txt => {
                validate::require_non_empty("text", &record.text)?;
                Ok(RecordData::Txt(record.text.clone()))
            }
            RecordType::Mx => Self::mx(&record.mx_preference, &record.mx_exchange),
            RecordType::Srv => Self::srv(
                &record.srv_priority,
                &record.srv_weight,
                &record.srv_port,
                &record.srv_target,
            ),
            RecordType::Other(name) => Err(Error::unsupported_type(name)),
        }
    }

    /// Render as an endpoint target string
    pub fn to_target(&self) -> String {
        match self {
            RecordData::A(addr) => addr.to_string(),
            RecordData::Aaaa(addr) => addr.to_string(),
            RecordData::Cname(name) => name.clone(),
            RecordData::Txt(text) => text.clone(),
            RecordData::Mx {
                preference,
                exchange,
            } => format!("{preference} {exchange}"),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{priority} {weight} {port} {target}"),
        }
    }

    /// Populate the type field and the type-specific fields of `record`
    pub fn write_to(&self, record: &mut DnsRecord) {
        record.record_type = self.record_type().as_str().to_string();
        match self {
            RecordData::A(addr) => record.address = addr.to_string(),
            RecordData::Aaaa(addr) => record.address = addr.to_string(),
            RecordData::Cname(name) => record.cname = name.clone(),
            RecordData::Txt(text) => record.text = text.clone(),
            RecordData::Mx {
                preference,
                exchange,
            } => {
                record.mx_preference = preference.to_string();
                record.mx_exchange = exchange.clone();
            }
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                record.srv_priority = priority.to_string();
                record.srv_weight = weight.to_string();
                record.srv_port = port.to_string();
                record.srv_target = target.clone();
            }
        }
    }

    fn a(address: &str) -> Result<Self> {
        Ok(RecordData::A(Spelled::new(validate::ipv4("address", address)?, address)))
    }

    fn aaaa(address: &str) -> Result<Self> {
        Ok(RecordData::Aaaa(Spelled::new(validate::ipv6("address", address)?, address)))
    }

    fn mx(preference: &str, exchange: &str) -> Result<Self> {
        let preference = Spelled::new(validate::u16_field("mx-preference", preference)?, preference);
        validate::mx_exchange("mx-exchange", exchange)?;
        Ok(RecordData::Mx {
            preference,
            exchange: exchange.to_string(),
        })
    }

    fn srv(priority: &str, weight: &str, port: &str, target: &str) -> Result<Self> {
        let priority = Spelled::new(validate::u16_field("srv-priority", priority)?, priority);
        let weight = Spelled::new(validate::u16_field("srv-weight", weight)?, weight);
        let port = Spelled::new(validate::u16_field("srv-port", port)?, port);
        validate::domain_name("srv-target", target)?;
        Ok(RecordData::Srv {
            priority,
            weight,
            port,
            target: target.to_string(),
        })
    }
}

/// Split a composite target into exactly `N` single-space separated tokens
///
/// The router stores each token in its own field, so any other spacing could
/// not be read back as written.
fn split_exact<'a, const N: usize>(record_type: &RecordType, target: &'a str) -> Result<[&'a str; N]> {
    let tokens: Vec<&str> = target.split(' ').collect();
    if tokens.iter().any(|t| t.is_empty() || t.contains(char::is_whitespace)) {
        return Err(Error::format(format!(
            "{record_type} target '{target}' must separate fields with single spaces"
        )));
    }
    tokens.try_into().map_err(|tokens: Vec<&str>| {
        Error::format(format!(
            "{record_type} target '{target}' has {} fields, expected {N}",
            tokens.len()
        ))
    })
}

/// Query filter for listing RouterOS static DNS entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Exact record name, empty for all names
    pub name: String,
    /// Record type (or comma-separated types), empty for [`DEFAULT_FILTER_TYPES`]
    pub record_type: String,
}

impl RecordFilter {
    /// Filter on a name and a single type
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
        }
    }

    /// Render as a RouterOS query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        let record_type = if self.record_type.is_empty() {
            DEFAULT_FILTER_TYPES
        } else {
            &self.record_type
        };

        let mut query = format!("type={record_type}");
        if !self.name.is_empty() {
            query.push_str("&name=");
            query.extend(url::form_urlencoded::byte_serialize(self.name.as_bytes()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_uses_routeros_names() {
        let json = serde_json::json!({
            ".id": "*1",
            "name": "mx.example.com",
            "type": "MX",
            "mx-exchange": "mail.example.com",
            "mx-preference": "10",
            "ttl": "1h",
            "match-subdomain": "false",
            "address-list": "list",
            "dynamic": "false"
        });

        let record: DnsRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.id.as_deref(), Some("*1"));
        assert_eq!(record.mx_exchange, "mail.example.com");
        assert_eq!(record.mx_preference, "10");
        assert_eq!(record.match_subdomain, "false");
        assert_eq!(record.address_list, "list");

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out[".id"], "*1");
        assert_eq!(out["mx-preference"], "10");
        assert!(out.get("address").is_none(), "empty fields are omitted");
    }

    #[test]
    fn test_empty_type_means_a() {
        let record = DnsRecord {
            name: "example.com".into(),
            address: "192.0.2.1".into(),
            ..Default::default()
        };
        assert_eq!(record.effective_type(), "A");
        assert_eq!(
            RecordData::from_record(&record).unwrap(),
            RecordData::A(Ipv4Addr::new(192, 0, 2, 1).into())
        );
    }

    #[test]
    fn test_from_record_ignores_foreign_fields() {
        let record = DnsRecord {
            name: "example.com".into(),
            record_type: "CNAME".into(),
            cname: "target.example.com".into(),
            address: "not an address".into(),
            ..Default::default()
        };
        assert_eq!(
            RecordData::from_record(&record).unwrap(),
            RecordData::Cname("target.example.com".into())
        );
    }

    #[test]
    fn test_from_record_unsupported_type() {
        let record = DnsRecord {
            name: "example.com".into(),
            record_type: "NS".into(),
            ..Default::default()
        };
        assert!(matches!(
            RecordData::from_record(&record),
            Err(Error::UnsupportedType(t)) if t == "NS"
        ));
    }

    #[test]
    fn test_parse_srv_target() {
        let data = RecordData::parse_target(&RecordType::Srv, "10 60 5060 sip.example.com").unwrap();
        assert_eq!(
            data,
            RecordData::Srv {
                priority: 10u16.into(),
                weight: 60u16.into(),
                port: 5060u16.into(),
                target: "sip.example.com".into()
            }
        );
        assert_eq!(data.to_target(), "10 60 5060 sip.example.com");
    }

    #[test]
    fn test_parse_target_token_count() {
        assert!(matches!(
            RecordData::parse_target(&RecordType::Mx, "mail.example.com"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            RecordData::parse_target(&RecordType::Srv, "10 60 sip.example.com"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            RecordData::parse_target(&RecordType::Mx, "10 mail.example.com extra"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_write_to_sets_only_type_fields() {
        let mut record = DnsRecord::default();
        RecordData::Mx {
            preference: 10u16.into(),
            exchange: "mail.example.com".into(),
        }
        .write_to(&mut record);

        assert_eq!(record.record_type, "MX");
        assert_eq!(record.mx_preference, "10");
        assert_eq!(record.mx_exchange, "mail.example.com");
        assert!(record.address.is_empty());
        assert!(record.srv_target.is_empty());
    }

    #[test]
    fn test_targets_keep_their_spelling() {
        let data = RecordData::parse_target(&RecordType::Aaaa, "2001:DB8:0::1").unwrap();
        assert_eq!(data.to_target(), "2001:DB8:0::1");

        let data = RecordData::parse_target(&RecordType::Mx, "010 mail.example.com").unwrap();
        let mut record = DnsRecord::default();
        data.write_to(&mut record);
        assert_eq!(record.mx_preference, "010");
        assert_eq!(RecordData::from_record(&record).unwrap().to_target(), "010 mail.example.com");

        match data {
            RecordData::Mx { preference, .. } => assert_eq!(*preference.value(), 10),
            other => panic!("expected MX, got {other:?}"),
        }
    }

    #[test]
    fn test_composite_target_spacing() {
        for bad in ["10  mail.example.com", " 10 mail.example.com", "10 mail.example.com ", "10\tmail.example.com"] {
            assert!(
                matches!(RecordData::parse_target(&RecordType::Mx, bad), Err(Error::Format(_))),
                "expected format error for {bad:?}"
            );
        }
        assert!(matches!(
            RecordData::parse_target(&RecordType::Srv, "10 60  5060 sip.example.com"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_parse_target_unsupported_type() {
        assert!(matches!(
            RecordData::parse_target(&RecordType::Other("NS".into()), "ns1.example.com"),
            Err(Error::UnsupportedType(t)) if t == "NS"
        ));
    }

    #[test]
    fn test_filter_query_string() {
        assert_eq!(
            RecordFilter::default().to_query_string(),
            "type=A,AAAA,CNAME,TXT,MX,SRV,NS"
        );
        assert_eq!(
            RecordFilter::new("example.com", "").to_query_string(),
            "type=A,AAAA,CNAME,TXT,MX,SRV,NS&name=example.com"
        );
        assert_eq!(
            RecordFilter::new("my host.example.com", "TXT").to_query_string(),
            "type=TXT&name=my+host.example.com"
        );
    }
}
