//! Controller-side data model
//!
//! [`Endpoint`] and [`ChangeSet`] are the generic, provider-neutral shapes
//! ExternalDNS exchanges with webhook providers. Field names on the wire follow
//! the ExternalDNS JSON encoding (`dnsName`, `recordTTL`, `providerSpecific`,
//! `Create`/`UpdateOld`/...).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// DNS record types as they appear on the wire
///
/// Types outside A, AAAA, CNAME, TXT, MX and SRV decode as [`RecordType::Other`]
/// so one unsupported endpoint does not reject a whole request. They fail
/// per item when encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name
    Cname,
    /// Free-form text
    Txt,
    /// Mail exchange
    Mx,
    /// Service locator
    Srv,
    /// Any type this bridge does not manage, spelled as received
    Other(String),
}

impl RecordType {
    /// All supported types, in RouterOS filter order
    pub const ALL: [RecordType; 6] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Txt,
        RecordType::Mx,
        RecordType::Srv,
    ];

    /// Upper-case wire name (`"A"`, `"AAAA"`, ...)
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Srv => "SRV",
            RecordType::Other(name) => name,
        }
    }

    /// Whether records of this type can be translated
    pub fn is_supported(&self) -> bool {
        !matches!(self, RecordType::Other(_))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: only supported types succeed
impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "MX" => Ok(RecordType::Mx),
            "SRV" => Ok(RecordType::Srv),
            other => Err(Error::unsupported_type(other)),
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(record_type) => record_type,
            Err(_) => RecordType::Other(value),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::Other(name) => name,
            supported => supported.as_str().to_string(),
        }
    }
}

/// A desired or observed DNS record set, as ExternalDNS models it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully-qualified record name
    #[serde(rename = "dnsName")]
    pub name: String,

    /// Record data, one entry per value; grammar depends on `record_type`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub targets: Vec<String>,

    /// Record type
    pub record_type: RecordType,

    /// TTL in seconds, 0 when unspecified
    #[serde(rename = "recordTTL", default)]
    pub ttl: u32,

    /// Controller bookkeeping labels, carried through untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Provider-specific properties
    #[serde(
        rename = "providerSpecific",
        default,
        with = "provider_specific",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub properties: BTreeMap<String, String>,
}

impl Endpoint {
    /// Create an endpoint with no TTL and no properties
    pub fn new<I, S>(name: impl Into<String>, record_type: RecordType, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            record_type,
            ttl: 0,
            labels: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Add a provider-specific property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Raw property lookup by exact key
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.name,
            self.ttl,
            self.record_type,
            self.targets.join(";")
        )
    }
}

/// A create/update/delete partition produced by the controller's planner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Endpoints to create
    #[serde(rename = "Create", alias = "create", default, deserialize_with = "null_as_empty")]
    pub create: Vec<Endpoint>,

    /// Current state of updated endpoints, paired by index with `update_new`
    #[serde(rename = "UpdateOld", alias = "updateOld", default, deserialize_with = "null_as_empty")]
    pub update_old: Vec<Endpoint>,

    /// Desired state of updated endpoints
    #[serde(rename = "UpdateNew", alias = "updateNew", default, deserialize_with = "null_as_empty")]
    pub update_new: Vec<Endpoint>,

    /// Endpoints to delete
    #[serde(rename = "Delete", alias = "delete", default, deserialize_with = "null_as_empty")]
    pub delete: Vec<Endpoint>,
}

impl ChangeSet {
    /// True when there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }

    /// Every endpoint referenced by this change set
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.create
            .iter()
            .chain(&self.update_old)
            .chain(&self.update_new)
            .chain(&self.delete)
    }
}

/// Go encodes nil slices as `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `providerSpecific` is a list of `{name, value}` pairs on the wire
mod provider_specific {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Property {
        name: String,
        #[serde(default)]
        value: String,
    }

    pub fn serialize<S>(map: &BTreeMap<String, String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let list: Vec<Property> = map
            .iter()
            .map(|(name, value)| Property {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Option::<Vec<Property>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(list.into_iter().map(|p| (p.name, p.value)).collect())
    }
}
