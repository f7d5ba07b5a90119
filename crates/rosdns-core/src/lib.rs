// # rosdns-core
//
// Core library for the RouterOS ExternalDNS webhook.
//
// ## Architecture Overview
//
// This library translates between the ExternalDNS endpoint model and the
// RouterOS static DNS table, and decides which controller changes actually
// need to reach the router:
// - **ttl**: RouterOS duration strings ↔ integer seconds
// - **validate**: per-field grammar checks for record data
// - **translate**: record ↔ endpoint conversion
// - **properties**: bare / `webhook/` provider-specific property lookup
// - **reconcile**: drops updates that only differ by router-backfilled defaults
// - **RouterApi**: trait for talking to a router
// - **RouterOsProvider**: reads records and applies change sets through a `RouterApi`
//
// ## Data Flow
//
// observed records → translate → endpoints → reconcile (vs. desired)
// → filtered change set → translate → records → RouterApi

pub mod config;
pub mod domain_filter;
pub mod endpoint;
pub mod error;
pub mod properties;
pub mod provider;
pub mod reconcile;
pub mod record;
pub mod traits;
pub mod translate;
pub mod ttl;
pub mod validate;

// Re-export core types for convenience
pub use config::{BridgeConfig, DefaultValues, DomainFilterConfig, RouterOsConfig, ServerConfig};
pub use domain_filter::DomainFilter;
pub use endpoint::{ChangeSet, Endpoint, RecordType};
pub use error::{Error, Result};
pub use properties::{PropertyResolver, ProviderProperty};
pub use provider::{ApplyReport, RouterOsProvider};
pub use reconcile::Reconciler;
pub use record::{DnsRecord, RecordData, RecordFilter};
pub use traits::{RouterApi, SystemInfo};
