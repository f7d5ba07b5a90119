// # Router API Trait
//
// Defines the interface to a router's static DNS table.
//
// ## Implementations
//
// - RouterOS REST: `rosdns-routeros` crate
//
// ## Usage
//
// ```rust,ignore
// use rosdns_core::{RecordFilter, RouterApi};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* RouterApi implementation */;
//
//     let records = api
//         .list_records(&RecordFilter::new("www.example.com", "A"))
//         .await?;
//
//     for record in &records {
//         api.delete_record(record.id.as_deref().unwrap_or_default()).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::record::{DnsRecord, RecordFilter};

/// Router identity and resource summary (`/system/resource`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemInfo {
    #[serde(default)]
    pub architecture_name: String,
    #[serde(default)]
    pub board_name: String,
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub version: String,
}

/// Trait for router API implementations
///
/// Implementations perform exactly one request per call and return failures
/// as errors. Retrying is left to the controller's next reconciliation cycle.
///
/// # Thread Safety
///
/// Implementations must be thread-safe; the webhook server shares one
/// instance across all request handlers.
#[async_trait]
pub trait RouterApi: Send + Sync {
    /// Fetch router identity, used as a connectivity check
    async fn system_info(&self) -> Result<SystemInfo, crate::Error>;

    /// List static DNS entries matching `filter`
    ///
    /// # Parameters
    ///
    /// - `filter`: name and type restriction; an empty filter lists every
    ///   supported type
    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a static DNS entry
    ///
    /// # Returns
    ///
    /// The record as stored by the router, including its assigned `.id`
    async fn create_record(&self, record: &DnsRecord) -> Result<DnsRecord, crate::Error>;

    /// Delete a static DNS entry by its `.id`
    async fn delete_record(&self, id: &str) -> Result<(), crate::Error>;

    /// Get the API name (for logging/debugging)
    fn api_name(&self) -> &'static str;
}
