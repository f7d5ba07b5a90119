//! RouterOS DNS provider
//!
//! The provider sits between the webhook surface and a [`RouterApi`]:
//!
//! ```text
//! GET /records        POST /records
//!      │                    │
//!      ▼                    ▼
//! ┌──────────────────────────────────┐
//! │          RouterOsProvider        │
//! │  records()       apply_changes() │
//! └──────────────────────────────────┘
//!      │  ▲                 │
//!      │  │ decode          │ reconcile → domain filter → encode
//!      ▼  │                 ▼
//! ┌──────────────────────────────────┐
//! │            RouterApi             │
//! └──────────────────────────────────┘
//! ```
//!
//! ## Apply Flow
//!
//! 1. Reconcile the change set against the router defaults
//! 2. Reject the whole set if any endpoint is outside the domain filter
//! 3. Delete, then apply update pairs, then create
//! 4. Count per-record failures and report them together

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::config::DefaultValues;
use crate::domain_filter::DomainFilter;
use crate::endpoint::{ChangeSet, Endpoint};
use crate::error::{Error, Result};
use crate::reconcile::Reconciler;
use crate::record::{DnsRecord, RecordData, RecordFilter};
use crate::traits::{RouterApi, SystemInfo};
use crate::translate;

/// Outcome of a fully successful [`RouterOsProvider::apply_changes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Records created on the router
    pub created: usize,
    /// Records deleted from the router
    pub deleted: usize,
}

/// Running tally of record operations during one apply
#[derive(Debug, Default)]
struct Tally {
    report: ApplyReport,
    attempted: usize,
    failed: usize,
}

impl Tally {
    fn created(&mut self) {
        self.attempted += 1;
        self.report.created += 1;
    }

    fn deleted(&mut self) {
        self.attempted += 1;
        self.report.deleted += 1;
    }

    fn failed(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }

    fn finish(self) -> Result<ApplyReport> {
        if self.failed > 0 {
            return Err(Error::PartialFailure {
                failed: self.failed,
                total: self.attempted,
            });
        }
        Ok(self.report)
    }
}

/// Records sharing these attributes collapse into one endpoint
type GroupKey<'a> = [&'a str; 8];

fn group_key(record: &DnsRecord) -> GroupKey<'_> {
    [
        &record.name,
        record.effective_type(),
        &record.ttl,
        &record.comment,
        &record.regexp,
        &record.match_subdomain,
        &record.address_list,
        &record.disabled,
    ]
}

/// ExternalDNS provider backed by a RouterOS static DNS table
///
/// Holds no mutable state; a single instance is shared by all webhook
/// handlers.
pub struct RouterOsProvider {
    /// Router API client
    api: Box<dyn RouterApi>,

    /// Default-aware change filter
    reconciler: Reconciler,

    /// Names this provider may touch
    domain_filter: DomainFilter,
}

impl RouterOsProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `api`: router API implementation
    /// - `defaults`: values the router backfills for unset fields
    /// - `domain_filter`: names this provider may read and write
    pub fn new(api: Box<dyn RouterApi>, defaults: DefaultValues, domain_filter: DomainFilter) -> Self {
        Self {
            api,
            reconciler: Reconciler::new(defaults),
            domain_filter,
        }
    }

    /// The configured domain filter
    pub fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    /// The configured router defaults
    pub fn defaults(&self) -> &DefaultValues {
        self.reconciler.defaults()
    }

    /// Check connectivity and log the router identity
    pub async fn connect(&self) -> Result<SystemInfo> {
        let info = self.api.system_info().await?;
        info!(
            "Connected to board {} running RouterOS version {} ({}) via {}",
            info.board_name,
            info.version,
            info.architecture_name,
            self.api.api_name()
        );
        Ok(info)
    }

    /// Current router state as ExternalDNS endpoints.
    ///
    /// Records outside the domain filter are dropped. Records that share
    /// name, type, TTL, comment, regexp, match-subdomain, address-list and
    /// disabled are merged into one endpoint with multiple targets, in
    /// first-seen order. Records that do not decode are logged and skipped.
    pub async fn records(&self) -> Result<Vec<Endpoint>> {
        let records = self.api.list_records(&RecordFilter::default()).await?;
        let total = records.len();

        let mut order: Vec<GroupKey<'_>> = Vec::new();
        let mut groups: HashMap<GroupKey<'_>, Vec<&DnsRecord>> = HashMap::new();
        for record in records.iter().filter(|r| self.domain_filter.matches(&r.name)) {
            let key = group_key(record);
            groups
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(record);
        }
        debug!(
            "Grouped {} of {} records into {} groups",
            groups.values().map(Vec::len).sum::<usize>(),
            total,
            order.len()
        );

        let mut endpoints = Vec::with_capacity(order.len());
        for key in order {
            let Some(members) = groups.remove(&key) else {
                continue;
            };

            let mut merged: Option<Endpoint> = None;
            for record in members {
                match translate::to_endpoint(record) {
                    Ok(endpoint) => match merged.as_mut() {
                        Some(base) => base.targets.extend(endpoint.targets),
                        None => merged = Some(endpoint),
                    },
                    Err(e) => warn!("Skipping record {}: {}", record, e),
                }
            }
            endpoints.extend(merged);
        }

        debug!("Returning {} endpoints", endpoints.len());
        Ok(endpoints)
    }

    /// Apply a controller change set to the router.
    ///
    /// # Errors
    ///
    /// - [`Error::DomainFilter`] if any endpoint is outside the domain
    ///   filter; nothing is changed in that case
    /// - [`Error::PartialFailure`] if some record operations failed; the
    ///   others were still applied
    pub async fn apply_changes(&self, changes: &ChangeSet) -> Result<ApplyReport> {
        let changes = self.reconciler.reconcile(changes);

        if let Some(outside) = changes
            .endpoints()
            .find(|ep| !self.domain_filter.matches(&ep.name))
        {
            error!("Refusing change set: {} is outside the domain filter", outside.name);
            return Err(Error::domain_filter(outside.name.clone()));
        }

        let mut tally = Tally::default();

        for endpoint in &changes.delete {
            self.delete_targets(endpoint, &endpoint.targets, &mut tally).await;
        }

        let paired = changes.update_old.len().min(changes.update_new.len());
        for (old, new) in changes.update_old.iter().zip(&changes.update_new) {
            self.apply_update(old, new, &mut tally).await;
        }
        for old in &changes.update_old[paired..] {
            self.delete_targets(old, &old.targets, &mut tally).await;
        }
        for new in &changes.update_new[paired..] {
            self.create_targets(new, &new.targets, &mut tally).await;
        }

        for endpoint in &changes.create {
            self.create_targets(endpoint, &endpoint.targets, &mut tally).await;
        }

        let report = tally.finish();
        match &report {
            Ok(r) => info!("Applied changes: {} created, {} deleted", r.created, r.deleted),
            Err(e) => error!("Applied changes with errors: {}", e),
        }
        report
    }

    /// Return endpoints unchanged, logging the ones that would not encode
    pub fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
        for endpoint in &endpoints {
            if let Err(e) = translate::to_records(endpoint) {
                warn!("Endpoint {} will be rejected on apply: {}", endpoint, e);
            }
        }
        endpoints
    }

    /// Update one pair. When only targets differ, touch just the changed
    /// targets; otherwise replace every old record.
    async fn apply_update(&self, old: &Endpoint, new: &Endpoint, tally: &mut Tally) {
        let mut retargeted = new.clone();
        retargeted.targets = old.targets.clone();

        if self.reconciler.equivalent(old, &retargeted) {
            let removed: Vec<String> = old
                .targets
                .iter()
                .filter(|t| !new.targets.contains(t))
                .cloned()
                .collect();
            let added: Vec<String> = new
                .targets
                .iter()
                .filter(|t| !old.targets.contains(t))
                .cloned()
                .collect();
            debug!("Target-only update for {}: -{:?} +{:?}", new.name, removed, added);

            self.delete_targets(old, &removed, tally).await;
            self.create_targets(new, &added, tally).await;
        } else {
            self.delete_targets(old, &old.targets, tally).await;
            self.create_targets(new, &new.targets, tally).await;
        }
    }

    /// Delete the router records of `endpoint` whose target is in `targets`
    async fn delete_targets(&self, endpoint: &Endpoint, targets: &[String], tally: &mut Tally) {
        if targets.is_empty() {
            return;
        }
        if !endpoint.record_type.is_supported() {
            error!("Cannot delete {}: {}", endpoint, Error::unsupported_type(endpoint.record_type.as_str()));
            tally.failed();
            return;
        }

        let filter = RecordFilter::new(endpoint.name.clone(), "");
        let existing = match self.api.list_records(&filter).await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to look up records for {}: {}", endpoint.name, e);
                tally.failed();
                return;
            }
        };

        for record in existing
            .iter()
            .filter(|r| r.name == endpoint.name && r.effective_type() == endpoint.record_type.as_str())
        {
            let target = match RecordData::from_record(record) {
                Ok(data) => data.to_target(),
                Err(e) => {
                    debug!("Ignoring undecodable record {}: {}", record, e);
                    continue;
                }
            };
            if !targets.contains(&target) {
                continue;
            }

            let Some(id) = record.id.as_deref() else {
                warn!("Record {} has no id, cannot delete", record);
                continue;
            };
            match self.api.delete_record(id).await {
                Ok(()) => {
                    info!("Deleted {} {} {}", endpoint.name, endpoint.record_type, target);
                    tally.deleted();
                }
                Err(e) => {
                    error!("Failed to delete {}: {}", record, e);
                    tally.failed();
                }
            }
        }
    }

    /// Create one router record per entry of `targets`
    async fn create_targets(&self, endpoint: &Endpoint, targets: &[String], tally: &mut Tally) {
        for target in targets {
            let mut single = endpoint.clone();
            single.targets = vec![target.clone()];

            let record = match translate::to_record(&single) {
                Ok(record) => record,
                Err(e) => {
                    error!("Cannot encode {}: {}", single, e);
                    tally.failed();
                    continue;
                }
            };

            match self.api.create_record(&record).await {
                Ok(created) => {
                    info!(
                        "Created {} (id: {})",
                        single,
                        created.id.as_deref().unwrap_or("-")
                    );
                    tally.created();
                }
                Err(e) => {
                    error!("Failed to create {}: {}", single, e);
                    tally.failed();
                }
            }
        }
    }
}
