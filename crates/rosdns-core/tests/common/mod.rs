//! Test doubles and common utilities for contract tests
//!
//! This module provides an in-memory router that behaves like the RouterOS
//! static DNS table closely enough to exercise the provider end to end.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rosdns_core::error::{Error, Result};
use rosdns_core::traits::{RouterApi, SystemInfo};
use rosdns_core::{DefaultValues, DnsRecord, DomainFilter, RecordFilter, RouterOsProvider};

/// Shared state behind a [`MockRouterApi`]
#[derive(Default)]
struct RouterState {
    records: Vec<DnsRecord>,
    next_id: usize,
    /// Creates whose `address` equals this value fail
    fail_create_address: Option<String>,
}

/// An in-memory router that tracks calls
pub struct MockRouterApi {
    state: Arc<Mutex<RouterState>>,
    list_call_count: Arc<AtomicUsize>,
    create_call_count: Arc<AtomicUsize>,
    delete_call_count: Arc<AtomicUsize>,
}

impl MockRouterApi {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RouterState {
                next_id: 1,
                ..Default::default()
            })),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            create_call_count: Arc::new(AtomicUsize::new(0)),
            delete_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new MockRouterApi that shares state and counters with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
            list_call_count: Arc::clone(&other.list_call_count),
            create_call_count: Arc::clone(&other.create_call_count),
            delete_call_count: Arc::clone(&other.delete_call_count),
        }
    }

    /// Seed a record as if it already existed on the router
    pub fn seed(&self, mut record: DnsRecord) {
        let mut state = self.state.lock().unwrap();
        if record.id.is_none() {
            record.id = Some(format!("*{:X}", state.next_id));
            state.next_id += 1;
        }
        state.records.push(record);
    }

    /// Make creates of records with this address fail
    pub fn fail_creates_for(&self, address: &str) {
        self.state.lock().unwrap().fail_create_address = Some(address.to_string());
    }

    /// Snapshot of the router table
    pub fn records(&self) -> Vec<DnsRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_call_count.load(Ordering::SeqCst)
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_call_count.load(Ordering::SeqCst)
    }

    /// Total mutating calls
    pub fn mutation_count(&self) -> usize {
        self.create_call_count() + self.delete_call_count()
    }
}

#[async_trait::async_trait]
impl RouterApi for MockRouterApi {
    async fn system_info(&self) -> Result<SystemInfo> {
        Ok(SystemInfo {
            board_name: "CHR".to_string(),
            version: "7.16 (stable)".to_string(),
            architecture_name: "x86_64".to_string(),
            ..Default::default()
        })
    }

    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|r| filter.name.is_empty() || r.name == filter.name)
            .filter(|r| {
                filter.record_type.is_empty()
                    || filter.record_type.split(',').any(|t| t == r.effective_type())
            })
            .cloned()
            .collect())
    }

    async fn create_record(&self, record: &DnsRecord) -> Result<DnsRecord> {
        self.create_call_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.fail_create_address.as_deref() == Some(record.address.as_str()) {
            return Err(Error::provider("mock", "failure: entry rejected"));
        }

        let mut created = record.clone();
        created.id = Some(format!("*{:X}", state.next_id));
        state.next_id += 1;
        state.records.push(created.clone());
        Ok(created)
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.delete_call_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let before = state.records.len();
        state.records.retain(|r| r.id.as_deref() != Some(id));
        if state.records.len() == before {
            return Err(Error::not_found(id));
        }
        Ok(())
    }

    fn api_name(&self) -> &'static str {
        "mock"
    }
}

/// Router defaults used throughout the contract tests
pub fn defaults() -> DefaultValues {
    DefaultValues::new(3600, "external-dns")
}

/// Build a provider over a fresh mock router, returning a handle to the router
pub fn provider_with(domain_filter: DomainFilter) -> (RouterOsProvider, MockRouterApi) {
    let router = MockRouterApi::new();
    let provider = RouterOsProvider::new(
        Box::new(MockRouterApi::sharing_state_with(&router)),
        defaults(),
        domain_filter,
    );
    (provider, router)
}

/// An A record as RouterOS reports it
pub fn a_record(name: &str, address: &str, ttl: &str) -> DnsRecord {
    DnsRecord {
        name: name.to_string(),
        record_type: "A".to_string(),
        address: address.to_string(),
        ttl: ttl.to_string(),
        disabled: "false".to_string(),
        ..Default::default()
    }
}
