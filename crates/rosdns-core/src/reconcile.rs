//! Change-set reconciliation
//!
//! RouterOS backfills defaults for fields a desired record leaves unset: a
//! TTL of 0 comes back as the default TTL, a missing comment comes back as
//! the default comment, a missing `disabled` comes back as `"false"`. The
//! controller sees those as differences and asks for the same update on every
//! cycle. The reconciler compares old and new endpoints with the defaults
//! taken into account and drops the update pairs that would change nothing.

use tracing::debug;

use crate::config::DefaultValues;
use crate::endpoint::{ChangeSet, Endpoint};
use crate::properties::{PropertyResolver, ProviderProperty};

/// Default-aware change-set filter
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    defaults: DefaultValues,
}

impl Reconciler {
    /// Create a reconciler for the given router defaults
    pub fn new(defaults: DefaultValues) -> Self {
        Self { defaults }
    }

    /// The defaults this reconciler compares against
    pub fn defaults(&self) -> &DefaultValues {
        &self.defaults
    }

    /// Whether `a` and `b` describe the same router state.
    ///
    /// Name, type and targets must match exactly. TTLs match when equal or
    /// when both are unspecified or the default. Comments match when equal
    /// or when both are absent or the default. `match-subdomain` and
    /// `disabled` are compared as booleans, `address-list` and `regexp` as
    /// strings. Labels are ignored.
    pub fn equivalent(&self, a: &Endpoint, b: &Endpoint) -> bool {
        if a.name != b.name {
            debug!("name mismatch: {} != {}", a.name, b.name);
            return false;
        }
        if a.record_type != b.record_type {
            debug!("record type mismatch: {} != {}", a.record_type, b.record_type);
            return false;
        }
        if a.targets != b.targets {
            debug!("targets mismatch: {:?} != {:?}", a.targets, b.targets);
            return false;
        }

        let ttl_relevant = |ttl: u32| ttl != 0 && ttl != self.defaults.ttl;
        if a.ttl != b.ttl && (ttl_relevant(a.ttl) || ttl_relevant(b.ttl)) {
            debug!("TTL mismatch: {} != {}", a.ttl, b.ttl);
            return false;
        }

        let resolver = PropertyResolver::new(&self.defaults);

        let comment_a = resolver.resolve_or(a, ProviderProperty::Comment, "");
        let comment_b = resolver.resolve_or(b, ProviderProperty::Comment, "");
        let comment_relevant = |c: &str| !c.is_empty() && c != self.defaults.comment;
        if comment_a != comment_b && (comment_relevant(&comment_a) || comment_relevant(&comment_b)) {
            debug!("comment mismatch: {comment_a:?} != {comment_b:?}");
            return false;
        }

        for property in [ProviderProperty::MatchSubdomain, ProviderProperty::Disabled] {
            let flag_a = resolver.resolve_bool(a, property);
            let flag_b = resolver.resolve_bool(b, property);
            if flag_a != flag_b {
                debug!("{property} mismatch: {flag_a} != {flag_b}");
                return false;
            }
        }

        for property in [ProviderProperty::AddressList, ProviderProperty::Regexp] {
            let value_a = resolver.resolve_or(a, property, "");
            let value_b = resolver.resolve_or(b, property, "");
            if value_a != value_b {
                debug!("{property} mismatch: {value_a:?} != {value_b:?}");
                return false;
            }
        }

        true
    }

    /// Drop update pairs whose old and new sides are equivalent.
    ///
    /// Pairs are formed by index. When the lists differ in length only the
    /// common prefix is paired; the unpaired tail of the longer list is kept.
    /// Order is preserved.
    ///
    /// # Returns
    ///
    /// The surviving `(update_old, update_new)` lists
    pub fn filter_updates(&self, old: &[Endpoint], new: &[Endpoint]) -> (Vec<Endpoint>, Vec<Endpoint>) {
        let mut kept_old = Vec::with_capacity(old.len());
        let mut kept_new = Vec::with_capacity(new.len());

        for (a, b) in old.iter().zip(new) {
            if self.equivalent(a, b) {
                debug!("dropping no-op update for {}", a);
                continue;
            }
            kept_old.push(a.clone());
            kept_new.push(b.clone());
        }

        let paired = old.len().min(new.len());
        kept_old.extend_from_slice(&old[paired..]);
        kept_new.extend_from_slice(&new[paired..]);

        (kept_old, kept_new)
    }

    /// Produce the change set to apply.
    ///
    /// Updates are filtered with [`Self::filter_updates`]. Creates with a TTL
    /// of 0 get the default TTL. Deletes pass through. The input is not
    /// modified.
    pub fn reconcile(&self, changes: &ChangeSet) -> ChangeSet {
        debug!(
            "reconciling changes: create={}, update_old={}, update_new={}, delete={}",
            changes.create.len(),
            changes.update_old.len(),
            changes.update_new.len(),
            changes.delete.len()
        );

        let create = changes
            .create
            .iter()
            .map(|endpoint| {
                if endpoint.ttl == 0 {
                    endpoint.clone().with_ttl(self.defaults.ttl)
                } else {
                    endpoint.clone()
                }
            })
            .collect();
        let (update_old, update_new) = self.filter_updates(&changes.update_old, &changes.update_new);

        let result = ChangeSet {
            create,
            update_old,
            update_new,
            delete: changes.delete.clone(),
        };

        debug!(
            "reconciled changes: create={}, update_old={}, update_new={}, delete={}",
            result.create.len(),
            result.update_old.len(),
            result.update_new.len(),
            result.delete.len()
        );
        result
    }
}
