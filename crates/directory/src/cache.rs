//! Explicit, time-boxed read-through caching for directory lookups.
//!
//! Reference directories change rarely but are consulted on hot request
//! paths. The cache here is a component with a stated TTL and explicit
//! invalidation — never ambient module state.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::contracts::VendorDirectory;

struct Entry<T> {
    cached_at: Instant,
    value: T,
}

/// Read-through cache over a [`VendorDirectory`], keyed by vendor type.
///
/// Entries older than the TTL are refetched from the inner directory on
/// the next read. `invalidate` drops everything immediately (e.g. after a
/// known upstream edit).
pub struct CachedVendorDirectory<D> {
    inner: D,
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<Vec<String>>>>,
}

impl<D: VendorDirectory> CachedVendorDirectory<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    fn fresh(&self, entry: &Entry<Vec<String>>) -> bool {
        entry.cached_at.elapsed() < self.ttl
    }
}

impl<D: VendorDirectory> VendorDirectory for CachedVendorDirectory<D> {
    fn list_by_type(&self, vendor_type: &str) -> Vec<String> {
        if let Ok(entries) = self.entries.read() {
            if let Some(entry) = entries.get(vendor_type) {
                if self.fresh(entry) {
                    return entry.value.clone();
                }
            }
        }

        let value = self.inner.list_by_type(vendor_type);
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                vendor_type.to_string(),
                Entry {
                    cached_at: Instant::now(),
                    value: value.clone(),
                },
            );
        }
        value
    }
}
