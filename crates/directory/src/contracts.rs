use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use stockbook_core::{ItemCode, OwnerId, StoreCode};

/// Catalog entry for one stock item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub name: String,
    pub spec: String,
    /// Unit cost in smallest currency unit (stock valuation).
    pub cost: i64,
    /// Unit sales price in smallest currency unit.
    pub price: i64,
    pub tax_class: String,
}

/// Read contract for the item reference directory.
pub trait ItemCatalog: Send + Sync {
    fn get(&self, code: &ItemCode) -> Option<ItemInfo>;
}

/// Read contract for the store directory.
pub trait StoreDirectory: Send + Sync {
    fn list(&self) -> Vec<StoreCode>;

    fn contains(&self, store: &StoreCode) -> bool {
        self.list().iter().any(|s| s == store)
    }
}

/// Read contract for the vendor directory.
pub trait VendorDirectory: Send + Sync {
    fn list_by_type(&self, vendor_type: &str) -> Vec<String>;
}

/// Read contract for owner resolution.
///
/// Resolution from raw display names to owner keys happens here, outside
/// the ledger core. Implementations must not fall back to substring
/// matching against a roster; ambiguity is the directory's problem to
/// refuse, not to guess at.
pub trait EmployeeDirectory: Send + Sync {
    fn resolve_owner(&self, raw_name: &str) -> Option<OwnerId>;
}

impl<T> ItemCatalog for Arc<T>
where
    T: ItemCatalog + ?Sized,
{
    fn get(&self, code: &ItemCode) -> Option<ItemInfo> {
        (**self).get(code)
    }
}

impl<T> StoreDirectory for Arc<T>
where
    T: StoreDirectory + ?Sized,
{
    fn list(&self) -> Vec<StoreCode> {
        (**self).list()
    }
}

impl<T> VendorDirectory for Arc<T>
where
    T: VendorDirectory + ?Sized,
{
    fn list_by_type(&self, vendor_type: &str) -> Vec<String> {
        (**self).list_by_type(vendor_type)
    }
}

impl<T> EmployeeDirectory for Arc<T>
where
    T: EmployeeDirectory + ?Sized,
{
    fn resolve_owner(&self, raw_name: &str) -> Option<OwnerId> {
        (**self).resolve_owner(raw_name)
    }
}

/// Per-store-per-item safety stock levels (display/alerting only, never
/// enforced by the ledger).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStockConfig {
    levels: HashMap<StoreCode, HashMap<ItemCode, i64>>,
}

impl SafetyStockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, store: StoreCode, item: ItemCode, qty: i64) {
        self.levels.entry(store).or_default().insert(item, qty);
    }

    /// Unconfigured pairs default to 0.
    pub fn get(&self, store: &StoreCode, item: &ItemCode) -> i64 {
        self.levels
            .get(store)
            .and_then(|items| items.get(item))
            .copied()
            .unwrap_or(0)
    }
}

/// In-memory directory fixture backing all four contracts.
///
/// Intended for tests/dev; production directories are external systems.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    items: RwLock<HashMap<ItemCode, ItemInfo>>,
    stores: RwLock<Vec<StoreCode>>,
    vendors: RwLock<HashMap<String, Vec<String>>>,
    owners: RwLock<HashMap<String, OwnerId>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_item(&self, code: ItemCode, info: ItemInfo) {
        if let Ok(mut items) = self.items.write() {
            items.insert(code, info);
        }
    }

    pub fn put_store(&self, store: StoreCode) {
        if let Ok(mut stores) = self.stores.write() {
            if !stores.contains(&store) {
                stores.push(store);
            }
        }
    }

    pub fn put_vendor(&self, vendor_type: impl Into<String>, name: impl Into<String>) {
        if let Ok(mut vendors) = self.vendors.write() {
            vendors.entry(vendor_type.into()).or_default().push(name.into());
        }
    }

    pub fn put_owner(&self, raw_name: impl Into<String>, owner: OwnerId) {
        if let Ok(mut owners) = self.owners.write() {
            owners.insert(raw_name.into(), owner);
        }
    }
}

impl ItemCatalog for InMemoryDirectory {
    fn get(&self, code: &ItemCode) -> Option<ItemInfo> {
        self.items.read().ok()?.get(code).cloned()
    }
}

impl StoreDirectory for InMemoryDirectory {
    fn list(&self) -> Vec<StoreCode> {
        self.stores.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl VendorDirectory for InMemoryDirectory {
    fn list_by_type(&self, vendor_type: &str) -> Vec<String> {
        self.vendors
            .read()
            .ok()
            .and_then(|v| v.get(vendor_type).cloned())
            .unwrap_or_default()
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    /// Exact-key lookup only. The old substring matching ("first roster
    /// entry containing the raw name wins") assigned work to the wrong
    /// person whenever one name contained another, and is not replicated.
    fn resolve_owner(&self, raw_name: &str) -> Option<OwnerId> {
        self.owners.read().ok()?.get(raw_name).copied()
    }
}
