//! `stockbook-directory` — read contracts for external reference data.
//!
//! The item, vendor, store and employee directories live outside the
//! ledger core; this crate defines the traits the engine consumes, plus
//! in-memory fixtures and an explicit time-boxed read-through cache.

pub mod cache;
pub mod contracts;

pub use cache::CachedVendorDirectory;
pub use contracts::{
    EmployeeDirectory, InMemoryDirectory, ItemCatalog, ItemInfo, SafetyStockConfig, StoreDirectory,
    VendorDirectory,
};
