//! `stockbook-infra` — storage backends and engine services.
//!
//! The store traits are the transaction boundary: `append_batch` and
//! `finalize_decision` are all-or-nothing, and the per-day invoice counter
//! is advanced atomically. The engine services orchestrate the domain
//! crates over those traits and implement the exposed operation contracts.

pub mod engine;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use engine::{
    AdjustmentRequest, InboundReceipt, OrderRequestLine, OrderService, StockService,
    TaskLedgerService, UsageEntry,
};
pub use store::{
    InMemoryStore, MovementFilter, MovementStore, OrderStore, PostgresStore, SortOrder, StoreError,
    TaskStore,
};
