//! Operation services orchestrating the domain crates over the store traits.
//!
//! Services are generic over the store and directory traits so the same
//! code runs against `InMemoryStore` in tests and `PostgresStore` in
//! production. All validation happens before the first write; multi-row
//! writes go through the atomic store operations.

pub mod orders;
pub mod stock;
pub mod tasks;

pub use orders::{OrderRequestLine, OrderService};
pub use stock::{AdjustmentRequest, InboundReceipt, StockService, UsageEntry};
pub use tasks::TaskLedgerService;
