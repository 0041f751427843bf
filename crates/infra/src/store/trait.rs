use chrono::NaiveDate;
use thiserror::Error;

use std::sync::Arc;

use stockbook_core::{MovementId, OrderId, OwnerId, StoreCode};
use stockbook_ledger::MovementRecord;
use stockbook_orders::{Order, OrderStatus};
use stockbook_tasks::{Task, TaskWrite};

use super::query::MovementFilter;

/// Storage operation error.
///
/// Infrastructure failures (lock poisoning, connection loss, constraint
/// violations) as opposed to domain errors. Batches hit by any of these
/// are left fully uncommitted.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Expected-status check or unique constraint failed (e.g. a second
    /// decision racing the first, or a duplicate invoice sequence).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid data reached the storage layer (e.g. zero quantity).
    #[error("invalid write: {0}")]
    InvalidWrite(String),

    /// A batch was partially persisted. Transaction boundary bug; fails
    /// loudly and is never retried automatically.
    #[error("partial write: {0}")]
    PartialWrite(String),

    /// Backend failure (pool closed, network, lock poisoned).
    #[error("storage backend: {0}")]
    Backend(String),
}

impl From<StoreError> for stockbook_core::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => stockbook_core::Error::Conflict(msg),
            StoreError::NotFound(msg) => stockbook_core::Error::NotFound(msg),
            StoreError::InvalidWrite(msg) => stockbook_core::Error::Validation(msg),
            StoreError::PartialWrite(msg) => stockbook_core::Error::PartialWrite(msg),
            StoreError::Backend(msg) => stockbook_core::Error::Storage(msg),
        }
    }
}

/// Append-only movement ledger plus the per-day invoice counter.
///
/// ## Append semantics
///
/// `append_batch` is all-or-nothing: a logical transfer needs two rows
/// (source outflow + destination inflow) and a partial write is a
/// consistency violation. Implementations must wrap the batch in one
/// storage transaction (or an equivalent single critical section).
///
/// ## Invoice counter
///
/// `next_invoice_seq` advances a counter keyed by calendar day and must be
/// atomic: concurrent callers for the same day never see the same value.
/// Gaps (from approvals that later fail) are acceptable; duplicates are
/// not. Deliberately not a max-scan over existing rows — that approach is
/// only correct with a single writer.
pub trait MovementStore: Send + Sync {
    /// Append one movement (append-only; records are never edited).
    fn append(&self, record: MovementRecord) -> Result<MovementId, StoreError>;

    /// Append a batch atomically: all rows or none.
    fn append_batch(&self, records: Vec<MovementRecord>) -> Result<Vec<MovementId>, StoreError>;

    /// Query movements; ordered by `occurred_at` descending unless the
    /// filter says otherwise. "No data" is an empty vector, never an error.
    fn query(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, StoreError>;

    /// Next invoice sequence for `day`, starting at 1.
    fn next_invoice_seq(&self, day: NaiveDate) -> Result<u32, StoreError>;
}

/// Order persistence with a compare-and-set decision step.
pub trait OrderStore: Send + Sync {
    fn insert_order(&self, order: Order) -> Result<(), StoreError>;

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    fn list_orders(
        &self,
        store: Option<&StoreCode>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError>;

    /// Persist a decision and its movements as one storage transaction.
    ///
    /// The stored order's current status must be one of `expected`
    /// (`Conflict` otherwise, with zero movement rows written). On success
    /// the order row is replaced by `decided` and every movement is
    /// appended — no half-applied transfer, no silently-approved order
    /// with missing movements.
    fn finalize_decision(
        &self,
        expected: &[OrderStatus],
        decided: Order,
        movements: Vec<MovementRecord>,
    ) -> Result<(), StoreError>;

    /// Opaque passthrough for the external receiving process.
    fn set_delivery_status(
        &self,
        id: OrderId,
        delivery_status: Option<String>,
    ) -> Result<(), StoreError>;
}

/// Daily task rows.
pub trait TaskStore: Send + Sync {
    /// All rows for an owner on one day.
    fn tasks_for_day(&self, owner: OwnerId, date: NaiveDate) -> Result<Vec<Task>, StoreError>;

    /// Continue rows strictly before `date`, most-recent-first. Callers
    /// cap how many they take after content deduplication.
    fn continue_rows_before(&self, owner: OwnerId, date: NaiveDate)
        -> Result<Vec<Task>, StoreError>;

    /// Apply a close plan atomically. Upserts overwrite the row with the
    /// same id when present; inserts always create a new row.
    fn apply_close_plan(&self, writes: Vec<TaskWrite>) -> Result<(), StoreError>;
}

impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn append(&self, record: MovementRecord) -> Result<MovementId, StoreError> {
        (**self).append(record)
    }

    fn append_batch(&self, records: Vec<MovementRecord>) -> Result<Vec<MovementId>, StoreError> {
        (**self).append_batch(records)
    }

    fn query(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).query(filter)
    }

    fn next_invoice_seq(&self, day: NaiveDate) -> Result<u32, StoreError> {
        (**self).next_invoice_seq(day)
    }
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        (**self).insert_order(order)
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).get_order(id)
    }

    fn list_orders(
        &self,
        store: Option<&StoreCode>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders(store, status)
    }

    fn finalize_decision(
        &self,
        expected: &[OrderStatus],
        decided: Order,
        movements: Vec<MovementRecord>,
    ) -> Result<(), StoreError> {
        (**self).finalize_decision(expected, decided, movements)
    }

    fn set_delivery_status(
        &self,
        id: OrderId,
        delivery_status: Option<String>,
    ) -> Result<(), StoreError> {
        (**self).set_delivery_status(id, delivery_status)
    }
}

impl<S> TaskStore for Arc<S>
where
    S: TaskStore + ?Sized,
{
    fn tasks_for_day(&self, owner: OwnerId, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        (**self).tasks_for_day(owner, date)
    }

    fn continue_rows_before(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Vec<Task>, StoreError> {
        (**self).continue_rows_before(owner, date)
    }

    fn apply_close_plan(&self, writes: Vec<TaskWrite>) -> Result<(), StoreError> {
        (**self).apply_close_plan(writes)
    }
}
