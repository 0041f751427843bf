//! `stockbook-tasks` — the daily task ledger.
//!
//! Same pattern as the movement ledger: an append-only log of task rows,
//! current state derived by scan, and a next-period continuation rule. A
//! task closed below 100% on day D yields exactly one `CarryOver` row for D
//! (history) and exactly one `Continue` row for D+1.

pub mod carryover;
pub mod task;

pub use carryover::{
    bucket_open_items, plan_close_day, CloseDaySummary, CloseItem, ClosePlan, OpenItems, TaskWrite,
    CONTINUE_SCAN_LIMIT,
};
pub use task::{Task, TaskPriority, TaskStatus};
