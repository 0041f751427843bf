//! Open-item bucketing and the daily close plan.
//!
//! Pure planning functions: they read task rows and produce the writes the
//! store must perform. Persistence and ordering of the backward scan are
//! the store's job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{Error, OwnerId, TaskId};

use crate::task::{Task, TaskPriority, TaskStatus};

/// The backward scan over prior-day Continue rows stops once this many
/// continue items are collected.
pub const CONTINUE_SCAN_LIMIT: usize = 20;

/// Buckets returned by `load_open_items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenItems {
    /// Finished today (progress 100 or status Finish).
    pub finish_today: Vec<Task>,
    /// Unfinished work carried into today, oldest entry last.
    pub continue_items: Vec<Task>,
    /// Opened today, still undecided.
    pub today_items: Vec<Task>,
}

/// Bucket today's rows and fold in prior-day continuations.
///
/// `today_rows` are the owner's rows for the requested date.
/// `prior_continue` must contain only rows with `status = Continue` and
/// `date < today`, ordered most-recent-first; rows whose `content` already
/// appears among the continue items are skipped, and the scan stops at
/// [`CONTINUE_SCAN_LIMIT`] items or when history is exhausted.
pub fn bucket_open_items(
    today_rows: Vec<Task>,
    prior_continue: impl IntoIterator<Item = Task>,
) -> OpenItems {
    let mut open = OpenItems::default();

    for task in today_rows {
        if task.progress >= 100 || task.status == TaskStatus::Finish {
            open.finish_today.push(task);
        } else if task.status == TaskStatus::Continue {
            open.continue_items.push(task);
        } else {
            open.today_items.push(task);
        }
    }

    for task in prior_continue {
        if open.continue_items.len() >= CONTINUE_SCAN_LIMIT {
            break;
        }
        if open
            .continue_items
            .iter()
            .any(|seen| seen.content == task.content)
        {
            continue;
        }
        open.continue_items.push(task);
    }

    open
}

/// One submitted item at day close. Items with an `id` update that row in
/// place (idempotent re-close); items without one are new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseItem {
    pub id: Option<TaskId>,
    pub content: String,
    pub progress: u8,
    pub priority: TaskPriority,
    pub manager_check: bool,
    pub manager_comment: Option<String>,
}

/// A write the task store must perform. Upserts overwrite the row with the
/// same id when it exists; inserts always create a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskWrite {
    Upsert(Task),
    Insert(Task),
}

impl TaskWrite {
    pub fn task(&self) -> &Task {
        match self {
            TaskWrite::Upsert(t) | TaskWrite::Insert(t) => t,
        }
    }
}

/// Result counts of a day close.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseDaySummary {
    pub finished: usize,
    pub carried_over: usize,
}

/// The writes for one day close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePlan {
    pub writes: Vec<TaskWrite>,
    pub summary: CloseDaySummary,
}

/// Plan a day close for `owner` on `date`.
///
/// Items with `progress >= 100` become Finish rows (progress pinned to
/// 100). Every other item becomes a CarryOver row for `date` plus exactly
/// one new Continue row for `date + 1` carrying the same content, progress
/// and priority — never zero forward rows, never more than one.
pub fn plan_close_day(
    date: NaiveDate,
    owner: OwnerId,
    owner_label: &str,
    items: Vec<CloseItem>,
) -> Result<ClosePlan, Error> {
    let next_day = date
        .succ_opt()
        .ok_or_else(|| Error::validation("close date has no following day"))?;

    let mut writes = Vec::new();
    let mut summary = CloseDaySummary::default();

    for item in items {
        if item.content.trim().is_empty() {
            return Err(Error::validation("task content must not be blank"));
        }

        let id = item.id.unwrap_or_default();
        if item.progress >= 100 {
            writes.push(TaskWrite::Upsert(Task {
                id,
                date,
                owner,
                owner_label: owner_label.to_string(),
                content: item.content,
                progress: 100,
                priority: item.priority,
                status: TaskStatus::Finish,
                manager_check: item.manager_check,
                manager_comment: item.manager_comment,
                carried_from: None,
            }));
            summary.finished += 1;
        } else {
            let carry = Task {
                id,
                date,
                owner,
                owner_label: owner_label.to_string(),
                content: item.content.clone(),
                progress: item.progress,
                priority: item.priority,
                status: TaskStatus::CarryOver,
                manager_check: item.manager_check,
                manager_comment: item.manager_comment,
                carried_from: None,
            };
            let continuation = Task {
                id: TaskId::new(),
                date: next_day,
                owner,
                owner_label: owner_label.to_string(),
                content: item.content,
                progress: item.progress,
                priority: item.priority,
                status: TaskStatus::Continue,
                manager_check: false,
                manager_comment: None,
                carried_from: Some(carry.id),
            };
            writes.push(TaskWrite::Upsert(carry));
            writes.push(TaskWrite::Insert(continuation));
            summary.carried_over += 1;
        }
    }

    Ok(ClosePlan { writes, summary })
}
