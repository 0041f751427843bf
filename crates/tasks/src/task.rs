use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{OwnerId, TaskId};

/// Status of a daily work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Opened today, not yet resolved.
    Today,
    /// Continuation of an earlier day's unfinished work.
    Continue,
    /// Done; terminal (progress 100).
    Finish,
    /// Historical marker: closed below 100 on its day.
    CarryOver,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Today => "today",
            TaskStatus::Continue => "continue",
            TaskStatus::Finish => "finish",
            TaskStatus::CarryOver => "carry_over",
        }
    }
}

impl core::str::FromStr for TaskStatus {
    type Err = stockbook_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(TaskStatus::Today),
            "continue" => Ok(TaskStatus::Continue),
            "finish" => Ok(TaskStatus::Finish),
            "carry_over" => Ok(TaskStatus::CarryOver),
            other => Err(stockbook_core::Error::validation(format!(
                "unknown task status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
        }
    }
}

impl core::str::FromStr for TaskPriority {
    type Err = stockbook_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "normal" => Ok(TaskPriority::Normal),
            "high" => Ok(TaskPriority::High),
            other => Err(stockbook_core::Error::validation(format!(
                "unknown task priority: {other}"
            ))),
        }
    }
}

/// One daily work item row. Rows are append-only; a day close writes new
/// rows (or overwrites a row in place when re-closing the same day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub date: NaiveDate,
    /// Resolved owner key. Name resolution is an external, pre-ledger
    /// concern; no fuzzy matching happens here.
    pub owner: OwnerId,
    /// Display label ("Bangna / Somchai"), carried for listings only.
    pub owner_label: String,
    pub content: String,
    /// 0..=100; 100 is terminal.
    pub progress: u8,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub manager_check: bool,
    pub manager_comment: Option<String>,
    /// The CarryOver row this Continue row was spawned from, when known.
    /// Pre-existing rows linked only by content equality have `None`.
    pub carried_from: Option<TaskId>,
}
