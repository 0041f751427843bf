use chrono::NaiveDate;
use tracing::{info, instrument};

use stockbook_core::{OwnerId, Result};
use stockbook_tasks::{bucket_open_items, plan_close_day, CloseDaySummary, CloseItem, OpenItems};

use crate::store::TaskStore;

/// Daily task ledger: open-item listing and the day close.
pub struct TaskLedgerService<T> {
    tasks: T,
}

impl<T> TaskLedgerService<T>
where
    T: TaskStore,
{
    pub fn new(tasks: T) -> Self {
        Self { tasks }
    }

    /// Today's buckets plus deduplicated continuations from prior days.
    #[instrument(skip(self), err)]
    pub fn load_open_items(&self, owner: OwnerId, date: NaiveDate) -> Result<OpenItems> {
        let today_rows = self.tasks.tasks_for_day(owner, date)?;
        let prior = self.tasks.continue_rows_before(owner, date)?;
        Ok(bucket_open_items(today_rows, prior))
    }

    /// Close `owner`'s day: finished items become Finish rows, unfinished
    /// ones become a CarryOver row plus exactly one Continue row for the
    /// next day. All writes land atomically.
    #[instrument(skip(self, items), fields(item_count = items.len()), err)]
    pub fn close_day(
        &self,
        date: NaiveDate,
        owner: OwnerId,
        owner_label: &str,
        items: Vec<CloseItem>,
    ) -> Result<CloseDaySummary> {
        let plan = plan_close_day(date, owner, owner_label, items)?;
        self.tasks.apply_close_plan(plan.writes)?;
        info!(
            finished = plan.summary.finished,
            carried_over = plan.summary.carried_over,
            "day closed"
        );
        Ok(plan.summary)
    }
}
