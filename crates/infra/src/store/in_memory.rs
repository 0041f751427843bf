use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use stockbook_core::{MovementId, OrderId, OwnerId, StoreCode};
use stockbook_ledger::MovementRecord;
use stockbook_orders::{Order, OrderStatus};
use stockbook_tasks::{Task, TaskStatus, TaskWrite};

use super::query::{MovementFilter, SortOrder};
use super::r#trait::{MovementStore, OrderStore, StoreError, TaskStore};

#[derive(Debug, Default)]
struct State {
    movements: Vec<MovementRecord>,
    orders: HashMap<OrderId, Order>,
    tasks: Vec<Task>,
    invoice_seqs: HashMap<NaiveDate, u32>,
}

/// In-memory store backing all three store traits.
///
/// Intended for tests/dev. One `RwLock` guards the whole state, which
/// makes `append_batch`, `finalize_decision` and the invoice counter
/// trivially atomic and serialized.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_batch(records: &[MovementRecord]) -> Result<(), StoreError> {
        for (idx, r) in records.iter().enumerate() {
            if r.quantity == 0 {
                return Err(StoreError::InvalidWrite(format!(
                    "movement quantity must not be zero (index {idx})"
                )));
            }
        }
        Ok(())
    }
}

fn poisoned(_: impl core::fmt::Debug) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

fn sort_movements(movements: &mut [MovementRecord], order: SortOrder) {
    match order {
        SortOrder::Descending => {
            movements.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.recorded_at.cmp(&a.recorded_at)))
        }
        SortOrder::Ascending => {
            movements.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then(a.recorded_at.cmp(&b.recorded_at)))
        }
    }
}

impl MovementStore for InMemoryStore {
    fn append(&self, record: MovementRecord) -> Result<MovementId, StoreError> {
        Ok(self.append_batch(vec![record])?[0])
    }

    fn append_batch(&self, records: Vec<MovementRecord>) -> Result<Vec<MovementId>, StoreError> {
        if records.is_empty() {
            return Ok(vec![]);
        }
        Self::validate_batch(&records)?;

        let mut state = self.state.write().map_err(poisoned)?;
        let ids = records.iter().map(|r| r.id).collect();
        state.movements.extend(records);
        Ok(ids)
    }

    fn query(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        let mut matched: Vec<MovementRecord> = state
            .movements
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        sort_movements(&mut matched, filter.order);
        Ok(matched)
    }

    fn next_invoice_seq(&self, day: NaiveDate) -> Result<u32, StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let seq = state.invoice_seqs.entry(day).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}

impl OrderStore for InMemoryStore {
    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }
        state.orders.insert(order.id, order);
        Ok(())
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.orders.get(&id).cloned())
    }

    fn list_orders(
        &self,
        store: Option<&StoreCode>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| store.is_none_or(|s| &o.store == s))
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(a.id.as_uuid().cmp(b.id.as_uuid())));
        Ok(orders)
    }

    fn finalize_decision(
        &self,
        expected: &[OrderStatus],
        decided: Order,
        movements: Vec<MovementRecord>,
    ) -> Result<(), StoreError> {
        Self::validate_batch(&movements)?;

        let mut state = self.state.write().map_err(poisoned)?;
        let current = state
            .orders
            .get(&decided.id)
            .ok_or_else(|| StoreError::NotFound(format!("order {}", decided.id)))?;

        if !expected.contains(&current.status) {
            return Err(StoreError::Conflict(format!(
                "order {} is {}, expected one of {:?}",
                decided.id,
                current.status.as_str(),
                expected.iter().map(OrderStatus::as_str).collect::<Vec<_>>(),
            )));
        }

        // Status check passed: the whole write happens under this lock,
        // so either everything below lands or nothing does.
        state.movements.extend(movements);
        state.orders.insert(decided.id, decided);
        Ok(())
    }

    fn set_delivery_status(
        &self,
        id: OrderId,
        delivery_status: Option<String>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        order.delivery_status = delivery_status;
        Ok(())
    }
}

impl TaskStore for InMemoryStore {
    fn tasks_for_day(&self, owner: OwnerId, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.owner == owner && t.date == date)
            .cloned()
            .collect())
    }

    fn continue_rows_before(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Vec<Task>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        let mut rows: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.owner == owner && t.status == TaskStatus::Continue && t.date < date)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    fn apply_close_plan(&self, writes: Vec<TaskWrite>) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        for write in writes {
            match write {
                TaskWrite::Upsert(task) => {
                    if let Some(existing) = state.tasks.iter_mut().find(|t| t.id == task.id) {
                        *existing = task;
                    } else {
                        state.tasks.push(task);
                    }
                }
                TaskWrite::Insert(task) => state.tasks.push(task),
            }
        }
        Ok(())
    }
}
