//! Postgres-backed storage for movements, orders and tasks.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate order or movement id |
//! | Database (check constraint violation) | `23514` | `InvalidWrite` | Zero quantity, progress out of range |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! ## Atomicity
//!
//! `append_batch`, `finalize_decision` and `apply_close_plan` each run in a
//! single transaction. `finalize_decision` takes a row lock on the order
//! (`SELECT ... FOR UPDATE`) before the status check, so a racing decision
//! blocks, re-reads the committed status and fails the expected-status check
//! without writing any movement rows.
//!
//! ## Invoice Counter
//!
//! `next_invoice_seq` is a single upsert returning the incremented counter,
//! so concurrent callers for the same day always receive distinct values.
//! Counter rows are never rolled back with a failed approval; the resulting
//! sequence gaps are accepted.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockbook_core::{MovementId, OrderId, OwnerId, StoreCode, TaskId};
use stockbook_ledger::{InvoiceNumber, MovementRecord};
use stockbook_orders::{Order, OrderLine, OrderStatus};
use stockbook_tasks::{Task, TaskStatus, TaskWrite};

use super::query::{MovementFilter, SortOrder};
use super::r#trait::{MovementStore, OrderStore, StoreError, TaskStore};

/// Postgres-backed store implementing all three store traits.
///
/// Uses the SQLx connection pool, which is thread-safe; the struct is cheap
/// to clone and share. The synchronous trait impls bridge into async through
/// `block_in_place`, so they are safe to call from multi-thread runtime
/// workers (the server's handlers) and from plain threads alike. A
/// current-thread runtime cannot drive the pool from a blocked worker and
/// gets a `Backend` error instead.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the schema if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS movements (
                id UUID PRIMARY KEY,
                store TEXT NOT NULL,
                item_code TEXT NOT NULL,
                item_name TEXT NOT NULL,
                spec TEXT NOT NULL DEFAULT '',
                quantity BIGINT NOT NULL CHECK (quantity <> 0),
                occurred_at DATE NOT NULL,
                counterpart TEXT NOT NULL,
                kind TEXT NOT NULL,
                invoice_number TEXT,
                recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_movements_store_item_day
                ON movements (store, item_code, occurred_at)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_movements_invoice
                ON movements (invoice_number)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS invoice_counters (
                day DATE PRIMARY KEY,
                seq INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id UUID PRIMARY KEY,
                order_date DATE NOT NULL,
                delivery_date DATE,
                store TEXT NOT NULL,
                requested_by TEXT NOT NULL,
                lines JSONB NOT NULL,
                status TEXT NOT NULL,
                invoice_number TEXT,
                delivery_status TEXT,
                subtotal BIGINT NOT NULL,
                tax BIGINT NOT NULL,
                total BIGINT NOT NULL,
                decided_at TIMESTAMPTZ
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_orders_store_status
                ON orders (store, status)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id UUID PRIMARY KEY,
                task_date DATE NOT NULL,
                owner UUID NOT NULL,
                owner_label TEXT NOT NULL,
                content TEXT NOT NULL,
                progress SMALLINT NOT NULL CHECK (progress BETWEEN 0 AND 100),
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                manager_check BOOLEAN NOT NULL,
                manager_comment TEXT,
                carried_from UUID
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_tasks_owner_date
                ON tasks (owner, task_date)
            "#,
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self, records), fields(record_count = records.len()), err)]
    pub async fn append_movements(
        &self,
        records: Vec<MovementRecord>,
    ) -> Result<Vec<MovementId>, StoreError> {
        if records.is_empty() {
            return Ok(vec![]);
        }
        for (idx, r) in records.iter().enumerate() {
            if r.quantity == 0 {
                return Err(StoreError::InvalidWrite(format!(
                    "movement quantity must not be zero (index {idx})"
                )));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let mut ids = Vec::with_capacity(records.len());
        for record in &records {
            insert_movement(&mut tx, record).await?;
            ids.push(record.id);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(ids)
    }

    #[instrument(skip(self), err)]
    pub async fn query_movements(
        &self,
        filter: &MovementFilter,
    ) -> Result<Vec<MovementRecord>, StoreError> {
        let store: Option<&str> = filter.store.as_ref().map(StoreCode::as_str);
        let item: Option<&str> = filter.item_code.as_ref().map(|c| c.as_str());
        let kinds: Option<Vec<String>> = filter
            .kinds
            .as_ref()
            .map(|ks| ks.iter().map(|k| k.as_str().to_string()).collect());

        let order_clause = match filter.order {
            SortOrder::Descending => "ORDER BY occurred_at DESC, recorded_at DESC",
            SortOrder::Ascending => "ORDER BY occurred_at ASC, recorded_at ASC",
        };
        let sql = format!(
            r#"
            SELECT
                id, store, item_code, item_name, spec, quantity,
                occurred_at, counterpart, kind, invoice_number, recorded_at
            FROM movements
            WHERE ($1::text IS NULL OR store = $1)
                AND ($2::text IS NULL OR item_code = $2)
                AND ($3::text[] IS NULL OR kind = ANY($3))
                AND ($4::date IS NULL OR occurred_at >= $4)
                AND ($5::date IS NULL OR occurred_at <= $5)
            {order_clause}
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(store)
            .bind(item)
            .bind(kinds)
            .bind(filter.occurred_from)
            .bind(filter.occurred_to)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("query_movements", e))?;

        let mut movements = Vec::with_capacity(rows.len());
        for row in rows {
            let raw = MovementRow::from_row(&row)
                .map_err(|e| StoreError::Backend(format!("failed to read movement row: {e}")))?;
            movements.push(raw.try_into()?);
        }
        Ok(movements)
    }

    #[instrument(skip(self), err)]
    pub async fn allocate_invoice_seq(&self, day: NaiveDate) -> Result<u32, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO invoice_counters (day, seq)
            VALUES ($1, 1)
            ON CONFLICT (day)
            DO UPDATE SET seq = invoice_counters.seq + 1
            RETURNING seq
            "#,
        )
        .bind(day)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("allocate_invoice_seq", e))?;

        let seq: i32 = row
            .try_get("seq")
            .map_err(|e| StoreError::Backend(format!("failed to read seq: {e}")))?;
        Ok(seq as u32)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id), err)]
    pub async fn insert_order_row(&self, order: &Order) -> Result<(), StoreError> {
        let lines = serde_json::to_value(&order.lines)
            .map_err(|e| StoreError::InvalidWrite(format!("failed to serialize lines: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_date, delivery_date, store, requested_by, lines,
                status, invoice_number, delivery_status, subtotal, tax, total, decided_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.order_date)
        .bind(order.delivery_date)
        .bind(order.store.as_str())
        .bind(&order.requested_by)
        .bind(&lines)
        .bind(order.status.as_str())
        .bind(order.invoice_number.as_ref().map(InvoiceNumber::as_str))
        .bind(&order.delivery_status)
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.total)
        .bind(order.decided_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("{ORDER_SELECT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_order", e))?;

        match row {
            Some(row) => {
                let raw = OrderRow::from_row(&row)
                    .map_err(|e| StoreError::Backend(format!("failed to read order row: {e}")))?;
                Ok(Some(raw.try_into()?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    pub async fn fetch_orders(
        &self,
        store: Option<&StoreCode>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        let sql = format!(
            r#"
            {ORDER_SELECT}
            WHERE ($1::text IS NULL OR store = $1)
                AND ($2::text IS NULL OR status = $2)
            ORDER BY order_date DESC, id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(store.map(StoreCode::as_str))
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_orders", e))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let raw = OrderRow::from_row(&row)
                .map_err(|e| StoreError::Backend(format!("failed to read order row: {e}")))?;
            orders.push(raw.try_into()?);
        }
        Ok(orders)
    }

    /// Persist a decision and its movements in one transaction.
    ///
    /// Locks the order row, re-checks the committed status against
    /// `expected`, then writes the decided order plus every movement row.
    /// A concurrent decision that committed first makes this fail with
    /// `Conflict` and no rows written.
    #[instrument(
        skip(self, decided, movements),
        fields(order_id = %decided.id, movement_count = movements.len()),
        err
    )]
    pub async fn finalize_decision_tx(
        &self,
        expected: &[OrderStatus],
        decided: &Order,
        movements: &[MovementRecord],
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(decided.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_order", e))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound(format!("order {}", decided.id)));
        };
        let status_str: String = row
            .try_get("status")
            .map_err(|e| StoreError::Backend(format!("failed to read status: {e}")))?;
        let current: OrderStatus = status_str
            .parse()
            .map_err(|e| StoreError::Backend(format!("corrupt order status: {e}")))?;

        if !expected.contains(&current) {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Conflict(format!(
                "order {} is {}, expected one of {:?}",
                decided.id,
                current.as_str(),
                expected.iter().map(OrderStatus::as_str).collect::<Vec<_>>(),
            )));
        }

        let lines = serde_json::to_value(&decided.lines)
            .map_err(|e| StoreError::InvalidWrite(format!("failed to serialize lines: {e}")))?;
        sqlx::query(
            r#"
            UPDATE orders SET
                delivery_date = $2,
                lines = $3,
                status = $4,
                invoice_number = $5,
                subtotal = $6,
                tax = $7,
                total = $8,
                decided_at = $9
            WHERE id = $1
            "#,
        )
        .bind(decided.id.as_uuid())
        .bind(decided.delivery_date)
        .bind(&lines)
        .bind(decided.status.as_str())
        .bind(decided.invoice_number.as_ref().map(InvoiceNumber::as_str))
        .bind(decided.subtotal)
        .bind(decided.tax)
        .bind(decided.total)
        .bind(decided.decided_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;

        for record in movements {
            insert_movement(&mut tx, record).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn update_delivery_status(
        &self,
        id: OrderId,
        delivery_status: Option<String>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET delivery_status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(delivery_status)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_delivery_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn fetch_tasks_for_day(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query(&format!(
            "{TASK_SELECT} WHERE owner = $1 AND task_date = $2"
        ))
        .bind(owner.as_uuid())
        .bind(date)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_tasks_for_day", e))?;

        rows_into_tasks(rows)
    }

    #[instrument(skip(self), err)]
    pub async fn fetch_continue_rows_before(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            {TASK_SELECT}
            WHERE owner = $1 AND status = 'continue' AND task_date < $2
            ORDER BY task_date DESC
            "#
        ))
        .bind(owner.as_uuid())
        .bind(date)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_continue_rows_before", e))?;

        rows_into_tasks(rows)
    }

    #[instrument(skip(self, writes), fields(write_count = writes.len()), err)]
    pub async fn apply_close_plan_tx(&self, writes: &[TaskWrite]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for write in writes {
            match write {
                TaskWrite::Upsert(task) => upsert_task(&mut tx, task).await?,
                TaskWrite::Insert(task) => insert_task(&mut tx, task).await?,
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }
}

const ORDER_SELECT: &str = r#"
    SELECT
        id, order_date, delivery_date, store, requested_by, lines,
        status, invoice_number, delivery_status, subtotal, tax, total, decided_at
    FROM orders
"#;

const TASK_SELECT: &str = r#"
    SELECT
        id, task_date, owner, owner_label, content, progress,
        priority, status, manager_check, manager_comment, carried_from
    FROM tasks
"#;

async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    record: &MovementRecord,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO movements (
            id, store, item_code, item_name, spec, quantity,
            occurred_at, counterpart, kind, invoice_number, recorded_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(record.id.as_uuid())
    .bind(record.store.as_str())
    .bind(record.item_code.as_str())
    .bind(&record.item_name)
    .bind(&record.spec)
    .bind(record.quantity)
    .bind(record.occurred_at)
    .bind(&record.counterpart)
    .bind(record.kind.as_str())
    .bind(record.invoice_number.as_ref().map(InvoiceNumber::as_str))
    .bind(record.recorded_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_movement", e))?;
    Ok(())
}

async fn insert_task(tx: &mut Transaction<'_, Postgres>, task: &Task) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO tasks (
            id, task_date, owner, owner_label, content, progress,
            priority, status, manager_check, manager_comment, carried_from
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(task.id.as_uuid())
    .bind(task.date)
    .bind(task.owner.as_uuid())
    .bind(&task.owner_label)
    .bind(&task.content)
    .bind(task.progress as i16)
    .bind(task.priority.as_str())
    .bind(task.status.as_str())
    .bind(task.manager_check)
    .bind(&task.manager_comment)
    .bind(task.carried_from.as_ref().map(|id| id.as_uuid()))
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_task", e))?;
    Ok(())
}

async fn upsert_task(tx: &mut Transaction<'_, Postgres>, task: &Task) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO tasks (
            id, task_date, owner, owner_label, content, progress,
            priority, status, manager_check, manager_comment, carried_from
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id)
        DO UPDATE SET
            task_date = EXCLUDED.task_date,
            owner = EXCLUDED.owner,
            owner_label = EXCLUDED.owner_label,
            content = EXCLUDED.content,
            progress = EXCLUDED.progress,
            priority = EXCLUDED.priority,
            status = EXCLUDED.status,
            manager_check = EXCLUDED.manager_check,
            manager_comment = EXCLUDED.manager_comment,
            carried_from = EXCLUDED.carried_from
        "#,
    )
    .bind(task.id.as_uuid())
    .bind(task.date)
    .bind(task.owner.as_uuid())
    .bind(&task.owner_label)
    .bind(&task.content)
    .bind(task.progress as i16)
    .bind(task.priority.as_str())
    .bind(task.status.as_str())
    .bind(task.manager_check)
    .bind(&task.manager_comment)
    .bind(task.carried_from.as_ref().map(|id| id.as_uuid()))
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("upsert_task", e))?;
    Ok(())
}

fn rows_into_tasks(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<Task>, StoreError> {
    let mut tasks = Vec::with_capacity(rows.len());
    for row in rows {
        let raw = TaskRow::from_row(&row)
            .map_err(|e| StoreError::Backend(format!("failed to read task row: {e}")))?;
        tasks.push(raw.try_into()?);
    }
    Ok(tasks)
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23514") => StoreError::InvalidWrite(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

/// Run a store future to completion from synchronous code.
///
/// Inside a multi-thread runtime the calling worker is moved to a blocking
/// context first (`block_in_place`), so other workers keep driving the pool
/// while this one waits. Outside any runtime a one-off current-thread
/// runtime drives the future. Blocking a current-thread runtime worker
/// would deadlock the pool's IO driver, so that case is refused.
fn bridge<T>(
    fut: impl std::future::Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    use tokio::runtime::{Handle, RuntimeFlavor};

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(fut))
        }
        Ok(_) => Err(StoreError::Backend(
            "PostgresStore needs the multi-thread tokio runtime; \
             use InMemoryStore on current-thread runtimes"
                .to_string(),
        )),
        Err(_) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| StoreError::Backend(format!("building bridge runtime: {e}")))?;
            rt.block_on(fut)
        }
    }
}

// SQLx row types

#[derive(Debug)]
struct MovementRow {
    id: uuid::Uuid,
    store: String,
    item_code: String,
    item_name: String,
    spec: String,
    quantity: i64,
    occurred_at: NaiveDate,
    counterpart: String,
    kind: String,
    invoice_number: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for MovementRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            store: row.try_get("store")?,
            item_code: row.try_get("item_code")?,
            item_name: row.try_get("item_name")?,
            spec: row.try_get("spec")?,
            quantity: row.try_get("quantity")?,
            occurred_at: row.try_get("occurred_at")?,
            counterpart: row.try_get("counterpart")?,
            kind: row.try_get("kind")?,
            invoice_number: row.try_get("invoice_number")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

impl TryFrom<MovementRow> for MovementRecord {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let corrupt = |e| StoreError::Backend(format!("corrupt movement row: {e}"));
        Ok(MovementRecord {
            id: MovementId::from_uuid(row.id),
            store: row.store.parse().map_err(corrupt)?,
            item_code: row.item_code.parse().map_err(corrupt)?,
            item_name: row.item_name,
            spec: row.spec,
            quantity: row.quantity,
            occurred_at: row.occurred_at,
            counterpart: row.counterpart,
            kind: row.kind.parse().map_err(corrupt)?,
            invoice_number: row
                .invoice_number
                .map(|s| InvoiceNumber::parse(&s))
                .transpose()
                .map_err(corrupt)?,
            recorded_at: row.recorded_at,
        })
    }
}

#[derive(Debug)]
struct OrderRow {
    id: uuid::Uuid,
    order_date: NaiveDate,
    delivery_date: Option<NaiveDate>,
    store: String,
    requested_by: String,
    lines: serde_json::Value,
    status: String,
    invoice_number: Option<String>,
    delivery_status: Option<String>,
    subtotal: i64,
    tax: i64,
    total: i64,
    decided_at: Option<DateTime<Utc>>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for OrderRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            order_date: row.try_get("order_date")?,
            delivery_date: row.try_get("delivery_date")?,
            store: row.try_get("store")?,
            requested_by: row.try_get("requested_by")?,
            lines: row.try_get("lines")?,
            status: row.try_get("status")?,
            invoice_number: row.try_get("invoice_number")?,
            delivery_status: row.try_get("delivery_status")?,
            subtotal: row.try_get("subtotal")?,
            tax: row.try_get("tax")?,
            total: row.try_get("total")?,
            decided_at: row.try_get("decided_at")?,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let lines: Vec<OrderLine> = serde_json::from_value(row.lines)
            .map_err(|e| StoreError::Backend(format!("corrupt order lines: {e}")))?;
        let corrupt = |e| StoreError::Backend(format!("corrupt order row: {e}"));
        Ok(Order {
            id: OrderId::from_uuid(row.id),
            order_date: row.order_date,
            delivery_date: row.delivery_date,
            store: row.store.parse().map_err(corrupt)?,
            requested_by: row.requested_by,
            lines,
            status: row.status.parse().map_err(corrupt)?,
            invoice_number: row
                .invoice_number
                .map(|s| InvoiceNumber::parse(&s))
                .transpose()
                .map_err(corrupt)?,
            delivery_status: row.delivery_status,
            subtotal: row.subtotal,
            tax: row.tax,
            total: row.total,
            decided_at: row.decided_at,
        })
    }
}

#[derive(Debug)]
struct TaskRow {
    id: uuid::Uuid,
    task_date: NaiveDate,
    owner: uuid::Uuid,
    owner_label: String,
    content: String,
    progress: i16,
    priority: String,
    status: String,
    manager_check: bool,
    manager_comment: Option<String>,
    carried_from: Option<uuid::Uuid>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TaskRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TaskRow {
            id: row.try_get("id")?,
            task_date: row.try_get("task_date")?,
            owner: row.try_get("owner")?,
            owner_label: row.try_get("owner_label")?,
            content: row.try_get("content")?,
            progress: row.try_get("progress")?,
            priority: row.try_get("priority")?,
            status: row.try_get("status")?,
            manager_check: row.try_get("manager_check")?,
            manager_comment: row.try_get("manager_comment")?,
            carried_from: row.try_get("carried_from")?,
        })
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let corrupt = |e| StoreError::Backend(format!("corrupt task row: {e}"));
        let status: TaskStatus = row.status.parse().map_err(corrupt)?;
        Ok(Task {
            id: TaskId::from_uuid(row.id),
            date: row.task_date,
            owner: OwnerId::from_uuid(row.owner),
            owner_label: row.owner_label,
            content: row.content,
            progress: row.progress.clamp(0, 100) as u8,
            priority: row.priority.parse().map_err(corrupt)?,
            status,
            manager_check: row.manager_check,
            manager_comment: row.manager_comment,
            carried_from: row.carried_from.map(TaskId::from_uuid),
        })
    }
}

// The store traits are synchronous; each impl parks the calling worker and
// drives the async inherent method through `bridge`.

impl MovementStore for PostgresStore {
    fn append(&self, record: MovementRecord) -> Result<MovementId, StoreError> {
        Ok(self.append_batch(vec![record])?[0])
    }

    fn append_batch(&self, records: Vec<MovementRecord>) -> Result<Vec<MovementId>, StoreError> {
        bridge(self.append_movements(records))
    }

    fn query(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, StoreError> {
        bridge(self.query_movements(filter))
    }

    fn next_invoice_seq(&self, day: NaiveDate) -> Result<u32, StoreError> {
        bridge(self.allocate_invoice_seq(day))
    }
}

impl OrderStore for PostgresStore {
    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        bridge(self.insert_order_row(&order))
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        bridge(self.fetch_order(id))
    }

    fn list_orders(
        &self,
        store: Option<&StoreCode>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        bridge(self.fetch_orders(store, status))
    }

    fn finalize_decision(
        &self,
        expected: &[OrderStatus],
        decided: Order,
        movements: Vec<MovementRecord>,
    ) -> Result<(), StoreError> {
        bridge(self.finalize_decision_tx(expected, &decided, &movements))
    }

    fn set_delivery_status(
        &self,
        id: OrderId,
        delivery_status: Option<String>,
    ) -> Result<(), StoreError> {
        bridge(self.update_delivery_status(id, delivery_status))
    }
}

impl TaskStore for PostgresStore {
    fn tasks_for_day(&self, owner: OwnerId, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        bridge(self.fetch_tasks_for_day(owner, date))
    }

    fn continue_rows_before(
        &self,
        owner: OwnerId,
        date: NaiveDate,
    ) -> Result<Vec<Task>, StoreError> {
        bridge(self.fetch_continue_rows_before(owner, date))
    }

    fn apply_close_plan(&self, writes: Vec<TaskWrite>) -> Result<(), StoreError> {
        bridge(self.apply_close_plan_tx(&writes))
    }
}
