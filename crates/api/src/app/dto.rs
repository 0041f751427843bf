use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use stockbook_core::{ItemCode, OrderId, StoreCode};
use stockbook_ledger::{InvoiceNumber, MovementKind, MovementRecord, StockStatusLine};
use stockbook_orders::{ForceTransfer, Order};
use stockbook_tasks::{CloseItem, OpenItems, Task};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// One `(code, qty)` line shared by receipts and usage batches.
#[derive(Debug, Deserialize)]
pub struct QuantityLine {
    pub code: String,
    pub qty: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptRequest {
    pub store: String,
    /// Vendor or source description.
    pub counterpart: String,
    pub occurred_at: NaiveDate,
    pub lines: Vec<QuantityLine>,
}

#[derive(Debug, Deserialize)]
pub struct UsageRequest {
    pub store: String,
    pub reason: String,
    pub occurred_at: NaiveDate,
    pub lines: Vec<QuantityLine>,
}

#[derive(Debug, Deserialize)]
pub struct CountLine {
    pub code: String,
    pub counted_qty: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentBatchRequest {
    pub store: String,
    pub note: String,
    pub occurred_at: NaiveDate,
    pub counts: Vec<CountLine>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub store: String,
    pub requested_by: String,
    pub order_date: NaiveDate,
    pub lines: Vec<QuantityLine>,
}

#[derive(Debug, Deserialize)]
pub struct ForceTransferBatchRequest {
    pub occurred_at: NaiveDate,
    pub transfers: Vec<ForceTransfer>,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryStatusRequest {
    pub delivery_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseDayRequest {
    pub date: NaiveDate,
    /// Raw owner name; resolved through the employee directory.
    pub owner: String,
    pub owner_label: Option<String>,
    pub items: Vec<CloseItem>,
}

// -------------------------
// Parse helpers
// -------------------------

pub fn parse_store(s: &str) -> Result<StoreCode, axum::response::Response> {
    StoreCode::new(s).map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_store",
            "store code must not be blank",
        )
    })
}

pub fn parse_item(s: &str) -> Result<ItemCode, axum::response::Response> {
    ItemCode::new(s).map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_item",
            "item code must not be blank",
        )
    })
}

pub fn parse_order_id(s: &str) -> Result<OrderId, axum::response::Response> {
    s.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
    })
}

pub fn parse_kind(s: &str) -> Result<MovementKind, axum::response::Response> {
    s.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_kind",
            "kind must be one of: inbound, outbound, force_push, adjustment, usage",
        )
    })
}

// -------------------------
// Response mapping
// -------------------------

pub fn movement_to_json(m: &MovementRecord) -> serde_json::Value {
    json!({
        "id": m.id.to_string(),
        "store": m.store.as_str(),
        "item_code": m.item_code.as_str(),
        "item_name": m.item_name,
        "spec": m.spec,
        "quantity": m.quantity,
        "occurred_at": m.occurred_at,
        "counterpart": m.counterpart,
        "kind": m.kind.as_str(),
        "invoice_number": m.invoice_number.as_ref().map(InvoiceNumber::as_str),
        "recorded_at": m.recorded_at,
    })
}

pub fn order_to_json(o: &Order) -> serde_json::Value {
    json!({
        "id": o.id.to_string(),
        "order_date": o.order_date,
        "delivery_date": o.delivery_date,
        "store": o.store.as_str(),
        "requested_by": o.requested_by,
        "status": o.status.as_str(),
        "invoice_number": o.invoice_number.as_ref().map(InvoiceNumber::as_str),
        "delivery_status": o.delivery_status,
        "subtotal": o.subtotal,
        "tax": o.tax,
        "total": o.total,
        "decided_at": o.decided_at,
        "lines": o.lines.iter().map(|l| json!({
            "code": l.code.as_str(),
            "name": l.name,
            "spec": l.spec,
            "unit_price": l.unit_price,
            "qty": l.qty,
            "original_qty": l.original_qty,
            "checked": l.checked,
            "amount": l.amount(),
        })).collect::<Vec<_>>(),
    })
}

pub fn status_line_to_json(line: &StockStatusLine) -> serde_json::Value {
    json!({
        "code": line.code.as_str(),
        "name": line.name,
        "qty": line.qty,
        "total_value": line.total_value,
        "safety_qty": line.safety_qty,
    })
}

pub fn task_to_json(t: &Task) -> serde_json::Value {
    json!({
        "id": t.id.to_string(),
        "date": t.date,
        "owner_label": t.owner_label,
        "content": t.content,
        "progress": t.progress,
        "priority": t.priority.as_str(),
        "status": t.status.as_str(),
        "manager_check": t.manager_check,
        "manager_comment": t.manager_comment,
        "carried_from": t.carried_from.map(|id| id.to_string()),
    })
}

pub fn open_items_to_json(open: &OpenItems) -> serde_json::Value {
    json!({
        "finish_today": open.finish_today.iter().map(task_to_json).collect::<Vec<_>>(),
        "continue_items": open.continue_items.iter().map(task_to_json).collect::<Vec<_>>(),
        "today_items": open.today_items.iter().map(task_to_json).collect::<Vec<_>>(),
    })
}
