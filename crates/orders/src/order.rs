use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{Error, ItemCode, OrderId, StoreCode};
use stockbook_ledger::{InvoiceNumber, MovementDraft, MovementKind};

use crate::tax::TaxRate;

/// Order status lifecycle.
///
/// `Approved` and `Rejected` are terminal. `Hold` is re-enterable review:
/// a held order accepts another decision just like a pending one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Hold,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Approved | OrderStatus::Rejected)
    }

    pub fn accepts_decision(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Hold)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Hold => "hold",
        }
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "rejected" => Ok(OrderStatus::Rejected),
            "hold" => Ok(OrderStatus::Hold),
            other => Err(Error::validation(format!("unknown order status: {other}"))),
        }
    }
}

/// Reviewer decision on a pending or held order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
    Hold,
}

/// One requested item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub code: ItemCode,
    pub name: String,
    pub spec: String,
    /// Smallest currency unit.
    pub unit_price: u64,
    pub qty: i64,
    /// The store's original request, retained to flag operator edits.
    pub original_qty: i64,
    /// Unchecked lines are excluded from approval without being deleted.
    pub checked: bool,
}

impl OrderLine {
    pub fn is_approvable(&self) -> bool {
        self.checked && self.qty > 0
    }

    pub fn amount(&self) -> i64 {
        self.qty * self.unit_price as i64
    }
}

/// Line content as submitted by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub code: ItemCode,
    pub name: String,
    pub spec: String,
    pub unit_price: u64,
    pub qty: i64,
}

/// Reviewer edit to one line at decision time: reduce the quantity or
/// uncheck the line entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    pub code: ItemCode,
    pub qty: i64,
    pub checked: bool,
}

/// A store's purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_date: NaiveDate,
    /// Set on approval; requested deliveries before that are unknown.
    pub delivery_date: Option<NaiveDate>,
    pub store: StoreCode,
    pub requested_by: String,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub invoice_number: Option<InvoiceNumber>,
    /// Opaque field owned by the downstream receiving process
    /// (partial/full receipt, photo evidence).
    pub delivery_status: Option<String>,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Full decision input as it arrives from the reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    pub delivery_date: Option<NaiveDate>,
    pub edited_lines: Option<Vec<LineEdit>>,
}

/// Facts the workflow supplies when finalizing a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionContext {
    /// Allocated for approvals only; `decide` rejects a missing number.
    pub invoice_number: Option<InvoiceNumber>,
    pub head_office: StoreCode,
    pub tax_rate: TaxRate,
    pub decided_at: DateTime<Utc>,
}

/// Result of a decision: the updated order plus the movement rows that must
/// be appended atomically with it (empty unless approving).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub order: Order,
    pub movements: Vec<MovementDraft>,
}

impl Order {
    /// Create a pending order from submitted lines.
    pub fn submit(
        store: StoreCode,
        requested_by: impl Into<String>,
        order_date: NaiveDate,
        lines: Vec<NewOrderLine>,
        tax_rate: TaxRate,
    ) -> Result<Self, Error> {
        if lines.is_empty() {
            return Err(Error::validation("order must have at least one line"));
        }
        for line in &lines {
            if line.qty <= 0 {
                return Err(Error::validation(format!(
                    "line {} quantity must be positive",
                    line.code
                )));
            }
        }

        let lines: Vec<OrderLine> = lines
            .into_iter()
            .map(|l| OrderLine {
                code: l.code,
                name: l.name,
                spec: l.spec,
                unit_price: l.unit_price,
                original_qty: l.qty,
                qty: l.qty,
                checked: true,
            })
            .collect();

        let subtotal: i64 = lines.iter().map(OrderLine::amount).sum();
        let tax = tax_rate.tax_on(subtotal);

        Ok(Self {
            id: OrderId::new(),
            order_date,
            delivery_date: None,
            store,
            requested_by: requested_by.into(),
            lines,
            status: OrderStatus::Pending,
            invoice_number: None,
            delivery_status: None,
            subtotal,
            tax,
            total: subtotal + tax,
            decided_at: None,
        })
    }

    /// Check a decision without producing effects.
    ///
    /// Used by the workflow before allocating an invoice number, so a plainly
    /// invalid approval never burns a sequence.
    pub fn validate_decision(&self, req: &DecisionRequest) -> Result<(), Error> {
        if !self.status.accepts_decision() {
            return Err(Error::conflict(format!(
                "order {} is already {}",
                self.id,
                self.status.as_str()
            )));
        }

        let edited = self.edited_lines(req.edited_lines.as_deref())?;

        if matches!(req.decision, Decision::Approve) {
            if req.delivery_date.is_none() {
                return Err(Error::validation("approval requires a delivery date"));
            }
            if !edited.iter().any(OrderLine::is_approvable) {
                return Err(Error::validation(
                    "approval requires at least one checked line with qty > 0",
                ));
            }
        }

        Ok(())
    }

    /// Apply a decision, yielding the updated order and (for approvals) the
    /// paired movements to append. Does not mutate `self`.
    pub fn decide(&self, req: &DecisionRequest, ctx: &DecisionContext) -> Result<DecisionOutcome, Error> {
        self.validate_decision(req)?;

        let lines = self.edited_lines(req.edited_lines.as_deref())?;
        let mut order = self.clone();
        order.lines = lines;

        match req.decision {
            Decision::Hold => {
                order.status = OrderStatus::Hold;
                Ok(DecisionOutcome {
                    order,
                    movements: Vec::new(),
                })
            }
            Decision::Reject => {
                order.status = OrderStatus::Rejected;
                order.decided_at = Some(ctx.decided_at);
                Ok(DecisionOutcome {
                    order,
                    movements: Vec::new(),
                })
            }
            Decision::Approve => {
                let invoice = ctx
                    .invoice_number
                    .clone()
                    .ok_or_else(|| Error::validation("approval requires an invoice number"))?;
                let delivery_date = req
                    .delivery_date
                    .ok_or_else(|| Error::validation("approval requires a delivery date"))?;

                let mut movements = Vec::new();
                for line in order.lines.iter().filter(|l| l.is_approvable()) {
                    movements.push(MovementDraft {
                        store: ctx.head_office.clone(),
                        item_code: line.code.clone(),
                        item_name: line.name.clone(),
                        spec: line.spec.clone(),
                        quantity: -line.qty,
                        occurred_at: delivery_date,
                        counterpart: order.store.to_string(),
                        kind: MovementKind::Outbound,
                        invoice_number: Some(invoice.clone()),
                    });
                    movements.push(MovementDraft {
                        store: order.store.clone(),
                        item_code: line.code.clone(),
                        item_name: line.name.clone(),
                        spec: line.spec.clone(),
                        quantity: line.qty,
                        occurred_at: delivery_date,
                        counterpart: ctx.head_office.to_string(),
                        kind: MovementKind::Inbound,
                        invoice_number: Some(invoice.clone()),
                    });
                }

                let subtotal: i64 = order
                    .lines
                    .iter()
                    .filter(|l| l.is_approvable())
                    .map(|l| l.amount())
                    .sum();
                let tax = ctx.tax_rate.tax_on(subtotal);
                order.subtotal = subtotal;
                order.tax = tax;
                order.total = subtotal + tax;
                order.status = OrderStatus::Approved;
                order.delivery_date = Some(delivery_date);
                order.invoice_number = Some(invoice);
                order.decided_at = Some(ctx.decided_at);

                Ok(DecisionOutcome { order, movements })
            }
        }
    }

    /// Apply reviewer line edits, validating against the stored lines.
    ///
    /// Quantities may only be reduced (never above the store's original
    /// request); removing a line means unchecking it, not a zero quantity.
    fn edited_lines(&self, edits: Option<&[LineEdit]>) -> Result<Vec<OrderLine>, Error> {
        let Some(edits) = edits else {
            return Ok(self.lines.clone());
        };

        let mut lines = self.lines.clone();
        for edit in edits {
            let line = lines
                .iter_mut()
                .find(|l| l.code == edit.code)
                .ok_or_else(|| {
                    Error::validation(format!("edited line {} is not on the order", edit.code))
                })?;
            if edit.qty <= 0 {
                return Err(Error::validation(format!(
                    "edited quantity for {} must be positive; uncheck the line instead",
                    edit.code
                )));
            }
            if edit.qty > line.original_qty {
                return Err(Error::validation(format!(
                    "edited quantity for {} exceeds the requested {}",
                    edit.code, line.original_qty
                )));
            }
            line.qty = edit.qty;
            line.checked = edit.checked;
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StoreCode {
        StoreCode::new("Bangna").unwrap()
    }

    fn hq() -> StoreCode {
        StoreCode::new("HQ").unwrap()
    }

    fn vat() -> TaxRate {
        TaxRate::from_basis_points(700)
    }

    fn line(code: &str, qty: i64, price: u64) -> NewOrderLine {
        NewOrderLine {
            code: ItemCode::new(code).unwrap(),
            name: format!("item {code}"),
            spec: String::new(),
            unit_price: price,
            qty,
        }
    }

    fn submit(lines: Vec<NewOrderLine>) -> Order {
        Order::submit(
            store(),
            "somchai",
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            lines,
            vat(),
        )
        .unwrap()
    }

    fn approve_ctx(seq: u32) -> DecisionContext {
        DecisionContext {
            invoice_number: Some(
                InvoiceNumber::new(NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(), seq).unwrap(),
            ),
            head_office: hq(),
            tax_rate: vat(),
            decided_at: Utc::now(),
        }
    }

    fn approve_req() -> DecisionRequest {
        DecisionRequest {
            decision: Decision::Approve,
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            edited_lines: None,
        }
    }

    #[test]
    fn submit_computes_totals_with_tax() {
        let order = submit(vec![line("A1", 5, 10), line("B2", 2, 100)]);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.subtotal, 250);
        assert_eq!(order.tax, 17); // 7% of 250, rounded down
        assert_eq!(order.total, 267);
        assert!(order.lines.iter().all(|l| l.checked && l.qty == l.original_qty));
    }

    #[test]
    fn submit_rejects_empty_or_nonpositive_lines() {
        assert!(Order::submit(
            store(),
            "somchai",
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            vec![],
            vat()
        )
        .is_err());
        assert!(Order::submit(
            store(),
            "somchai",
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            vec![line("A1", 0, 10)],
            vat()
        )
        .is_err());
    }

    #[test]
    fn approval_emits_paired_movements_sharing_one_invoice() {
        let order = submit(vec![line("A1", 5, 10), line("B2", 2, 100)]);
        let outcome = order.decide(&approve_req(), &approve_ctx(1)).unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Approved);
        assert_eq!(outcome.movements.len(), 4); // 2N

        let invoice = outcome.order.invoice_number.clone().unwrap();
        for m in &outcome.movements {
            assert_eq!(m.invoice_number.as_ref(), Some(&invoice));
        }

        let hq_out: Vec<_> = outcome
            .movements
            .iter()
            .filter(|m| m.store == hq())
            .collect();
        let store_in: Vec<_> = outcome
            .movements
            .iter()
            .filter(|m| m.store == store())
            .collect();
        assert_eq!(hq_out.len(), 2);
        assert_eq!(store_in.len(), 2);
        assert!(hq_out.iter().all(|m| m.quantity < 0 && m.kind == MovementKind::Outbound));
        assert!(store_in.iter().all(|m| m.quantity > 0 && m.kind == MovementKind::Inbound));

        // Quantities pair up per item.
        let a1_out = hq_out.iter().find(|m| m.item_code.as_str() == "A1").unwrap();
        let a1_in = store_in.iter().find(|m| m.item_code.as_str() == "A1").unwrap();
        assert_eq!(a1_out.quantity, -5);
        assert_eq!(a1_in.quantity, 5);
    }

    #[test]
    fn approval_requires_delivery_date() {
        let order = submit(vec![line("A1", 5, 10)]);
        let req = DecisionRequest {
            decision: Decision::Approve,
            delivery_date: None,
            edited_lines: None,
        };
        let err = order.decide(&req, &approve_ctx(1)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn unchecking_every_line_blocks_approval() {
        let order = submit(vec![line("A1", 5, 10)]);
        let req = DecisionRequest {
            decision: Decision::Approve,
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            edited_lines: Some(vec![LineEdit {
                code: ItemCode::new("A1").unwrap(),
                qty: 5,
                checked: false,
            }]),
        };
        assert!(matches!(
            order.decide(&req, &approve_ctx(1)).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn reviewer_may_reduce_but_not_raise_quantities() {
        let order = submit(vec![line("A1", 5, 10)]);

        let mut req = approve_req();
        req.edited_lines = Some(vec![LineEdit {
            code: ItemCode::new("A1").unwrap(),
            qty: 3,
            checked: true,
        }]);
        let outcome = order.decide(&req, &approve_ctx(1)).unwrap();
        let line = &outcome.order.lines[0];
        assert_eq!(line.qty, 3);
        assert_eq!(line.original_qty, 5); // original request retained
        assert_eq!(outcome.order.subtotal, 30);

        req.edited_lines = Some(vec![LineEdit {
            code: ItemCode::new("A1").unwrap(),
            qty: 9,
            checked: true,
        }]);
        assert!(order.decide(&req, &approve_ctx(1)).is_err());
    }

    #[test]
    fn deciding_a_terminal_order_is_a_conflict_with_no_movements() {
        let order = submit(vec![line("A1", 5, 10)]);
        let approved = order.decide(&approve_req(), &approve_ctx(1)).unwrap().order;

        let reject = DecisionRequest {
            decision: Decision::Reject,
            delivery_date: None,
            edited_lines: None,
        };
        let err = approved.decide(&reject, &approve_ctx(2)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(approved.status, OrderStatus::Approved);
    }

    #[test]
    fn hold_reenters_review_and_can_still_be_approved() {
        let order = submit(vec![line("A1", 5, 10)]);
        let hold = DecisionRequest {
            decision: Decision::Hold,
            delivery_date: None,
            edited_lines: None,
        };
        let held = order.decide(&hold, &approve_ctx(1)).unwrap();
        assert_eq!(held.order.status, OrderStatus::Hold);
        assert!(held.movements.is_empty());
        assert!(held.order.decided_at.is_none());

        let outcome = held.order.decide(&approve_req(), &approve_ctx(1)).unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Approved);
    }

    #[test]
    fn rejection_writes_no_movements() {
        let order = submit(vec![line("A1", 5, 10)]);
        let req = DecisionRequest {
            decision: Decision::Reject,
            delivery_date: None,
            edited_lines: None,
        };
        let outcome = order.decide(&req, &approve_ctx(1)).unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Rejected);
        assert!(outcome.movements.is_empty());
        assert!(outcome.order.invoice_number.is_none());
    }
}
