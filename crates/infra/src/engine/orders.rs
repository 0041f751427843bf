use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use stockbook_core::{Error, ItemCode, OrderId, Result, StoreCode};
use stockbook_directory::{ItemCatalog, StoreDirectory};
use stockbook_ledger::InvoiceNumber;
use stockbook_orders::{
    force_push_movements, group_by_destination, DecisionContext, DecisionRequest, ForceTransfer,
    NewOrderLine, Order, OrderStatus, TaxRate, TransferLine,
};

use crate::store::{MovementStore, OrderStore};

/// One line of a store's order as submitted: the catalog supplies name,
/// spec and price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequestLine {
    pub code: ItemCode,
    pub qty: i64,
}

/// Order submission, review decisions and forced transfers.
pub struct OrderService<M, O, C, S> {
    movements: M,
    orders: O,
    catalog: C,
    stores: S,
    head_office: StoreCode,
    tax_rate: TaxRate,
}

impl<M, O, C, S> OrderService<M, O, C, S>
where
    M: MovementStore,
    O: OrderStore,
    C: ItemCatalog,
    S: StoreDirectory,
{
    pub fn new(
        movements: M,
        orders: O,
        catalog: C,
        stores: S,
        head_office: StoreCode,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            movements,
            orders,
            catalog,
            stores,
            head_office,
            tax_rate,
        }
    }

    fn known_store(&self, store: &StoreCode) -> Result<()> {
        if self.stores.contains(store) {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "store {store} is not in the directory"
            )))
        }
    }

    /// Create a pending order. Line names, specs and prices come from the
    /// catalog; an unknown code fails the whole submission.
    #[instrument(skip(self, lines), fields(line_count = lines.len()), err)]
    pub fn submit_order(
        &self,
        store: StoreCode,
        requested_by: impl Into<String> + std::fmt::Debug,
        order_date: NaiveDate,
        lines: Vec<OrderRequestLine>,
    ) -> Result<Order> {
        if store == self.head_office {
            return Err(Error::validation("the head office cannot order from itself"));
        }
        self.known_store(&store)?;

        let mut order_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let info = self.catalog.get(&line.code).ok_or_else(|| {
                Error::validation(format!("item {} is not in the catalog", line.code))
            })?;
            if info.price < 0 {
                return Err(Error::validation(format!(
                    "item {} has no valid price",
                    line.code
                )));
            }
            order_lines.push(NewOrderLine {
                code: line.code,
                name: info.name,
                spec: info.spec,
                unit_price: info.price as u64,
                qty: line.qty,
            });
        }

        let order = Order::submit(store, requested_by, order_date, order_lines, self.tax_rate)?;
        self.orders.insert_order(order.clone())?;
        info!(order_id = %order.id, total = order.total, "order submitted");
        Ok(order)
    }

    pub fn get_order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get_order(id)?
            .ok_or_else(|| Error::not_found(format!("order {id}")))
    }

    pub fn list_orders(
        &self,
        store: Option<&StoreCode>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        Ok(self.orders.list_orders(store, status)?)
    }

    /// Allocate and format the next invoice number for `day`.
    ///
    /// Allocation consumes the sequence whether or not the caller writes a
    /// movement with it; gaps are fine, duplicates are not.
    #[instrument(skip(self), err)]
    pub fn next_invoice_number(&self, day: NaiveDate) -> Result<InvoiceNumber> {
        let seq = self.movements.next_invoice_seq(day)?;
        Ok(InvoiceNumber::new(day, seq)?)
    }

    /// Apply a reviewer decision.
    ///
    /// For approvals: allocates the next invoice sequence for today, builds
    /// the paired movements, then commits the decided order and every
    /// movement through one atomic store operation with an expected-status
    /// check. A concurrent decision that lands first turns this into a
    /// `Conflict` with no movement rows written. The invoice sequence
    /// consumed by a failed approval is never reused; gaps are fine,
    /// duplicates are not.
    #[instrument(skip(self, req), fields(decision = ?req.decision), err)]
    pub fn decide_order(&self, id: OrderId, req: &DecisionRequest) -> Result<Order> {
        let order = self.get_order(id)?;
        // Reject plainly invalid decisions before burning an invoice sequence.
        order.validate_decision(req)?;

        let decided_at = Utc::now();
        let invoice_number = match req.decision {
            stockbook_orders::Decision::Approve => {
                Some(self.next_invoice_number(decided_at.date_naive())?)
            }
            _ => None,
        };

        let ctx = DecisionContext {
            invoice_number,
            head_office: self.head_office.clone(),
            tax_rate: self.tax_rate,
            decided_at,
        };
        let outcome = order.decide(req, &ctx)?;

        let mut records = Vec::with_capacity(outcome.movements.len());
        for draft in outcome.movements {
            records.push(draft.into_record()?);
        }

        self.orders.finalize_decision(
            &[OrderStatus::Pending, OrderStatus::Hold],
            outcome.order.clone(),
            records,
        )?;
        info!(
            order_id = %outcome.order.id,
            status = outcome.order.status.as_str(),
            invoice = outcome.order.invoice_number.as_ref().map(InvoiceNumber::as_str),
            "order decided"
        );
        Ok(outcome.order)
    }

    /// Push stock to stores without an order.
    ///
    /// Every destination and item code is validated up front, before any
    /// invoice allocation or write. Transfers are then grouped by
    /// destination; each destination gets one invoice number covering its
    /// whole batch, and each batch is appended atomically.
    #[instrument(skip(self, transfers), fields(transfer_count = transfers.len()), err)]
    pub fn force_outbound_batch(
        &self,
        transfers: Vec<ForceTransfer>,
        occurred_at: NaiveDate,
    ) -> Result<BTreeMap<StoreCode, InvoiceNumber>> {
        if transfers.is_empty() {
            return Err(Error::validation("forced transfer batch must not be empty"));
        }

        let mut resolved = Vec::new();
        for (destination, batch) in group_by_destination(transfers) {
            self.known_store(&destination)?;
            let mut lines = Vec::with_capacity(batch.len());
            for t in batch {
                let info = self.catalog.get(&t.code).ok_or_else(|| {
                    Error::validation(format!("item {} is not in the catalog", t.code))
                })?;
                lines.push(TransferLine {
                    code: t.code,
                    name: info.name,
                    spec: info.spec,
                    qty: t.qty,
                });
            }
            resolved.push((destination, lines));
        }

        let today = Utc::now().date_naive();
        let mut invoices = BTreeMap::new();
        for (destination, lines) in resolved {
            let invoice = self.next_invoice_number(today)?;
            let drafts = force_push_movements(
                &destination,
                &lines,
                &self.head_office,
                &invoice,
                occurred_at,
            )?;
            let mut records = Vec::with_capacity(drafts.len());
            for draft in drafts {
                records.push(draft.into_record()?);
            }
            self.movements.append_batch(records)?;
            invoices.insert(destination, invoice);
        }
        Ok(invoices)
    }

    /// Opaque passthrough owned by the downstream receiving process.
    pub fn set_delivery_status(&self, id: OrderId, delivery_status: Option<String>) -> Result<()> {
        Ok(self.orders.set_delivery_status(id, delivery_status)?)
    }
}
