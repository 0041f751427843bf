use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use tracing::instrument;

use stockbook_core::{Error, ItemCode, MovementId, Result, StoreCode};
use stockbook_directory::{ItemCatalog, SafetyStockConfig, StoreDirectory};
use stockbook_ledger::{balance_map, stock_status, MovementDraft, MovementKind, MovementRecord, StockStatusLine};

use crate::store::{MovementFilter, MovementStore};

/// One delivery line arriving at a store from a vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundReceipt {
    pub store: StoreCode,
    pub code: ItemCode,
    pub qty: i64,
    pub occurred_at: NaiveDate,
    /// Vendor or source description.
    pub counterpart: String,
}

/// One consumption line at a store. `qty` is how much was used (positive);
/// the ledger records it as a negative movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEntry {
    pub store: StoreCode,
    pub code: ItemCode,
    pub qty: i64,
    pub occurred_at: NaiveDate,
    pub reason: String,
}

/// A stocktake correction: bring the balance of `(store, code)` to
/// `counted_qty` as of `occurred_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentRequest {
    pub store: StoreCode,
    pub code: ItemCode,
    pub counted_qty: i64,
    pub occurred_at: NaiveDate,
    pub note: String,
}

/// Stock queries and non-order movement writes.
pub struct StockService<M, C, S> {
    movements: M,
    catalog: C,
    stores: S,
    safety: SafetyStockConfig,
}

impl<M, C, S> StockService<M, C, S>
where
    M: MovementStore,
    C: ItemCatalog,
    S: StoreDirectory,
{
    pub fn new(movements: M, catalog: C, stores: S, safety: SafetyStockConfig) -> Self {
        Self {
            movements,
            catalog,
            stores,
            safety,
        }
    }

    fn describe(&self, code: &ItemCode) -> Result<(String, String)> {
        let info = self
            .catalog
            .get(code)
            .ok_or_else(|| Error::not_found(format!("item {code} is not in the catalog")))?;
        Ok((info.name, info.spec))
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

    /// Current (or as-of) balances for every item that has moved at the store.
    #[instrument(skip(self), err)]
    pub fn get_stock(
        &self,
        store: &StoreCode,
        as_of: Option<NaiveDate>,
    ) -> Result<BTreeMap<ItemCode, i64>> {
        let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
        let movements = self
            .movements
            .query(&MovementFilter::for_store(store.clone()))?;
        Ok(balance_map(&movements, store, as_of))
    }

    /// Balances enriched with valuation and safety levels for display.
    #[instrument(skip(self), err)]
    pub fn get_stock_status(
        &self,
        store: &StoreCode,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<StockStatusLine>> {
        let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
        let movements = self
            .movements
            .query(&MovementFilter::for_store(store.clone()))?;
        Ok(stock_status(
            &movements,
            store,
            as_of,
            |code| self.catalog.get(code).map(|i| i.cost).unwrap_or(0),
            |code| self.safety.get(store, code),
        ))
    }

    #[instrument(skip(self, filter), err)]
    pub fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>> {
        Ok(self.movements.query(filter)?)
    }

    /// Record a vendor delivery as one atomic batch of Inbound movements.
    #[instrument(skip(self, receipts), fields(receipt_count = receipts.len()), err)]
    pub fn register_inbound_batch(&self, receipts: Vec<InboundReceipt>) -> Result<Vec<MovementId>> {
        let mut records = Vec::with_capacity(receipts.len());
        for receipt in receipts {
            if receipt.qty <= 0 {
                return Err(Error::validation(format!(
                    "inbound quantity for {} must be positive",
                    receipt.code
                )));
            }
            self.known_store(&receipt.store)?;
            let (item_name, spec) = self.describe(&receipt.code)?;
            records.push(
                MovementDraft {
                    store: receipt.store,
                    item_code: receipt.code,
                    item_name,
                    spec,
                    quantity: receipt.qty,
                    occurred_at: receipt.occurred_at,
                    counterpart: receipt.counterpart,
                    kind: MovementKind::Inbound,
                    invoice_number: None,
                }
                .into_record()?,
            );
        }
        Ok(self.movements.append_batch(records)?)
    }

    /// Record consumption as one atomic batch of Usage movements.
    #[instrument(skip(self, entries), fields(entry_count = entries.len()), err)]
    pub fn record_usage_batch(&self, entries: Vec<UsageEntry>) -> Result<Vec<MovementId>> {
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.qty <= 0 {
                return Err(Error::validation(format!(
                    "usage quantity for {} must be positive",
                    entry.code
                )));
            }
            self.known_store(&entry.store)?;
            let (item_name, spec) = self.describe(&entry.code)?;
            records.push(
                MovementDraft {
                    store: entry.store,
                    item_code: entry.code,
                    item_name,
                    spec,
                    quantity: -entry.qty,
                    occurred_at: entry.occurred_at,
                    counterpart: entry.reason,
                    kind: MovementKind::Usage,
                    invoice_number: None,
                }
                .into_record()?,
            );
        }
        Ok(self.movements.append_batch(records)?)
    }

    /// Write Adjustment deltas bringing each `(store, code)` balance to the
    /// counted quantity. Pairs already at the counted quantity produce no
    /// row; the whole batch is appended atomically.
    #[instrument(skip(self, requests), fields(request_count = requests.len()), err)]
    pub fn adjust_stock_batch(&self, requests: Vec<AdjustmentRequest>) -> Result<Vec<MovementId>> {
        let mut records = Vec::new();
        for req in requests {
            self.known_store(&req.store)?;
            let filter = MovementFilter::for_store(req.store.clone())
                .with_item(req.code.clone())
                .occurred_between(None, Some(req.occurred_at));
            let current: i64 = self
                .movements
                .query(&filter)?
                .iter()
                .map(|m| m.quantity)
                .sum();

            let diff = req.counted_qty - current;
            if diff == 0 {
                continue;
            }

            let (item_name, spec) = self.describe(&req.code)?;
            records.push(
                MovementDraft {
                    store: req.store,
                    item_code: req.code,
                    item_name,
                    spec,
                    quantity: diff,
                    occurred_at: req.occurred_at,
                    counterpart: req.note,
                    kind: MovementKind::Adjustment,
                    invoice_number: None,
                }
                .into_record()?,
            );
        }
        Ok(self.movements.append_batch(records)?)
    }
}
