//! Balance projection: derived stock quantities.
//!
//! Balances are recomputed on demand by scanning movements; there is no
//! cached mutable counter. The scan is the source of truth. Callers that
//! need frequent reads can keep a rebuildable cache keyed by
//! `(store, item_code)`, invalidated on append, but it must remain
//! disposable with respect to this projection.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{ItemCode, StoreCode};

use crate::movement::MovementRecord;

/// Quantity of one item at one store as of a cutoff date.
///
/// An item with no movements has balance 0 (absence is not an error).
pub fn balance(
    movements: &[MovementRecord],
    store: &StoreCode,
    item_code: &ItemCode,
    as_of: NaiveDate,
) -> i64 {
    movements
        .iter()
        .filter(|m| &m.store == store && &m.item_code == item_code && m.occurred_at <= as_of)
        .map(|m| m.quantity)
        .sum()
}

/// Quantities for every item with any movement at `store`, as of `as_of`.
///
/// Items whose movements all fall after the cutoff are reported with
/// balance 0 rather than omitted; they exist at the store, they just have
/// no stock yet.
pub fn balance_map(
    movements: &[MovementRecord],
    store: &StoreCode,
    as_of: NaiveDate,
) -> BTreeMap<ItemCode, i64> {
    let mut balances = BTreeMap::new();
    for m in movements.iter().filter(|m| &m.store == store) {
        let entry = balances.entry(m.item_code.clone()).or_insert(0i64);
        if m.occurred_at <= as_of {
            *entry += m.quantity;
        }
    }
    balances
}

/// One line of the stock status view for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStatusLine {
    pub code: ItemCode,
    pub name: String,
    pub qty: i64,
    /// `qty * unit cost`, in smallest currency unit.
    pub total_value: i64,
    /// Configured minimum balance, display/alerting only.
    pub safety_qty: i64,
}

/// Stock status for a store: quantity, value and safety stock per item.
///
/// `unit_cost` and `safety_qty` are lookups into configuration/catalog data
/// the ledger does not own. Item names come from the most recent movement,
/// which is where the operator last saw them.
pub fn stock_status(
    movements: &[MovementRecord],
    store: &StoreCode,
    as_of: NaiveDate,
    unit_cost: impl Fn(&ItemCode) -> i64,
    safety_qty: impl Fn(&ItemCode) -> i64,
) -> Vec<StockStatusLine> {
    let balances = balance_map(movements, store, as_of);

    let mut names: BTreeMap<&ItemCode, (&str, NaiveDate)> = BTreeMap::new();
    for m in movements.iter().filter(|m| &m.store == store) {
        match names.get(&m.item_code) {
            Some((_, seen)) if *seen >= m.occurred_at => {}
            _ => {
                names.insert(&m.item_code, (&m.item_name, m.occurred_at));
            }
        }
    }

    balances
        .into_iter()
        .map(|(code, qty)| {
            let name = names
                .get(&code)
                .map(|(name, _)| (*name).to_string())
                .unwrap_or_default();
            let cost = unit_cost(&code);
            let safety = safety_qty(&code);
            StockStatusLine {
                name,
                qty,
                total_value: qty * cost,
                safety_qty: safety,
                code,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{MovementDraft, MovementKind};

    fn store() -> StoreCode {
        StoreCode::new("Bangna").unwrap()
    }

    fn item(code: &str) -> ItemCode {
        ItemCode::new(code).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn movement(store: &str, code: &str, qty: i64, d: u32) -> MovementRecord {
        MovementDraft {
            store: StoreCode::new(store).unwrap(),
            item_code: item(code),
            item_name: format!("item {code}"),
            spec: String::new(),
            quantity: qty,
            occurred_at: day(d),
            counterpart: "test".to_string(),
            kind: if qty >= 0 {
                MovementKind::Inbound
            } else {
                MovementKind::Outbound
            },
            invoice_number: None,
        }
        .into_record()
        .unwrap()
    }

    #[test]
    fn balance_sums_signed_quantities_up_to_cutoff() {
        let movements = vec![
            movement("Bangna", "A1", 10, 1),
            movement("Bangna", "A1", -3, 5),
            movement("Bangna", "A1", 4, 20),
            movement("Bangna", "B2", 99, 2),
            movement("Rama9", "A1", 50, 1),
        ];

        assert_eq!(balance(&movements, &store(), &item("A1"), day(10)), 7);
        assert_eq!(balance(&movements, &store(), &item("A1"), day(31)), 11);
        assert_eq!(balance(&movements, &store(), &item("A1"), day(1)), 10);
    }

    #[test]
    fn missing_item_has_zero_balance() {
        let movements = vec![movement("Bangna", "A1", 10, 1)];
        assert_eq!(balance(&movements, &store(), &item("ZZ"), day(31)), 0);
        assert_eq!(balance(&[], &store(), &item("A1"), day(31)), 0);
    }

    #[test]
    fn balance_map_covers_every_item_seen_at_store() {
        let movements = vec![
            movement("Bangna", "A1", 10, 1),
            movement("Bangna", "B2", 5, 2),
            movement("Bangna", "B2", -5, 3),
            movement("Bangna", "C3", 8, 25),
            movement("Rama9", "D4", 1, 1),
        ];

        let map = balance_map(&movements, &store(), day(10));
        assert_eq!(map.get(&item("A1")), Some(&10));
        assert_eq!(map.get(&item("B2")), Some(&0));
        // C3 only moves after the cutoff: present with zero balance.
        assert_eq!(map.get(&item("C3")), Some(&0));
        assert_eq!(map.get(&item("D4")), None);
    }

    #[test]
    fn stock_status_values_and_safety_stock() {
        let movements = vec![
            movement("Bangna", "A1", 10, 1),
            movement("Bangna", "A1", -4, 5),
        ];

        let lines = stock_status(&movements, &store(), day(31), |_| 250, |_| 5);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].qty, 6);
        assert_eq!(lines[0].total_value, 1500);
        assert_eq!(lines[0].safety_qty, 5);
        assert_eq!(lines[0].name, "item A1");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        prop_compose! {
            fn arb_movement()(
                store_idx in 0..2usize,
                item_idx in 0..3usize,
                qty in -50i64..50,
                d in 1u32..28,
            ) -> Option<MovementRecord> {
                if qty == 0 {
                    return None;
                }
                let stores = ["Bangna", "Rama9"];
                let items = ["A1", "B2", "C3"];
                Some(movement(stores[store_idx], items[item_idx], qty, d))
            }
        }

        proptest! {
            #[test]
            fn balance_equals_naive_sum(
                movements in proptest::collection::vec(arb_movement(), 0..60),
                cutoff in 1u32..28,
            ) {
                let movements: Vec<_> = movements.into_iter().flatten().collect();
                let as_of = day(cutoff);
                let expected: i64 = movements
                    .iter()
                    .filter(|m| m.store == store() && m.item_code == item("A1") && m.occurred_at <= as_of)
                    .map(|m| m.quantity)
                    .sum();
                prop_assert_eq!(balance(&movements, &store(), &item("A1"), as_of), expected);
            }

            #[test]
            fn balance_map_agrees_with_balance(
                movements in proptest::collection::vec(arb_movement(), 0..60),
                cutoff in 1u32..28,
            ) {
                let movements: Vec<_> = movements.into_iter().flatten().collect();
                let as_of = day(cutoff);
                let map = balance_map(&movements, &store(), as_of);
                for (code, qty) in &map {
                    prop_assert_eq!(*qty, balance(&movements, &store(), code, as_of));
                }
            }
        }
    }
}
