//! End-to-end flows over the in-memory store: the full order lifecycle
//! against stock balances, stocktake convergence, and invoice allocation
//! under overlapping approvals.

use std::sync::Arc;

use chrono::NaiveDate;

use stockbook_core::{ItemCode, StoreCode};
use stockbook_directory::{InMemoryDirectory, ItemInfo, SafetyStockConfig};
use stockbook_ledger::MovementKind;
use stockbook_orders::{Decision, DecisionRequest, TaxRate};

use crate::engine::{AdjustmentRequest, InboundReceipt, OrderRequestLine, OrderService, StockService};
use crate::store::{InMemoryStore, MovementFilter, MovementStore};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn hq() -> StoreCode {
    StoreCode::new("HQ").unwrap()
}

fn bangna() -> StoreCode {
    StoreCode::new("Bangna").unwrap()
}

fn item(code: &str) -> ItemCode {
    ItemCode::new(code).unwrap()
}

struct Fixture {
    store: Arc<InMemoryStore>,
    stock: StockService<Arc<InMemoryStore>, Arc<InMemoryDirectory>, Arc<InMemoryDirectory>>,
    orders: OrderService<
        Arc<InMemoryStore>,
        Arc<InMemoryStore>,
        Arc<InMemoryDirectory>,
        Arc<InMemoryDirectory>,
    >,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let directory = Arc::new(InMemoryDirectory::new());
    directory.put_item(
        item("A1"),
        ItemInfo {
            name: "Paper cup".to_string(),
            spec: "16oz".to_string(),
            cost: 3,
            price: 5,
            tax_class: "standard".to_string(),
        },
    );
    directory.put_store(hq());
    directory.put_store(bangna());

    Fixture {
        store: store.clone(),
        stock: StockService::new(
            store.clone(),
            directory.clone(),
            directory.clone(),
            SafetyStockConfig::new(),
        ),
        orders: OrderService::new(
            store.clone(),
            store.clone(),
            directory.clone(),
            directory,
            hq(),
            TaxRate::from_basis_points(700),
        ),
    }
}

#[test]
fn approved_order_moves_stock_from_hq_to_the_store() {
    let f = fixture();

    // Seed head-office stock.
    f.stock
        .register_inbound_batch(vec![InboundReceipt {
            store: hq(),
            code: item("A1"),
            qty: 100,
            occurred_at: day(1),
            counterpart: "Siam Paper Co".to_string(),
        }])
        .unwrap();

    let order = f
        .orders
        .submit_order(
            bangna(),
            "somchai",
            day(8),
            vec![OrderRequestLine {
                code: item("A1"),
                qty: 5,
            }],
        )
        .unwrap();

    let decided = f
        .orders
        .decide_order(
            order.id,
            &DecisionRequest {
                decision: Decision::Approve,
                delivery_date: Some(day(10)),
                edited_lines: None,
            },
        )
        .unwrap();
    let invoice = decided.invoice_number.clone().unwrap();

    // Balances as of the delivery date reflect the paired movements.
    let hq_stock = f.stock.get_stock(&hq(), Some(day(10))).unwrap();
    let bangna_stock = f.stock.get_stock(&bangna(), Some(day(10))).unwrap();
    assert_eq!(hq_stock[&item("A1")], 95);
    assert_eq!(bangna_stock[&item("A1")], 5);

    // The day before delivery, nothing has moved yet.
    let bangna_before = f.stock.get_stock(&bangna(), Some(day(9))).unwrap();
    assert_eq!(bangna_before.get(&item("A1")).copied().unwrap_or(0), 0);

    // Both rows of the transfer carry the order's invoice number.
    let rows = f
        .store
        .query(&MovementFilter::default().with_kinds(vec![
            MovementKind::Outbound,
            MovementKind::Inbound,
        ]))
        .unwrap();
    let transfer_rows: Vec<_> = rows
        .iter()
        .filter(|m| m.invoice_number.as_ref() == Some(&invoice))
        .collect();
    assert_eq!(transfer_rows.len(), 2);
}

#[test]
fn stocktake_after_usage_converges_and_stays_put() {
    let f = fixture();
    f.stock
        .register_inbound_batch(vec![InboundReceipt {
            store: bangna(),
            code: item("A1"),
            qty: 50,
            occurred_at: day(1),
            counterpart: "HQ".to_string(),
        }])
        .unwrap();
    f.stock
        .record_usage_batch(vec![crate::engine::UsageEntry {
            store: bangna(),
            code: item("A1"),
            qty: 12,
            occurred_at: day(2),
            reason: "daily prep".to_string(),
        }])
        .unwrap();

    // The count finds 35, not the ledger's 38.
    let count = AdjustmentRequest {
        store: bangna(),
        code: item("A1"),
        counted_qty: 35,
        occurred_at: day(3),
        note: "weekly stocktake".to_string(),
    };
    f.stock.adjust_stock_batch(vec![count.clone()]).unwrap();
    assert_eq!(f.stock.get_stock(&bangna(), Some(day(3))).unwrap()[&item("A1")], 35);

    f.stock.adjust_stock_batch(vec![count]).unwrap();
    assert_eq!(f.stock.get_stock(&bangna(), Some(day(3))).unwrap()[&item("A1")], 35);

    // Exactly one adjustment row was written.
    let adjustments = f
        .store
        .query(&MovementFilter::for_store(bangna()).with_kinds(vec![MovementKind::Adjustment]))
        .unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].quantity, -3);
}

#[test]
fn every_approval_gets_a_distinct_invoice_number() {
    let f = fixture();

    let mut invoices = Vec::new();
    for _ in 0..5 {
        let order = f
            .orders
            .submit_order(
                bangna(),
                "somchai",
                day(8),
                vec![OrderRequestLine {
                    code: item("A1"),
                    qty: 1,
                }],
            )
            .unwrap();
        let decided = f
            .orders
            .decide_order(
                order.id,
                &DecisionRequest {
                    decision: Decision::Approve,
                    delivery_date: Some(day(10)),
                    edited_lines: None,
                },
            )
            .unwrap();
        invoices.push(decided.invoice_number.unwrap());
    }

    let mut unique = invoices.clone();
    unique.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    unique.dedup();
    assert_eq!(unique.len(), invoices.len());

    // Same day, consecutive sequences.
    for pair in invoices.windows(2) {
        assert_eq!(pair[0].day(), pair[1].day());
        assert_eq!(pair[0].sequence() + 1, pair[1].sequence());
    }
}

#[test]
fn concurrent_approvals_never_write_twice() {
    let f = fixture();
    let order = f
        .orders
        .submit_order(
            bangna(),
            "somchai",
            day(8),
            vec![OrderRequestLine {
                code: item("A1"),
                qty: 5,
            }],
        )
        .unwrap();

    let req = DecisionRequest {
        decision: Decision::Approve,
        delivery_date: Some(day(10)),
        edited_lines: None,
    };

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| f.orders.decide_order(order.id, &req)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);

    // Exactly one pair of transfer rows exists.
    let rows = f.store.query(&MovementFilter::default()).unwrap();
    assert_eq!(rows.len(), 2);
}
