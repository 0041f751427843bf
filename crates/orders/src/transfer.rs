//! Forced transfers: non-order-driven stock pushes from the head office.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{Error, ItemCode, StoreCode};
use stockbook_ledger::{InvoiceNumber, MovementDraft, MovementKind};

/// One item pushed to one destination store, as requested. The item's
/// name and spec come from the catalog, never from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceTransfer {
    pub store: StoreCode,
    pub code: ItemCode,
    pub qty: i64,
}

/// A transfer line with its catalog description resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLine {
    pub code: ItemCode,
    pub name: String,
    pub spec: String,
    pub qty: i64,
}

/// Group transfers by destination store; one invoice number is allocated
/// per destination batch.
pub fn group_by_destination(
    transfers: Vec<ForceTransfer>,
) -> BTreeMap<StoreCode, Vec<ForceTransfer>> {
    let mut grouped: BTreeMap<StoreCode, Vec<ForceTransfer>> = BTreeMap::new();
    for t in transfers {
        grouped.entry(t.store.clone()).or_default().push(t);
    }
    grouped
}

/// Paired movements for one destination batch: a `ForcePush` outflow at the
/// head office and an `Inbound` inflow at the store per line, all tagged
/// with the batch's invoice number.
pub fn force_push_movements(
    destination: &StoreCode,
    lines: &[TransferLine],
    head_office: &StoreCode,
    invoice: &InvoiceNumber,
    occurred_at: NaiveDate,
) -> Result<Vec<MovementDraft>, Error> {
    if lines.is_empty() {
        return Err(Error::validation("forced transfer batch must not be empty"));
    }
    if destination == head_office {
        return Err(Error::validation(
            "forced transfer destination must differ from the head office",
        ));
    }

    let mut movements = Vec::with_capacity(lines.len() * 2);
    for line in lines {
        if line.qty <= 0 {
            return Err(Error::validation(format!(
                "transfer quantity for {} must be positive",
                line.code
            )));
        }

        movements.push(MovementDraft {
            store: head_office.clone(),
            item_code: line.code.clone(),
            item_name: line.name.clone(),
            spec: line.spec.clone(),
            quantity: -line.qty,
            occurred_at,
            counterpart: destination.to_string(),
            kind: MovementKind::ForcePush,
            invoice_number: Some(invoice.clone()),
        });
        movements.push(MovementDraft {
            store: destination.clone(),
            item_code: line.code.clone(),
            item_name: line.name.clone(),
            spec: line.spec.clone(),
            quantity: line.qty,
            occurred_at,
            counterpart: head_office.to_string(),
            kind: MovementKind::Inbound,
            invoice_number: Some(invoice.clone()),
        });
    }

    Ok(movements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(store: &str, code: &str, qty: i64) -> ForceTransfer {
        ForceTransfer {
            store: StoreCode::new(store).unwrap(),
            code: ItemCode::new(code).unwrap(),
            qty,
        }
    }

    fn line(code: &str, qty: i64) -> TransferLine {
        TransferLine {
            code: ItemCode::new(code).unwrap(),
            name: format!("item {code}"),
            spec: String::new(),
            qty,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn groups_transfers_per_destination() {
        let grouped = group_by_destination(vec![
            transfer("Bangna", "A1", 5),
            transfer("Rama9", "A1", 2),
            transfer("Bangna", "B2", 1),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&StoreCode::new("Bangna").unwrap()].len(), 2);
        assert_eq!(grouped[&StoreCode::new("Rama9").unwrap()].len(), 1);
    }

    #[test]
    fn batch_movements_pair_and_share_the_invoice() {
        let hq = StoreCode::new("HQ").unwrap();
        let dest = StoreCode::new("Bangna").unwrap();
        let invoice = InvoiceNumber::new(day(), 3).unwrap();
        let batch = vec![line("A1", 5), line("B2", 2)];

        let movements = force_push_movements(&dest, &batch, &hq, &invoice, day()).unwrap();
        assert_eq!(movements.len(), 4);
        assert!(movements.iter().all(|m| m.invoice_number.as_ref() == Some(&invoice)));
        assert_eq!(
            movements.iter().map(|m| m.quantity).sum::<i64>(),
            0,
            "outflows and inflows cancel out"
        );
        assert!(movements
            .iter()
            .filter(|m| m.store == hq)
            .all(|m| m.kind == MovementKind::ForcePush && m.quantity < 0));
    }

    #[test]
    fn rejects_empty_nonpositive_and_self_targeted_batches() {
        let hq = StoreCode::new("HQ").unwrap();
        let dest = StoreCode::new("Bangna").unwrap();
        let invoice = InvoiceNumber::new(day(), 1).unwrap();

        assert!(force_push_movements(&dest, &[], &hq, &invoice, day()).is_err());
        assert!(force_push_movements(&dest, &[line("A1", 0)], &hq, &invoice, day()).is_err());
        assert!(force_push_movements(&hq, &[line("A1", 1)], &hq, &invoice, day()).is_err());
    }
}
