use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{Error, ItemCode, MovementId, StoreCode};

use crate::invoice::InvoiceNumber;

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock arriving at a store (order delivery, vendor receipt).
    Inbound,
    /// Stock leaving the head office against an approved order.
    Outbound,
    /// Non-order-driven push from the head office to a store.
    ForcePush,
    /// Manual correction bringing a balance to a counted quantity.
    Adjustment,
    /// Consumption at a store.
    Usage,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "inbound",
            MovementKind::Outbound => "outbound",
            MovementKind::ForcePush => "force_push",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Usage => "usage",
        }
    }
}

impl core::str::FromStr for MovementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(MovementKind::Inbound),
            "outbound" => Ok(MovementKind::Outbound),
            "force_push" => Ok(MovementKind::ForcePush),
            "adjustment" => Ok(MovementKind::Adjustment),
            "usage" => Ok(MovementKind::Usage),
            other => Err(Error::validation(format!("unknown movement kind: {other}"))),
        }
    }
}

/// One signed quantity change for an item at a store (immutable once written).
///
/// The balance of `(store, item_code)` as of date D equals the sum of
/// `quantity` over all records with `occurred_at <= D`. Corrections are new
/// `Adjustment` records, never edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    pub store: StoreCode,
    pub item_code: ItemCode,
    pub item_name: String,
    /// Display-only specification text ("500ml", "box of 12").
    pub spec: String,
    /// Negative = outflow, positive = inflow. Never zero.
    pub quantity: i64,
    pub occurred_at: NaiveDate,
    /// Source/destination store, vendor, or reason text.
    pub counterpart: String,
    pub kind: MovementKind,
    /// Present for Outbound/ForcePush movements and their matching Inbound pairs.
    pub invoice_number: Option<InvoiceNumber>,
    pub recorded_at: DateTime<Utc>,
}

/// Input for a movement that has not been written yet.
///
/// `into_record` validates the draft and stamps identity + audit time; the
/// resulting `MovementRecord` is what stores persist verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub store: StoreCode,
    pub item_code: ItemCode,
    pub item_name: String,
    pub spec: String,
    pub quantity: i64,
    pub occurred_at: NaiveDate,
    pub counterpart: String,
    pub kind: MovementKind,
    pub invoice_number: Option<InvoiceNumber>,
}

impl MovementDraft {
    pub fn into_record(self) -> Result<MovementRecord, Error> {
        if self.quantity == 0 {
            return Err(Error::validation(format!(
                "movement quantity must not be zero ({} at {})",
                self.item_code, self.store
            )));
        }

        Ok(MovementRecord {
            id: MovementId::new(),
            store: self.store,
            item_code: self.item_code,
            item_name: self.item_name,
            spec: self.spec,
            quantity: self.quantity,
            occurred_at: self.occurred_at,
            counterpart: self.counterpart,
            kind: self.kind,
            invoice_number: self.invoice_number,
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(quantity: i64) -> MovementDraft {
        MovementDraft {
            store: StoreCode::new("Bangna").unwrap(),
            item_code: ItemCode::new("A1").unwrap(),
            item_name: "Paper cup".to_string(),
            spec: "16oz".to_string(),
            quantity,
            occurred_at: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            counterpart: "HQ".to_string(),
            kind: MovementKind::Inbound,
            invoice_number: None,
        }
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = draft(0).into_record().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn signed_quantities_are_preserved() {
        assert_eq!(draft(-5).into_record().unwrap().quantity, -5);
        assert_eq!(draft(5).into_record().unwrap().quantity, 5);
    }

    #[test]
    fn kind_serializes_to_the_same_spelling_as_as_str() {
        for kind in [
            MovementKind::Inbound,
            MovementKind::Outbound,
            MovementKind::ForcePush,
            MovementKind::Adjustment,
            MovementKind::Usage,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<MovementKind>().unwrap(), kind);
        }
    }
}
