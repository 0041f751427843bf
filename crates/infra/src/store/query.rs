use chrono::NaiveDate;

use stockbook_core::{ItemCode, StoreCode};
use stockbook_ledger::{MovementKind, MovementRecord};

/// Sort order for movement queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest `occurred_at` first (the ledger's default view).
    #[default]
    Descending,
    Ascending,
}

/// Filter for movement queries. Every field is optional; an empty filter
/// matches the whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub store: Option<StoreCode>,
    pub item_code: Option<ItemCode>,
    pub kinds: Option<Vec<MovementKind>>,
    pub occurred_from: Option<NaiveDate>,
    pub occurred_to: Option<NaiveDate>,
    pub order: SortOrder,
}

impl MovementFilter {
    pub fn for_store(store: StoreCode) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item_code: ItemCode) -> Self {
        self.item_code = Some(item_code);
        self
    }

    pub fn with_kinds(mut self, kinds: Vec<MovementKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    pub fn occurred_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.occurred_from = from;
        self.occurred_to = to;
        self
    }

    pub fn ascending(mut self) -> Self {
        self.order = SortOrder::Ascending;
        self
    }

    pub fn matches(&self, m: &MovementRecord) -> bool {
        if let Some(store) = &self.store {
            if &m.store != store {
                return false;
            }
        }
        if let Some(item) = &self.item_code {
            if &m.item_code != item {
                return false;
            }
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&m.kind) {
                return false;
            }
        }
        if let Some(from) = self.occurred_from {
            if m.occurred_at < from {
                return false;
            }
        }
        if let Some(to) = self.occurred_to {
            if m.occurred_at > to {
                return false;
            }
        }
        true
    }
}
