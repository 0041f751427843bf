//! `stockbook-ledger` — the movement ledger domain.
//!
//! An append-only record of signed stock movements is the single source of
//! truth for stock. Balances are never stored; they are derived by summing
//! movements up to a cutoff date (`balance` module). Invoice numbers link a
//! source-outflow movement to its destination-inflow counterpart.

pub mod balance;
pub mod invoice;
pub mod movement;

pub use balance::{balance, balance_map, stock_status, StockStatusLine};
pub use invoice::InvoiceNumber;
pub use movement::{MovementDraft, MovementKind, MovementRecord};
