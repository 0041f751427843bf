//! `stockbook-orders` — order lifecycle and transfer pairing.
//!
//! An order moves `Pending -> Approved | Rejected | Hold`; `Hold` re-enters
//! review, the other two are terminal. Approval emits the paired movement
//! rows (head-office outbound, store inbound) that the storage layer must
//! append atomically together with the status change.

pub mod order;
pub mod tax;
pub mod transfer;

pub use order::{
    Decision, DecisionContext, DecisionOutcome, DecisionRequest, LineEdit, NewOrderLine, Order,
    OrderLine, OrderStatus,
};
pub use tax::TaxRate;
pub use transfer::{force_push_movements, group_by_destination, ForceTransfer, TransferLine};
