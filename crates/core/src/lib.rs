//! `stockbook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod code;
pub mod error;
pub mod id;

pub use code::{ItemCode, StoreCode};
pub use error::{Error, Result};
pub use id::{MovementId, OrderId, OwnerId, TaskId};
