pub mod in_memory;
pub mod postgres;
pub mod query;
#[allow(clippy::module_inception)]
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{MovementFilter, SortOrder};
pub use r#trait::{MovementStore, OrderStore, StoreError, TaskStore};
