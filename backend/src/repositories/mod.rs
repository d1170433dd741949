pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::{MemoryStore, MemoryUnitOfWork};
pub use postgres::{PgStore, PgUnitOfWork};
pub use store::{RequestListFilters, RequestScope, Store, UnitOfWork};
