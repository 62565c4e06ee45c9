//! PostgreSQL store implementations.

mod entry_repository;
mod order_repository;

pub use entry_repository::PostgresEntryRepository;
pub use order_repository::PostgresOrderRepository;
