//! Storage adapters

mod memory_store;
#[cfg(feature = "postgres")]
mod postgres_store;
#[cfg(feature = "sqlite")]
mod sqlite_store;

pub use memory_store::InMemorySnapshotStore;
#[cfg(feature = "postgres")]
pub use postgres_store::PostgresSnapshotStore;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteSnapshotStore;
