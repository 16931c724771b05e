//! codeatlas-store: snapshot-addressed persistence for the code-graph engine
//!
//! Owns the durable side of the system: repositories, immutable snapshots,
//! chunks (soft-delete + UPSERT semantics), the dependency table, and
//! per-file metadata that enables early cutoff during incremental indexing.
//!
//! Three adapters share one semantic contract:
//! - [`infrastructure::SqliteSnapshotStore`]: embedded single file (CLI/dev)
//! - `infrastructure::PostgresSnapshotStore`: server (behind `postgres`)
//! - [`infrastructure::InMemorySnapshotStore`]: tests and env-free mode

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use domain::{Chunk, ChunkId, ChunkKind, Dependency, FileMetadata, RepoId, Repository,
    Snapshot, SnapshotId};
pub use error::{Result, StorageError};
pub use ports::{SnapshotStore, StorageStats};
