//! Storage domain: entities persisted by the snapshot store

mod chunk_kind;
mod models;

pub use chunk_kind::ChunkKind;
pub use models::{
    Chunk, ChunkId, Dependency, FileMetadata, RepoId, Repository, Snapshot, SnapshotId,
};
