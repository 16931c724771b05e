//! Snapshot store port
//!
//! Port/adapter split for backend flexibility:
//! - Development / CLI: SQLite (zero-config, single file)
//! - Production: PostgreSQL (scale + concurrency)
//! - Testing: in-memory
//!
//! All operations are idempotent, return deterministic errors, and never
//! panic. The same semantic contract holds across every adapter.

use async_trait::async_trait;

use crate::domain::{Chunk, ChunkId, Dependency, FileMetadata, Repository, Snapshot};
use crate::error::Result;

/// Primary storage interface implemented by every backend
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    // Repository management

    /// Save or update a repository (UPSERT)
    async fn save_repository(&self, repo: &Repository) -> Result<()>;

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>>;

    // Snapshot management

    /// Save or update a snapshot (UPSERT)
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Option<Snapshot>>;

    // Chunk CRUD

    /// UPSERT a single chunk.
    ///
    /// On conflict with an existing `chunk_id`: content is overwritten,
    /// `is_deleted` is cleared, `version` is bumped, `updated_at` refreshed.
    async fn save_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// UPSERT a batch of chunks inside one transaction
    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    async fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>>;

    /// All live chunks for (repo, snapshot); soft-deleted rows excluded
    async fn get_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<Vec<Chunk>>;

    /// Live chunks for one file
    async fn get_chunks_by_file(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Vec<Chunk>>;

    /// Mark every chunk of a file deleted (used before re-analysis)
    async fn soft_delete_file_chunks(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<usize>;

    // Dependency graph

    /// Save dependencies; duplicates on (from, to, relationship) are ignored
    async fn save_dependencies(&self, deps: &[Dependency]) -> Result<()>;

    async fn get_dependencies_from(&self, chunk_id: &str) -> Result<Vec<Dependency>>;

    async fn get_dependencies_to(&self, chunk_id: &str) -> Result<Vec<Dependency>>;

    /// BFS over the dependency table with a visited set, up to `max_depth`
    async fn get_transitive_dependencies(
        &self,
        chunk_id: &str,
        max_depth: usize,
    ) -> Result<Vec<ChunkId>>;

    // File metadata (early cutoff)

    /// Content hash recorded at the last index run, None if never indexed
    async fn get_file_hash(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Option<String>>;

    async fn get_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Option<FileMetadata>>;

    /// Record (hash, txn) for a file after indexing
    async fn update_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
        content_hash: &str,
        txn_id: i64,
    ) -> Result<()>;

    // Search

    /// Backend-native full-text over live chunk content
    async fn search_content(&self, query: &str, limit: usize) -> Result<Vec<Chunk>>;

    // Statistics

    async fn count_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<usize>;

    async fn get_stats(&self) -> Result<StorageStats>;
}

/// Aggregate store statistics
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    pub total_repos: usize,
    pub total_snapshots: usize,
    /// Live chunks only
    pub total_chunks: usize,
    pub total_dependencies: usize,
}
