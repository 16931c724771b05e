//! In-memory snapshot store
//!
//! HashMap-backed adapter for unit tests and env-free in-memory mode.
//! Implements the full `SnapshotStore` contract, including UPSERT/soft-delete
//! semantics, so contract tests can run against it and the SQL adapters
//! interchangeably.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{Chunk, ChunkId, Dependency, FileMetadata, Repository, Snapshot};
use crate::error::{Result, StorageError};
use crate::ports::{SnapshotStore, StorageStats};

#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    repos: Arc<RwLock<HashMap<String, Repository>>>,
    snapshots: Arc<RwLock<HashMap<String, Snapshot>>>,
    chunks: Arc<RwLock<HashMap<String, Chunk>>>,
    dependencies: Arc<RwLock<Vec<Dependency>>>,
    file_metadata: Arc<RwLock<HashMap<(String, String, String), FileMetadata>>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| StorageError::Backend(format!("lock poisoned: {e}")))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| StorageError::Backend(format!("lock poisoned: {e}")))
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert_chunk(existing: Option<&Chunk>, incoming: &Chunk) -> Chunk {
        match existing {
            Some(prev) => {
                let mut merged = incoming.clone();
                merged.version = prev.version + 1;
                merged.is_deleted = false;
                merged.created_at = prev.created_at;
                merged.original_start_line =
                    prev.original_start_line.or(incoming.original_start_line);
                merged.updated_at = Utc::now();
                merged
            }
            None => incoming.clone(),
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save_repository(&self, repo: &Repository) -> Result<()> {
        write(&self.repos)?.insert(repo.repo_id.clone(), repo.clone());
        Ok(())
    }

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>> {
        Ok(read(&self.repos)?.get(repo_id).cloned())
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        if read(&self.repos)?.get(&snapshot.repo_id).is_none() {
            return Err(StorageError::ConstraintViolation(format!(
                "snapshot references unknown repo {}",
                snapshot.repo_id
            )));
        }
        write(&self.snapshots)?.insert(snapshot.snapshot_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Option<Snapshot>> {
        Ok(read(&self.snapshots)?.get(snapshot_id).cloned())
    }

    async fn save_chunk(&self, chunk: &Chunk) -> Result<()> {
        let mut chunks = write(&self.chunks)?;
        let merged = Self::upsert_chunk(chunks.get(&chunk.chunk_id), chunk);
        chunks.insert(chunk.chunk_id.clone(), merged);
        Ok(())
    }

    async fn save_chunks(&self, batch: &[Chunk]) -> Result<()> {
        let mut chunks = write(&self.chunks)?;
        for chunk in batch {
            let merged = Self::upsert_chunk(chunks.get(&chunk.chunk_id), chunk);
            chunks.insert(chunk.chunk_id.clone(), merged);
        }
        Ok(())
    }

    async fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>> {
        Ok(read(&self.chunks)?.get(chunk_id).cloned())
    }

    async fn get_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<Vec<Chunk>> {
        let mut out: Vec<Chunk> = read(&self.chunks)?
            .values()
            .filter(|c| c.repo_id == repo_id && c.snapshot_id == snapshot_id && !c.is_deleted)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id));
        Ok(out)
    }

    async fn get_chunks_by_file(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Vec<Chunk>> {
        let mut out: Vec<Chunk> = read(&self.chunks)?
            .values()
            .filter(|c| {
                c.repo_id == repo_id
                    && c.snapshot_id == snapshot_id
                    && c.file_path == file_path
                    && !c.is_deleted
            })
            .cloned()
            .collect();
        out.sort_by_key(|c| c.start_line);
        Ok(out)
    }

    async fn soft_delete_file_chunks(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<usize> {
        let mut chunks = write(&self.chunks)?;
        let mut affected = 0;
        for chunk in chunks.values_mut() {
            if chunk.repo_id == repo_id
                && chunk.snapshot_id == snapshot_id
                && chunk.file_path == file_path
                && !chunk.is_deleted
            {
                chunk.is_deleted = true;
                chunk.updated_at = Utc::now();
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn save_dependencies(&self, deps: &[Dependency]) -> Result<()> {
        let mut stored = write(&self.dependencies)?;
        for dep in deps {
            let duplicate = stored.iter().any(|d| {
                d.from_chunk_id == dep.from_chunk_id
                    && d.to_chunk_id == dep.to_chunk_id
                    && d.relationship == dep.relationship
            });
            if !duplicate {
                stored.push(dep.clone());
            }
        }
        Ok(())
    }

    async fn get_dependencies_from(&self, chunk_id: &str) -> Result<Vec<Dependency>> {
        Ok(read(&self.dependencies)?
            .iter()
            .filter(|d| d.from_chunk_id == chunk_id)
            .cloned()
            .collect())
    }

    async fn get_dependencies_to(&self, chunk_id: &str) -> Result<Vec<Dependency>> {
        Ok(read(&self.dependencies)?
            .iter()
            .filter(|d| d.to_chunk_id == chunk_id)
            .cloned()
            .collect())
    }

    async fn get_transitive_dependencies(
        &self,
        chunk_id: &str,
        max_depth: usize,
    ) -> Result<Vec<ChunkId>> {
        let deps = read(&self.dependencies)?;
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for dep in deps.iter() {
            adjacency
                .entry(dep.from_chunk_id.as_str())
                .or_default()
                .push(dep.to_chunk_id.as_str());
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        let mut out = Vec::new();
        visited.insert(chunk_id);
        queue.push_back((chunk_id, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for &next in adjacency.get(current).into_iter().flatten() {
                if visited.insert(next) {
                    out.push(next.to_string());
                    queue.push_back((next, depth + 1));
                }
            }
        }
        Ok(out)
    }

    async fn get_file_hash(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .get_file_metadata(repo_id, snapshot_id, file_path)
            .await?
            .map(|m| m.content_hash))
    }

    async fn get_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Option<FileMetadata>> {
        let key = (
            repo_id.to_string(),
            snapshot_id.to_string(),
            file_path.to_string(),
        );
        Ok(read(&self.file_metadata)?.get(&key).cloned())
    }

    async fn update_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
        content_hash: &str,
        txn_id: i64,
    ) -> Result<()> {
        let key = (
            repo_id.to_string(),
            snapshot_id.to_string(),
            file_path.to_string(),
        );
        write(&self.file_metadata)?.insert(
            key,
            FileMetadata {
                repo_id: repo_id.to_string(),
                snapshot_id: snapshot_id.to_string(),
                file_path: file_path.to_string(),
                content_hash: content_hash.to_string(),
                last_indexed_txn: txn_id,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn search_content(&self, query: &str, limit: usize) -> Result<Vec<Chunk>> {
        let needle = query.to_lowercase();
        let mut out: Vec<Chunk> = read(&self.chunks)?
            .values()
            .filter(|c| !c.is_deleted && c.content.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id));
        out.truncate(limit);
        Ok(out)
    }

    async fn count_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<usize> {
        Ok(read(&self.chunks)?
            .values()
            .filter(|c| c.repo_id == repo_id && c.snapshot_id == snapshot_id && !c.is_deleted)
            .count())
    }

    async fn get_stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            total_repos: read(&self.repos)?.len(),
            total_snapshots: read(&self.snapshots)?.len(),
            total_chunks: read(&self.chunks)?.values().filter(|c| !c.is_deleted).count(),
            total_dependencies: read(&self.dependencies)?.len(),
        })
    }
}
