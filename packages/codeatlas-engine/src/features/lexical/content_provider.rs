//! Content ports for the lexical plugin
//!
//! `ChunkSource` feeds the plugin the live chunks of a file or snapshot.
//! `FileContentProvider` supplies original file bytes during `rebuild`;
//! when it is absent the plugin reconstructs text from stored chunk content
//! and flags the rebuild as degraded.

use std::collections::HashMap;
use std::sync::RwLock;

use codeatlas_store::Chunk;

/// Synchronous chunk feed, callable from inside `apply_delta`
pub trait ChunkSource: Send + Sync {
    fn chunks_for_file(&self, repo_id: &str, snapshot_id: &str, file_path: &str) -> Vec<Chunk>;

    fn all_chunks(&self, repo_id: &str, snapshot_id: &str) -> Vec<Chunk>;
}

/// Original file bytes for rebuilds
pub trait FileContentProvider: Send + Sync {
    fn content(&self, file_path: &str) -> Option<String>;
}

/// Chunk source fed by the pipeline after every index run
#[derive(Default)]
pub struct InMemoryChunkSource {
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryChunkSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all chunks for a (repo, snapshot)
    pub fn replace(&self, repo_id: &str, snapshot_id: &str, incoming: Vec<Chunk>) {
        if let Ok(mut chunks) = self.chunks.write() {
            chunks.retain(|c| !(c.repo_id == repo_id && c.snapshot_id == snapshot_id));
            chunks.extend(incoming);
        }
    }

    pub fn upsert_file(&self, repo_id: &str, snapshot_id: &str, file_path: &str, incoming: Vec<Chunk>) {
        if let Ok(mut chunks) = self.chunks.write() {
            chunks.retain(|c| {
                !(c.repo_id == repo_id
                    && c.snapshot_id == snapshot_id
                    && c.file_path == file_path)
            });
            chunks.extend(incoming);
        }
    }

    pub fn remove_file(&self, repo_id: &str, snapshot_id: &str, file_path: &str) {
        if let Ok(mut chunks) = self.chunks.write() {
            chunks.retain(|c| {
                !(c.repo_id == repo_id
                    && c.snapshot_id == snapshot_id
                    && c.file_path == file_path)
            });
        }
    }
}

impl ChunkSource for InMemoryChunkSource {
    fn chunks_for_file(&self, repo_id: &str, snapshot_id: &str, file_path: &str) -> Vec<Chunk> {
        self.chunks
            .read()
            .map(|chunks| {
                chunks
                    .iter()
                    .filter(|c| {
                        c.repo_id == repo_id
                            && c.snapshot_id == snapshot_id
                            && c.file_path == file_path
                            && !c.is_deleted
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn all_chunks(&self, repo_id: &str, snapshot_id: &str) -> Vec<Chunk> {
        self.chunks
            .read()
            .map(|chunks| {
                chunks
                    .iter()
                    .filter(|c| {
                        c.repo_id == repo_id && c.snapshot_id == snapshot_id && !c.is_deleted
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Static provider for tests and CLI runs
#[derive(Default)]
pub struct StaticContentProvider {
    files: HashMap<String, String>,
}

impl StaticContentProvider {
    pub fn new(files: HashMap<String, String>) -> Self {
        Self { files }
    }
}

impl FileContentProvider for StaticContentProvider {
    fn content(&self, file_path: &str) -> Option<String> {
        self.files.get(file_path).cloned()
    }
}
