//! Storage domain models
//!
//! Content-addressed, multi-repository, multi-snapshot store entities with
//! soft delete for safe incremental updates. Chunks are never hard-deleted:
//! deletion flips `is_deleted`, and a later UPSERT of the same `chunk_id`
//! revives the row with a bumped `version`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::chunk_kind::ChunkKind;

/// Chunk ID format: `chunk:{repo_id}:{kind}:{fqn}` with an optional short
/// content-hash suffix on collision.
pub type ChunkId = String;

/// Repository ID (unique identifier)
pub type RepoId = String;

/// Snapshot ID format: `"{repo_id}:{ref}"` where ref is a branch or commit
pub type SnapshotId = String;

/// Repository entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub repo_id: RepoId,
    pub name: String,
    pub remote_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repository {
    pub fn new(repo_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            repo_id: repo_id.into(),
            name: name.into(),
            remote_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Snapshot entity: an immutable (repo, ref) view indexed atomically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format: `"{repo_id}:{ref}"`
    pub snapshot_id: SnapshotId,
    pub repo_id: RepoId,
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(repo_id: impl Into<String>, git_ref: &str) -> Self {
        let repo_id = repo_id.into();
        Self {
            snapshot_id: Self::generate_id(&repo_id, git_ref),
            repo_id,
            commit_hash: None,
            branch: None,
            created_at: Utc::now(),
        }
    }

    pub fn generate_id(repo_id: &str, git_ref: &str) -> SnapshotId {
        format!("{repo_id}:{git_ref}")
    }
}

/// Chunk entity: the persisted projection of one hierarchy node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub repo_id: RepoId,
    pub snapshot_id: SnapshotId,

    pub kind: ChunkKind,
    /// Fully qualified dotted name, unique per scope
    pub fqn: String,
    pub file_path: String,
    pub parent_id: Option<ChunkId>,

    pub start_line: u32,
    pub end_line: u32,
    /// Line where the chunk started when first indexed (span-drift tracking)
    pub original_start_line: Option<u32>,

    pub language: Option<String>,
    pub visibility: Option<String>,

    /// Source text covered by the chunk
    pub content: String,
    /// SHA-256 over normalized content
    pub content_hash: String,

    pub summary: Option<String>,
    /// Importance score written back by the repo-map stage (0.0-1.0)
    pub importance: f32,

    pub version: i32,
    pub is_deleted: bool,

    pub attrs: HashMap<String, String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chunk {
    /// SHA-256 hex digest of content, after newline normalization
    pub fn compute_content_hash(content: &str) -> String {
        use sha2::{Digest, Sha256};
        let normalized = content.replace("\r\n", "\n");
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn new(
        chunk_id: impl Into<String>,
        repo_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        kind: ChunkKind,
        fqn: impl Into<String>,
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let content_hash = Self::compute_content_hash(&content);
        let now = Utc::now();
        Self {
            chunk_id: chunk_id.into(),
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            kind,
            fqn: fqn.into(),
            file_path: file_path.into(),
            parent_id: None,
            start_line,
            end_line,
            original_start_line: Some(start_line),
            language: None,
            visibility: None,
            content,
            content_hash,
            summary: None,
            importance: 0.0,
            version: 1,
            is_deleted: false,
            attrs: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// True when `line` (0-based) falls inside the chunk span
    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    pub fn is_modified(&self, other_hash: &str) -> bool {
        self.content_hash != other_hash
    }
}

/// Cross-chunk relationship, unique on (from, to, relationship)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub from_chunk_id: ChunkId,
    pub to_chunk_id: ChunkId,
    pub relationship: String,
    pub attrs: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Dependency {
    pub fn new(
        from_chunk_id: impl Into<String>,
        to_chunk_id: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            from_chunk_id: from_chunk_id.into(),
            to_chunk_id: to_chunk_id.into(),
            relationship: relationship.into(),
            attrs: HashMap::new(),
            created_at: Utc::now(),
        }
    }
}

/// Per-file index bookkeeping, enables early cutoff on unchanged hashes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub repo_id: RepoId,
    pub snapshot_id: SnapshotId,
    pub file_path: String,
    pub content_hash: String,
    pub last_indexed_txn: i64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic_and_newline_normalized() {
        let a = Chunk::compute_content_hash("fn main() {}\n");
        let b = Chunk::compute_content_hash("fn main() {}\r\n");
        let c = Chunk::compute_content_hash("fn main() { changed }\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn snapshot_id_embeds_repo_and_ref() {
        let snap = Snapshot::new("backend", "main");
        assert_eq!(snap.snapshot_id, "backend:main");
        assert_eq!(snap.repo_id, "backend");
    }

    #[test]
    fn new_chunk_starts_live_at_version_one() {
        let chunk = Chunk::new(
            "chunk:r:function:pkg.foo",
            "r",
            "r:main",
            ChunkKind::Function,
            "pkg.foo",
            "pkg/foo.py",
            10,
            20,
            "def foo(): pass",
        );
        assert_eq!(chunk.version, 1);
        assert!(!chunk.is_deleted);
        assert_eq!(chunk.original_start_line, Some(10));
        assert_eq!(chunk.line_count(), 11);
        assert!(chunk.contains_line(10));
        assert!(chunk.contains_line(20));
        assert!(!chunk.contains_line(21));
    }
}
