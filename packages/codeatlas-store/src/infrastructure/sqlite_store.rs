//! SQLite snapshot store
//!
//! Embedded single-file adapter for CLI and development. Zero configuration:
//! `SqliteSnapshotStore::in_memory()` needs no environment at all.
//!
//! Full-text search is `LIKE` over the content column; the server adapter
//! provides real FTS.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{Chunk, ChunkId, Dependency, FileMetadata, Repository, Snapshot};
use crate::error::{Result, StorageError};
use crate::ports::{SnapshotStore, StorageStats};

#[derive(Clone)]
pub struct SqliteSnapshotStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotStore {
    /// Open (or create) a store at the given path
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests and env-free mode
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Backend(format!("connection lock poisoned: {e}")))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS repositories (
                repo_id     TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                remote_url  TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshots (
                snapshot_id TEXT PRIMARY KEY,
                repo_id     TEXT NOT NULL REFERENCES repositories(repo_id),
                commit_hash TEXT,
                branch      TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                chunk_id            TEXT PRIMARY KEY,
                repo_id             TEXT NOT NULL REFERENCES repositories(repo_id),
                snapshot_id         TEXT NOT NULL REFERENCES snapshots(snapshot_id),
                kind                TEXT NOT NULL,
                fqn                 TEXT NOT NULL,
                file_path           TEXT NOT NULL,
                parent_id           TEXT,
                start_line          INTEGER NOT NULL,
                end_line            INTEGER NOT NULL,
                original_start_line INTEGER,
                language            TEXT,
                visibility          TEXT,
                content             TEXT NOT NULL,
                content_hash        TEXT NOT NULL,
                summary             TEXT,
                importance          REAL NOT NULL DEFAULT 0.0,
                version             INTEGER NOT NULL DEFAULT 1,
                is_deleted          INTEGER NOT NULL DEFAULT 0,
                attrs               TEXT NOT NULL DEFAULT '{}',
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_repo_snapshot
                ON chunks(repo_id, snapshot_id, is_deleted);
            CREATE INDEX IF NOT EXISTS idx_chunks_file
                ON chunks(repo_id, snapshot_id, file_path);
            CREATE INDEX IF NOT EXISTS idx_chunks_span
                ON chunks(repo_id, file_path, start_line, end_line);
            CREATE INDEX IF NOT EXISTS idx_chunks_fqn
                ON chunks(repo_id, fqn);

            CREATE TABLE IF NOT EXISTS dependencies (
                from_chunk_id TEXT NOT NULL,
                to_chunk_id   TEXT NOT NULL,
                relationship  TEXT NOT NULL,
                attrs         TEXT NOT NULL DEFAULT '{}',
                created_at    TEXT NOT NULL,
                PRIMARY KEY (from_chunk_id, to_chunk_id, relationship)
            );

            CREATE INDEX IF NOT EXISTS idx_deps_from ON dependencies(from_chunk_id);
            CREATE INDEX IF NOT EXISTS idx_deps_to ON dependencies(to_chunk_id);

            CREATE TABLE IF NOT EXISTS file_metadata (
                repo_id          TEXT NOT NULL,
                snapshot_id      TEXT NOT NULL,
                file_path        TEXT NOT NULL,
                content_hash     TEXT NOT NULL,
                last_indexed_txn INTEGER NOT NULL,
                updated_at       TEXT NOT NULL,
                PRIMARY KEY (repo_id, snapshot_id, file_path)
            );",
        )?;
        Ok(())
    }

    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<Chunk> {
        let kind_text: String = row.get("kind")?;
        let kind = kind_text.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
        })?;
        let attrs_text: String = row.get("attrs")?;
        let attrs: HashMap<String, String> =
            serde_json::from_str(&attrs_text).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
        Ok(Chunk {
            chunk_id: row.get("chunk_id")?,
            repo_id: row.get("repo_id")?,
            snapshot_id: row.get("snapshot_id")?,
            kind,
            fqn: row.get("fqn")?,
            file_path: row.get("file_path")?,
            parent_id: row.get("parent_id")?,
            start_line: row.get("start_line")?,
            end_line: row.get("end_line")?,
            original_start_line: row.get("original_start_line")?,
            language: row.get("language")?,
            visibility: row.get("visibility")?,
            content: row.get("content")?,
            content_hash: row.get("content_hash")?,
            summary: row.get("summary")?,
            importance: row.get("importance")?,
            version: row.get("version")?,
            is_deleted: row.get("is_deleted")?,
            attrs,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn insert_chunk(conn: &Connection, chunk: &Chunk) -> Result<()> {
        let attrs = serde_json::to_string(&chunk.attrs)?;
        conn.execute(
            "INSERT INTO chunks (
                chunk_id, repo_id, snapshot_id, kind, fqn, file_path, parent_id,
                start_line, end_line, original_start_line, language, visibility,
                content, content_hash, summary, importance, version, is_deleted,
                attrs, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, 1, 0, ?17, ?18, ?19)
            ON CONFLICT(chunk_id) DO UPDATE SET
                kind = excluded.kind,
                fqn = excluded.fqn,
                file_path = excluded.file_path,
                parent_id = excluded.parent_id,
                start_line = excluded.start_line,
                end_line = excluded.end_line,
                original_start_line =
                    COALESCE(chunks.original_start_line, excluded.original_start_line),
                language = excluded.language,
                visibility = excluded.visibility,
                content = excluded.content,
                content_hash = excluded.content_hash,
                summary = excluded.summary,
                importance = excluded.importance,
                version = chunks.version + 1,
                is_deleted = 0,
                attrs = excluded.attrs,
                updated_at = excluded.updated_at",
            params![
                chunk.chunk_id,
                chunk.repo_id,
                chunk.snapshot_id,
                chunk.kind.as_str(),
                chunk.fqn,
                chunk.file_path,
                chunk.parent_id,
                chunk.start_line,
                chunk.end_line,
                chunk.original_start_line,
                chunk.language,
                chunk.visibility,
                chunk.content,
                chunk.content_hash,
                chunk.summary,
                chunk.importance,
                attrs,
                chunk.created_at,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    fn query_chunks(
        conn: &Connection,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Chunk>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, Self::row_to_chunk)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn save_repository(&self, repo: &Repository) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO repositories (repo_id, name, remote_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(repo_id) DO UPDATE SET
                name = excluded.name,
                remote_url = excluded.remote_url,
                updated_at = excluded.updated_at",
            params![
                repo.repo_id,
                repo.name,
                repo.remote_url,
                repo.created_at,
                Utc::now()
            ],
        )?;
        Ok(())
    }

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>> {
        let conn = self.lock()?;
        let repo = conn
            .query_row(
                "SELECT repo_id, name, remote_url, created_at, updated_at
                 FROM repositories WHERE repo_id = ?1",
                params![repo_id],
                |row| {
                    Ok(Repository {
                        repo_id: row.get(0)?,
                        name: row.get(1)?,
                        remote_url: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(repo)
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO snapshots (snapshot_id, repo_id, commit_hash, branch, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(snapshot_id) DO UPDATE SET
                commit_hash = excluded.commit_hash,
                branch = excluded.branch",
            params![
                snapshot.snapshot_id,
                snapshot.repo_id,
                snapshot.commit_hash,
                snapshot.branch,
                snapshot.created_at,
            ],
        )?;
        Ok(())
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Option<Snapshot>> {
        let conn = self.lock()?;
        let snap = conn
            .query_row(
                "SELECT snapshot_id, repo_id, commit_hash, branch, created_at
                 FROM snapshots WHERE snapshot_id = ?1",
                params![snapshot_id],
                |row| {
                    Ok(Snapshot {
                        snapshot_id: row.get(0)?,
                        repo_id: row.get(1)?,
                        commit_hash: row.get(2)?,
                        branch: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(snap)
    }

    async fn save_chunk(&self, chunk: &Chunk) -> Result<()> {
        let conn = self.lock()?;
        Self::insert_chunk(&conn, chunk)
    }

    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for chunk in chunks {
            Self::insert_chunk(&tx, chunk)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>> {
        let conn = self.lock()?;
        let mut found =
            Self::query_chunks(&conn, "SELECT * FROM chunks WHERE chunk_id = ?1", &[&chunk_id])?;
        Ok(found.pop())
    }

    async fn get_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<Vec<Chunk>> {
        let conn = self.lock()?;
        Self::query_chunks(
            &conn,
            "SELECT * FROM chunks
             WHERE repo_id = ?1 AND snapshot_id = ?2 AND is_deleted = 0
             ORDER BY chunk_id",
            &[&repo_id, &snapshot_id],
        )
    }

    async fn get_chunks_by_file(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Vec<Chunk>> {
        let conn = self.lock()?;
        Self::query_chunks(
            &conn,
            "SELECT * FROM chunks
             WHERE repo_id = ?1 AND snapshot_id = ?2 AND file_path = ?3 AND is_deleted = 0
             ORDER BY start_line",
            &[&repo_id, &snapshot_id, &file_path],
        )
    }

    async fn soft_delete_file_chunks(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<usize> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE chunks SET is_deleted = 1, updated_at = ?4
             WHERE repo_id = ?1 AND snapshot_id = ?2 AND file_path = ?3 AND is_deleted = 0",
            params![repo_id, snapshot_id, file_path, Utc::now()],
        )?;
        Ok(affected)
    }

    async fn save_dependencies(&self, deps: &[Dependency]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for dep in deps {
            let attrs = serde_json::to_string(&dep.attrs)?;
            tx.execute(
                "INSERT OR IGNORE INTO dependencies
                    (from_chunk_id, to_chunk_id, relationship, attrs, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    dep.from_chunk_id,
                    dep.to_chunk_id,
                    dep.relationship,
                    attrs,
                    dep.created_at
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn get_dependencies_from(&self, chunk_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.lock()?;
        query_dependencies(
            &conn,
            "SELECT from_chunk_id, to_chunk_id, relationship, attrs, created_at
             FROM dependencies WHERE from_chunk_id = ?1",
            chunk_id,
        )
    }

    async fn get_dependencies_to(&self, chunk_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.lock()?;
        query_dependencies(
            &conn,
            "SELECT from_chunk_id, to_chunk_id, relationship, attrs, created_at
             FROM dependencies WHERE to_chunk_id = ?1",
            chunk_id,
        )
    }

    async fn get_transitive_dependencies(
        &self,
        chunk_id: &str,
        max_depth: usize,
    ) -> Result<Vec<ChunkId>> {
        let conn = self.lock()?;
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut out = Vec::new();
        visited.insert(chunk_id.to_string());
        queue.push_back((chunk_id.to_string(), 0));

        let mut stmt =
            conn.prepare("SELECT to_chunk_id FROM dependencies WHERE from_chunk_id = ?1")?;
        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let targets = stmt
                .query_map(params![current], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for target in targets {
                if visited.insert(target.clone()) {
                    out.push(target.clone());
                    queue.push_back((target, depth + 1));
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
        let conn = self.lock()?;
        let hash = conn
            .query_row(
                "SELECT content_hash FROM file_metadata
                 WHERE repo_id = ?1 AND snapshot_id = ?2 AND file_path = ?3",
                params![repo_id, snapshot_id, file_path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    async fn get_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Option<FileMetadata>> {
        let conn = self.lock()?;
        let meta = conn
            .query_row(
                "SELECT repo_id, snapshot_id, file_path, content_hash, last_indexed_txn, updated_at
                 FROM file_metadata
                 WHERE repo_id = ?1 AND snapshot_id = ?2 AND file_path = ?3",
                params![repo_id, snapshot_id, file_path],
                |row| {
                    Ok(FileMetadata {
                        repo_id: row.get(0)?,
                        snapshot_id: row.get(1)?,
                        file_path: row.get(2)?,
                        content_hash: row.get(3)?,
                        last_indexed_txn: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(meta)
    }

    async fn update_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
        content_hash: &str,
        txn_id: i64,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO file_metadata
                (repo_id, snapshot_id, file_path, content_hash, last_indexed_txn, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(repo_id, snapshot_id, file_path) DO UPDATE SET
                content_hash = excluded.content_hash,
                last_indexed_txn = excluded.last_indexed_txn,
                updated_at = excluded.updated_at",
            params![repo_id, snapshot_id, file_path, content_hash, txn_id, Utc::now()],
        )?;
        Ok(())
    }

    async fn search_content(&self, query: &str, limit: usize) -> Result<Vec<Chunk>> {
        let conn = self.lock()?;
        Self::query_chunks(
            &conn,
            "SELECT * FROM chunks
             WHERE is_deleted = 0 AND content LIKE '%' || ?1 || '%'
             ORDER BY chunk_id LIMIT ?2",
            &[&query, &(limit as i64)],
        )
    }

    async fn count_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks
             WHERE repo_id = ?1 AND snapshot_id = ?2 AND is_deleted = 0",
            params![repo_id, snapshot_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn get_stats(&self) -> Result<StorageStats> {
        let conn = self.lock()?;
        let total_repos: i64 =
            conn.query_row("SELECT COUNT(*) FROM repositories", [], |r| r.get(0))?;
        let total_snapshots: i64 =
            conn.query_row("SELECT COUNT(*) FROM snapshots", [], |r| r.get(0))?;
        let total_chunks: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE is_deleted = 0",
            [],
            |r| r.get(0),
        )?;
        let total_dependencies: i64 =
            conn.query_row("SELECT COUNT(*) FROM dependencies", [], |r| r.get(0))?;
        Ok(StorageStats {
            total_repos: total_repos as usize,
            total_snapshots: total_snapshots as usize,
            total_chunks: total_chunks as usize,
            total_dependencies: total_dependencies as usize,
        })
    }
}

fn query_dependencies(conn: &Connection, sql: &str, chunk_id: &str) -> Result<Vec<Dependency>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![chunk_id], |row| {
        let attrs_text: String = row.get(3)?;
        let attrs: HashMap<String, String> = serde_json::from_str(&attrs_text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Dependency {
            from_chunk_id: row.get(0)?,
            to_chunk_id: row.get(1)?,
            relationship: row.get(2)?,
            attrs,
            created_at: row.get::<_, DateTime<Utc>>(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChunkKind;

    fn chunk(id: &str, file: &str, content: &str) -> Chunk {
        Chunk::new(
            id,
            "r1",
            "r1:main",
            ChunkKind::Function,
            "m.f",
            file,
            0,
            3,
            content,
        )
    }

    async fn seeded() -> SqliteSnapshotStore {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        store
            .save_repository(&Repository::new("r1", "repo-one"))
            .await
            .unwrap();
        store.save_snapshot(&Snapshot::new("r1", "main")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn save_is_idempotent_and_upsert_bumps_version() {
        let store = seeded().await;
        let c = chunk("chunk:r1:function:m.f", "m.py", "x = 1");

        store.save_chunk(&c).await.unwrap();
        store.save_chunk(&c).await.unwrap();
        let live = store.get_chunks("r1", "r1:main").await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].version, 2);
    }

    #[tokio::test]
    async fn soft_delete_hides_then_upsert_revives() {
        let store = seeded().await;
        store
            .save_chunk(&chunk("chunk:r1:function:m.f", "m.py", "x = 1"))
            .await
            .unwrap();
        store
            .soft_delete_file_chunks("r1", "r1:main", "m.py")
            .await
            .unwrap();
        assert!(store.get_chunks("r1", "r1:main").await.unwrap().is_empty());

        store
            .save_chunk(&chunk("chunk:r1:function:m.f", "m.py", "x = 2"))
            .await
            .unwrap();
        let live = store.get_chunks("r1", "r1:main").await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].content, "x = 2");
        assert!(!live[0].is_deleted);
        assert_eq!(live[0].version, 2);
    }

    #[tokio::test]
    async fn chunk_round_trip_preserves_attrs_and_kind() {
        let store = seeded().await;
        let mut c = chunk("chunk:r1:function:m.f", "m.py", "x = 1");
        c.attrs.insert("decorator".into(), "cached".into());
        c.parent_id = Some("chunk:r1:file:m.py".into());
        store.save_chunk(&c).await.unwrap();

        let loaded = store.get_chunk("chunk:r1:function:m.f").await.unwrap().unwrap();
        assert_eq!(loaded.kind, ChunkKind::Function);
        assert_eq!(loaded.attrs.get("decorator").map(String::as_str), Some("cached"));
        assert_eq!(loaded.parent_id.as_deref(), Some("chunk:r1:file:m.py"));
    }

    #[tokio::test]
    async fn like_search_finds_live_chunks_only() {
        let store = seeded().await;
        store
            .save_chunk(&chunk("chunk:r1:function:m.f", "m.py", "def handle_login(): ..."))
            .await
            .unwrap();
        store
            .save_chunk(&chunk("chunk:r1:function:m.g", "n.py", "def unrelated(): ..."))
            .await
            .unwrap();
        store
            .soft_delete_file_chunks("r1", "r1:main", "n.py")
            .await
            .unwrap();

        let hits = store.search_content("login", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, "chunk:r1:function:m.f");
        assert!(store.search_content("unrelated", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dependency_triple_is_unique() {
        let store = seeded().await;
        let dep = Dependency::new("a", "b", "CALLS");
        store.save_dependencies(&[dep.clone(), dep.clone()]).await.unwrap();
        store.save_dependencies(&[dep]).await.unwrap();
        assert_eq!(store.get_dependencies_from("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transitive_bfs_depth_limited() {
        let store = seeded().await;
        store
            .save_dependencies(&[
                Dependency::new("a", "b", "CALLS"),
                Dependency::new("b", "c", "CALLS"),
                Dependency::new("c", "d", "CALLS"),
            ])
            .await
            .unwrap();
        let two = store.get_transitive_dependencies("a", 2).await.unwrap();
        assert_eq!(two, vec!["b".to_string(), "c".to_string()]);
    }
}
