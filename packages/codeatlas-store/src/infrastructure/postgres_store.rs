//! PostgreSQL snapshot store
//!
//! Server adapter for production deployments. Connects via `DATABASE_URL`.
//! Carries the full index set: span lookup `(repo_id, file_path, start_line,
//! end_line)` for line→chunk mapping, GIN full-text over content, FQN lookup,
//! and both dependency directions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::{Chunk, ChunkId, Dependency, FileMetadata, Repository, Snapshot};
use crate::error::{Result, StorageError};
use crate::ports::{SnapshotStore, StorageStats};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    repo_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    remote_url  TEXT,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id TEXT PRIMARY KEY,
    repo_id     TEXT NOT NULL REFERENCES repositories(repo_id),
    commit_hash TEXT,
    branch      TEXT,
    created_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    chunk_id            TEXT PRIMARY KEY,
    repo_id             TEXT NOT NULL REFERENCES repositories(repo_id),
    snapshot_id         TEXT NOT NULL REFERENCES snapshots(snapshot_id),
    kind                TEXT NOT NULL,
    fqn                 TEXT NOT NULL,
    file_path           TEXT NOT NULL,
    parent_id           TEXT,
    start_line          BIGINT NOT NULL,
    end_line            BIGINT NOT NULL,
    original_start_line BIGINT,
    language            TEXT,
    visibility          TEXT,
    content             TEXT NOT NULL,
    content_hash        TEXT NOT NULL,
    summary             TEXT,
    importance          REAL NOT NULL DEFAULT 0.0,
    version             INTEGER NOT NULL DEFAULT 1,
    is_deleted          BOOLEAN NOT NULL DEFAULT FALSE,
    attrs               JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at          TIMESTAMPTZ NOT NULL,
    updated_at          TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_repo_snapshot
    ON chunks(repo_id, snapshot_id, is_deleted);
CREATE INDEX IF NOT EXISTS idx_chunks_repo_snapshot_file
    ON chunks(repo_id, snapshot_id, file_path);
CREATE INDEX IF NOT EXISTS idx_chunks_span
    ON chunks(repo_id, file_path, start_line, end_line);
CREATE INDEX IF NOT EXISTS idx_chunks_fqn
    ON chunks(repo_id, fqn);
CREATE INDEX IF NOT EXISTS idx_chunks_kind
    ON chunks(repo_id, snapshot_id, kind);
CREATE INDEX IF NOT EXISTS idx_chunks_content_fts
    ON chunks USING GIN (to_tsvector('simple', content));
CREATE INDEX IF NOT EXISTS idx_chunks_parent
    ON chunks(parent_id);

CREATE TABLE IF NOT EXISTS dependencies (
    from_chunk_id TEXT NOT NULL,
    to_chunk_id   TEXT NOT NULL,
    relationship  TEXT NOT NULL,
    attrs         JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at    TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (from_chunk_id, to_chunk_id, relationship)
);

CREATE INDEX IF NOT EXISTS idx_deps_from ON dependencies(from_chunk_id);
CREATE INDEX IF NOT EXISTS idx_deps_to ON dependencies(to_chunk_id);

CREATE TABLE IF NOT EXISTS file_metadata (
    repo_id          TEXT NOT NULL,
    snapshot_id      TEXT NOT NULL,
    file_path        TEXT NOT NULL,
    content_hash     TEXT NOT NULL,
    last_indexed_txn BIGINT NOT NULL,
    updated_at       TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (repo_id, snapshot_id, file_path)
);
CREATE INDEX IF NOT EXISTS idx_file_metadata_lookup
    ON file_metadata(repo_id, snapshot_id, file_path);
"#;

pub struct PostgresSnapshotStore {
    pool: PgPool,
}

impl PostgresSnapshotStore {
    /// Connect using a `DATABASE_URL`-style connection string and apply schema
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_chunk(row: &PgRow) -> Result<Chunk> {
        let kind_text: String = row.try_get("kind")?;
        let kind = kind_text
            .parse()
            .map_err(StorageError::InvalidInput)?;
        let attrs_json: serde_json::Value = row.try_get("attrs")?;
        let attrs: HashMap<String, String> = serde_json::from_value(attrs_json)?;
        Ok(Chunk {
            chunk_id: row.try_get("chunk_id")?,
            repo_id: row.try_get("repo_id")?,
            snapshot_id: row.try_get("snapshot_id")?,
            kind,
            fqn: row.try_get("fqn")?,
            file_path: row.try_get("file_path")?,
            parent_id: row.try_get("parent_id")?,
            start_line: row.try_get::<i64, _>("start_line")? as u32,
            end_line: row.try_get::<i64, _>("end_line")? as u32,
            original_start_line: row
                .try_get::<Option<i64>, _>("original_start_line")?
                .map(|v| v as u32),
            language: row.try_get("language")?,
            visibility: row.try_get("visibility")?,
            content: row.try_get("content")?,
            content_hash: row.try_get("content_hash")?,
            summary: row.try_get("summary")?,
            importance: row.try_get("importance")?,
            version: row.try_get("version")?,
            is_deleted: row.try_get("is_deleted")?,
            attrs,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn upsert_chunk<'e, E>(executor: E, chunk: &Chunk) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let attrs = serde_json::to_value(&chunk.attrs)?;
        sqlx::query(
            "INSERT INTO chunks (
                chunk_id, repo_id, snapshot_id, kind, fqn, file_path, parent_id,
                start_line, end_line, original_start_line, language, visibility,
                content, content_hash, summary, importance, version, is_deleted,
                attrs, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                      $14, $15, $16, 1, FALSE, $17, $18, $19)
            ON CONFLICT (chunk_id) DO UPDATE SET
                kind = EXCLUDED.kind,
                fqn = EXCLUDED.fqn,
                file_path = EXCLUDED.file_path,
                parent_id = EXCLUDED.parent_id,
                start_line = EXCLUDED.start_line,
                end_line = EXCLUDED.end_line,
                original_start_line =
                    COALESCE(chunks.original_start_line, EXCLUDED.original_start_line),
                language = EXCLUDED.language,
                visibility = EXCLUDED.visibility,
                content = EXCLUDED.content,
                content_hash = EXCLUDED.content_hash,
                summary = EXCLUDED.summary,
                importance = EXCLUDED.importance,
                version = chunks.version + 1,
                is_deleted = FALSE,
                attrs = EXCLUDED.attrs,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(&chunk.chunk_id)
        .bind(&chunk.repo_id)
        .bind(&chunk.snapshot_id)
        .bind(chunk.kind.as_str())
        .bind(&chunk.fqn)
        .bind(&chunk.file_path)
        .bind(&chunk.parent_id)
        .bind(chunk.start_line as i64)
        .bind(chunk.end_line as i64)
        .bind(chunk.original_start_line.map(|v| v as i64))
        .bind(&chunk.language)
        .bind(&chunk.visibility)
        .bind(&chunk.content)
        .bind(&chunk.content_hash)
        .bind(&chunk.summary)
        .bind(chunk.importance)
        .bind(attrs)
        .bind(chunk.created_at)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(())
    }

    async fn fetch_chunks(
        &self,
        sql: &str,
        binds: &[&str],
        limit: Option<i64>,
    ) -> Result<Vec<Chunk>> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        if let Some(limit) = limit {
            query = query.bind(limit);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_chunk).collect()
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn save_repository(&self, repo: &Repository) -> Result<()> {
        sqlx::query(
            "INSERT INTO repositories (repo_id, name, remote_url, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (repo_id) DO UPDATE SET
                name = EXCLUDED.name,
                remote_url = EXCLUDED.remote_url,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(&repo.repo_id)
        .bind(&repo.name)
        .bind(&repo.remote_url)
        .bind(repo.created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_repository(&self, repo_id: &str) -> Result<Option<Repository>> {
        let row = sqlx::query(
            "SELECT repo_id, name, remote_url, created_at, updated_at
             FROM repositories WHERE repo_id = $1",
        )
        .bind(repo_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| {
            Ok(Repository {
                repo_id: r.try_get(0)?,
                name: r.try_get(1)?,
                remote_url: r.try_get(2)?,
                created_at: r.try_get(3)?,
                updated_at: r.try_get(4)?,
            })
        })
        .transpose()
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO snapshots (snapshot_id, repo_id, commit_hash, branch, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (snapshot_id) DO UPDATE SET
                commit_hash = EXCLUDED.commit_hash,
                branch = EXCLUDED.branch",
        )
        .bind(&snapshot.snapshot_id)
        .bind(&snapshot.repo_id)
        .bind(&snapshot.commit_hash)
        .bind(&snapshot.branch)
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Option<Snapshot>> {
        let row = sqlx::query(
            "SELECT snapshot_id, repo_id, commit_hash, branch, created_at
             FROM snapshots WHERE snapshot_id = $1",
        )
        .bind(snapshot_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| {
            Ok(Snapshot {
                snapshot_id: r.try_get(0)?,
                repo_id: r.try_get(1)?,
                commit_hash: r.try_get(2)?,
                branch: r.try_get(3)?,
                created_at: r.try_get(4)?,
            })
        })
        .transpose()
    }

    async fn save_chunk(&self, chunk: &Chunk) -> Result<()> {
        Self::upsert_chunk(&self.pool, chunk).await
    }

    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for chunk in chunks {
            Self::upsert_chunk(&mut *tx, chunk).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>> {
        let mut found = self
            .fetch_chunks("SELECT * FROM chunks WHERE chunk_id = $1", &[chunk_id], None)
            .await?;
        Ok(found.pop())
    }

    async fn get_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<Vec<Chunk>> {
        self.fetch_chunks(
            "SELECT * FROM chunks
             WHERE repo_id = $1 AND snapshot_id = $2 AND is_deleted = FALSE
             ORDER BY chunk_id",
            &[repo_id, snapshot_id],
            None,
        )
        .await
    }

    async fn get_chunks_by_file(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Vec<Chunk>> {
        self.fetch_chunks(
            "SELECT * FROM chunks
             WHERE repo_id = $1 AND snapshot_id = $2 AND file_path = $3 AND is_deleted = FALSE
             ORDER BY start_line",
            &[repo_id, snapshot_id, file_path],
            None,
        )
        .await
    }

    async fn soft_delete_file_chunks(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<usize> {
        let result = sqlx::query(
            "UPDATE chunks SET is_deleted = TRUE, updated_at = $4
             WHERE repo_id = $1 AND snapshot_id = $2 AND file_path = $3 AND is_deleted = FALSE",
        )
        .bind(repo_id)
        .bind(snapshot_id)
        .bind(file_path)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn save_dependencies(&self, deps: &[Dependency]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for dep in deps {
            let attrs = serde_json::to_value(&dep.attrs)?;
            sqlx::query(
                "INSERT INTO dependencies
                    (from_chunk_id, to_chunk_id, relationship, attrs, created_at)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (from_chunk_id, to_chunk_id, relationship) DO NOTHING",
            )
            .bind(&dep.from_chunk_id)
            .bind(&dep.to_chunk_id)
            .bind(&dep.relationship)
            .bind(attrs)
            .bind(dep.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_dependencies_from(&self, chunk_id: &str) -> Result<Vec<Dependency>> {
        self.query_deps(
            "SELECT from_chunk_id, to_chunk_id, relationship, attrs, created_at
             FROM dependencies WHERE from_chunk_id = $1",
            chunk_id,
        )
        .await
    }

    async fn get_dependencies_to(&self, chunk_id: &str) -> Result<Vec<Dependency>> {
        self.query_deps(
            "SELECT from_chunk_id, to_chunk_id, relationship, attrs, created_at
             FROM dependencies WHERE to_chunk_id = $1",
            chunk_id,
        )
        .await
    }

    async fn get_transitive_dependencies(
        &self,
        chunk_id: &str,
        max_depth: usize,
    ) -> Result<Vec<ChunkId>> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut out = Vec::new();
        visited.insert(chunk_id.to_string());
        queue.push_back((chunk_id.to_string(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let rows = sqlx::query(
                "SELECT to_chunk_id FROM dependencies WHERE from_chunk_id = $1",
            )
            .bind(&current)
            .fetch_all(&self.pool)
            .await?;
            for row in rows {
                let target: String = row.try_get(0)?;
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
        let row = sqlx::query(
            "SELECT content_hash FROM file_metadata
             WHERE repo_id = $1 AND snapshot_id = $2 AND file_path = $3",
        )
        .bind(repo_id)
        .bind(snapshot_id)
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Ok(r.try_get(0)?)).transpose()
    }

    async fn get_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
    ) -> Result<Option<FileMetadata>> {
        let row = sqlx::query(
            "SELECT repo_id, snapshot_id, file_path, content_hash, last_indexed_txn, updated_at
             FROM file_metadata
             WHERE repo_id = $1 AND snapshot_id = $2 AND file_path = $3",
        )
        .bind(repo_id)
        .bind(snapshot_id)
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| {
            Ok(FileMetadata {
                repo_id: r.try_get(0)?,
                snapshot_id: r.try_get(1)?,
                file_path: r.try_get(2)?,
                content_hash: r.try_get(3)?,
                last_indexed_txn: r.try_get(4)?,
                updated_at: r.try_get::<DateTime<Utc>, _>(5)?,
            })
        })
        .transpose()
    }

    async fn update_file_metadata(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        file_path: &str,
        content_hash: &str,
        txn_id: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO file_metadata
                (repo_id, snapshot_id, file_path, content_hash, last_indexed_txn, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (repo_id, snapshot_id, file_path) DO UPDATE SET
                content_hash = EXCLUDED.content_hash,
                last_indexed_txn = EXCLUDED.last_indexed_txn,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(repo_id)
        .bind(snapshot_id)
        .bind(file_path)
        .bind(content_hash)
        .bind(txn_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn search_content(&self, query: &str, limit: usize) -> Result<Vec<Chunk>> {
        self.fetch_chunks(
            "SELECT * FROM chunks
             WHERE is_deleted = FALSE
               AND to_tsvector('simple', content) @@ plainto_tsquery('simple', $1)
             ORDER BY chunk_id LIMIT $2",
            &[query],
            Some(limit as i64),
        )
        .await
    }

    async fn count_chunks(&self, repo_id: &str, snapshot_id: &str) -> Result<usize> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM chunks
             WHERE repo_id = $1 AND snapshot_id = $2 AND is_deleted = FALSE",
        )
        .bind(repo_id)
        .bind(snapshot_id)
        .fetch_one(&self.pool)
        .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as usize)
    }

    async fn get_stats(&self) -> Result<StorageStats> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM repositories),
                (SELECT COUNT(*) FROM snapshots),
                (SELECT COUNT(*) FROM chunks WHERE is_deleted = FALSE),
                (SELECT COUNT(*) FROM dependencies)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(StorageStats {
            total_repos: row.try_get::<i64, _>(0)? as usize,
            total_snapshots: row.try_get::<i64, _>(1)? as usize,
            total_chunks: row.try_get::<i64, _>(2)? as usize,
            total_dependencies: row.try_get::<i64, _>(3)? as usize,
        })
    }
}

impl PostgresSnapshotStore {
    async fn query_deps(&self, sql: &str, chunk_id: &str) -> Result<Vec<Dependency>> {
        let rows = sqlx::query(sql).bind(chunk_id).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| {
                let attrs_json: serde_json::Value = r.try_get(3)?;
                let attrs: HashMap<String, String> = serde_json::from_value(attrs_json)?;
                Ok(Dependency {
                    from_chunk_id: r.try_get(0)?,
                    to_chunk_id: r.try_get(1)?,
                    relationship: r.try_get(2)?,
                    attrs,
                    created_at: r.try_get::<DateTime<Utc>, _>(4)?,
                })
            })
            .collect()
    }
}
