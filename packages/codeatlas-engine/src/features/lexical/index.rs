//! Tantivy lexical index plugin
//!
//! Implements the `IndexPlugin` contract: incremental `apply_delta` deletes
//! affected files by term and re-indexes their live chunks, `rebuild`
//! regenerates the whole index from the chunk source (falling back to the
//! injected `FileContentProvider` and flagging the result degraded when
//! original bytes are unavailable). The watermark is an atomic with
//! release stores and acquire loads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tantivy::{
    collector::TopDocs,
    doc,
    query::QueryParser,
    schema::Value,
    Index, IndexWriter, Term,
};
use tracing::{debug, warn};

use super::content_provider::{ChunkSource, FileContentProvider};
use super::schema::{build_schema, SchemaFields};
use crate::features::multi_index::ports::{
    DeltaAnalysis, IndexPlugin, IndexSnapshot, TransactionDelta, TxnId,
};
use crate::shared::models::{EngineError, Result};
use codeatlas_store::{Chunk, ChunkKind};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// A ranked lexical hit before fusion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalHit {
    pub chunk_id: Option<String>,
    pub file_path: String,
    pub line: Option<u32>,
    /// BM25 relevance scaled by the chunk-mapping priority
    pub score: f32,
}

pub struct TantivyLexicalIndex {
    repo_id: String,
    snapshot_id: String,
    index: Index,
    writer: Mutex<IndexWriter>,
    fields: SchemaFields,
    chunk_source: Arc<dyn ChunkSource>,
    content_provider: Option<Arc<dyn FileContentProvider>>,
    applied_txn: AtomicU64,
    degraded: AtomicBool,
}

impl TantivyLexicalIndex {
    pub fn in_memory(
        repo_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        chunk_source: Arc<dyn ChunkSource>,
    ) -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| EngineError::index("lexical", e.to_string()))?;
        Ok(Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            index,
            writer: Mutex::new(writer),
            fields,
            chunk_source,
            content_provider: None,
            applied_txn: AtomicU64::new(0),
            degraded: AtomicBool::new(false),
        })
    }

    pub fn with_content_provider(mut self, provider: Arc<dyn FileContentProvider>) -> Self {
        self.content_provider = Some(provider);
        self
    }

    /// True when the last rebuild had to reconstruct text from chunks
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn add_chunk_documents(&self, writer: &IndexWriter, chunks: &[Chunk]) -> Result<usize> {
        let mut indexed = 0;
        for chunk in chunks {
            if chunk.is_deleted {
                continue;
            }
            writer
                .add_document(doc!(
                    self.fields.chunk_id => chunk.chunk_id.clone(),
                    self.fields.repo_id => chunk.repo_id.clone(),
                    self.fields.file_path => chunk.file_path.clone(),
                    self.fields.kind => chunk.kind.as_str(),
                    self.fields.fqn => chunk.fqn.clone(),
                    self.fields.start_line => chunk.start_line as u64,
                    self.fields.content => chunk.content.clone(),
                ))
                .map_err(|e| EngineError::index("lexical", e.to_string()))?;
            indexed += 1;
        }
        Ok(indexed)
    }

    /// Priority mapping from an indexed document back to a chunk score:
    /// exact function/method chunk 1.0, file fallback 0.8, synthetic
    /// virtual chunk 0.5 (logged).
    fn mapping_factor(&self, kind: &str, chunk_id: &Option<String>, file_path: &str) -> f32 {
        if chunk_id.is_some() {
            match kind.parse::<ChunkKind>() {
                Ok(kind) if kind.is_leaf() => 1.0,
                Ok(_) => 0.8,
                Err(_) => 0.8,
            }
        } else {
            warn!(file = %file_path, "lexical hit without chunk, emitting virtual chunk");
            0.5
        }
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<LexicalHit>> {
        let reader = self
            .index
            .reader()
            .map_err(|e| EngineError::index("lexical", e.to_string()))?;
        reader
            .reload()
            .map_err(|e| EngineError::index("lexical", e.to_string()))?;
        let searcher = reader.searcher();
        let parser =
            QueryParser::for_index(&self.index, vec![self.fields.content, self.fields.fqn]);
        let parsed = parser
            .parse_query(query)
            .map_err(|e| EngineError::index("lexical", format!("bad query: {e}")))?;
        let top = searcher
            .search(&parsed, &TopDocs::with_limit(limit.max(1)))
            .map_err(|e| EngineError::index("lexical", e.to_string()))?;

        let mut hits = Vec::new();
        for (score, address) in top {
            let document: tantivy::TantivyDocument = searcher
                .doc(address)
                .map_err(|e| EngineError::index("lexical", e.to_string()))?;
            let file_path = document
                .get_first(self.fields.file_path)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let chunk_id = document
                .get_first(self.fields.chunk_id)
                .and_then(|v| v.as_str())
                .map(String::from)
                .filter(|id| !id.is_empty());
            let kind = document
                .get_first(self.fields.kind)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let line = document
                .get_first(self.fields.start_line)
                .and_then(|v| v.as_u64())
                .map(|l| l as u32);

            let factor = self.mapping_factor(&kind, &chunk_id, &file_path);
            let chunk_id = chunk_id.or_else(|| {
                Some(format!(
                    "virtual:{}:{}:{}",
                    self.repo_id,
                    file_path,
                    line.unwrap_or(0)
                ))
            });
            hits.push(LexicalHit {
                chunk_id,
                file_path,
                line,
                score: score * factor,
            });
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }
}

impl IndexPlugin for TantivyLexicalIndex {
    fn index_type(&self) -> &'static str {
        "lexical"
    }

    fn applied_up_to(&self) -> TxnId {
        self.applied_txn.load(Ordering::Acquire)
    }

    fn apply_delta(
        &self,
        delta: &TransactionDelta,
        analysis: &DeltaAnalysis,
    ) -> Result<(bool, u64)> {
        let started = Instant::now();
        let affected = &analysis.affected_files;
        if affected.is_empty() {
            self.applied_txn.store(delta.to_txn, Ordering::Release);
            return Ok((false, started.elapsed().as_millis() as u64));
        }

        {
            let mut writer = self.writer.lock();
            for file_path in affected {
                writer.delete_term(Term::from_field_text(self.fields.file_path, file_path));
            }
            let mut reindexed = 0;
            for file_path in affected {
                let chunks =
                    self.chunk_source
                        .chunks_for_file(&self.repo_id, &self.snapshot_id, file_path);
                reindexed += self.add_chunk_documents(&writer, &chunks)?;
            }
            writer
                .commit()
                .map_err(|e| EngineError::index("lexical", e.to_string()))?;
            debug!(
                files = affected.len(),
                chunks = reindexed,
                txn = delta.to_txn,
                "lexical delta applied"
            );
        }

        self.applied_txn.store(delta.to_txn, Ordering::Release);
        Ok((true, started.elapsed().as_millis() as u64))
    }

    fn rebuild(&self, snapshot: &IndexSnapshot, txn: TxnId) -> Result<u64> {
        let started = Instant::now();
        let chunks = self
            .chunk_source
            .all_chunks(&snapshot.repo_id, &snapshot.snapshot_id);

        // content recovery: prefer original file bytes, fall back to the
        // text stored on the chunks (degraded)
        let mut degraded = false;
        let mut rebuilt: Vec<Chunk> = Vec::with_capacity(chunks.len());
        for mut chunk in chunks {
            if chunk.content.is_empty() {
                match self
                    .content_provider
                    .as_ref()
                    .and_then(|p| p.content(&chunk.file_path))
                {
                    Some(content) => chunk.content = content,
                    None => degraded = true,
                }
            }
            rebuilt.push(chunk);
        }

        {
            let mut writer = self.writer.lock();
            writer
                .delete_all_documents()
                .map_err(|e| EngineError::index("lexical", e.to_string()))?;
            self.add_chunk_documents(&writer, &rebuilt)?;
            writer
                .commit()
                .map_err(|e| EngineError::index("lexical", e.to_string()))?;
        }

        self.degraded.store(degraded, Ordering::Release);
        if degraded {
            warn!("lexical rebuild ran without original file content, flagged degraded");
        }
        self.applied_txn.store(txn, Ordering::Release);
        Ok(started.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lexical::content_provider::InMemoryChunkSource;
    use crate::features::multi_index::ports::ChangeOp;
    use crate::features::multi_index::ChangeAnalyzer;

    fn chunk(id: &str, file: &str, kind: ChunkKind, content: &str) -> Chunk {
        Chunk::new(id, "r1", "r1:main", kind, id, file, 0, 5, content)
    }

    fn delta_for(files: &[&str], from: TxnId, to: TxnId) -> (TransactionDelta, DeltaAnalysis) {
        let delta = TransactionDelta {
            from_txn: from,
            to_txn: to,
            ops: files
                .iter()
                .map(|f| ChangeOp::AddFile {
                    file_path: f.to_string(),
                })
                .collect(),
        };
        let analysis = ChangeAnalyzer::analyze(&delta, None);
        (delta, analysis)
    }

    fn setup() -> (Arc<InMemoryChunkSource>, TantivyLexicalIndex) {
        let source = Arc::new(InMemoryChunkSource::new());
        let index =
            TantivyLexicalIndex::in_memory("r1", "r1:main", source.clone()).unwrap();
        (source, index)
    }

    #[test]
    fn delta_removes_old_file_and_indexes_new_one() {
        let (source, index) = setup();
        source.upsert_file(
            "r1",
            "r1:main",
            "x.ts",
            vec![chunk("chunk:r1:function:x.foo", "x.ts", ChunkKind::Function, "function foo() { return 1 }")],
        );
        let (delta, analysis) = delta_for(&["x.ts"], 0, 1);
        index.apply_delta(&delta, &analysis).unwrap();
        assert!(!index.search("foo", 10).unwrap().is_empty());

        // remove x.ts, add y.ts with different content
        source.remove_file("r1", "r1:main", "x.ts");
        source.upsert_file(
            "r1",
            "r1:main",
            "y.ts",
            vec![chunk("chunk:r1:function:y.foo", "y.ts", ChunkKind::Function, "function foo() { return 2 }")],
        );
        let (delta, analysis) = delta_for(&["x.ts", "y.ts"], 1, 2);
        index.apply_delta(&delta, &analysis).unwrap();

        let hits = index.search("foo", 10).unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.file_path == "y.ts"));
        assert_eq!(index.applied_up_to(), 2);
    }

    #[test]
    fn leaf_chunks_outscore_file_chunks() {
        let (source, index) = setup();
        source.upsert_file(
            "r1",
            "r1:main",
            "a.py",
            vec![
                chunk("chunk:r1:file:a", "a.py", ChunkKind::File, "def handler(): authenticate()"),
                chunk("chunk:r1:function:a.handler", "a.py", ChunkKind::Function, "def handler(): authenticate()"),
            ],
        );
        let (delta, analysis) = delta_for(&["a.py"], 0, 1);
        index.apply_delta(&delta, &analysis).unwrap();

        let hits = index.search("authenticate", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].chunk_id.as_deref().unwrap().contains("function"));
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn rebuild_without_provider_is_degraded_when_content_missing() {
        let (source, index) = setup();
        let mut empty = chunk("chunk:r1:function:a.f", "a.py", ChunkKind::Function, "");
        empty.content = String::new();
        source.upsert_file("r1", "r1:main", "a.py", vec![empty]);

        let snapshot = IndexSnapshot {
            repo_id: "r1".into(),
            snapshot_id: "r1:main".into(),
        };
        index.rebuild(&snapshot, 5).unwrap();
        assert!(index.is_degraded());
        assert_eq!(index.applied_up_to(), 5);
    }

    #[test]
    fn rebuild_with_provider_recovers_content() {
        let (source, index) = setup();
        let mut empty = chunk("chunk:r1:function:a.f", "a.py", ChunkKind::Function, "");
        empty.content = String::new();
        source.upsert_file("r1", "r1:main", "a.py", vec![empty]);

        let provider = Arc::new(super::super::content_provider::StaticContentProvider::new(
            [("a.py".to_string(), "def findable(): pass".to_string())].into(),
        ));
        let index = index.with_content_provider(provider);
        let snapshot = IndexSnapshot {
            repo_id: "r1".into(),
            snapshot_id: "r1:main".into(),
        };
        index.rebuild(&snapshot, 6).unwrap();
        assert!(!index.is_degraded());
        assert!(!index.search("findable", 10).unwrap().is_empty());
    }
}
