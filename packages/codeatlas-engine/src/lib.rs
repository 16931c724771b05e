//! codeatlas-engine: multi-language code-graph engine
//!
//! Ingests a source repository, parses it into a language-neutral IR,
//! builds a typed symbol/call/data-flow graph, derives higher-order indexes
//! (lexical, chunk hierarchy, importance, clone equivalence, effects,
//! points-to, taint paths), persists them through `codeatlas-store` with
//! snapshot semantics, and serves hybrid code-search queries.
//!
//! # Layout
//! - [`shared`]: IR model, stable IDs, error taxonomy
//! - [`features`]: vertical slices (parsing, chunking, cross-file, graph,
//!   points-to, taint, clone detection, repomap, lexical, multi-index,
//!   retrieval, effects
//! - [`pipeline`]: the staged orchestrator (L1 .. L16)
//! - [`config`] / [`api`]: engine configuration and wire-stable API types
//!
//! # Construction
//! All mutable subsystem state lives in an [`IndexingSubsystem`] value
//! built at startup and passed into handlers; there are no process-level
//! globals.

pub mod api;
pub mod config;
pub mod features;
pub mod pipeline;
pub mod shared;

use std::sync::Arc;

use codeatlas_store::SnapshotStore;

use crate::config::EngineConfig;
use crate::features::lexical::{InMemoryChunkSource, TantivyLexicalIndex};
use crate::features::multi_index::MultiIndexOrchestrator;
use crate::pipeline::PipelineOrchestrator;
use crate::shared::models::Result;

/// The assembled engine: snapshot store, index plugins, and the pipeline,
/// wired once at startup
pub struct IndexingSubsystem {
    pub store: Arc<dyn SnapshotStore>,
    pub multi_index: Arc<MultiIndexOrchestrator>,
    pub chunk_source: Arc<InMemoryChunkSource>,
    pub lexical: Arc<TantivyLexicalIndex>,
    pub pipeline: PipelineOrchestrator,
}

impl IndexingSubsystem {
    /// Wire the subsystem for one (repo, snapshot) against the given store.
    /// The lexical plugin is registered with the multi-index orchestrator;
    /// further plugins (vector, symbol) register the same way.
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        repo_id: &str,
        snapshot_id: &str,
        config: EngineConfig,
    ) -> Result<Self> {
        let chunk_source = Arc::new(InMemoryChunkSource::new());
        let lexical = Arc::new(TantivyLexicalIndex::in_memory(
            repo_id,
            snapshot_id,
            chunk_source.clone(),
        )?);
        let multi_index = Arc::new(MultiIndexOrchestrator::new());
        multi_index.register_plugin(lexical.clone());
        let pipeline = PipelineOrchestrator::new(
            store.clone(),
            multi_index.clone(),
            chunk_source.clone(),
            config,
        );
        Ok(Self {
            store,
            multi_index,
            chunk_source,
            lexical,
            pipeline,
        })
    }
}
