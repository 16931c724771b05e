//! Pipeline orchestrator
//!
//! Runs the stages in fixed order (IR build, chunking, cross-file
//! resolution, occurrences, symbols, points-to, taint, importance, then the
//! optional clone/effect tail), records per-stage timings in execution
//! order, and follows the best-effort failure policy: a failed stage is
//! recorded and later stages run with whatever inputs are available. Only
//! config and storage errors abort.
//!
//! Early cutoff: files whose content hash matches the stored file metadata
//! bypass re-parse entirely; their chunks stay untouched in the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use codeatlas_store::{Dependency, Repository, Snapshot, SnapshotStore};
use tracing::{info, warn};

use super::result::{PipelineResult, StageStatus};
use crate::config::EngineConfig;
use crate::features::chunking::{BoundaryValidator, ChunkBuilder};
use crate::features::clone_detection::{CloneFragment, HybridCloneDetector};
use crate::features::cross_file::{CrossFileResolver, SymbolTable};
use crate::features::effects::EffectAnalyzer;
use crate::features::graph::GraphBuilder;
use crate::features::lexical::InMemoryChunkSource;
use crate::features::multi_index::{ChangeOp, MultiIndexOrchestrator};
use crate::features::parsing::{ExtractorRegistry, ParserFrontend, SourceFile};
use crate::features::points_to::{ConstraintLowering, PointsToAnalyzer};
use crate::features::repomap::{ContextSet, ModeDetectionContext, ModeDetector, RepoMapAnalyzer};
use crate::features::taint::{SolverStrategy, TaintAnalyzer, TaintProgramBuilder};
use crate::shared::ids::content_hash;
use crate::shared::models::{EdgeKind, EngineError, ErrorEntry, ResponseStatus, Result};

pub struct PipelineOrchestrator {
    store: Arc<dyn SnapshotStore>,
    multi_index: Arc<MultiIndexOrchestrator>,
    chunk_source: Arc<InMemoryChunkSource>,
    config: EngineConfig,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        multi_index: Arc<MultiIndexOrchestrator>,
        chunk_source: Arc<InMemoryChunkSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            multi_index,
            chunk_source,
            config,
        }
    }

    /// Index a repository snapshot from scratch (cold caches still benefit
    /// from early cutoff on re-runs)
    pub async fn run_full(
        &self,
        repo_id: &str,
        git_ref: &str,
        files: Vec<SourceFile>,
    ) -> Result<PipelineResult> {
        self.run(repo_id, git_ref, files, false).await
    }

    /// Re-index after changes; unchanged files are skipped via file hashes
    pub async fn run_incremental(
        &self,
        repo_id: &str,
        git_ref: &str,
        files: Vec<SourceFile>,
    ) -> Result<PipelineResult> {
        self.run(repo_id, git_ref, files, true).await
    }

    async fn run(
        &self,
        repo_id: &str,
        git_ref: &str,
        files: Vec<SourceFile>,
        incremental: bool,
    ) -> Result<PipelineResult> {
        if repo_id.is_empty() {
            return Err(EngineError::Config("repo_id must not be empty".into()));
        }
        let snapshot = Snapshot::new(repo_id, git_ref);
        let snapshot_id = snapshot.snapshot_id.clone();
        self.store
            .save_repository(&Repository::new(repo_id, repo_id))
            .await?;
        self.store.save_snapshot(&snapshot).await?;

        let mut result = PipelineResult::new(repo_id, &snapshot_id);
        result.stats.files_total = files.len();

        // ─── L1: IR build with early cutoff ───
        let started = Instant::now();
        let mut changed: Vec<SourceFile> = Vec::new();
        let mut file_hashes: HashMap<String, String> = HashMap::new();
        for file in &files {
            let hash = content_hash(&file.content);
            let previous = self
                .store
                .get_file_hash(repo_id, &snapshot_id, &file.path)
                .await?;
            if previous.as_deref() == Some(hash.as_str()) {
                result.stats.files_skipped_unchanged += 1;
            } else {
                changed.push(file.clone());
            }
            file_hashes.insert(file.path.clone(), hash);
        }

        let frontend = ParserFrontend::new(repo_id, ExtractorRegistry::with_builtin_languages());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_pool_size)
            .build()
            .map_err(|e| EngineError::Config(format!("worker pool: {e}")))?;
        let frontend_result = pool.install(|| frontend.extract_all(&changed));
        result.stats.files_parsed = frontend_result.documents.len();
        result.stats.files_failed = frontend_result.errors.len();
        for (path, err) in &frontend_result.errors {
            result.errors.push(ErrorEntry::from_error(path, err));
        }
        let documents = frontend_result.documents;
        result.stats.ir_nodes = documents.iter().map(|d| d.nodes.len()).sum();
        result.stats.ir_edges = documents.iter().map(|d| d.edges.len()).sum();
        result.record_stage("L1 IR Build", started.elapsed(), StageStatus::Completed);

        // ─── L2: chunking + persistence ───
        let started = Instant::now();
        let contents: HashMap<String, String> = changed
            .iter()
            .map(|f| (f.path.clone(), f.content.clone()))
            .collect();
        let mut build = ChunkBuilder::new(repo_id, &snapshot_id).build(&documents, &contents);
        match BoundaryValidator::default().validate(&mut build.chunks) {
            Ok(report) => {
                for warning in &report.warnings {
                    warn!(%warning, "chunk boundary warning");
                }
                result.record_stage("L2 Chunking", started.elapsed(), StageStatus::Completed);
            }
            Err(err) => {
                let entry = ErrorEntry::from_error("L2 Chunking", &err);
                result.record_failed_stage("L2 Chunking", started.elapsed(), &entry);
            }
        }
        result.stats.chunks_built = build.chunks.len();

        // removed files: indexed before but absent from this run's input
        let mut removed_files: Vec<String> = Vec::new();
        if incremental {
            let incoming: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
            let live = self.store.get_chunks(repo_id, &snapshot_id).await?;
            let mut seen: HashSet<String> = HashSet::new();
            for chunk in live {
                if !chunk.file_path.is_empty()
                    && !incoming.contains(chunk.file_path.as_str())
                    && seen.insert(chunk.file_path.clone())
                {
                    removed_files.push(chunk.file_path.clone());
                }
            }
        }
        for path in &removed_files {
            self.store
                .soft_delete_file_chunks(repo_id, &snapshot_id, path)
                .await?;
            self.chunk_source.remove_file(repo_id, &snapshot_id, path);
        }
        for file in &changed {
            self.store
                .soft_delete_file_chunks(repo_id, &snapshot_id, &file.path)
                .await?;
        }
        self.store.save_chunks(&build.chunks).await?;
        // feed the lexical plugin's chunk source
        let mut by_file: HashMap<String, Vec<codeatlas_store::Chunk>> = HashMap::new();
        for chunk in &build.chunks {
            by_file
                .entry(chunk.file_path.clone())
                .or_default()
                .push(chunk.clone());
        }
        for (path, chunks) in by_file {
            if path.is_empty() {
                continue; // repo/project/module chunks are not file-bound
            }
            self.chunk_source
                .upsert_file(repo_id, &snapshot_id, &path, chunks);
        }

        // ─── L3: cross-file resolution ───
        let started = Instant::now();
        let resolution = CrossFileResolver::resolve(&documents);
        if resolution.unresolved_imports > 0 || resolution.unresolved_calls > 0 {
            info!(
                unresolved_imports = resolution.unresolved_imports,
                unresolved_calls = resolution.unresolved_calls,
                "references left as external sentinels"
            );
        }
        result.record_stage("L3 Cross-File Resolution", started.elapsed(), StageStatus::Completed);

        // ─── L4: occurrences ───
        let started = Instant::now();
        result.stats.occurrences = documents
            .iter()
            .flat_map(|d| d.edges.iter())
            .filter(|e| matches!(e.kind, EdgeKind::Reads | EdgeKind::Writes))
            .count();
        result.record_stage("L4 Occurrences", started.elapsed(), StageStatus::Completed);

        // ─── L5: symbols + graph promotion ───
        let started = Instant::now();
        let symbol_table = SymbolTable::build(&documents);
        result.stats.symbols_indexed = symbol_table.symbol_count();
        let graph = GraphBuilder::build(&documents, &resolution);
        result.stats.graph_nodes = graph.node_count();
        result.stats.graph_edges = graph.edge_count();
        self.persist_dependencies(&graph, &build.chunk_to_ir).await?;
        result.record_stage("L5 Symbols", started.elapsed(), StageStatus::Completed);

        // ─── L6: points-to ───
        let started = Instant::now();
        let (constraints, _interner) = ConstraintLowering::lower(&documents);
        result.stats.points_to_constraints = constraints.len();
        let mut points_to_config = self.config.points_to.clone();
        points_to_config.deadline = points_to_config.deadline.or(self.config.analysis_deadline);
        let points_to = PointsToAnalyzer::new(points_to_config).analyze(constraints);
        if points_to.partial {
            let err = EngineError::Degraded("points-to returned a partial result".into());
            let entry = ErrorEntry::from_error("L6 Points-to", &err);
            result.record_failed_stage("L6 Points-to", started.elapsed(), &entry);
        } else {
            result.record_stage("L6 Points-to", started.elapsed(), StageStatus::Completed);
        }

        // ─── L14: taint ───
        let started = Instant::now();
        let program = TaintProgramBuilder::build(&documents, &self.config.taint_policy);
        let taint = TaintAnalyzer::with_config(
            SolverStrategy::Ifds,
            crate::features::taint::SolverConfig {
                summary_cache_size: self.config.summary_cache_size,
                ..Default::default()
            },
        )
        .analyze(&program, &self.config.taint_policy);
        result.stats.taint_paths = taint.paths.len();
        result.record_stage("L14 Taint", started.elapsed(), StageStatus::Completed);

        // ─── L16: importance ───
        let started = Instant::now();
        let mode = self.config.pagerank_mode_override.unwrap_or_else(|| {
            ModeDetector::detect(&ModeDetectionContext {
                is_initial_indexing: !incremental,
                repo_loc: Some(files.iter().map(|f| f.content.lines().count()).sum()),
                ..Default::default()
            })
        });
        let scores = RepoMapAnalyzer::default().compute(&graph, mode, &ContextSet::default());
        RepoMapAnalyzer::apply_to_chunks(&scores, &build.chunk_to_ir, &mut build.chunks);
        self.store.save_chunks(&build.chunks).await?;
        result.record_stage("L16 RepoMap Importance", started.elapsed(), StageStatus::Completed);

        // ─── L8: clone detection (optional tail) ───
        if self.config.enable_clone_detection {
            let started = Instant::now();
            let fragments: Vec<CloneFragment> = build
                .chunks
                .iter()
                .filter(|c| c.kind.is_leaf())
                .map(|c| {
                    CloneFragment::new(
                        &c.chunk_id,
                        &c.file_path,
                        c.start_line,
                        c.end_line,
                        &c.content,
                    )
                })
                .collect();
            let pairs = HybridCloneDetector::default().detect(&fragments);
            result.stats.clone_pairs = pairs.len();
            result.record_stage("L8 Clone Detection", started.elapsed(), StageStatus::Completed);
        }

        // ─── L9: effect analysis (optional tail) ───
        if self.config.enable_effect_analysis {
            let started = Instant::now();
            let effects = EffectAnalyzer::analyze(&graph);
            result.stats.effectful_functions = effects
                .effects
                .values()
                .filter(|set| !set.is_empty())
                .count();
            result.record_stage("L9 Effect Analysis", started.elapsed(), StageStatus::Completed);
        }

        // ─── commit: fan the delta out to every index plugin ───
        let agent_id = format!("pipeline:{snapshot_id}");
        self.multi_index.set_total_files_hint(files.len());
        self.multi_index.begin_session(&agent_id).await;
        for file in &changed {
            let op = if file_was_known(&self.store, repo_id, &snapshot_id, &file.path).await {
                ChangeOp::ModifyNode {
                    node_id: format!("file:{}", file.path),
                    file_path: file.path.clone(),
                }
            } else {
                ChangeOp::AddFile {
                    file_path: file.path.clone(),
                }
            };
            self.multi_index.add_change(&agent_id, op).await?;
        }
        for path in &removed_files {
            self.multi_index
                .add_change(
                    &agent_id,
                    ChangeOp::RemoveFile {
                        file_path: path.clone(),
                    },
                )
                .await?;
        }
        let outcome = self.multi_index.commit(&agent_id).await?;
        result.txn_id = Some(outcome.txn_id);
        result.errors.extend(outcome.plugin_errors);

        // file metadata marks the txn that last indexed each changed file
        for file in &changed {
            if let Some(hash) = file_hashes.get(&file.path) {
                self.store
                    .update_file_metadata(
                        repo_id,
                        &snapshot_id,
                        &file.path,
                        hash,
                        outcome.txn_id as i64,
                    )
                    .await?;
            }
        }

        result.status = if result.failed_stage_count() > 0 || !result.errors.is_empty() {
            ResponseStatus::Degraded
        } else {
            ResponseStatus::Ok
        };
        info!(
            repo = repo_id,
            snapshot = %snapshot_id,
            parsed = result.stats.files_parsed,
            skipped = result.stats.files_skipped_unchanged,
            status = ?result.status,
            "pipeline run complete"
        );
        Ok(result)
    }

    /// Derive chunk-level dependencies from resolved graph edges
    async fn persist_dependencies(
        &self,
        graph: &crate::features::graph::CodeGraph,
        chunk_to_ir: &HashMap<String, Vec<String>>,
    ) -> Result<()> {
        // invert chunk → IR nodes
        let mut node_to_chunk: HashMap<&str, &str> = HashMap::new();
        for (chunk_id, nodes) in chunk_to_ir {
            for node in nodes {
                node_to_chunk.insert(node.as_str(), chunk_id.as_str());
            }
        }
        let mut deps = Vec::new();
        for edge in graph.edges() {
            let relationship = match edge.kind {
                EdgeKind::Calls => "CALLS",
                EdgeKind::Imports => "IMPORTS",
                _ => continue,
            };
            let (Some(&from), Some(&to)) = (
                node_to_chunk.get(edge.source_id.as_str()),
                node_to_chunk.get(edge.target_id.as_str()),
            ) else {
                continue;
            };
            if from != to {
                deps.push(Dependency::new(from, to, relationship));
            }
        }
        if !deps.is_empty() {
            self.store.save_dependencies(&deps).await?;
        }
        Ok(())
    }
}

async fn file_was_known(
    store: &Arc<dyn SnapshotStore>,
    repo_id: &str,
    snapshot_id: &str,
    file_path: &str,
) -> bool {
    store
        .get_file_hash(repo_id, snapshot_id, file_path)
        .await
        .ok()
        .flatten()
        .is_some()
}
