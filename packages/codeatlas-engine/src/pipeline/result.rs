//! Pipeline run results
//!
//! Stage timings are an ordered sequence, never a map: the recorded order
//! IS the execution order, and tests assert on it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::ids::content_hash;
use crate::shared::models::{ErrorEntry, ResponseStatus};

/// Stage implementation versions pinned into every `replay_ref`. Bump a
/// version when a stage's output format or semantics change.
pub const STAGE_VERSIONS: &[(&str, &str)] = &[
    ("ir_build", "2"),
    ("chunking", "2"),
    ("cross_file", "1"),
    ("occurrences", "1"),
    ("symbols", "1"),
    ("points_to", "2"),
    ("taint", "1"),
    ("importance", "2"),
    ("clone_detection", "1"),
    ("effects", "1"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTiming {
    pub name: String,
    pub duration_ms: f64,
    pub status: StageStatus,
    pub error: Option<String>,
}

/// Aggregate counters for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingStats {
    pub files_total: usize,
    pub files_parsed: usize,
    /// Early cutoff: unchanged content hash, re-parse bypassed
    pub files_skipped_unchanged: usize,
    pub files_failed: usize,
    pub ir_nodes: usize,
    pub ir_edges: usize,
    pub chunks_built: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub symbols_indexed: usize,
    pub occurrences: usize,
    pub points_to_constraints: usize,
    pub taint_paths: usize,
    pub clone_pairs: usize,
    /// Callables with at least one observed effect class
    pub effectful_functions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineResult {
    pub repo_id: String,
    pub snapshot_id: String,
    pub status: ResponseStatus,
    /// Execution-ordered stage records
    pub stage_timings: Vec<StageTiming>,
    pub stats: IndexingStats,
    pub errors: Vec<ErrorEntry>,
    /// Snapshot + stage-version pin: equal refs must replay byte-equal
    pub replay_ref: String,
    /// Transaction committed to the multi-index orchestrator
    pub txn_id: Option<u64>,
}

impl PipelineResult {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        let snapshot_id = snapshot_id.into();
        let replay_ref = compute_replay_ref(&snapshot_id);
        Self {
            repo_id: repo_id.into(),
            snapshot_id,
            status: ResponseStatus::Ok,
            stage_timings: Vec::new(),
            stats: IndexingStats::default(),
            errors: Vec::new(),
            replay_ref,
            txn_id: None,
        }
    }

    pub fn record_stage(&mut self, name: &str, duration: Duration, status: StageStatus) {
        self.stage_timings.push(StageTiming {
            name: name.to_string(),
            duration_ms: duration.as_secs_f64() * 1000.0,
            status,
            error: None,
        });
    }

    pub fn record_failed_stage(&mut self, name: &str, duration: Duration, error: &ErrorEntry) {
        self.stage_timings.push(StageTiming {
            name: name.to_string(),
            duration_ms: duration.as_secs_f64() * 1000.0,
            status: StageStatus::Failed,
            error: Some(error.message.clone()),
        });
        self.errors.push(error.clone());
    }

    pub fn failed_stage_count(&self) -> usize {
        self.stage_timings
            .iter()
            .filter(|t| t.status == StageStatus::Failed)
            .count()
    }
}

/// `replay:{snapshot}:{hash}` where the hash pins the stage version table
pub fn compute_replay_ref(snapshot_id: &str) -> String {
    let versions = STAGE_VERSIONS
        .iter()
        .map(|(stage, version)| format!("{stage}={version}"))
        .collect::<Vec<_>>()
        .join(";");
    let digest = content_hash(&format!("{snapshot_id}|{versions}"));
    format!("replay:{snapshot_id}:{}", &digest[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_preserved() {
        let mut result = PipelineResult::new("r", "r:main");
        result.record_stage("first", Duration::from_millis(5), StageStatus::Completed);
        result.record_stage("second", Duration::from_millis(3), StageStatus::Completed);
        result.record_stage("third", Duration::from_millis(9), StageStatus::Skipped);
        let names: Vec<&str> = result.stage_timings.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn replay_ref_is_deterministic_per_snapshot() {
        assert_eq!(compute_replay_ref("r:main"), compute_replay_ref("r:main"));
        assert_ne!(compute_replay_ref("r:main"), compute_replay_ref("r:dev"));
    }
}
