//! Repo-map importance domain

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Seed set for Personalized PageRank: the nodes the caller is working on
#[derive(Debug, Clone, Default)]
pub struct ContextSet {
    pub node_ids: HashSet<String>,
}

impl ContextSet {
    pub fn from_nodes<I: IntoIterator<Item = String>>(nodes: I) -> Self {
        Self {
            node_ids: nodes.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }
}

/// Per-node importance scores; `combined` is what lands in
/// `Chunk.importance`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportanceScore {
    pub pagerank: f64,
    pub personalized: f64,
    pub authority: f64,
    pub hub: f64,
    pub combined: f64,
}

/// What the caller is trying to do, when they told us explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisType {
    BugFix,
    ArchitectureReview,
    RefactoringPlan,
}

/// Inputs to the Smart-Mode detector
#[derive(Debug, Clone, Default)]
pub struct ModeDetectionContext {
    pub is_initial_indexing: bool,
    pub analysis_type: Option<AnalysisType>,
    pub is_architecture_review: bool,
    pub is_ai_agent: bool,
    pub target_file: Option<String>,
    pub query: Option<String>,
    /// Repository size in lines of code, when known
    pub repo_loc: Option<usize>,
}

/// Which algorithms a request activates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationMode {
    /// PageRank only (1× baseline)
    Fast,
    /// PageRank + PPR (≈2×)
    Ai,
    /// PageRank + HITS (≈2×)
    Architecture,
    /// PageRank + PPR + HITS (≈3.5×)
    Full,
}

impl ActivationMode {
    pub fn enables_personalized(&self) -> bool {
        matches!(self, ActivationMode::Ai | ActivationMode::Full)
    }

    pub fn enables_hits(&self) -> bool {
        matches!(self, ActivationMode::Architecture | ActivationMode::Full)
    }

    /// Documented cost relative to Fast
    pub fn time_multiplier(&self) -> f64 {
        match self {
            ActivationMode::Fast => 1.0,
            ActivationMode::Ai | ActivationMode::Architecture => 2.0,
            ActivationMode::Full => 3.5,
        }
    }
}
