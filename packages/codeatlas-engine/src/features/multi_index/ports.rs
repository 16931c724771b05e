//! Index plugin contract
//!
//! Every derived index (lexical, vector, symbol graph, ...) implements
//! `IndexPlugin`. Consistency is judged on `applied_up_to()`, the per-index
//! transaction watermark, which must advance monotonically with release
//! ordering so readers using acquire loads observe a consistent index.

use serde::{Deserialize, Serialize};

use crate::shared::models::Result;

/// Monotonic transaction id issued by the multi-index orchestrator
pub type TxnId = u64;

/// One observed change inside a session, in causal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChangeOp {
    AddNode {
        node_id: String,
        file_path: String,
    },
    ModifyNode {
        node_id: String,
        file_path: String,
    },
    RemoveNode {
        node_id: String,
        file_path: String,
    },
    AddFile {
        file_path: String,
    },
    RemoveFile {
        file_path: String,
    },
}

impl ChangeOp {
    pub fn file_path(&self) -> &str {
        match self {
            ChangeOp::AddNode { file_path, .. }
            | ChangeOp::ModifyNode { file_path, .. }
            | ChangeOp::RemoveNode { file_path, .. }
            | ChangeOp::AddFile { file_path }
            | ChangeOp::RemoveFile { file_path } => file_path,
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, ChangeOp::RemoveNode { .. } | ChangeOp::RemoveFile { .. })
    }
}

/// Ordered change set between two transactions: the wire-stable shape
/// handed to every plugin on commit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionDelta {
    pub from_txn: TxnId,
    pub to_txn: TxnId,
    /// Ordered ops reflecting their causal order within the session
    pub ops: Vec<ChangeOp>,
}

impl TransactionDelta {
    pub fn added_nodes(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            ChangeOp::AddNode { node_id, .. } => Some(node_id.as_str()),
            _ => None,
        })
    }

    pub fn modified_nodes(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            ChangeOp::ModifyNode { node_id, .. } => Some(node_id.as_str()),
            _ => None,
        })
    }

    pub fn removed_nodes(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            ChangeOp::RemoveNode { node_id, .. } => Some(node_id.as_str()),
            _ => None,
        })
    }

    /// Every file any op touches, deduplicated, insertion-ordered
    pub fn affected_files(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for op in &self.ops {
            let path = op.file_path();
            if seen.insert(path.to_string()) {
                out.push(path.to_string());
            }
        }
        out
    }
}

/// Broad classification of a delta, steering per-index update strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeScope {
    /// Nodes added/removed: graph shape changed
    Structural,
    /// Node bodies modified
    Semantic,
    /// File-level churn only
    FileOnly,
}

/// Pre-computed analysis shared by all plugins on one commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaAnalysis {
    pub scope: ChangeScope,
    /// affected files / total files, when total is known
    pub impact_ratio: f64,
    pub affected_files: Vec<String>,
    pub from_txn: TxnId,
    pub to_txn: TxnId,
}

/// A (repo, snapshot) pair a plugin can rebuild from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub repo_id: String,
    pub snapshot_id: String,
}

/// Contract implemented by every registered index
pub trait IndexPlugin: Send + Sync {
    /// Stable index type tag ("lexical", "vector", "symbol", ...)
    fn index_type(&self) -> &'static str;

    /// Highest TxnId this index has applied (atomic acquire load)
    fn applied_up_to(&self) -> TxnId;

    /// Apply an incremental delta; returns (changed, cost_ms). The
    /// watermark must advance to `delta.to_txn` with release ordering on
    /// success, and must NOT advance on failure.
    fn apply_delta(&self, delta: &TransactionDelta, analysis: &DeltaAnalysis)
        -> Result<(bool, u64)>;

    /// Full rebuild from a snapshot; returns cost_ms and advances the
    /// watermark to the rebuild txn
    fn rebuild(&self, snapshot: &IndexSnapshot, txn: TxnId) -> Result<u64>;
}
