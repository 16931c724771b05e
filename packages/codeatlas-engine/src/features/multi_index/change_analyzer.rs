//! Delta analysis
//!
//! Classifies a transaction delta once so every plugin can make its update
//! decision from the same facts instead of re-deriving them in parallel.

use super::ports::{ChangeOp, ChangeScope, DeltaAnalysis, TransactionDelta};

pub struct ChangeAnalyzer;

impl ChangeAnalyzer {
    /// `total_files` is the current file count of the snapshot, when known,
    /// used for the impact ratio (0.0 when unknown or empty)
    pub fn analyze(delta: &TransactionDelta, total_files: Option<usize>) -> DeltaAnalysis {
        let affected_files = delta.affected_files();
        let scope = Self::classify(delta);
        let impact_ratio = match total_files {
            Some(total) if total > 0 => (affected_files.len() as f64 / total as f64).min(1.0),
            _ => 0.0,
        };
        DeltaAnalysis {
            scope,
            impact_ratio,
            affected_files,
            from_txn: delta.from_txn,
            to_txn: delta.to_txn,
        }
    }

    fn classify(delta: &TransactionDelta) -> ChangeScope {
        let mut saw_node_shape_change = false;
        let mut saw_modification = false;
        for op in &delta.ops {
            match op {
                ChangeOp::AddNode { .. } | ChangeOp::RemoveNode { .. } => {
                    saw_node_shape_change = true;
                }
                ChangeOp::ModifyNode { .. } => saw_modification = true,
                ChangeOp::AddFile { .. } | ChangeOp::RemoveFile { .. } => {}
            }
        }
        if saw_node_shape_change {
            ChangeScope::Structural
        } else if saw_modification {
            ChangeScope::Semantic
        } else {
            ChangeScope::FileOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(ops: Vec<ChangeOp>) -> TransactionDelta {
        TransactionDelta {
            from_txn: 1,
            to_txn: 2,
            ops,
        }
    }

    #[test]
    fn node_addition_is_structural() {
        let analysis = ChangeAnalyzer::analyze(
            &delta(vec![
                ChangeOp::ModifyNode {
                    node_id: "a".into(),
                    file_path: "a.py".into(),
                },
                ChangeOp::AddNode {
                    node_id: "b".into(),
                    file_path: "b.py".into(),
                },
            ]),
            Some(10),
        );
        assert_eq!(analysis.scope, ChangeScope::Structural);
        assert!((analysis.impact_ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn modification_only_is_semantic() {
        let analysis = ChangeAnalyzer::analyze(
            &delta(vec![ChangeOp::ModifyNode {
                node_id: "a".into(),
                file_path: "a.py".into(),
            }]),
            None,
        );
        assert_eq!(analysis.scope, ChangeScope::Semantic);
        assert_eq!(analysis.impact_ratio, 0.0);
    }

    #[test]
    fn file_churn_only() {
        let analysis = ChangeAnalyzer::analyze(
            &delta(vec![ChangeOp::AddFile {
                file_path: "new.py".into(),
            }]),
            Some(4),
        );
        assert_eq!(analysis.scope, ChangeScope::FileOnly);
    }
}
