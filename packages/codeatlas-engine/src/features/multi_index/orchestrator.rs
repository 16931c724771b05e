//! Multi-index orchestrator
//!
//! Owns the agent-session protocol and the transactional fan-out:
//! `begin_session` → repeated `add_change` (causally ordered) → `commit`,
//! which analyzes the delta once and applies it to every registered plugin
//! in parallel. A failing plugin fails the commit status but never blocks
//! the other plugins, since each index owns its own watermark and artifact.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::change_analyzer::ChangeAnalyzer;
use super::ports::{ChangeOp, IndexPlugin, TransactionDelta, TxnId};
use crate::shared::models::{EngineError, ErrorEntry, ResponseStatus, Result};

/// Handle returned by `begin_session`
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub agent_id: String,
    /// MVCC snapshot: the committed txn visible to this session
    pub base_txn: TxnId,
}

#[derive(Debug)]
struct SessionState {
    session: Session,
    ops: Vec<ChangeOp>,
}

/// Aggregate result of one commit
#[derive(Debug)]
pub struct CommitOutcome {
    pub txn_id: TxnId,
    pub status: ResponseStatus,
    pub total_cost_ms: u64,
    /// Per-plugin failures; successful plugins kept their updates
    pub plugin_errors: Vec<ErrorEntry>,
}

#[derive(Default)]
pub struct MultiIndexOrchestrator {
    plugins: DashMap<&'static str, Arc<dyn IndexPlugin>>,
    sessions: DashMap<String, SessionState>,
    txn_counter: AtomicU64,
    /// Snapshot file count hint for impact ratios
    total_files_hint: AtomicUsize,
}

impl MultiIndexOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_plugin(&self, plugin: Arc<dyn IndexPlugin>) {
        self.plugins.insert(plugin.index_type(), plugin);
    }

    pub fn plugin(&self, index_type: &str) -> Option<Arc<dyn IndexPlugin>> {
        self.plugins.get(index_type).map(|p| Arc::clone(p.value()))
    }

    pub fn set_total_files_hint(&self, total: usize) {
        self.total_files_hint.store(total, Ordering::Relaxed);
    }

    pub fn current_txn(&self) -> TxnId {
        self.txn_counter.load(Ordering::Acquire)
    }

    /// Open an MVCC session for an agent; a second begin for the same agent
    /// replaces the previous uncommitted session.
    pub async fn begin_session(&self, agent_id: &str) -> Session {
        let session = Session {
            session_id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            base_txn: self.current_txn(),
        };
        self.sessions.insert(
            agent_id.to_string(),
            SessionState {
                session: session.clone(),
                ops: Vec::new(),
            },
        );
        session
    }

    /// Record a change; observations within a session stay ordered.
    pub async fn add_change(&self, agent_id: &str, op: ChangeOp) -> Result<()> {
        let mut state = self.sessions.get_mut(agent_id).ok_or_else(|| {
            EngineError::index("orchestrator", format!("no open session for agent {agent_id}"))
        })?;
        state.ops.push(op);
        Ok(())
    }

    /// Commit the session: compute the delta, fan out to every plugin in
    /// parallel, and report the aggregate outcome.
    pub async fn commit(&self, agent_id: &str) -> Result<CommitOutcome> {
        let (_, state) = self.sessions.remove(agent_id).ok_or_else(|| {
            EngineError::index("orchestrator", format!("no open session for agent {agent_id}"))
        })?;

        let to_txn = self.txn_counter.fetch_add(1, Ordering::AcqRel) + 1;
        let delta = TransactionDelta {
            from_txn: state.session.base_txn,
            to_txn,
            ops: state.ops,
        };
        let total_files = match self.total_files_hint.load(Ordering::Relaxed) {
            0 => None,
            n => Some(n),
        };
        let analysis = ChangeAnalyzer::analyze(&delta, total_files);

        let plugins: Vec<Arc<dyn IndexPlugin>> =
            self.plugins.iter().map(|entry| Arc::clone(entry.value())).collect();

        // unordered parallel fan-out; each plugin owns its artifact
        let applied: Vec<(&'static str, Result<(bool, u64)>)> = plugins
            .par_iter()
            .map(|plugin| (plugin.index_type(), plugin.apply_delta(&delta, &analysis)))
            .collect();

        let mut total_cost_ms = 0;
        let mut plugin_errors = Vec::new();
        for (index_type, outcome) in applied {
            match outcome {
                Ok((_, cost_ms)) => total_cost_ms += cost_ms,
                Err(err) => {
                    warn!(index = index_type, error = %err, "plugin failed to apply delta");
                    plugin_errors.push(ErrorEntry::from_error(index_type, &err));
                }
            }
        }

        let status = if plugin_errors.is_empty() {
            ResponseStatus::Ok
        } else if plugin_errors.len() < self.plugins.len() {
            ResponseStatus::Degraded
        } else {
            ResponseStatus::Failed
        };
        info!(
            txn = to_txn,
            agent = agent_id,
            ?status,
            cost_ms = total_cost_ms,
            "commit complete"
        );
        Ok(CommitOutcome {
            txn_id: to_txn,
            status,
            total_cost_ms,
            plugin_errors,
        })
    }

    /// Optional read barrier: wait until every plugin watermark reaches
    /// `txn`. Returns false when the deadline expires first.
    pub async fn wait_for_watermarks(&self, txn: TxnId, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let behind = self
                .plugins
                .iter()
                .any(|entry| entry.value().applied_up_to() < txn);
            if !behind {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::multi_index::ports::{DeltaAnalysis, IndexSnapshot};

    /// Plugin recording watermark + applied deltas; can be told to fail
    struct RecordingPlugin {
        tag: &'static str,
        watermark: AtomicU64,
        applied_ops: parking_lot::Mutex<Vec<usize>>,
        fail: std::sync::atomic::AtomicBool,
    }

    impl RecordingPlugin {
        fn new(tag: &'static str) -> Self {
            Self {
                tag,
                watermark: AtomicU64::new(0),
                applied_ops: parking_lot::Mutex::new(Vec::new()),
                fail: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    impl IndexPlugin for RecordingPlugin {
        fn index_type(&self) -> &'static str {
            self.tag
        }

        fn applied_up_to(&self) -> TxnId {
            self.watermark.load(Ordering::Acquire)
        }

        fn apply_delta(
            &self,
            delta: &TransactionDelta,
            _analysis: &DeltaAnalysis,
        ) -> Result<(bool, u64)> {
            if self.fail.load(Ordering::Relaxed) {
                return Err(EngineError::index(self.tag, "simulated failure"));
            }
            self.applied_ops.lock().push(delta.ops.len());
            self.watermark.store(delta.to_txn, Ordering::Release);
            Ok((true, 1))
        }

        fn rebuild(&self, _snapshot: &IndexSnapshot, txn: TxnId) -> Result<u64> {
            self.watermark.store(txn, Ordering::Release);
            Ok(0)
        }
    }

    fn op(path: &str) -> ChangeOp {
        ChangeOp::AddFile {
            file_path: path.into(),
        }
    }

    #[tokio::test]
    async fn commit_fans_out_to_all_plugins() {
        let orchestrator = MultiIndexOrchestrator::new();
        let a = Arc::new(RecordingPlugin::new("lexical"));
        let b = Arc::new(RecordingPlugin::new("vector"));
        orchestrator.register_plugin(a.clone());
        orchestrator.register_plugin(b.clone());

        orchestrator.begin_session("agent-1").await;
        orchestrator.add_change("agent-1", op("a.py")).await.unwrap();
        orchestrator.add_change("agent-1", op("b.py")).await.unwrap();
        let outcome = orchestrator.commit("agent-1").await.unwrap();

        assert_eq!(outcome.status, ResponseStatus::Ok);
        assert_eq!(a.applied_up_to(), outcome.txn_id);
        assert_eq!(b.applied_up_to(), outcome.txn_id);
        assert!(orchestrator
            .wait_for_watermarks(outcome.txn_id, Duration::from_millis(100))
            .await);
    }

    #[tokio::test]
    async fn failing_plugin_does_not_block_others() {
        let orchestrator = MultiIndexOrchestrator::new();
        let healthy = Arc::new(RecordingPlugin::new("lexical"));
        let broken = Arc::new(RecordingPlugin::new("vector"));
        broken.fail.store(true, Ordering::Relaxed);
        orchestrator.register_plugin(healthy.clone());
        orchestrator.register_plugin(broken.clone());

        orchestrator.begin_session("agent-1").await;
        orchestrator.add_change("agent-1", op("a.py")).await.unwrap();
        let outcome = orchestrator.commit("agent-1").await.unwrap();

        assert_eq!(outcome.status, ResponseStatus::Degraded);
        assert_eq!(outcome.plugin_errors.len(), 1);
        assert_eq!(healthy.applied_up_to(), outcome.txn_id);
        assert_eq!(broken.applied_up_to(), 0); // watermark must not advance
    }

    #[tokio::test]
    async fn watermarks_are_monotonic_across_commits() {
        let orchestrator = MultiIndexOrchestrator::new();
        let plugin = Arc::new(RecordingPlugin::new("lexical"));
        orchestrator.register_plugin(plugin.clone());

        let mut last = 0;
        for round in 0..5 {
            orchestrator.begin_session("agent").await;
            orchestrator
                .add_change("agent", op(&format!("f{round}.py")))
                .await
                .unwrap();
            let outcome = orchestrator.commit("agent").await.unwrap();
            assert!(outcome.txn_id > last);
            assert!(plugin.applied_up_to() >= last);
            last = outcome.txn_id;
        }
    }

    #[tokio::test]
    async fn session_ops_stay_ordered_in_delta() {
        let orchestrator = MultiIndexOrchestrator::new();
        let plugin = Arc::new(RecordingPlugin::new("lexical"));
        orchestrator.register_plugin(plugin.clone());

        orchestrator.begin_session("agent").await;
        for i in 0..4 {
            orchestrator
                .add_change(
                    "agent",
                    ChangeOp::AddNode {
                        node_id: format!("n{i}"),
                        file_path: "f.py".into(),
                    },
                )
                .await
                .unwrap();
        }
        orchestrator.commit("agent").await.unwrap();
        assert_eq!(*plugin.applied_ops.lock(), vec![4]);
    }

    #[tokio::test]
    async fn commit_without_session_is_an_error() {
        let orchestrator = MultiIndexOrchestrator::new();
        assert!(orchestrator.commit("ghost").await.is_err());
    }
}
