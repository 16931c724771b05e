//! Multi-index orchestration: agent sessions, transaction deltas, and
//! parallel plugin fan-out with per-index watermarks

pub mod change_analyzer;
pub mod orchestrator;
pub mod ports;

pub use change_analyzer::ChangeAnalyzer;
pub use orchestrator::{CommitOutcome, MultiIndexOrchestrator, Session};
pub use ports::{
    ChangeOp, ChangeScope, DeltaAnalysis, IndexPlugin, IndexSnapshot, TransactionDelta, TxnId,
};
