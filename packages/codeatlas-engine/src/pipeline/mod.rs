//! Pipeline orchestration: ordered stage execution with per-stage timing,
//! best-effort failure policy, and early cutoff on unchanged files

pub mod orchestrator;
pub mod result;

pub use orchestrator::PipelineOrchestrator;
pub use result::{
    compute_replay_ref, IndexingStats, PipelineResult, StageStatus, StageTiming, STAGE_VERSIONS,
};
