//! Repo-map importance: PageRank / PPR / HITS with a Smart-Mode selector

pub mod adjacency;
pub mod domain;
pub mod mode_detector;
pub mod pagerank;
pub mod usecase;

pub use adjacency::AdjacencyLists;
pub use domain::{ActivationMode, AnalysisType, ContextSet, ImportanceScore, ModeDetectionContext};
pub use mode_detector::ModeDetector;
pub use pagerank::{ImportanceEngine, ImportanceSettings};
pub use usecase::RepoMapAnalyzer;
