//! Points-to analysis: Andersen (precise) and Steensgaard (fast) with an
//! auto-selecting analyzer

pub mod analyzer;
pub mod andersen;
pub mod domain;
pub mod lowering;
pub mod parallel_andersen;
pub mod scc;
pub mod sparse_bitmap;
pub mod steensgaard;
pub mod union_find;

pub use analyzer::{PointsToAnalyzer, PointsToConfig, DEFAULT_AUTO_THRESHOLD};
pub use lowering::{ConstraintLowering, VariableInterner};
pub use andersen::{AndersenConfig, AndersenSolver, PointsToResult, SolverStats};
pub use domain::{AnalysisMode, Constraint, ConstraintKind, LocationId, PointsToGraph, VarId};
pub use parallel_andersen::{ParallelAndersenConfig, ParallelAndersenSolver};
pub use steensgaard::SteensgaardSolver;
