//! Taint analysis: inter-procedural worklist solvers (IFDS / IDE /
//! interprocedural dataflow) over a program model lowered from the IR

pub mod analyzer;
pub mod domain;
pub mod program_builder;
pub mod solver_base;
pub mod strategies;

pub use analyzer::TaintAnalyzer;
pub use domain::{
    SolverStrategy, Statement, TaintAnalysisResult, TaintFact, TaintFunction, TaintPath,
    TaintPolicy, TaintProgram, TaintStep,
};
pub use program_builder::TaintProgramBuilder;
pub use solver_base::{BaseSolver, FlowFunctions, SolverConfig, TrackedFact};
