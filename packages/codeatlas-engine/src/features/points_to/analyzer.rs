//! Points-to analyzer: mode selection and solver dispatch
//!
//! `AnalysisMode::Auto` picks Steensgaard once the constraint count reaches
//! the threshold (default 3000) and Andersen below it. Taint-sensitive
//! contexts always get Andersen regardless of size; sanitizer reasoning
//! needs the precision.

use std::time::Duration;

use tracing::info;

use super::andersen::{AndersenConfig, AndersenSolver, PointsToResult};
use super::domain::{AnalysisMode, Constraint};
use super::parallel_andersen::{ParallelAndersenConfig, ParallelAndersenSolver};
use super::steensgaard::SteensgaardSolver;

pub const DEFAULT_AUTO_THRESHOLD: usize = 3000;
const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
pub struct PointsToConfig {
    pub mode: AnalysisMode,
    /// Auto switches to Steensgaard at this constraint count
    pub auto_threshold: usize,
    pub deadline: Option<Duration>,
    pub enable_parallel: bool,
    /// Parallel Andersen only pays off past this constraint count
    pub parallel_threshold: usize,
}

impl Default for PointsToConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Auto,
            auto_threshold: DEFAULT_AUTO_THRESHOLD,
            deadline: None,
            enable_parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

pub struct PointsToAnalyzer {
    config: PointsToConfig,
}

impl PointsToAnalyzer {
    pub fn new(config: PointsToConfig) -> Self {
        Self { config }
    }

    /// Analyzer for taint contexts: Andersen, no auto-degradation
    pub fn for_taint(deadline: Option<Duration>) -> Self {
        Self::new(PointsToConfig {
            mode: AnalysisMode::Andersen,
            deadline,
            ..Default::default()
        })
    }

    /// Mode that would run for a given constraint count (deterministic)
    pub fn effective_mode(&self, constraint_count: usize) -> AnalysisMode {
        match self.config.mode {
            AnalysisMode::Auto => {
                if constraint_count >= self.config.auto_threshold {
                    AnalysisMode::Steensgaard
                } else {
                    AnalysisMode::Andersen
                }
            }
            explicit => explicit,
        }
    }

    pub fn analyze(&self, constraints: Vec<Constraint>) -> PointsToResult {
        let mode = self.effective_mode(constraints.len());
        info!(
            constraints = constraints.len(),
            ?mode,
            "running points-to analysis"
        );
        match mode {
            AnalysisMode::Steensgaard => {
                let mut solver = SteensgaardSolver::new();
                solver.add_constraints(constraints);
                solver.solve()
            }
            AnalysisMode::Andersen | AnalysisMode::Auto => {
                if self.config.enable_parallel
                    && constraints.len() >= self.config.parallel_threshold
                {
                    let mut solver = ParallelAndersenSolver::new(ParallelAndersenConfig {
                        deadline: self.config.deadline,
                    });
                    solver.add_constraints(constraints);
                    solver.solve()
                } else {
                    let mut solver = AndersenSolver::new(AndersenConfig {
                        deadline: self.config.deadline,
                        ..Default::default()
                    });
                    solver.add_constraints(constraints);
                    solver.solve()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_constraints(count: usize) -> Vec<Constraint> {
        let mut out = Vec::with_capacity(count);
        for i in 0..count as u32 {
            if i % 3 == 0 {
                out.push(Constraint::alloc(i, i));
            } else {
                out.push(Constraint::copy(i, i - 1));
            }
        }
        out
    }

    #[test]
    fn auto_threshold_switches_solver() {
        let analyzer = PointsToAnalyzer::new(PointsToConfig::default());
        assert_eq!(analyzer.effective_mode(2900), AnalysisMode::Andersen);
        assert_eq!(analyzer.effective_mode(3100), AnalysisMode::Steensgaard);
        assert_eq!(analyzer.effective_mode(3000), AnalysisMode::Steensgaard);
    }

    #[test]
    fn taint_context_forces_andersen_even_when_large() {
        let analyzer = PointsToAnalyzer::for_taint(None);
        assert_eq!(analyzer.effective_mode(1_000_000), AnalysisMode::Andersen);
    }

    #[test]
    fn auto_results_match_selected_mode_contract() {
        // below threshold: precise mode
        let analyzer = PointsToAnalyzer::new(PointsToConfig::default());
        let small = analyzer.analyze(synthetic_constraints(2900));
        assert_eq!(small.mode, AnalysisMode::Andersen);

        // above threshold: fast mode; its aliases must cover Andersen's
        let large_constraints = synthetic_constraints(3100);
        let large = analyzer.analyze(large_constraints.clone());
        assert_eq!(large.mode, AnalysisMode::Steensgaard);

        let mut reference = super::super::andersen::AndersenSolver::default();
        reference.add_constraints(large_constraints);
        let precise = reference.solve();
        for (a, b) in [(1u32, 2u32), (4, 5), (7, 8), (10, 11)] {
            if precise.may_alias(a, b) {
                assert!(large.may_alias(a, b));
            }
        }
    }
}
