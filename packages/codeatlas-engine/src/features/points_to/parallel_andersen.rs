//! Parallel Andersen solver
//!
//! Round-based frontier propagation: each round processes the changed
//! variables in parallel (rayon work-stealing over batches), with
//! per-variable locks around the sparse bitmaps and a lock-free seen-set for
//! copy-edge insertion. Clone-then-lock propagation keeps lock acquisition
//! single-level, so no ordering discipline is required.
//!
//! The fixpoint of the inclusion system is unique, so this solver and the
//! sequential reference produce identical alias relations.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashSet;
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::andersen::{PointsToResult, SolverStats};
use super::domain::{AnalysisMode, Constraint, ConstraintKind, LocationId, PointsToGraph, VarId};
use super::sparse_bitmap::SparseBitmap;

/// Frontier batch size per stolen work item
const BATCH: usize = 64;

#[derive(Debug, Clone)]
pub struct ParallelAndersenConfig {
    pub deadline: Option<Duration>,
}

impl Default for ParallelAndersenConfig {
    fn default() -> Self {
        Self { deadline: None }
    }
}

#[derive(Default)]
pub struct ParallelAndersenSolver {
    config: ParallelAndersenConfig,
    constraints: Vec<Constraint>,
}

impl ParallelAndersenSolver {
    pub fn new(config: ParallelAndersenConfig) -> Self {
        Self {
            config,
            constraints: Vec::new(),
        }
    }

    pub fn add_constraints(&mut self, constraints: impl IntoIterator<Item = Constraint>) {
        self.constraints.extend(constraints);
    }

    pub fn solve(&self) -> PointsToResult {
        let started = Instant::now();
        let mut stats = SolverStats {
            constraints_total: self.constraints.len(),
            ..Default::default()
        };

        let mut max_var: VarId = 0;
        let mut max_loc: LocationId = 0;
        for c in &self.constraints {
            max_var = max_var.max(c.lhs);
            if c.kind == ConstraintKind::Alloc {
                max_loc = max_loc.max(c.rhs);
            } else {
                max_var = max_var.max(c.rhs);
            }
        }
        let deref_base = max_var + 1;
        let total_vars = (deref_base + max_loc + 2) as usize;
        let deref = |loc: LocationId| deref_base + loc;

        let pts: Vec<Mutex<SparseBitmap>> =
            (0..total_vars).map(|_| Mutex::new(SparseBitmap::new())).collect();
        let copy_out: Vec<Mutex<Vec<VarId>>> =
            (0..total_vars).map(|_| Mutex::new(Vec::new())).collect();
        let copy_seen: DashSet<(VarId, VarId)> = DashSet::new();
        let queued: Vec<AtomicBool> = (0..total_vars).map(|_| AtomicBool::new(false)).collect();
        let propagations = AtomicUsize::new(0);

        let mut loads_by_pointer: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();
        let mut stores_by_pointer: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();
        let mut frontier: Vec<VarId> = Vec::new();

        for c in &self.constraints {
            match c.kind {
                ConstraintKind::Alloc => {
                    if pts[c.lhs as usize].lock().insert(c.rhs)
                        && !queued[c.lhs as usize].swap(true, Ordering::AcqRel)
                    {
                        frontier.push(c.lhs);
                    }
                }
                ConstraintKind::Copy => {
                    if c.rhs != c.lhs && copy_seen.insert((c.rhs, c.lhs)) {
                        copy_out[c.rhs as usize].lock().push(c.lhs);
                    }
                }
                ConstraintKind::Load => {
                    loads_by_pointer.entry(c.rhs).or_default().push(c.lhs);
                }
                ConstraintKind::Store => {
                    stores_by_pointer.entry(c.lhs).or_default().push(c.rhs);
                }
            }
        }

        let mut partial = false;
        while !frontier.is_empty() {
            if let Some(deadline) = self.config.deadline {
                if started.elapsed() > deadline {
                    partial = true;
                    break;
                }
            }
            let next: Mutex<Vec<VarId>> = Mutex::new(Vec::new());

            frontier.par_chunks(BATCH).for_each(|batch| {
                let mut local_next = Vec::new();
                for &var in batch {
                    queued[var as usize].store(false, Ordering::Release);
                    let locations: Vec<LocationId> =
                        pts[var as usize].lock().iter().collect();

                    let mut propagate = |from: VarId, to: VarId| {
                        let source = pts[from as usize].lock().clone();
                        if source.is_empty() {
                            return;
                        }
                        let changed = pts[to as usize].lock().union_with(&source);
                        if changed {
                            propagations.fetch_add(1, Ordering::Relaxed);
                            if !queued[to as usize].swap(true, Ordering::AcqRel) {
                                local_next.push(to);
                            }
                        }
                    };

                    if let Some(targets) = loads_by_pointer.get(&var) {
                        for &loc in &locations {
                            let d = deref(loc);
                            for &target in targets {
                                if copy_seen.insert((d, target)) {
                                    copy_out[d as usize].lock().push(target);
                                }
                                propagate(d, target);
                            }
                        }
                    }
                    if let Some(sources) = stores_by_pointer.get(&var) {
                        for &loc in &locations {
                            let d = deref(loc);
                            for &source in sources {
                                if copy_seen.insert((source, d)) {
                                    copy_out[source as usize].lock().push(d);
                                }
                                propagate(source, d);
                            }
                        }
                    }
                    let targets = copy_out[var as usize].lock().clone();
                    for target in targets {
                        propagate(var, target);
                    }
                }
                if !local_next.is_empty() {
                    next.lock().append(&mut local_next);
                }
            });

            frontier = next.into_inner();
        }

        let mut graph = PointsToGraph::new();
        for (var, set) in pts.iter().enumerate() {
            let set = set.lock();
            for loc in set.iter() {
                graph.insert(var as VarId, loc);
            }
        }

        stats.propagations = propagations.load(Ordering::Relaxed);
        stats.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        PointsToResult::new(
            graph,
            FxHashMap::default(),
            AnalysisMode::Andersen,
            partial,
            stats,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::andersen::AndersenSolver;

    fn fixture_constraints() -> Vec<Constraint> {
        vec![
            Constraint::alloc(1, 100),
            Constraint::alloc(2, 200),
            Constraint::copy(3, 1),
            Constraint::copy(4, 3),
            Constraint::store(1, 2),
            Constraint::load(5, 1),
            Constraint::copy(6, 5),
        ]
    }

    #[test]
    fn matches_sequential_reference_on_fixture() {
        let mut sequential = AndersenSolver::default();
        sequential.add_constraints(fixture_constraints());
        let seq = sequential.solve();

        let mut parallel = ParallelAndersenSolver::default();
        parallel.add_constraints(fixture_constraints());
        let par = parallel.solve();

        for a in 1..=6u32 {
            for b in 1..=6u32 {
                assert_eq!(
                    seq.may_alias(a, b),
                    par.may_alias(a, b),
                    "alias({a},{b}) diverged between solvers"
                );
            }
        }
    }

    #[test]
    fn wide_fanout_converges() {
        let mut constraints = vec![Constraint::alloc(0, 7)];
        for i in 1..500u32 {
            constraints.push(Constraint::copy(i, i - 1));
        }
        let mut parallel = ParallelAndersenSolver::default();
        parallel.add_constraints(constraints);
        let result = parallel.solve();
        assert!(!result.partial);
        assert_eq!(result.locations_of(499), vec![7]);
    }
}
