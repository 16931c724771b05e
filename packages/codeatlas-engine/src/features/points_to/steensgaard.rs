//! Steensgaard's points-to analysis
//!
//! Unification-based: `x = y` merges the equivalence classes of x and y, so
//! constraint solving is almost linear, O(n·α(n)). Coarser than Andersen:
//! every alias Andersen proves is also proved here, never the other way
//! around.
//!
//! Reference: Steensgaard, "Points-to Analysis in Almost Linear Time"
//! (POPL 1996)

use std::time::Instant;

use rustc_hash::FxHashMap;

use super::andersen::{PointsToResult, SolverStats};
use super::domain::{AnalysisMode, Constraint, ConstraintKind, LocationId, PointsToGraph, VarId};
use super::sparse_bitmap::SparseBitmap;
use super::union_find::UnionFind;

#[derive(Default)]
pub struct SteensgaardSolver {
    constraints: Vec<Constraint>,
}

impl SteensgaardSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
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
        for c in &self.constraints {
            max_var = max_var.max(c.lhs);
            if c.kind != ConstraintKind::Alloc {
                max_var = max_var.max(c.rhs);
            }
        }

        let mut uf = UnionFind::new();
        let mut pts: FxHashMap<VarId, SparseBitmap> = FxHashMap::default();
        // synthetic deref var per location, allocated past the var space
        let mut deref_vars: FxHashMap<LocationId, VarId> = FxHashMap::default();
        let mut next_var = max_var + 1;

        // union that also merges the points-to sets of the two roots
        fn merge(
            uf: &mut UnionFind,
            pts: &mut FxHashMap<VarId, SparseBitmap>,
            a: VarId,
            b: VarId,
        ) -> bool {
            let ra = uf.find(a);
            let rb = uf.find(b);
            let Some(winner) = uf.union(ra, rb) else {
                return false;
            };
            let loser = if winner == ra { rb } else { ra };
            if let Some(loser_set) = pts.remove(&loser) {
                pts.entry(winner).or_default().union_with(&loser_set);
            }
            true
        }

        // Unification is order-insensitive but deref edges depend on pts
        // contents, so iterate to a (quick) fixpoint.
        loop {
            let mut changed = false;
            for c in &self.constraints {
                match c.kind {
                    ConstraintKind::Alloc => {
                        let root = uf.find(c.lhs);
                        changed |= pts.entry(root).or_default().insert(c.rhs);
                    }
                    ConstraintKind::Copy => {
                        changed |= merge(&mut uf, &mut pts, c.lhs, c.rhs);
                    }
                    ConstraintKind::Load => {
                        // x = *y : unify x with the deref class of every
                        // location y points at
                        let root = uf.find(c.rhs);
                        let locations: Vec<LocationId> = pts
                            .get(&root)
                            .map(|s| s.iter().collect())
                            .unwrap_or_default();
                        for loc in locations {
                            let d = *deref_vars.entry(loc).or_insert_with(|| {
                                let v = next_var;
                                next_var += 1;
                                v
                            });
                            changed |= merge(&mut uf, &mut pts, c.lhs, d);
                        }
                    }
                    ConstraintKind::Store => {
                        // *x = y : unify y with the deref class of every
                        // location x points at
                        let root = uf.find(c.lhs);
                        let locations: Vec<LocationId> = pts
                            .get(&root)
                            .map(|s| s.iter().collect())
                            .unwrap_or_default();
                        for loc in locations {
                            let d = *deref_vars.entry(loc).or_insert_with(|| {
                                let v = next_var;
                                next_var += 1;
                                v
                            });
                            changed |= merge(&mut uf, &mut pts, c.rhs, d);
                        }
                    }
                }
            }
            stats.propagations += 1;
            if !changed {
                break;
            }
        }

        // Materialize: every var reads its root's set
        let mut graph = PointsToGraph::new();
        let mut rep: FxHashMap<VarId, VarId> = FxHashMap::default();
        for var in 0..=max_var {
            let root = uf.find(var);
            rep.insert(var, root);
        }
        let roots: Vec<VarId> = pts.keys().copied().collect();
        for root in roots {
            if let Some(set) = pts.get(&root) {
                for loc in set.iter() {
                    graph.insert(root, loc);
                }
            }
        }

        stats.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        PointsToResult::new(graph, rep, AnalysisMode::Steensgaard, false, stats)
    }
}
