//! Andersen's points-to analysis (sequential reference solver)
//!
//! Inclusion-based worklist solver with SCC collapse over the initial copy
//! graph. This is the reference implementation: the parallel solver must
//! produce identical alias relations on the unit-test fixtures.
//!
//! References:
//! - Andersen, "Program Analysis and Specialization for C" (1994)
//! - Hardekopf & Lin, "The Ant and the Grasshopper" (PLDI 2007)

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use super::domain::{AnalysisMode, Constraint, ConstraintKind, LocationId, PointsToGraph, VarId};
use super::scc::detect_sccs;

#[derive(Debug, Clone)]
pub struct AndersenConfig {
    pub enable_scc: bool,
    /// 0 = unlimited
    pub max_iterations: usize,
    pub deadline: Option<Duration>,
}

impl Default for AndersenConfig {
    fn default() -> Self {
        Self {
            enable_scc: true,
            max_iterations: 0,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    pub constraints_total: usize,
    pub scc_collapsed: usize,
    pub propagations: usize,
    pub duration_ms: f64,
}

/// Result shared by all points-to solvers. On deadline expiry `partial` is
/// set and the best-effort relation computed so far is returned.
#[derive(Debug)]
pub struct PointsToResult {
    graph: PointsToGraph,
    /// var → solved representative (SCC collapse / unification)
    rep: FxHashMap<VarId, VarId>,
    pub mode: AnalysisMode,
    pub partial: bool,
    pub stats: SolverStats,
}

impl PointsToResult {
    pub(super) fn new(
        graph: PointsToGraph,
        rep: FxHashMap<VarId, VarId>,
        mode: AnalysisMode,
        partial: bool,
        stats: SolverStats,
    ) -> Self {
        Self {
            graph,
            rep,
            mode,
            partial,
            stats,
        }
    }

    fn rep_of(&self, var: VarId) -> VarId {
        self.rep.get(&var).copied().unwrap_or(var)
    }

    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        let (ra, rb) = (self.rep_of(a), self.rep_of(b));
        if ra == rb {
            return self
                .graph
                .points_to(ra)
                .is_some_and(|set| !set.is_empty());
        }
        self.graph.may_alias(ra, rb)
    }

    pub fn locations_of(&self, var: VarId) -> Vec<LocationId> {
        self.graph.locations_of(self.rep_of(var))
    }

    pub fn graph(&self) -> &PointsToGraph {
        &self.graph
    }
}

#[derive(Default)]
pub struct AndersenSolver {
    config: AndersenConfig,
    constraints: Vec<Constraint>,
}

impl AndersenSolver {
    pub fn new(config: AndersenConfig) -> Self {
        Self {
            config,
            constraints: Vec::new(),
        }
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn add_constraints(&mut self, constraints: impl IntoIterator<Item = Constraint>) {
        self.constraints.extend(constraints);
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn solve(&self) -> PointsToResult {
        let started = Instant::now();
        let mut stats = SolverStats {
            constraints_total: self.constraints.len(),
            ..Default::default()
        };

        // Collapse copy cycles first
        let mut vars: FxHashSet<VarId> = FxHashSet::default();
        let mut max_var: VarId = 0;
        let mut max_loc: LocationId = 0;
        for c in &self.constraints {
            vars.insert(c.lhs);
            max_var = max_var.max(c.lhs);
            if c.kind == ConstraintKind::Alloc {
                max_loc = max_loc.max(c.rhs);
            } else {
                vars.insert(c.rhs);
                max_var = max_var.max(c.rhs);
            }
        }

        let rep_map = if self.config.enable_scc {
            let mut copy_edges: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();
            for c in &self.constraints {
                if c.kind == ConstraintKind::Copy {
                    copy_edges.entry(c.rhs).or_default().push(c.lhs);
                }
            }
            let var_list: Vec<VarId> = vars.iter().copied().collect();
            let scc = detect_sccs(&var_list, &copy_edges);
            stats.scc_collapsed = scc.collapsed_vars;
            scc.representative
        } else {
            FxHashMap::default()
        };
        let rep = |v: VarId| rep_map.get(&v).copied().unwrap_or(v);

        // Synthetic deref variable per abstract location
        let deref_base = max_var + 1;
        let deref = |loc: LocationId| deref_base + loc;

        let mut graph = PointsToGraph::new();
        let mut copy_out: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();
        let mut copy_seen: FxHashSet<(VarId, VarId)> = FxHashSet::default();
        let mut loads_by_pointer: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();
        let mut stores_by_pointer: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();
        let mut worklist: VecDeque<VarId> = VecDeque::new();
        let mut queued: FxHashSet<VarId> = FxHashSet::default();

        let add_copy = |from: VarId,
                            to: VarId,
                            copy_out: &mut FxHashMap<VarId, Vec<VarId>>,
                            copy_seen: &mut FxHashSet<(VarId, VarId)>|
         -> bool {
            from != to && copy_seen.insert((from, to)) && {
                copy_out.entry(from).or_default().push(to);
                true
            }
        };

        for c in &self.constraints {
            match c.kind {
                ConstraintKind::Alloc => {
                    let lhs = rep(c.lhs);
                    if graph.insert(lhs, c.rhs) && queued.insert(lhs) {
                        worklist.push_back(lhs);
                    }
                }
                ConstraintKind::Copy => {
                    add_copy(rep(c.rhs), rep(c.lhs), &mut copy_out, &mut copy_seen);
                }
                ConstraintKind::Load => {
                    loads_by_pointer.entry(rep(c.rhs)).or_default().push(rep(c.lhs));
                }
                ConstraintKind::Store => {
                    stores_by_pointer.entry(rep(c.lhs)).or_default().push(rep(c.rhs));
                }
            }
        }

        let mut partial = false;
        let mut processed: usize = 0;
        while let Some(var) = worklist.pop_front() {
            queued.remove(&var);
            processed += 1;
            if self.config.max_iterations > 0 && processed > self.config.max_iterations {
                partial = true;
                break;
            }
            if processed % 256 == 0 {
                if let Some(deadline) = self.config.deadline {
                    if started.elapsed() > deadline {
                        partial = true;
                        break;
                    }
                }
            }

            let locations = graph.locations_of(var);

            // x = *v : pts(x) ⊇ pts(deref(o)) for every o ∈ pts(v)
            if let Some(load_targets) = loads_by_pointer.get(&var).cloned() {
                for &loc in &locations {
                    let d = deref(loc);
                    for &target in &load_targets {
                        if add_copy(d, target, &mut copy_out, &mut copy_seen)
                            && graph.union_into(target, d)
                        {
                            stats.propagations += 1;
                            if queued.insert(target) {
                                worklist.push_back(target);
                            }
                        }
                    }
                }
            }

            // *v = y : pts(deref(o)) ⊇ pts(y) for every o ∈ pts(v)
            if let Some(store_sources) = stores_by_pointer.get(&var).cloned() {
                for &loc in &locations {
                    let d = deref(loc);
                    for &source in &store_sources {
                        add_copy(source, d, &mut copy_out, &mut copy_seen);
                        if graph.union_into(d, source) {
                            stats.propagations += 1;
                            if queued.insert(d) {
                                worklist.push_back(d);
                            }
                        }
                    }
                }
            }

            // plain copy propagation
            if let Some(targets) = copy_out.get(&var).cloned() {
                for target in targets {
                    if graph.union_into(target, var) {
                        stats.propagations += 1;
                        if queued.insert(target) {
                            worklist.push_back(target);
                        }
                    }
                }
            }
        }

        stats.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        PointsToResult::new(graph, rep_map, AnalysisMode::Andersen, partial, stats)
    }
}
