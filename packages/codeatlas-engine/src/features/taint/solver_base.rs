//! Shared taint solver base
//!
//! Owns everything the three strategies have in common: the interprocedural
//! worklist loop, the function summary cache, path-edge bookkeeping and
//! source→sink path reconstruction. A strategy contributes only its fact
//! transfer and merge functions.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

use super::domain::{
    FunctionId, Statement, TaintAnalysisResult, TaintFact, TaintFunction, TaintPath, TaintPolicy,
    TaintProgram, TaintStep,
};

/// A fact plus the interprocedural steps that produced it
#[derive(Debug, Clone)]
pub struct TrackedFact {
    pub fact: TaintFact,
    pub steps: Vec<TaintStep>,
    /// IDE value component: number of sanitizers traversed
    pub sanitize_hops: u32,
}

/// Per-variable fact environment inside one function activation
pub type FactEnv = HashMap<String, Vec<TrackedFact>>;

/// Strategy hooks: transfer for intra-procedural statements, merge for
/// joining a fact into an environment slot.
pub trait FlowFunctions: Send + Sync {
    /// Facts flowing out of an intra-procedural statement for one incoming
    /// tracked fact bound to `Statement`'s source variable
    fn transfer(
        &self,
        policy: &TaintPolicy,
        statement: &Statement,
        incoming: &TrackedFact,
    ) -> Vec<TrackedFact>;

    /// Join `incoming` into `slot`; true when the environment changed
    fn merge(&self, slot: &mut Vec<TrackedFact>, incoming: TrackedFact) -> bool;

    /// Flow-insensitive strategies iterate statements to a local fixpoint
    fn flow_insensitive(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub max_call_depth: usize,
    pub summary_cache_size: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 32,
            summary_cache_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FunctionSummary {
    returned: Vec<TrackedFact>,
    sink_paths: Vec<TaintPath>,
}

/// Append a path unless an equivalent one is already recorded
fn push_path(paths: &mut Vec<TaintPath>, path: TaintPath) -> bool {
    let duplicate = paths.iter().any(|p| {
        p.source_name == path.source_name
            && p.sink_name == path.sink_name
            && p.label == path.label
            && p.sanitizer_passed == path.sanitizer_passed
    });
    if duplicate {
        return false;
    }
    paths.push(path);
    true
}

pub struct BaseSolver<'a, S: FlowFunctions> {
    strategy: &'a S,
    config: SolverConfig,
    summaries: LruCache<(FunctionId, Vec<TaintFact>), FunctionSummary>,
    facts_propagated: usize,
    functions_analyzed: usize,
}

impl<'a, S: FlowFunctions> BaseSolver<'a, S> {
    pub fn new(strategy: &'a S, config: SolverConfig) -> Self {
        let capacity = NonZeroUsize::new(config.summary_cache_size.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            strategy,
            config,
            summaries: LruCache::new(capacity),
            facts_propagated: 0,
            functions_analyzed: 0,
        }
    }

    pub fn solve(&mut self, program: &TaintProgram, policy: &TaintPolicy) -> TaintAnalysisResult {
        let mut paths: Vec<TaintPath> = Vec::new();
        for entry in &program.entry_points {
            let Some(function) = program.function(entry) else {
                continue;
            };
            let mut call_stack = HashSet::new();
            let summary = self.analyze_function(
                program,
                policy,
                function,
                Vec::new(),
                &mut call_stack,
                0,
            );
            paths.extend(summary.sink_paths);
        }

        // path-edge dedup: one report per (source, sink, label, sanitized)
        let mut seen: HashSet<(String, String, String, bool)> = HashSet::new();
        paths.retain(|p| {
            seen.insert((
                p.source_name.clone(),
                p.sink_name.clone(),
                p.label.clone(),
                p.sanitizer_passed,
            ))
        });

        debug!(
            paths = paths.len(),
            functions = self.functions_analyzed,
            facts = self.facts_propagated,
            "taint solve complete"
        );
        TaintAnalysisResult {
            paths,
            partial: false,
            functions_analyzed: self.functions_analyzed,
            facts_propagated: self.facts_propagated,
        }
    }

    /// Analyze one function given tracked facts bound to its parameters.
    /// Summaries are cached on (function, entry facts).
    fn analyze_function(
        &mut self,
        program: &TaintProgram,
        policy: &TaintPolicy,
        function: &TaintFunction,
        entry: Vec<TrackedFact>,
        call_stack: &mut HashSet<FunctionId>,
        depth: usize,
    ) -> FunctionSummary {
        let cache_key = {
            let mut facts: Vec<TaintFact> = entry.iter().map(|t| t.fact.clone()).collect();
            facts.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
            (function.id.clone(), facts)
        };
        if let Some(summary) = self.summaries.get(&cache_key) {
            return summary.clone();
        }
        if depth > self.config.max_call_depth || !call_stack.insert(function.id.clone()) {
            return FunctionSummary::default(); // recursion / depth cutoff
        }
        self.functions_analyzed += 1;

        let mut env: FactEnv = HashMap::new();
        for tracked in entry {
            let slot = env.entry(tracked.fact.variable.clone()).or_default();
            self.strategy.merge(slot, tracked);
        }
        let mut summary = FunctionSummary::default();

        let passes = if self.strategy.flow_insensitive() {
            function.statements.len().max(1)
        } else {
            1
        };
        for _ in 0..passes {
            let mut changed = false;
            for statement in &function.statements {
                changed |= self.apply_statement(
                    program,
                    policy,
                    function,
                    statement,
                    &mut env,
                    &mut summary,
                    call_stack,
                    depth,
                );
            }
            if !changed {
                break;
            }
        }

        call_stack.remove(&function.id);
        self.summaries.put(cache_key, summary.clone());
        summary
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_statement(
        &mut self,
        program: &TaintProgram,
        policy: &TaintPolicy,
        function: &TaintFunction,
        statement: &Statement,
        env: &mut FactEnv,
        summary: &mut FunctionSummary,
        call_stack: &mut HashSet<FunctionId>,
        depth: usize,
    ) -> bool {
        let mut changed = false;
        match statement {
            Statement::SourceCall { to, source_name, line } => {
                let Some(label) = policy.sources.get(source_name) else {
                    return false;
                };
                let tracked = TrackedFact {
                    fact: TaintFact {
                        variable: to.clone(),
                        label: label.clone(),
                        source_name: source_name.clone(),
                        sanitizer_passed: false,
                    },
                    steps: vec![TaintStep {
                        function: function.id.clone(),
                        description: format!("source {source_name} -> {to}"),
                        line: *line,
                    }],
                    sanitize_hops: 0,
                };
                self.facts_propagated += 1;
                changed |= self.strategy.merge(env.entry(to.clone()).or_default(), tracked);
            }
            Statement::Assign { to, from } | Statement::Sanitize { to, from, .. } => {
                let incoming: Vec<TrackedFact> =
                    env.get(from).cloned().unwrap_or_default();
                for tracked in incoming {
                    for out in self.strategy.transfer(policy, statement, &tracked) {
                        self.facts_propagated += 1;
                        changed |= self
                            .strategy
                            .merge(env.entry(to.clone()).or_default(), out);
                    }
                }
            }
            Statement::SinkCall { from, sink_name, line } => {
                for tracked in env.get(from).cloned().unwrap_or_default() {
                    if !policy.sink_accepts(sink_name, &tracked.fact.label) {
                        continue;
                    }
                    let mut steps = tracked.steps.clone();
                    steps.push(TaintStep {
                        function: function.id.clone(),
                        description: format!("sink {sink_name}({from})"),
                        line: *line,
                    });
                    let path = TaintPath {
                        source_name: tracked.fact.source_name.clone(),
                        sink_name: sink_name.clone(),
                        label: tracked.fact.label.clone(),
                        steps,
                        sanitizer_passed: tracked.fact.sanitizer_passed
                            || tracked.sanitize_hops > 0,
                    };
                    changed |= push_path(&mut summary.sink_paths, path);
                }
            }
            Statement::Call { callee, args, to, line } => {
                let Some(callee_fn) = program.function(callee) else {
                    return false;
                };
                let mut callee_entry: Vec<TrackedFact> = Vec::new();
                for (arg, param) in args.iter().zip(callee_fn.params.iter()) {
                    for tracked in env.get(arg).cloned().unwrap_or_default() {
                        let mut bound = tracked.clone();
                        bound.fact.variable = param.clone();
                        bound.steps.push(TaintStep {
                            function: function.id.clone(),
                            description: format!("call {callee}({arg} -> {param})"),
                            line: *line,
                        });
                        callee_entry.push(bound);
                    }
                }
                let callee_summary = self.analyze_function(
                    program,
                    policy,
                    callee_fn,
                    callee_entry,
                    call_stack,
                    depth + 1,
                );
                for path in callee_summary.sink_paths {
                    changed |= push_path(&mut summary.sink_paths, path);
                }
                if let Some(to) = to {
                    for mut returned in callee_summary.returned {
                        returned.fact.variable = to.clone();
                        returned.steps.push(TaintStep {
                            function: function.id.clone(),
                            description: format!("return {callee} -> {to}"),
                            line: *line,
                        });
                        self.facts_propagated += 1;
                        changed |= self
                            .strategy
                            .merge(env.entry(to.clone()).or_default(), returned);
                    }
                }
            }
            Statement::Return { value } => {
                for tracked in env.get(value).cloned().unwrap_or_default() {
                    if !summary.returned.iter().any(|t| t.fact == tracked.fact) {
                        summary.returned.push(tracked);
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}
