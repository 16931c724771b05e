//! Solver strategies
//!
//! All three produce the same result shape; they differ only in fact merge
//! and transfer:
//! - IFDS: binary facts, flow-sensitive tabulation (Reps-Horwitz-Sagiv)
//! - IDE: facts carry a value component (sanitizer hop count) merged by min
//! - interprocedural dataflow: set-based, flow-insensitive per function

use super::domain::{Statement, TaintPolicy};
use super::solver_base::{FlowFunctions, TrackedFact};

fn rename_to(incoming: &TrackedFact, to: &str) -> TrackedFact {
    let mut out = incoming.clone();
    out.fact.variable = to.to_string();
    out
}

/// Shared Assign/Sanitize transfer used by the set-based strategies
fn set_transfer(
    policy: &TaintPolicy,
    statement: &Statement,
    incoming: &TrackedFact,
) -> Vec<TrackedFact> {
    match statement {
        Statement::Assign { to, .. } => vec![rename_to(incoming, to)],
        Statement::Sanitize {
            to,
            sanitizer_name,
            ..
        } => {
            if policy.sanitizer_clears(sanitizer_name, &incoming.fact.label) {
                Vec::new() // label cleared, fact dies
            } else {
                let mut out = rename_to(incoming, to);
                out.fact.sanitizer_passed = true;
                out.sanitize_hops = out.sanitize_hops.saturating_add(1);
                vec![out]
            }
        }
        _ => Vec::new(),
    }
}

/// Merge keyed on the full fact (binary lattice)
fn set_merge(slot: &mut Vec<TrackedFact>, incoming: TrackedFact) -> bool {
    if slot.iter().any(|t| t.fact == incoming.fact) {
        return false;
    }
    slot.push(incoming);
    true
}

/// IFDS tabulation flavor
pub struct IfdsFlow;

impl FlowFunctions for IfdsFlow {
    fn transfer(
        &self,
        policy: &TaintPolicy,
        statement: &Statement,
        incoming: &TrackedFact,
    ) -> Vec<TrackedFact> {
        set_transfer(policy, statement, incoming)
    }

    fn merge(&self, slot: &mut Vec<TrackedFact>, incoming: TrackedFact) -> bool {
        set_merge(slot, incoming)
    }
}

/// IDE flavor: environment values are sanitizer hop counts, joined by min
pub struct IdeFlow;

impl FlowFunctions for IdeFlow {
    fn transfer(
        &self,
        policy: &TaintPolicy,
        statement: &Statement,
        incoming: &TrackedFact,
    ) -> Vec<TrackedFact> {
        set_transfer(policy, statement, incoming)
    }

    fn merge(&self, slot: &mut Vec<TrackedFact>, incoming: TrackedFact) -> bool {
        // join on (variable, label, source): keep the minimum hop count
        for existing in slot.iter_mut() {
            if existing.fact.label == incoming.fact.label
                && existing.fact.source_name == incoming.fact.source_name
            {
                if incoming.sanitize_hops < existing.sanitize_hops {
                    *existing = incoming;
                    return true;
                }
                return false;
            }
        }
        slot.push(incoming);
        true
    }
}

/// Flow-insensitive interprocedural dataflow flavor
pub struct DataflowFlow;

impl FlowFunctions for DataflowFlow {
    fn transfer(
        &self,
        policy: &TaintPolicy,
        statement: &Statement,
        incoming: &TrackedFact,
    ) -> Vec<TrackedFact> {
        set_transfer(policy, statement, incoming)
    }

    fn merge(&self, slot: &mut Vec<TrackedFact>, incoming: TrackedFact) -> bool {
        set_merge(slot, incoming)
    }

    fn flow_insensitive(&self) -> bool {
        true
    }
}
