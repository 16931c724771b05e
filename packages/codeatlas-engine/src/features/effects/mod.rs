//! Effect classification
//!
//! Assigns each callable an effect class by seeding from well-known callee
//! names and propagating along resolved call edges to a fixpoint: a caller
//! inherits the union of its callees' effects. Functions with no observed
//! effectful calls are Pure.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::features::graph::CodeGraph;
use crate::shared::ids::is_external_sentinel;
use crate::shared::models::EdgeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectClass {
    ReadsIo,
    WritesIo,
    Network,
    Spawns,
}

/// Result: callable node id → effect set (empty set = pure)
#[derive(Debug, Default)]
pub struct EffectAnalysisResult {
    pub effects: HashMap<String, HashSet<EffectClass>>,
}

impl EffectAnalysisResult {
    pub fn is_pure(&self, node_id: &str) -> bool {
        self.effects.get(node_id).is_none_or(HashSet::is_empty)
    }

    pub fn effects_of(&self, node_id: &str) -> Vec<EffectClass> {
        let mut out: Vec<EffectClass> = self
            .effects
            .get(node_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}

const READ_PATTERNS: &[&str] = &["read", "open", "load", "input", "recv", "get_file"];
const WRITE_PATTERNS: &[&str] = &["write", "print", "save", "dump", "log", "append"];
const NETWORK_PATTERNS: &[&str] = &["http", "fetch", "request", "connect", "send", "socket"];
const SPAWN_PATTERNS: &[&str] = &["spawn", "thread", "fork", "exec", "subprocess"];

pub struct EffectAnalyzer;

impl EffectAnalyzer {
    pub fn analyze(graph: &CodeGraph) -> EffectAnalysisResult {
        let mut result = EffectAnalysisResult::default();

        // seed: direct calls to effectful externals
        let mut callers_of: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in graph.edges() {
            if edge.kind != EdgeKind::Calls {
                continue;
            }
            callers_of
                .entry(edge.target_id.as_str())
                .or_default()
                .push(edge.source_id.as_str());
            if is_external_sentinel(&edge.target_id) {
                let callee = edge
                    .target_id
                    .rsplit("::")
                    .next()
                    .unwrap_or("")
                    .to_lowercase();
                for effect in classify_name(&callee) {
                    result
                        .effects
                        .entry(edge.source_id.clone())
                        .or_default()
                        .insert(effect);
                }
            }
        }

        // propagate callee effects to callers until stable
        loop {
            let mut changed = false;
            for edge in graph.edges() {
                if edge.kind != EdgeKind::Calls || is_external_sentinel(&edge.target_id) {
                    continue;
                }
                let callee_effects: Vec<EffectClass> = result
                    .effects
                    .get(&edge.target_id)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default();
                if callee_effects.is_empty() {
                    continue;
                }
                let caller = result.effects.entry(edge.source_id.clone()).or_default();
                for effect in callee_effects {
                    changed |= caller.insert(effect);
                }
            }
            if !changed {
                break;
            }
        }
        result
    }
}

fn classify_name(callee: &str) -> Vec<EffectClass> {
    let mut out = Vec::new();
    if NETWORK_PATTERNS.iter().any(|p| callee.contains(p)) {
        out.push(EffectClass::Network);
    }
    if SPAWN_PATTERNS.iter().any(|p| callee.contains(p)) {
        out.push(EffectClass::Spawns);
    }
    // network/spawn names often contain "send"/"read" too; classify IO last
    if out.is_empty() {
        if READ_PATTERNS.iter().any(|p| callee.contains(p)) {
            out.push(EffectClass::ReadsIo);
        }
        if WRITE_PATTERNS.iter().any(|p| callee.contains(p)) {
            out.push(EffectClass::WritesIo);
        }
    }
    out
}
