//! IR edges
//!
//! Both endpoints must exist in the same snapshot view, unless the target is
//! an `external::{lang}::{fqn}` sentinel left by the cross-file resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Edge kind across the IR / graph layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Contains,
    Calls,
    Imports,
    Reads,
    Writes,
    ReferencesType,
    Defines,
    CfgNormal,
    CfgBranch,
    CfgLoopback,
    CfgException,
    DfgDefUse,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Reads => "READS",
            EdgeKind::Writes => "WRITES",
            EdgeKind::ReferencesType => "REFERENCES_TYPE",
            EdgeKind::Defines => "DEFINES",
            EdgeKind::CfgNormal => "CFG_NORMAL",
            EdgeKind::CfgBranch => "CFG_BRANCH",
            EdgeKind::CfgLoopback => "CFG_LOOPBACK",
            EdgeKind::CfgException => "CFG_EXCEPTION",
            EdgeKind::DfgDefUse => "DFG_DEF_USE",
        }
    }
}

/// A directed, attributed edge between two IR nodes
///
/// `attrs` uses an ordered map so edge normalization (and therefore edge
/// deduplication keys) is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IREdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub attrs: BTreeMap<String, String>,
}

impl IREdge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Deduplication key: (source, target, kind, stable-sorted attrs)
    pub fn dedup_key(&self) -> String {
        let attrs = self
            .attrs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}|{}|{}|{}",
            self.source_id,
            self.target_id,
            self.kind.as_str(),
            attrs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_is_attr_order_independent() {
        let mut a = IREdge::new("s", "t", EdgeKind::Calls);
        a.attrs.insert("line".into(), "7".into());
        a.attrs.insert("arity".into(), "2".into());

        let mut b = IREdge::new("s", "t", EdgeKind::Calls);
        b.attrs.insert("arity".into(), "2".into());
        b.attrs.insert("line".into(), "7".into());

        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn dedup_key_distinguishes_kind() {
        let a = IREdge::new("s", "t", EdgeKind::Calls);
        let b = IREdge::new("s", "t", EdgeKind::Imports);
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
