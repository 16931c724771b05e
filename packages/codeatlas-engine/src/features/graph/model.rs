//! Code graph storage
//!
//! Nodes are held in an arena keyed by id; edges are `(src, dst, kind)`
//! tuples with attrs; no owning pointers across cycles. Deduplication is
//! keyed on the normalized edge form.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::shared::models::{EdgeKind, IREdge, NodeKind};

/// A node promoted into the code graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub fqn: String,
    pub name: String,
    pub file_path: String,
    pub signature: Option<String>,
}

#[derive(Debug, Default)]
pub struct CodeGraph {
    nodes: HashMap<String, GraphNode>,
    edges: Vec<IREdge>,
    edge_keys: HashSet<String>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.entry(node.id.clone()).or_insert(node);
    }

    /// Insert an edge unless an identical normalized edge already exists
    pub fn add_edge(&mut self, edge: IREdge) -> bool {
        if !self.edge_keys.insert(edge.dedup_key()) {
            return false;
        }
        let index = self.edges.len();
        self.outgoing
            .entry(edge.source_id.clone())
            .or_default()
            .push(index);
        self.incoming
            .entry(edge.target_id.clone())
            .or_default()
            .push(index);
        self.edges.push(edge);
        true
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[IREdge] {
        &self.edges
    }

    fn targets_of(&self, id: &str, kind: EdgeKind) -> Vec<&GraphNode> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
            .filter(|e| e.kind == kind)
            .filter_map(|e| self.nodes.get(&e.target_id))
            .collect()
    }

    fn sources_of(&self, id: &str, kind: EdgeKind) -> Vec<&GraphNode> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
            .filter(|e| e.kind == kind)
            .filter_map(|e| self.nodes.get(&e.source_id))
            .collect()
    }

    /// Nodes calling `id`
    pub fn callers(&self, id: &str) -> Vec<&GraphNode> {
        self.sources_of(id, EdgeKind::Calls)
    }

    /// Nodes `id` calls (resolved targets only)
    pub fn callees(&self, id: &str) -> Vec<&GraphNode> {
        self.targets_of(id, EdgeKind::Calls)
    }

    pub fn imports(&self, id: &str) -> Vec<&GraphNode> {
        self.targets_of(id, EdgeKind::Imports)
    }

    pub fn imported_by(&self, id: &str) -> Vec<&GraphNode> {
        self.sources_of(id, EdgeKind::Imports)
    }

    /// Depth-limited BFS over all edge kinds; returns the node-id path
    /// including both endpoints, or None when unreachable within the limit.
    pub fn shortest_path(&self, from: &str, to: &str, max_depth: usize) -> Option<Vec<String>> {
        if from == to {
            return Some(vec![from.to_string()]);
        }
        let mut predecessor: HashMap<String, String> = HashMap::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((from.to_string(), 0));
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(from.to_string());

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for &i in self.outgoing.get(&current).into_iter().flatten() {
                let next = &self.edges[i].target_id;
                if !visited.insert(next.clone()) {
                    continue;
                }
                predecessor.insert(next.clone(), current.clone());
                if next == to {
                    let mut path = vec![to.to_string()];
                    let mut cursor = to;
                    while let Some(prev) = predecessor.get(cursor) {
                        path.push(prev.clone());
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back((next.clone(), depth + 1));
            }
        }
        None
    }

    /// (outgoing, incoming) degree
    pub fn degree(&self, id: &str) -> (usize, usize) {
        (
            self.outgoing.get(id).map_or(0, Vec::len),
            self.incoming.get(id).map_or(0, Vec::len),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Span;
    use crate::shared::models::IRNode;

    fn node(id: &str) -> GraphNode {
        let ir = IRNode::new(id, NodeKind::Function, id, id, "python", "a.py", Span::lines(0, 1));
        GraphNode {
            id: ir.node_id,
            kind: ir.kind,
            fqn: ir.fqn,
            name: ir.name,
            file_path: ir.file_path,
            signature: None,
        }
    }

    fn graph() -> CodeGraph {
        let mut g = CodeGraph::new();
        for id in ["a", "b", "c", "d"] {
            g.add_node(node(id));
        }
        g.add_edge(IREdge::new("a", "b", EdgeKind::Calls));
        g.add_edge(IREdge::new("b", "c", EdgeKind::Calls));
        g.add_edge(IREdge::new("c", "d", EdgeKind::Calls));
        g
    }

    #[test]
    fn duplicate_edges_are_rejected() {
        let mut g = graph();
        assert!(!g.add_edge(IREdge::new("a", "b", EdgeKind::Calls)));
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn callers_and_callees() {
        let g = graph();
        assert_eq!(g.callees("a").len(), 1);
        assert_eq!(g.callees("a")[0].id, "b");
        assert_eq!(g.callers("c")[0].id, "b");
        assert!(g.callers("a").is_empty());
    }

    #[test]
    fn shortest_path_respects_depth_limit() {
        let g = graph();
        assert_eq!(
            g.shortest_path("a", "d", 10).unwrap(),
            vec!["a", "b", "c", "d"]
        );
        assert!(g.shortest_path("a", "d", 2).is_none());
        assert!(g.shortest_path("d", "a", 10).is_none());
    }
}
