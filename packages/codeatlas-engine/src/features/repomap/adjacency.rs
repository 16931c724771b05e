//! Adjacency-list pre-computation
//!
//! Built once per run, O(E): both outgoing and incoming lists over dense
//! node indexes. All three importance algorithms iterate these lists
//! instead of scanning the edge set.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AdjacencyLists {
    pub node_ids: Vec<String>,
    index: HashMap<String, usize>,
    pub outgoing: Vec<Vec<usize>>,
    pub incoming: Vec<Vec<usize>>,
}

impl AdjacencyLists {
    pub fn build<'a>(
        nodes: impl IntoIterator<Item = &'a str>,
        edges: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut lists = Self::default();
        for node in nodes {
            lists.intern(node);
        }
        for (source, target) in edges {
            let s = lists.intern(source);
            let t = lists.intern(target);
            lists.outgoing[s].push(t);
            lists.incoming[t].push(s);
        }
        lists
    }

    fn intern(&mut self, node: &str) -> usize {
        if let Some(&index) = self.index.get(node) {
            return index;
        }
        let index = self.node_ids.len();
        self.node_ids.push(node.to_string());
        self.index.insert(node.to_string(), index);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        index
    }

    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn index_of(&self, node: &str) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub fn out_degree(&self, index: usize) -> usize {
        self.outgoing[index].len()
    }
}
