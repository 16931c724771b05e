//! Graph builder
//!
//! Promotes IR symbols to graph nodes and derives edges: CONTAINS from
//! parent links, CALLS from resolved call sites, IMPORTS from the resolver,
//! REFERENCES_TYPE from type annotations, READS/WRITES from the data-flow
//! pass.

use tracing::debug;

use super::model::{CodeGraph, GraphNode};
use crate::features::cross_file::ResolutionResult;
use crate::shared::ids::{external_sentinel, is_external_sentinel};
use crate::shared::models::{EdgeKind, IRDocument, IREdge, NodeKind};

pub struct GraphBuilder;

impl GraphBuilder {
    pub fn build(documents: &[IRDocument], resolution: &ResolutionResult) -> CodeGraph {
        let mut graph = CodeGraph::new();

        // Promote symbol-bearing nodes
        for doc in documents {
            for node in &doc.nodes {
                if matches!(
                    node.kind,
                    NodeKind::File
                        | NodeKind::Module
                        | NodeKind::Class
                        | NodeKind::Interface
                        | NodeKind::Function
                        | NodeKind::Method
                        | NodeKind::Lambda
                        | NodeKind::Variable
                ) {
                    graph.add_node(GraphNode {
                        id: node.node_id.clone(),
                        kind: node.kind,
                        fqn: node.fqn.clone(),
                        name: node.name.clone(),
                        file_path: node.file_path.clone(),
                        signature: node.signature.clone(),
                    });
                }
                // type annotations become REFERENCES_TYPE edges
                if let Some(type_info) = &node.type_info {
                    graph.add_edge(
                        IREdge::new(
                            &node.node_id,
                            external_sentinel(&node.language, type_info),
                            EdgeKind::ReferencesType,
                        ),
                    );
                }
            }
        }

        // Structural edges between promoted nodes
        for doc in documents {
            for edge in &doc.edges {
                if edge.kind == EdgeKind::Contains
                    && graph.node(&edge.source_id).is_some()
                    && graph.node(&edge.target_id).is_some()
                {
                    graph.add_edge(edge.clone());
                }
                if edge.kind == EdgeKind::Writes {
                    graph.add_edge(edge.clone());
                }
            }
        }

        // Resolver output: IMPORTS plus CALLS/READS (resolved or sentinel)
        for edge in &resolution.edges {
            graph.add_edge(edge.clone());
        }

        let unresolved = graph
            .edges()
            .iter()
            .filter(|e| is_external_sentinel(&e.target_id))
            .count();
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            sentinel_edges = unresolved,
            "code graph built"
        );
        graph
    }
}
