//! Built-in strategy adapters
//!
//! Lexical wraps the Tantivy plugin; symbol matches query tokens against
//! graph FQNs; graph expands from symbol matches along call edges (flow
//! neighborhood). A vector adapter is external (embedding service) and
//! registers through the same `SearchStrategy` trait.

use std::sync::Arc;

use async_trait::async_trait;

use super::fusion::StrategyDoc;
use super::hit::StrategySource;
use super::retriever::SearchStrategy;
use crate::features::graph::CodeGraph;
use crate::features::lexical::TantivyLexicalIndex;
use crate::shared::models::Result;

fn file_depth(path: &str) -> f32 {
    path.split('/').count().saturating_sub(1) as f32
}

/// Lexical adapter over the Tantivy plugin
pub struct LexicalSearchStrategy {
    index: Arc<TantivyLexicalIndex>,
}

impl LexicalSearchStrategy {
    pub fn new(index: Arc<TantivyLexicalIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl SearchStrategy for LexicalSearchStrategy {
    fn source(&self) -> StrategySource {
        StrategySource::Lexical
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StrategyDoc>> {
        let hits = self.index.search(query, limit)?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                hit.chunk_id.map(|chunk_id| StrategyDoc {
                    chunk_id,
                    chunk_size: 0.0,
                    file_depth: file_depth(&hit.file_path),
                })
            })
            .collect())
    }
}

/// Symbol adapter: token match against graph node names/FQNs
pub struct SymbolSearchStrategy {
    graph: Arc<CodeGraph>,
}

impl SymbolSearchStrategy {
    pub fn new(graph: Arc<CodeGraph>) -> Self {
        Self { graph }
    }

    fn matches(&self, query: &str) -> Vec<(String, String, usize)> {
        let tokens: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let mut scored: Vec<(String, String, usize)> = self
            .graph
            .nodes()
            .filter(|n| n.kind.is_callable() || n.kind == crate::shared::models::NodeKind::Class)
            .filter_map(|n| {
                let name = n.name.to_lowercase();
                let fqn = n.fqn.to_lowercase();
                let score = tokens
                    .iter()
                    .filter(|t| name.contains(t.as_str()) || fqn.contains(t.as_str()))
                    .count();
                (score > 0).then(|| (n.id.clone(), n.file_path.clone(), score))
            })
            .collect();
        scored.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        scored
    }
}

#[async_trait]
impl SearchStrategy for SymbolSearchStrategy {
    fn source(&self) -> StrategySource {
        StrategySource::Symbol
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StrategyDoc>> {
        Ok(self
            .matches(query)
            .into_iter()
            .take(limit)
            .map(|(node_id, path, _)| StrategyDoc {
                chunk_id: node_id,
                chunk_size: 0.0,
                file_depth: file_depth(&path),
            })
            .collect())
    }
}

/// Graph-flow adapter: the call neighborhood of symbol matches
pub struct GraphSearchStrategy {
    graph: Arc<CodeGraph>,
}

impl GraphSearchStrategy {
    pub fn new(graph: Arc<CodeGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl SearchStrategy for GraphSearchStrategy {
    fn source(&self) -> StrategySource {
        StrategySource::Graph
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StrategyDoc>> {
        let seeds = SymbolSearchStrategy::new(Arc::clone(&self.graph)).matches(query);
        let mut out: Vec<StrategyDoc> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for (node_id, _, _) in seeds.into_iter().take(limit / 2 + 1) {
            for neighbor in self
                .graph
                .callers(&node_id)
                .into_iter()
                .chain(self.graph.callees(&node_id))
            {
                if seen.insert(neighbor.id.clone()) {
                    out.push(StrategyDoc {
                        chunk_id: neighbor.id.clone(),
                        chunk_size: 0.0,
                        file_depth: file_depth(&neighbor.file_path),
                    });
                }
            }
            if out.len() >= limit {
                break;
            }
        }
        out.truncate(limit);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::cross_file::CrossFileResolver;
    use crate::features::graph::GraphBuilder;
    use crate::features::parsing::languages::PythonSpec;
    use crate::features::parsing::BaseExtractor;

    fn graph() -> Arc<CodeGraph> {
        let extractor = BaseExtractor::new("repo");
        let lib = extractor
            .extract(&PythonSpec, "auth.py", "def issue_token(user):\n    return user\n")
            .unwrap();
        let app = extractor
            .extract(
                &PythonSpec,
                "app.py",
                "def login(user):\n    return issue_token(user)\n",
            )
            .unwrap();
        let docs = vec![lib, app];
        let resolution = CrossFileResolver::resolve(&docs);
        Arc::new(GraphBuilder::build(&docs, &resolution))
    }

    #[tokio::test]
    async fn symbol_strategy_finds_by_name() {
        let strategy = SymbolSearchStrategy::new(graph());
        let docs = strategy.search("issue_token", 10).await.unwrap();
        assert!(!docs.is_empty());
    }

    #[tokio::test]
    async fn graph_strategy_returns_call_neighborhood() {
        let strategy = GraphSearchStrategy::new(graph());
        let docs = strategy.search("issue_token", 10).await.unwrap();
        // login calls issue_token, so it appears in the neighborhood
        assert!(!docs.is_empty());
    }
}
