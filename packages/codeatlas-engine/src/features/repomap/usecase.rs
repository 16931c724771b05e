//! Repo-map analyzer
//!
//! Runs the algorithms the detected mode activates, combines scores, and
//! writes them back into `Chunk.importance` through the chunk→IR mapping.

use std::collections::HashMap;

use codeatlas_store::Chunk;
use tracing::info;

use super::adjacency::AdjacencyLists;
use super::domain::{ActivationMode, ContextSet, ImportanceScore};
use super::pagerank::{ImportanceEngine, ImportanceSettings};
use crate::features::graph::CodeGraph;

pub struct RepoMapAnalyzer {
    engine: ImportanceEngine,
}

impl Default for RepoMapAnalyzer {
    fn default() -> Self {
        Self {
            engine: ImportanceEngine::new(ImportanceSettings::default()),
        }
    }
}

impl RepoMapAnalyzer {
    pub fn new(settings: ImportanceSettings) -> Self {
        Self {
            engine: ImportanceEngine::new(settings),
        }
    }

    /// Compute importance for every graph node under the given mode
    pub fn compute(
        &self,
        graph: &CodeGraph,
        mode: ActivationMode,
        context: &ContextSet,
    ) -> HashMap<String, ImportanceScore> {
        let adjacency = AdjacencyLists::build(
            graph.nodes().map(|n| n.id.as_str()),
            graph
                .edges()
                .iter()
                .map(|e| (e.source_id.as_str(), e.target_id.as_str())),
        );
        if adjacency.is_empty() {
            return HashMap::new();
        }

        let pagerank = self.engine.pagerank(&adjacency);
        let personalized = if mode.enables_personalized() {
            Some(self.engine.personalized_pagerank(&adjacency, context))
        } else {
            None
        };
        let hits = if mode.enables_hits() {
            Some(self.engine.hits(&adjacency))
        } else {
            None
        };

        let max_pagerank = pagerank.iter().copied().fold(f64::MIN, f64::max).max(f64::EPSILON);
        let mut scores = HashMap::new();
        for (index, node_id) in adjacency.node_ids.iter().enumerate() {
            let mut score = ImportanceScore {
                pagerank: pagerank[index],
                ..Default::default()
            };
            if let Some(ppr) = &personalized {
                score.personalized = ppr[index];
            }
            if let Some((authority, hub)) = &hits {
                score.authority = authority[index];
                score.hub = hub[index];
            }
            // normalized pagerank anchors the combined score; the optional
            // signals shift it
            score.combined = (score.pagerank / max_pagerank) * 0.6
                + score.personalized * 0.2
                + score.authority * 0.15
                + score.hub * 0.05;
            scores.insert(node_id.clone(), score);
        }
        info!(nodes = scores.len(), ?mode, "importance computed");
        scores
    }

    /// Write combined scores into chunks via the chunk→IR-node mapping
    pub fn apply_to_chunks(
        scores: &HashMap<String, ImportanceScore>,
        chunk_to_ir: &HashMap<String, Vec<String>>,
        chunks: &mut [Chunk],
    ) {
        for chunk in chunks.iter_mut() {
            let Some(ir_nodes) = chunk_to_ir.get(&chunk.chunk_id) else {
                continue;
            };
            let best = ir_nodes
                .iter()
                .filter_map(|id| scores.get(id))
                .map(|s| s.combined)
                .fold(f64::MIN, f64::max);
            if best > f64::MIN {
                chunk.importance = best.clamp(0.0, 1.0) as f32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::cross_file::CrossFileResolver;
    use crate::features::graph::GraphBuilder;
    use crate::features::parsing::languages::PythonSpec;
    use crate::features::parsing::BaseExtractor;

    fn graph_fixture() -> CodeGraph {
        let extractor = BaseExtractor::new("repo");
        let core = extractor
            .extract(&PythonSpec, "core.py", "def util(x):\n    return x\n")
            .unwrap();
        let a = extractor
            .extract(&PythonSpec, "a.py", "def fa():\n    return util(1)\n")
            .unwrap();
        let b = extractor
            .extract(&PythonSpec, "b.py", "def fb():\n    return util(2)\n")
            .unwrap();
        let docs = vec![core, a, b];
        let resolution = CrossFileResolver::resolve(&docs);
        GraphBuilder::build(&docs, &resolution)
    }

    #[test]
    fn widely_called_node_scores_highest() {
        let graph = graph_fixture();
        let scores = RepoMapAnalyzer::default().compute(
            &graph,
            ActivationMode::Fast,
            &ContextSet::default(),
        );
        let util_id = &graph.nodes().find(|n| n.name == "util").unwrap().id;
        let fa_id = &graph.nodes().find(|n| n.name == "fa").unwrap().id;
        assert!(scores[util_id].combined > scores[fa_id].combined);
    }

    #[test]
    fn fast_mode_skips_optional_signals() {
        let graph = graph_fixture();
        let scores = RepoMapAnalyzer::default().compute(
            &graph,
            ActivationMode::Fast,
            &ContextSet::default(),
        );
        assert!(scores.values().all(|s| s.authority == 0.0 && s.personalized == 0.0));
    }

    #[test]
    fn full_mode_populates_all_signals() {
        let graph = graph_fixture();
        let util_id = graph.nodes().find(|n| n.name == "util").unwrap().id.clone();
        let scores = RepoMapAnalyzer::default().compute(
            &graph,
            ActivationMode::Full,
            &ContextSet::from_nodes([util_id.clone()]),
        );
        assert!(scores[&util_id].authority > 0.0);
        assert!(scores[&util_id].personalized > 0.0);
    }
}
