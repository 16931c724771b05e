//! Search hits and the learning-to-rank feature vector

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategySource {
    Lexical,
    Vector,
    Symbol,
    Graph,
    Fusion,
}

/// The 18-float feature vector attached to every fused hit. Field ORDER IS
/// WIRE-STABLE: downstream rankers index by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rank_vec: f32,
    pub rank_lex: f32,
    pub rank_sym: f32,
    pub rank_graph: f32,
    pub rrf_vec: f32,
    pub rrf_lex: f32,
    pub rrf_sym: f32,
    pub rrf_graph: f32,
    pub weight_vec: f32,
    pub weight_lex: f32,
    pub weight_sym: f32,
    pub weight_graph: f32,
    pub num_strategies: f32,
    pub best_rank: f32,
    pub avg_rank: f32,
    pub consensus_factor: f32,
    pub chunk_size: f32,
    pub file_depth: f32,
}

impl FeatureVector {
    /// Fixed-order projection; the only sanctioned wire encoding
    pub fn to_array(&self) -> [f32; 18] {
        [
            self.rank_vec,
            self.rank_lex,
            self.rank_sym,
            self.rank_graph,
            self.rrf_vec,
            self.rrf_lex,
            self.rrf_sym,
            self.rrf_graph,
            self.weight_vec,
            self.weight_lex,
            self.weight_sym,
            self.weight_graph,
            self.num_strategies,
            self.best_rank,
            self.avg_rank,
            self.consensus_factor,
            self.chunk_size,
            self.file_depth,
        ]
    }
}

/// A fused, ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub score: f64,
    pub source: StrategySource,
    pub metadata: HashMap<String, String>,
    pub feature_vector: FeatureVector,
    /// Optional human-readable account of the fusion decision
    pub explanation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_projection_has_eighteen_stable_slots() {
        let mut features = FeatureVector {
            rank_vec: 1.0,
            consensus_factor: 1.25,
            file_depth: 3.0,
            ..Default::default()
        };
        features.num_strategies = 4.0;
        let array = features.to_array();
        assert_eq!(array.len(), 18);
        assert_eq!(array[0], 1.0);
        assert_eq!(array[12], 4.0);
        assert_eq!(array[15], 1.25);
        assert_eq!(array[17], 3.0);
    }
}
