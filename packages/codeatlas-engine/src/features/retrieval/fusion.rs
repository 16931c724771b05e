//! Weighted RRF fusion with consensus boost
//!
//! ```text
//! rrf_s(d)   = 1 / (k_s + rank_s(d))          k_vec = k_lex = 70
//!                                             k_sym = k_graph = 50
//! weight_s   = Σ_i P(intent_i) · profile[i][s]
//! base(d)    = Σ_s weight_s · rrf_s(d)
//!
//! raw        = 1 + 0.3·(√M − 1)               M = strategies agreeing on d
//! capped     = min(1.5, raw)
//! quality    = 1 / (1 + r̄/10)                 r̄ = average rank of d
//! factor     = capped · (0.5 + 0.5·quality)
//! final(d)   = base(d) · factor
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::hit::{FeatureVector, SearchHit, StrategySource};
use super::intent::{IntentDistribution, QueryIntent, ALL_INTENTS};

pub const K_VEC: f64 = 70.0;
pub const K_LEX: f64 = 70.0;
pub const K_SYM: f64 = 50.0;
pub const K_GRAPH: f64 = 50.0;

const CONSENSUS_BETA: f64 = 0.3;
const CONSENSUS_CAP: f64 = 1.5;

/// Weight profile per intent: (vec, lex, sym, graph)
fn weight_profile(intent: QueryIntent) -> [f64; 4] {
    match intent {
        QueryIntent::Code => [0.50, 0.30, 0.10, 0.10],
        QueryIntent::Symbol => [0.20, 0.20, 0.50, 0.10],
        QueryIntent::Flow => [0.20, 0.10, 0.20, 0.50],
        QueryIntent::Concept => [0.70, 0.20, 0.05, 0.05],
        QueryIntent::Balanced => [0.40, 0.30, 0.20, 0.10],
    }
}

/// Intent-specific result cutoff
pub fn top_k(intent: QueryIntent) -> usize {
    match intent {
        QueryIntent::Symbol => 20,
        QueryIntent::Flow => 15,
        QueryIntent::Concept => 60,
        QueryIntent::Code => 40,
        QueryIntent::Balanced => 40,
    }
}

/// One document as returned by a single retrieval strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDoc {
    pub chunk_id: String,
    /// Size of the chunk in lines (feature only)
    pub chunk_size: f32,
    /// Path depth of the containing file (feature only)
    pub file_depth: f32,
}

impl StrategyDoc {
    pub fn new(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            chunk_size: 0.0,
            file_depth: 0.0,
        }
    }
}

/// Ranked lists per strategy; `None` marks a strategy that was unavailable
/// or timed out (its weight is simply never earned)
#[derive(Debug, Default)]
pub struct StrategyInputs {
    pub vector: Option<Vec<StrategyDoc>>,
    pub lexical: Option<Vec<StrategyDoc>>,
    pub symbol: Option<Vec<StrategyDoc>>,
    pub graph: Option<Vec<StrategyDoc>>,
}

struct Accumulator {
    doc: StrategyDoc,
    /// rank per strategy slot (vec, lex, sym, graph); None = absent
    ranks: [Option<usize>; 4],
}

pub struct FusionEngine;

impl FusionEngine {
    /// Fuse the per-strategy rankings into a single ranked hit list
    pub fn fuse(
        intent: &IntentDistribution,
        inputs: &StrategyInputs,
        with_explanations: bool,
    ) -> Vec<SearchHit> {
        // combined weights from the intent distribution
        let mut weights = [0.0f64; 4];
        for intent_kind in ALL_INTENTS {
            let p = intent.probability(intent_kind);
            let profile = weight_profile(intent_kind);
            for (weight, contribution) in weights.iter_mut().zip(profile) {
                *weight += p * contribution;
            }
        }

        let mut accumulators: HashMap<String, Accumulator> = HashMap::new();
        let lists = [
            (0usize, &inputs.vector),
            (1, &inputs.lexical),
            (2, &inputs.symbol),
            (3, &inputs.graph),
        ];
        for (slot, list) in lists {
            let Some(list) = list else { continue };
            for (rank, doc) in list.iter().enumerate() {
                let entry = accumulators
                    .entry(doc.chunk_id.clone())
                    .or_insert_with(|| Accumulator {
                        doc: doc.clone(),
                        ranks: [None; 4],
                    });
                entry.ranks[slot] = Some(rank);
            }
        }

        let ks = [K_VEC, K_LEX, K_SYM, K_GRAPH];
        let mut hits: Vec<SearchHit> = accumulators
            .into_values()
            .map(|acc| {
                let mut rrf = [0.0f64; 4];
                let mut base = 0.0;
                let mut present_ranks: Vec<usize> = Vec::new();
                for slot in 0..4 {
                    if let Some(rank) = acc.ranks[slot] {
                        rrf[slot] = 1.0 / (ks[slot] + rank as f64);
                        base += weights[slot] * rrf[slot];
                        present_ranks.push(rank);
                    }
                }

                let m = present_ranks.len() as f64;
                let avg_rank =
                    present_ranks.iter().sum::<usize>() as f64 / m.max(1.0);
                let best_rank = present_ranks.iter().copied().min().unwrap_or(0);
                let raw = 1.0 + CONSENSUS_BETA * (m.sqrt() - 1.0);
                let capped = raw.min(CONSENSUS_CAP);
                let quality = 1.0 / (1.0 + avg_rank / 10.0);
                let factor = capped * (0.5 + 0.5 * quality);
                let score = base * factor;

                let feature_vector = FeatureVector {
                    rank_vec: rank_feature(acc.ranks[0]),
                    rank_lex: rank_feature(acc.ranks[1]),
                    rank_sym: rank_feature(acc.ranks[2]),
                    rank_graph: rank_feature(acc.ranks[3]),
                    rrf_vec: rrf[0] as f32,
                    rrf_lex: rrf[1] as f32,
                    rrf_sym: rrf[2] as f32,
                    rrf_graph: rrf[3] as f32,
                    weight_vec: weights[0] as f32,
                    weight_lex: weights[1] as f32,
                    weight_sym: weights[2] as f32,
                    weight_graph: weights[3] as f32,
                    num_strategies: m as f32,
                    best_rank: best_rank as f32,
                    avg_rank: avg_rank as f32,
                    consensus_factor: factor as f32,
                    chunk_size: acc.doc.chunk_size,
                    file_depth: acc.doc.file_depth,
                };

                let explanation = with_explanations.then(|| {
                    let contributing: Vec<String> = [
                        ("vector", acc.ranks[0]),
                        ("lexical", acc.ranks[1]),
                        ("symbol", acc.ranks[2]),
                        ("graph", acc.ranks[3]),
                    ]
                    .iter()
                    .filter_map(|(name, rank)| rank.map(|r| format!("{name}#{r}")))
                    .collect();
                    format!(
                        "intent={:?} strategies=[{}] boost={:.3}",
                        intent.dominant(),
                        contributing.join(", "),
                        factor
                    )
                });

                SearchHit {
                    chunk_id: acc.doc.chunk_id,
                    score,
                    source: StrategySource::Fusion,
                    metadata: HashMap::new(),
                    feature_vector,
                    explanation,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(top_k(intent.dominant()));
        hits
    }
}

fn rank_feature(rank: Option<usize>) -> f32 {
    rank.map(|r| r as f32).unwrap_or(-1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::retrieval::intent::IntentClassifier;

    fn balanced_intent() -> IntentDistribution {
        IntentDistribution {
            probabilities: vec![(QueryIntent::Balanced, 1.0)],
        }
    }

    /// One document ranked vec=0, lex=0, sym=0, graph=2 under pure Balanced
    /// intent: base and boost follow the normative formulas exactly.
    #[test]
    fn single_document_all_strategies() {
        let doc = StrategyDoc::new("chunk:r:function:d");
        let inputs = StrategyInputs {
            vector: Some(vec![doc.clone()]),
            lexical: Some(vec![doc.clone()]),
            symbol: Some(vec![doc.clone()]),
            graph: Some(vec![
                StrategyDoc::new("other1"),
                StrategyDoc::new("other2"),
                doc.clone(),
            ]),
        };
        let hits = FusionEngine::fuse(&balanced_intent(), &inputs, false);
        let hit = hits.iter().find(|h| h.chunk_id == doc.chunk_id).unwrap();

        let base = 0.4 * (1.0 / 70.0) + 0.3 * (1.0 / 70.0) + 0.2 * (1.0 / 50.0)
            + 0.1 * (1.0 / (50.0 + 2.0));
        let raw = 1.0 + 0.3 * (4.0f64.sqrt() - 1.0); // 1.3
        let quality = 1.0 / (1.0 + 0.5 / 10.0);
        let factor = raw.min(1.5) * (0.5 + 0.5 * quality);
        assert!((hit.score - base * factor).abs() < 1e-9);

        let features = &hit.feature_vector;
        assert_eq!(features.num_strategies, 4.0);
        assert_eq!(features.best_rank, 0.0);
        assert_eq!(features.avg_rank, 0.5);
        assert!((features.consensus_factor - factor as f32).abs() < 1e-6);
    }

    #[test]
    fn multi_strategy_document_gets_boosted_over_single() {
        let shared = StrategyDoc::new("shared");
        let lonely = StrategyDoc::new("lonely");
        let inputs = StrategyInputs {
            vector: Some(vec![shared.clone(), lonely.clone()]),
            lexical: Some(vec![shared.clone()]),
            symbol: Some(vec![shared.clone()]),
            graph: None,
        };
        let hits = FusionEngine::fuse(&balanced_intent(), &inputs, false);
        let shared_hit = hits.iter().find(|h| h.chunk_id == "shared").unwrap();
        let lonely_hit = hits.iter().find(|h| h.chunk_id == "lonely").unwrap();
        assert!(shared_hit.feature_vector.consensus_factor > 1.0);
        assert!(shared_hit.feature_vector.consensus_factor <= 1.5);
        assert!(shared_hit.score > lonely_hit.score);
        // a single-strategy doc earns no consensus bonus above 1.0·quality
        assert!(lonely_hit.feature_vector.num_strategies == 1.0);
    }

    #[test]
    fn cutoff_follows_dominant_intent() {
        let docs: Vec<StrategyDoc> = (0..100)
            .map(|i| StrategyDoc::new(format!("chunk{i:03}")))
            .collect();
        let flow_intent = IntentClassifier::classify("trace the data flow path");
        assert_eq!(flow_intent.dominant(), QueryIntent::Flow);
        let hits = FusionEngine::fuse(
            &flow_intent,
            &StrategyInputs {
                graph: Some(docs),
                ..Default::default()
            },
            false,
        );
        assert_eq!(hits.len(), top_k(QueryIntent::Flow));
    }

    #[test]
    fn explanation_names_contributing_strategies() {
        let doc = StrategyDoc::new("d");
        let inputs = StrategyInputs {
            lexical: Some(vec![doc.clone()]),
            symbol: Some(vec![doc]),
            ..Default::default()
        };
        let hits = FusionEngine::fuse(&balanced_intent(), &inputs, true);
        let explanation = hits[0].explanation.as_deref().unwrap();
        assert!(explanation.contains("lexical#0"));
        assert!(explanation.contains("symbol#0"));
        assert!(!explanation.contains("vector"));
    }
}
