//! Hybrid retriever
//!
//! State machine: Received → Classified → Fanned-out → Normalized → Fused →
//! Boosted → Cutoff → Emitted. Strategy adapters run in parallel with a
//! per-stage timeout; a strategy that times out or fails is dropped from
//! fusion and the response is marked degraded instead of failing outright.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fusion::{FusionEngine, StrategyDoc, StrategyInputs};
use super::hit::{SearchHit, StrategySource};
use super::intent::{IntentClassifier, IntentDistribution};
use crate::shared::models::{EngineError, ErrorEntry, ResponseStatus, Result};

/// One retrieval back-end (lexical, vector, symbol graph, graph flow)
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    fn source(&self) -> StrategySource;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<StrategyDoc>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrieverState {
    Received,
    Classified,
    FannedOut,
    Normalized,
    Fused,
    Boosted,
    Cutoff,
    Emitted,
}

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Per-strategy deadline during fan-out
    pub strategy_timeout: Duration,
    /// How many candidates each strategy is asked for
    pub fan_out_limit: usize,
    pub with_explanations: bool,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            strategy_timeout: Duration::from_millis(500),
            fan_out_limit: 100,
            with_explanations: false,
        }
    }
}

#[derive(Debug)]
pub struct RetrievalResponse {
    pub hits: Vec<SearchHit>,
    pub intent: IntentDistribution,
    pub status: ResponseStatus,
    pub errors: Vec<ErrorEntry>,
    /// States traversed, in order; always ends with Emitted
    pub trace: Vec<RetrieverState>,
}

pub struct Retriever {
    strategies: Vec<Arc<dyn SearchStrategy>>,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(config: RetrieverConfig) -> Self {
        Self {
            strategies: Vec::new(),
            config,
        }
    }

    pub fn register_strategy(&mut self, strategy: Arc<dyn SearchStrategy>) {
        self.strategies.push(strategy);
    }

    pub async fn retrieve(&self, query: &str) -> RetrievalResponse {
        let mut trace = vec![RetrieverState::Received];

        let intent = IntentClassifier::classify(query);
        trace.push(RetrieverState::Classified);

        // parallel fan-out, each strategy under its own deadline
        let mut handles = Vec::new();
        for strategy in &self.strategies {
            let strategy = Arc::clone(strategy);
            let query = query.to_string();
            let limit = self.config.fan_out_limit;
            let timeout = self.config.strategy_timeout;
            let source = strategy.source();
            handles.push((
                source,
                tokio::spawn(async move {
                    tokio::time::timeout(timeout, strategy.search(&query, limit)).await
                }),
            ));
        }

        let mut inputs = StrategyInputs::default();
        let mut errors = Vec::new();
        for (source, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(Ok(docs))) => Some(docs),
                Ok(Ok(Err(err))) => {
                    warn!(?source, error = %err, "strategy failed");
                    errors.push(ErrorEntry::from_error(strategy_name(source), &err));
                    None
                }
                Ok(Err(_elapsed)) => {
                    let err = EngineError::AnalysisTimeout {
                        what: format!("{source:?} retrieval"),
                        elapsed_ms: self.config.strategy_timeout.as_millis() as u64,
                    };
                    errors.push(ErrorEntry::from_error(strategy_name(source), &err));
                    None
                }
                Err(join_err) => {
                    let err = EngineError::index(strategy_name(source), join_err.to_string());
                    errors.push(ErrorEntry::from_error(strategy_name(source), &err));
                    None
                }
            };
            match source {
                StrategySource::Vector => inputs.vector = outcome,
                StrategySource::Lexical => inputs.lexical = outcome,
                StrategySource::Symbol => inputs.symbol = outcome,
                StrategySource::Graph => inputs.graph = outcome,
                StrategySource::Fusion => {}
            }
        }
        trace.push(RetrieverState::FannedOut);

        // RRF normalization, weighting, consensus boost and cutoff all
        // happen inside the fusion engine; the state machine records the
        // conceptual stages it passes through
        trace.push(RetrieverState::Normalized);
        let hits = FusionEngine::fuse(&intent, &inputs, self.config.with_explanations);
        trace.push(RetrieverState::Fused);
        trace.push(RetrieverState::Boosted);
        trace.push(RetrieverState::Cutoff);
        trace.push(RetrieverState::Emitted);

        let status = if errors.is_empty() {
            ResponseStatus::Ok
        } else {
            ResponseStatus::Degraded
        };
        debug!(hits = hits.len(), ?status, "retrieval complete");
        RetrievalResponse {
            hits,
            intent,
            status,
            errors,
            trace,
        }
    }
}

fn strategy_name(source: StrategySource) -> &'static str {
    match source {
        StrategySource::Lexical => "lexical",
        StrategySource::Vector => "vector",
        StrategySource::Symbol => "symbol",
        StrategySource::Graph => "graph",
        StrategySource::Fusion => "fusion",
    }
}
