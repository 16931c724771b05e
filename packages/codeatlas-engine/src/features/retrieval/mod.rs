//! Hybrid retrieval: intent → parallel strategies → weighted RRF fusion →
//! consensus boost → intent cutoff → feature vectors

pub mod adapters;
pub mod fusion;
pub mod hit;
pub mod intent;
pub mod retriever;

pub use adapters::{GraphSearchStrategy, LexicalSearchStrategy, SymbolSearchStrategy};
pub use fusion::{top_k, FusionEngine, StrategyDoc, StrategyInputs, K_GRAPH, K_LEX, K_SYM, K_VEC};
pub use hit::{FeatureVector, SearchHit, StrategySource};
pub use intent::{IntentClassifier, IntentDistribution, QueryIntent, ALL_INTENTS};
pub use retriever::{
    RetrievalResponse, Retriever, RetrieverConfig, RetrieverState, SearchStrategy,
};
