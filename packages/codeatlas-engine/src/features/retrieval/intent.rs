//! Multi-label intent classification
//!
//! Produces a probability distribution over the five intents, summing to 1.
//! Keyword evidence accumulates per label; with no evidence at all the mass
//! sits on Balanced.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryIntent {
    Symbol,
    Flow,
    Concept,
    Code,
    Balanced,
}

pub const ALL_INTENTS: [QueryIntent; 5] = [
    QueryIntent::Symbol,
    QueryIntent::Flow,
    QueryIntent::Concept,
    QueryIntent::Code,
    QueryIntent::Balanced,
];

/// Normalized distribution over intents (sums to 1.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDistribution {
    pub probabilities: Vec<(QueryIntent, f64)>,
}

impl IntentDistribution {
    pub fn probability(&self, intent: QueryIntent) -> f64 {
        self.probabilities
            .iter()
            .find(|(i, _)| *i == intent)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }

    /// Intent with the highest probability (ties resolve to the earlier
    /// entry in the canonical order, keeping classification deterministic)
    pub fn dominant(&self) -> QueryIntent {
        self.probabilities
            .iter()
            .fold((QueryIntent::Balanced, f64::MIN), |best, &(intent, p)| {
                if p > best.1 {
                    (intent, p)
                } else {
                    best
                }
            })
            .0
    }
}

const SYMBOL_KEYWORDS: &[&str] = &[
    "function", "class", "method", "definition", "declaration", "symbol", "signature", "callers",
    "callees", "where is",
];
const FLOW_KEYWORDS: &[&str] = &[
    "flow", "call chain", "path", "propagate", "taint", "reaches", "data flow", "depends on",
    "impact",
];
const CONCEPT_KEYWORDS: &[&str] = &[
    "how does", "why", "explain", "architecture", "design", "overview", "concept", "purpose",
    "responsible",
];
const CODE_KEYWORDS: &[&str] = &[
    "example", "snippet", "implementation", "usage", "code for", "sample", "similar code",
];

pub struct IntentClassifier;

impl IntentClassifier {
    pub fn classify(query: &str) -> IntentDistribution {
        let query = query.to_lowercase();
        let mut scores: Vec<(QueryIntent, f64)> = vec![
            (QueryIntent::Symbol, keyword_score(&query, SYMBOL_KEYWORDS)),
            (QueryIntent::Flow, keyword_score(&query, FLOW_KEYWORDS)),
            (QueryIntent::Concept, keyword_score(&query, CONCEPT_KEYWORDS)),
            (QueryIntent::Code, keyword_score(&query, CODE_KEYWORDS)),
        ];

        // camelCase / snake_case / :: tokens look like symbol lookups
        if query.split_whitespace().any(looks_like_identifier) {
            if let Some(entry) = scores.iter_mut().find(|(i, _)| *i == QueryIntent::Symbol) {
                entry.1 += 1.0;
            }
        }

        let evidence: f64 = scores.iter().map(|(_, s)| s).sum();
        // Balanced absorbs the remaining uncertainty
        let balanced = if evidence == 0.0 { 1.0 } else { 0.5 };
        scores.push((QueryIntent::Balanced, balanced));

        let total: f64 = scores.iter().map(|(_, s)| s).sum();
        let probabilities = scores
            .into_iter()
            .map(|(intent, score)| (intent, score / total))
            .collect();
        IntentDistribution { probabilities }
    }
}

fn keyword_score(query: &str, keywords: &[&str]) -> f64 {
    keywords.iter().filter(|k| query.contains(*k)).count() as f64
}

fn looks_like_identifier(token: &str) -> bool {
    token.contains("::")
        || token.contains('_') && token.chars().all(|c| c.is_alphanumeric() || c == '_')
        || (token.chars().any(|c| c.is_uppercase()) && token.chars().any(|c| c.is_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_sums_to_one() {
        for query in [
            "where is the login function",
            "how does the cache work",
            "trace the data flow from request to database",
            "show me example usage of the parser",
            "foo",
        ] {
            let distribution = IntentClassifier::classify(query);
            let total: f64 = distribution.probabilities.iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-9, "query: {query}");
        }
    }

    #[test]
    fn keyword_queries_pick_the_right_dominant() {
        assert_eq!(
            IntentClassifier::classify("where is the class definition of TokenIssuer").dominant(),
            QueryIntent::Symbol
        );
        assert_eq!(
            IntentClassifier::classify("trace the taint flow into the sink").dominant(),
            QueryIntent::Flow
        );
        assert_eq!(
            IntentClassifier::classify("explain the architecture overview").dominant(),
            QueryIntent::Concept
        );
        assert_eq!(
            IntentClassifier::classify("plain nonsense words").dominant(),
            QueryIntent::Balanced
        );
    }

    #[test]
    fn classification_is_multi_label() {
        let distribution =
            IntentClassifier::classify("explain the data flow of the login function");
        assert!(distribution.probability(QueryIntent::Flow) > 0.0);
        assert!(distribution.probability(QueryIntent::Concept) > 0.0);
        assert!(distribution.probability(QueryIntent::Symbol) > 0.0);
    }
}
