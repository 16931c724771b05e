//! Hybrid clone detector
//!
//! Tier selection:
//! - fewer than 50 fragments: baseline (token hash) only; the fancy tiers
//!   cannot beat it at that size and cost setup time
//! - otherwise: tier 1 on everything, tier 2 (MinHash+LSH) on the residue
//!   when it is small enough (≤ 500 fragments), tier 3 (multi-level) on
//!   whatever is still unmatched
//!
//! Recall is by construction ≥ baseline: tier 1's pairs are always kept.

use std::collections::HashSet;

use tracing::debug;

use super::domain::{CloneFragment, ClonePair};
use super::minhash_lsh::MinHashLshDetector;
use super::multilevel::MultiLevelDetector;
use super::token_hash::TokenHashIndex;

const BASELINE_ONLY_LIMIT: usize = 50;
const LSH_FRAGMENT_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct HybridConfig {
    pub baseline_only_limit: usize,
    pub lsh_fragment_limit: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            baseline_only_limit: BASELINE_ONLY_LIMIT,
            lsh_fragment_limit: LSH_FRAGMENT_LIMIT,
        }
    }
}

pub struct HybridCloneDetector {
    config: HybridConfig,
    lsh: MinHashLshDetector,
    multilevel: MultiLevelDetector,
}

impl Default for HybridCloneDetector {
    fn default() -> Self {
        Self {
            config: HybridConfig::default(),
            lsh: MinHashLshDetector::default(),
            multilevel: MultiLevelDetector::default(),
        }
    }
}

impl HybridCloneDetector {
    pub fn new(config: HybridConfig) -> Self {
        Self {
            config,
            lsh: MinHashLshDetector::default(),
            multilevel: MultiLevelDetector::default(),
        }
    }

    pub fn detect(&self, fragments: &[CloneFragment]) -> Vec<ClonePair> {
        let tier1 = TokenHashIndex::detect(fragments);
        if fragments.len() < self.config.baseline_only_limit {
            debug!(fragments = fragments.len(), "baseline-only clone detection");
            return tier1;
        }

        let matched = TokenHashIndex::matched_ids(&tier1);
        let residue: Vec<CloneFragment> = fragments
            .iter()
            .filter(|f| !matched.contains(&f.id))
            .cloned()
            .collect();

        let mut pairs = tier1;
        let mut still_unmatched = residue;

        if still_unmatched.len() <= self.config.lsh_fragment_limit {
            let tier2 = self.lsh.detect(&still_unmatched);
            let matched2: HashSet<String> = tier2
                .iter()
                .flat_map(|p| [p.fragment_a.clone(), p.fragment_b.clone()])
                .collect();
            still_unmatched.retain(|f| !matched2.contains(&f.id));
            pairs.extend(tier2);
        }

        let tier3 = self.multilevel.detect(&still_unmatched);
        pairs.extend(tier3);

        // one pair per fragment pair, highest-similarity tier wins
        pairs.sort_by(|a, b| {
            a.key().cmp(&b.key()).then(
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });
        pairs.dedup_by_key(|p| p.key());
        debug!(pairs = pairs.len(), "hybrid clone detection complete");
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::clone_detection::domain::CloneType;

    fn fragment(id: &str, content: &str) -> CloneFragment {
        CloneFragment::new(id, format!("{id}.py"), 0, 5, content)
    }

    #[test]
    fn small_sets_use_baseline_only() {
        let fragments = vec![
            fragment("a", "x = 1\ny = 2"),
            fragment("b", "x = 1\ny = 2"),
            // a rename clone tier 2 would catch, baseline will not
            fragment("c", "p = 1\nq = 2"),
        ];
        let pairs = HybridCloneDetector::default().detect(&fragments);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].clone_type, CloneType::Type1);
    }

    #[test]
    fn hybrid_keeps_all_baseline_pairs() {
        let mut fragments = Vec::new();
        for i in 0..60 {
            fragments.push(fragment(&format!("dup{i}"), "total = a + b\nreturn total"));
        }
        let baseline = TokenHashIndex::detect(&fragments);
        let hybrid = HybridCloneDetector::default().detect(&fragments);
        assert!(hybrid.len() >= baseline.len());
        for pair in &baseline {
            assert!(hybrid.iter().any(|p| p.key() == pair.key()));
        }
    }

    #[test]
    fn residue_reaches_deeper_tiers() {
        let mut fragments = Vec::new();
        for i in 0..55 {
            fragments.push(fragment(&format!("noise{i}"), &format!("unique_{i} = {i} * marker_{i}\nvalue_{i} = unique_{i}")));
        }
        let body_a = "def add_all(items):\n    total = 0\n    for item in items:\n        total += item.price\n    return total";
        let body_b = "def add_all(rows):\n    acc = 0\n    for row in rows:\n        acc += row.price\n    return acc";
        fragments.push(fragment("orig", body_a));
        fragments.push(fragment("renamed", body_b));

        let pairs = HybridCloneDetector::default().detect(&fragments);
        assert!(
            pairs
                .iter()
                .any(|p| p.fragment_a == "orig" && p.fragment_b == "renamed"),
            "rename clone must be found by a deeper tier"
        );
    }
}
