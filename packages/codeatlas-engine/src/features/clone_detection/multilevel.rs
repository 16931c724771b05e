//! Tier 3: multi-level detector for the residue
//!
//! Pairwise comparison at three levels: token-set overlap, line edit
//! distance, and structural shape (identifier-normalized token sequence).
//! Expensive (O(n²) pairs), so the hybrid selector only feeds it fragments
//! the cheaper tiers did not already match.

use std::collections::HashSet;

use super::domain::{CloneFragment, ClonePair, CloneType, DetectionMethod};
use super::token_hash::{normalize_identifiers, normalize_tokens};

#[derive(Debug, Clone)]
pub struct MultiLevelConfig {
    /// Combined-score threshold for Type-3
    pub type3_threshold: f64,
    /// Structural-similarity threshold for Type-4 when the surface score is
    /// below the Type-3 bar
    pub type4_structural_threshold: f64,
}

impl Default for MultiLevelConfig {
    fn default() -> Self {
        Self {
            type3_threshold: 0.65,
            type4_structural_threshold: 0.85,
        }
    }
}

pub struct MultiLevelDetector {
    config: MultiLevelConfig,
}

impl Default for MultiLevelDetector {
    fn default() -> Self {
        Self {
            config: MultiLevelConfig::default(),
        }
    }
}

impl MultiLevelDetector {
    pub fn new(config: MultiLevelConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, fragments: &[CloneFragment]) -> Vec<ClonePair> {
        let mut pairs = Vec::new();
        for i in 0..fragments.len() {
            for j in (i + 1)..fragments.len() {
                if let Some(pair) = self.compare(&fragments[i], &fragments[j]) {
                    pairs.push(pair);
                }
            }
        }
        pairs.sort_by_key(|p| p.key());
        pairs
    }

    fn compare(&self, a: &CloneFragment, b: &CloneFragment) -> Option<ClonePair> {
        let token_sim = token_set_similarity(&a.content, &b.content);
        let edit_sim = line_edit_similarity(&a.content, &b.content);
        let structural_sim = structural_similarity(&a.content, &b.content);
        let combined = 0.35 * token_sim + 0.35 * edit_sim + 0.3 * structural_sim;

        if combined >= self.config.type3_threshold {
            return Some(ClonePair::new(
                &a.id,
                &b.id,
                CloneType::Type3,
                combined,
                DetectionMethod::MultiLevel,
            ));
        }
        // syntactically distant but structurally near-identical → semantic
        if structural_sim >= self.config.type4_structural_threshold {
            return Some(ClonePair::new(
                &a.id,
                &b.id,
                CloneType::Type4,
                structural_sim,
                DetectionMethod::MultiLevel,
            ));
        }
        None
    }
}

/// Jaccard over the normalized token sets
fn token_set_similarity(a: &str, b: &str) -> f64 {
    let normalized_a = normalize_tokens(a);
    let normalized_b = normalize_tokens(b);
    let set_a: HashSet<&str> = normalized_a.split(' ').filter(|t| !t.is_empty()).collect();
    let set_b: HashSet<&str> = normalized_b.split(' ').filter(|t| !t.is_empty()).collect();
    jaccard(&set_a, &set_b)
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// 1 − normalized Levenshtein over trimmed lines
fn line_edit_similarity(a: &str, b: &str) -> f64 {
    let lines_a: Vec<&str> = a.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let lines_b: Vec<&str> = b.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let max_len = lines_a.len().max(lines_b.len());
    if max_len == 0 {
        return 0.0;
    }
    let distance = levenshtein(&lines_a, &lines_b);
    1.0 - distance as f64 / max_len as f64
}

fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, item_a) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, item_b) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(item_a != item_b);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Similarity of identifier-normalized token sequences, a cheap stand-in
/// for PDG isomorphism that still sees through renames and literal changes
fn structural_similarity(a: &str, b: &str) -> f64 {
    let normalized_a = normalize_identifiers(a);
    let normalized_b = normalize_identifiers(b);
    let shape_a: Vec<&str> = normalized_a.split(' ').collect();
    let shape_b: Vec<&str> = normalized_b.split(' ').collect();
    let max_len = shape_a.len().max(shape_b.len());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - levenshtein(&shape_a, &shape_b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_miss_is_type3() {
        let a = "def total(items):\n    s = 0\n    for i in items:\n        s += i.price\n    return s\n";
        let b = "def total(items):\n    s = 0\n    for i in items:\n        s += i.price\n    log(s)\n    return s\n";
        let fragments = vec![
            CloneFragment::new("a", "a.py", 0, 5, a),
            CloneFragment::new("b", "b.py", 0, 6, b),
        ];
        let pairs = MultiLevelDetector::default().detect(&fragments);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].clone_type, CloneType::Type3);
        assert!(pairs[0].similarity > 0.6);
    }

    #[test]
    fn unrelated_code_is_not_paired() {
        let fragments = vec![
            CloneFragment::new("a", "a.py", 0, 1, "def render(template):\n    return template.html()\n"),
            CloneFragment::new("b", "b.py", 0, 2, "class Socket:\n    def bind(self, port):\n        self.port = port\n"),
        ];
        let pairs = MultiLevelDetector::default().detect(&fragments);
        assert!(pairs.is_empty());
    }

    #[test]
    fn levenshtein_base_cases() {
        assert_eq!(levenshtein(&["a", "b"], &["a", "b"]), 0);
        assert_eq!(levenshtein(&["a"], &["b"]), 1);
        assert_eq!(levenshtein::<&str>(&[], &["x", "y"]), 2);
    }
}
