//! Tier 1: normalized-token hash index
//!
//! O(n) bucketing by the hash of whitespace/comment-normalized content.
//! Catches the bulk of real-world duplication (copy-paste without edits) as
//! exact Type-1 matches.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::domain::{CloneFragment, ClonePair, CloneType, DetectionMethod};
use crate::shared::ids::content_hash;

static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(//|#).*$").expect("literal regex"));
static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("literal regex"));

/// Whitespace/comment-insensitive normal form
pub fn normalize_tokens(content: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(content, " ");
    let without_lines = LINE_COMMENT.replace_all(&without_blocks, "");
    without_lines.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identifier/literal-insensitive normal form (for Type-2 classification)
pub fn normalize_identifiers(content: &str) -> String {
    static IDENT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").expect("literal regex"));
    static NUMBER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b\d+(\.\d+)?\b").expect("literal regex"));
    let normalized = normalize_tokens(content);
    let idents = IDENT.replace_all(&normalized, "ID");
    NUMBER.replace_all(&idents, "N").to_string()
}

pub struct TokenHashIndex;

impl TokenHashIndex {
    /// All Type-1 pairs among `fragments`
    pub fn detect(fragments: &[CloneFragment]) -> Vec<ClonePair> {
        let mut buckets: HashMap<String, Vec<&CloneFragment>> = HashMap::new();
        for fragment in fragments {
            let normalized = normalize_tokens(&fragment.content);
            if normalized.is_empty() {
                continue;
            }
            buckets.entry(content_hash(&normalized)).or_default().push(fragment);
        }

        let mut pairs = Vec::new();
        for bucket in buckets.values() {
            for i in 0..bucket.len() {
                for j in (i + 1)..bucket.len() {
                    pairs.push(ClonePair::new(
                        &bucket[i].id,
                        &bucket[j].id,
                        CloneType::Type1,
                        1.0,
                        DetectionMethod::TokenHash,
                    ));
                }
            }
        }
        pairs.sort_by_key(|p| p.key());
        pairs
    }

    /// Fragment ids that matched in at least one Type-1 pair
    pub fn matched_ids(pairs: &[ClonePair]) -> std::collections::HashSet<String> {
        pairs
            .iter()
            .flat_map(|p| [p.fragment_a.clone(), p.fragment_b.clone()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_comments_are_ignored() {
        let fragments = vec![
            CloneFragment::new("a", "a.py", 0, 2, "x = 1  # set x\ny = 2\n"),
            CloneFragment::new("b", "b.py", 0, 2, "x = 1\n\n\ny   =   2"),
            CloneFragment::new("c", "c.py", 0, 2, "x = 3\ny = 2"),
        ];
        let pairs = TokenHashIndex::detect(&fragments);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].fragment_a, "a");
        assert_eq!(pairs[0].fragment_b, "b");
        assert_eq!(pairs[0].clone_type, CloneType::Type1);
    }

    #[test]
    fn identifier_normalization_collapses_renames() {
        let a = normalize_identifiers("total = total + price");
        let b = normalize_identifiers("sum = sum + cost");
        assert_eq!(a, b);
    }

    #[test]
    fn pair_ordering_is_canonical() {
        let p = ClonePair::new("z", "a", CloneType::Type1, 1.0, DetectionMethod::TokenHash);
        assert_eq!(p.fragment_a, "a");
        assert_eq!(p.fragment_b, "z");
    }
}
