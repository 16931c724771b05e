//! Tier 2: MinHash + LSH over token shingles
//!
//! Signatures use deterministic affine hash permutations; candidate pairs
//! come from LSH banding and are verified against the estimated Jaccard
//! similarity before being reported. Enabled only for fragment sets small
//! enough that signature construction stays cheap (≤ 500 by default).

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use super::domain::{CloneFragment, ClonePair, CloneType, DetectionMethod};
use super::token_hash::{normalize_identifiers, normalize_tokens};

const NUM_HASHES: usize = 128;
const BANDS: usize = 32;
const ROWS_PER_BAND: usize = NUM_HASHES / BANDS;
const SHINGLE_SIZE: usize = 4;
const MERSENNE_PRIME: u64 = (1 << 61) - 1;

#[derive(Debug, Clone)]
pub struct MinHashConfig {
    /// Estimated-Jaccard threshold for reporting a pair
    pub similarity_threshold: f64,
}

impl Default for MinHashConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
        }
    }
}

pub struct MinHashLshDetector {
    config: MinHashConfig,
}

impl Default for MinHashLshDetector {
    fn default() -> Self {
        Self {
            config: MinHashConfig::default(),
        }
    }
}

impl MinHashLshDetector {
    pub fn new(config: MinHashConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, fragments: &[CloneFragment]) -> Vec<ClonePair> {
        let signatures: Vec<Option<[u64; NUM_HASHES]>> = fragments
            .iter()
            .map(|f| signature(&normalize_identifiers(&f.content)))
            .collect();

        // LSH banding: identical band slice → candidate bucket
        let mut candidates: HashSet<(usize, usize)> = HashSet::new();
        for band in 0..BANDS {
            let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
            for (index, signature) in signatures.iter().enumerate() {
                let Some(signature) = signature else { continue };
                let slice = &signature[band * ROWS_PER_BAND..(band + 1) * ROWS_PER_BAND];
                let mut hasher = std::collections::hash_map::DefaultHasher::new();
                slice.hash(&mut hasher);
                buckets.entry(hasher.finish()).or_default().push(index);
            }
            for bucket in buckets.values() {
                for i in 0..bucket.len() {
                    for j in (i + 1)..bucket.len() {
                        candidates.insert((bucket[i].min(bucket[j]), bucket[i].max(bucket[j])));
                    }
                }
            }
        }

        let mut pairs = Vec::new();
        for (i, j) in candidates {
            let (Some(sig_a), Some(sig_b)) = (&signatures[i], &signatures[j]) else {
                continue;
            };
            let similarity = estimated_jaccard(sig_a, sig_b);
            if similarity < self.config.similarity_threshold {
                continue;
            }
            // identical after identifier normalization → Type-2 (rename
            // clone); otherwise a near-miss Type-3
            let clone_type = if normalize_identifiers(&fragments[i].content)
                == normalize_identifiers(&fragments[j].content)
                && normalize_tokens(&fragments[i].content)
                    != normalize_tokens(&fragments[j].content)
            {
                CloneType::Type2
            } else {
                CloneType::Type3
            };
            pairs.push(ClonePair::new(
                &fragments[i].id,
                &fragments[j].id,
                clone_type,
                similarity,
                DetectionMethod::MinHashLsh,
            ));
        }
        pairs.sort_by_key(|p| p.key());
        pairs
    }
}

/// MinHash signature of a shingle set; None when too short to shingle
fn signature(normalized: &str) -> Option<[u64; NUM_HASHES]> {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.len() < SHINGLE_SIZE {
        return None;
    }
    let shingles: HashSet<u64> = tokens
        .windows(SHINGLE_SIZE)
        .map(|window| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            window.hash(&mut hasher);
            hasher.finish() % MERSENNE_PRIME
        })
        .collect();

    let mut signature = [u64::MAX; NUM_HASHES];
    for (index, slot) in signature.iter_mut().enumerate() {
        // deterministic affine permutation h_i(x) = (a·x + b) mod p
        let a = 2 * (index as u64) + 1;
        let b = (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        for &shingle in &shingles {
            let hashed = (a.wrapping_mul(shingle).wrapping_add(b)) % MERSENNE_PRIME;
            if hashed < *slot {
                *slot = hashed;
            }
        }
    }
    Some(signature)
}

fn estimated_jaccard(a: &[u64; NUM_HASHES], b: &[u64; NUM_HASHES]) -> f64 {
    let matching = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matching as f64 / NUM_HASHES as f64
}
