//! Clone detection: 3-tier hybrid (token hash / MinHash+LSH / multi-level)

pub mod domain;
pub mod hybrid;
pub mod minhash_lsh;
pub mod multilevel;
pub mod token_hash;

pub use domain::{CloneFragment, ClonePair, CloneType, DetectionMethod};
pub use hybrid::{HybridCloneDetector, HybridConfig};
pub use minhash_lsh::{MinHashConfig, MinHashLshDetector};
pub use multilevel::{MultiLevelConfig, MultiLevelDetector};
pub use token_hash::TokenHashIndex;
