//! Clone detection domain

use serde::{Deserialize, Serialize};

/// A candidate code fragment (usually a function chunk)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneFragment {
    pub id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
}

impl CloneFragment {
    pub fn new(
        id: impl Into<String>,
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file_path: file_path.into(),
            start_line,
            end_line,
            content: content.into(),
        }
    }
}

/// Clone taxonomy (Bellon et al.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CloneType {
    /// Identical modulo whitespace/comments
    Type1 = 1,
    /// Identical modulo identifiers/literals
    Type2 = 2,
    /// Near-miss: statements added/removed/changed
    Type3 = 3,
    /// Semantic: same computation, different syntax
    Type4 = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    TokenHash,
    MinHashLsh,
    MultiLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonePair {
    pub fragment_a: String,
    pub fragment_b: String,
    pub clone_type: CloneType,
    /// [0, 1]
    pub similarity: f64,
    pub detection_method: DetectionMethod,
}

impl ClonePair {
    /// Canonical ordering so (a, b) and (b, a) compare equal
    pub fn new(
        a: &str,
        b: &str,
        clone_type: CloneType,
        similarity: f64,
        detection_method: DetectionMethod,
    ) -> Self {
        let (fragment_a, fragment_b) = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        Self {
            fragment_a,
            fragment_b,
            clone_type,
            similarity: similarity.clamp(0.0, 1.0),
            detection_method,
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.fragment_a.clone(), self.fragment_b.clone())
    }
}
