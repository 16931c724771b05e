//! Chunk boundary validator
//!
//! Runs after the hierarchy build. Sibling gaps/overlaps and oversize chunks
//! produce warnings, not errors; a child escaping its parent's span is an
//! invariant violation that is logged and marked on the chunk's attrs but
//! does not abort the build. Only a missing parent is structural.

use std::collections::HashMap;

use codeatlas_store::Chunk;
use tracing::warn;

use crate::shared::models::{EngineError, Result};

/// Approximate token threshold above which a chunk is flagged oversize
/// (~4 chars per token heuristic)
const DEFAULT_MAX_TOKENS: usize = 2000;

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub violations_marked: usize,
}

pub struct BoundaryValidator {
    max_tokens: usize,
}

impl Default for BoundaryValidator {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl BoundaryValidator {
    pub fn with_max_tokens(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// Validate the hierarchy in place. Chunks that violate the span
    /// invariant get `attrs["span_violation"]` set.
    pub fn validate(&self, chunks: &mut [Chunk]) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        let by_id: HashMap<String, (u32, u32)> = chunks
            .iter()
            .map(|c| (c.chunk_id.clone(), (c.start_line, c.end_line)))
            .collect();

        // Child span ⊆ parent span (skip structural tiers without real spans)
        for chunk in chunks.iter_mut() {
            let Some(parent_id) = chunk.parent_id.clone() else {
                continue;
            };
            let Some(&(parent_start, parent_end)) = by_id.get(&parent_id) else {
                return Err(EngineError::invariant(
                    "chunking",
                    format!("chunk {} references missing parent {}", chunk.chunk_id, parent_id),
                ));
            };
            if parent_start == 0 && parent_end == 0 {
                continue; // repo/project/module chunks carry no span
            }
            if chunk.start_line < parent_start || chunk.end_line > parent_end {
                warn!(
                    chunk = %chunk.chunk_id,
                    parent = %parent_id,
                    "child span exceeds parent span"
                );
                chunk.attrs.insert(
                    "span_violation".into(),
                    format!(
                        "child {}-{} outside parent {}-{}",
                        chunk.start_line, chunk.end_line, parent_start, parent_end
                    ),
                );
                report.violations_marked += 1;
            }
        }

        // Sibling gaps/overlaps among leaf chunks of the same parent
        let mut by_parent: HashMap<&str, Vec<&Chunk>> = HashMap::new();
        for chunk in chunks.iter().filter(|c| c.kind.is_leaf()) {
            if let Some(parent) = &chunk.parent_id {
                by_parent.entry(parent.as_str()).or_default().push(chunk);
            }
        }
        for (parent, mut siblings) in by_parent {
            siblings.sort_by_key(|c| c.start_line);
            for pair in siblings.windows(2) {
                if pair[1].start_line <= pair[0].end_line {
                    report.warnings.push(format!(
                        "overlapping siblings under {parent}: {} and {}",
                        pair[0].chunk_id, pair[1].chunk_id
                    ));
                }
            }
        }

        // Oversize chunks
        for chunk in chunks.iter().filter(|c| c.kind.is_leaf()) {
            let approx_tokens = chunk.content.len() / 4;
            if approx_tokens > self.max_tokens {
                report.warnings.push(format!(
                    "oversize chunk {} (~{approx_tokens} tokens)",
                    chunk.chunk_id
                ));
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeatlas_store::ChunkKind;

    fn chunk(id: &str, kind: ChunkKind, parent: Option<&str>, start: u32, end: u32) -> Chunk {
        let mut c = Chunk::new(id, "r", "r:main", kind, id, "f.py", start, end, "x");
        c.parent_id = parent.map(String::from);
        c
    }

    #[test]
    fn marks_span_violation_without_failing() {
        let mut chunks = vec![
            chunk("file", ChunkKind::File, None, 0, 10),
            chunk("fn", ChunkKind::Function, Some("file"), 5, 15),
        ];
        let report = BoundaryValidator::default().validate(&mut chunks).unwrap();
        assert_eq!(report.violations_marked, 1);
        assert!(chunks[1].attrs.contains_key("span_violation"));
    }

    #[test]
    fn missing_parent_is_structural() {
        let mut chunks = vec![chunk("fn", ChunkKind::Function, Some("ghost"), 0, 2)];
        let err = BoundaryValidator::default().validate(&mut chunks);
        assert!(matches!(err, Err(EngineError::InvariantViolation { .. })));
    }

    #[test]
    fn reports_sibling_overlap_as_warning() {
        let mut chunks = vec![
            chunk("file", ChunkKind::File, None, 0, 20),
            chunk("a", ChunkKind::Function, Some("file"), 0, 10),
            chunk("b", ChunkKind::Function, Some("file"), 8, 15),
        ];
        let report = BoundaryValidator::default().validate(&mut chunks).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.violations_marked, 0);
    }

    #[test]
    fn flags_oversize_leaves() {
        let mut big = chunk("big", ChunkKind::Function, None, 0, 2);
        big.content = "x".repeat(100);
        let report = BoundaryValidator::with_max_tokens(10)
            .validate(&mut [big])
            .unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("oversize")));
    }
}
