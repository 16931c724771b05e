//! Stable ID generation
//!
//! IDs are SHA-256 over a canonical form, so the same source line range
//! produces the same ID across runs. External references use sentinel IDs
//! and are never stored as resolved edges.

use sha2::{Digest, Sha256};

use super::models::Span;

const SENTINEL_PREFIX: &str = "external::";

/// Hex SHA-256 over `{lang}:{repo}:{kind}:{span_hash}`
pub fn stable_node_id(lang: &str, repo: &str, kind: &str, span_hash: &str) -> String {
    let canonical = format!("{lang}:{repo}:{kind}:{span_hash}");
    hex_digest(&canonical)
}

/// Hash of (file, span) used as the span component of a node ID
pub fn span_hash(file_path: &str, span: &Span) -> String {
    let canonical = format!("{file_path}@{}", span.canonical());
    hex_digest(&canonical)[..16].to_string()
}

/// Span hash for a named member sharing its parent's span (parameters,
/// fields); the name disambiguates siblings
pub fn member_hash(file_path: &str, span: &Span, member: &str) -> String {
    let canonical = format!("{file_path}@{}#{member}", span.canonical());
    hex_digest(&canonical)[..16].to_string()
}

/// SHA-256 hex digest of content after newline normalization
pub fn content_hash(content: &str) -> String {
    hex_digest(&content.replace("\r\n", "\n"))
}

/// Sentinel ID for an unresolved external reference
pub fn external_sentinel(lang: &str, fqn: &str) -> String {
    format!("{SENTINEL_PREFIX}{lang}::{fqn}")
}

pub fn is_external_sentinel(node_id: &str) -> bool {
    node_id.starts_with(SENTINEL_PREFIX)
}

fn hex_digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
