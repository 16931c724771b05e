//! Cross-file resolver
//!
//! Resolves Import nodes to concrete module/file targets and call sentinels
//! to definition node ids. References that stay unresolved keep their
//! `external::{lang}::{fqn}` sentinel; they are never dropped and never
//! stored as resolved edges.

use tracing::debug;

use super::symbol_table::SymbolTable;
use crate::shared::ids::is_external_sentinel;
use crate::shared::models::{EdgeKind, IRDocument, IREdge, NodeKind};

#[derive(Debug, Default)]
pub struct ResolutionResult {
    /// IMPORTS edges plus CALLS/READS edges with rewritten targets
    pub edges: Vec<IREdge>,
    pub resolved_calls: usize,
    pub unresolved_calls: usize,
    pub resolved_imports: usize,
    pub unresolved_imports: usize,
}

pub struct CrossFileResolver;

impl CrossFileResolver {
    pub fn resolve(documents: &[IRDocument]) -> ResolutionResult {
        let table = SymbolTable::build(documents);
        let mut result = ResolutionResult::default();

        for doc in documents {
            let file_node_id = table.file(&doc.file_path).cloned();

            for node in doc.nodes_of_kind(NodeKind::Import) {
                let Some(target) = node.attrs.get("target") else {
                    continue;
                };
                let Some(source_id) = file_node_id.clone() else {
                    continue;
                };
                match resolve_import_target(&table, &doc.file_path, target) {
                    Some(target_id) => {
                        result.edges.push(
                            IREdge::new(source_id, target_id, EdgeKind::Imports)
                                .with_attr("target", target),
                        );
                        result.resolved_imports += 1;
                    }
                    None => {
                        result.unresolved_imports += 1;
                    }
                }
            }

            for edge in &doc.edges {
                if !matches!(edge.kind, EdgeKind::Calls | EdgeKind::Reads) {
                    continue;
                }
                if !is_external_sentinel(&edge.target_id) {
                    result.edges.push(edge.clone());
                    continue;
                }
                let callee = edge
                    .target_id
                    .rsplit("::")
                    .next()
                    .unwrap_or(&edge.target_id);
                match resolve_symbol(&table, callee) {
                    Some(node_id) => {
                        let mut resolved = edge.clone();
                        resolved.target_id = node_id;
                        resolved.attrs.insert("resolved".into(), "true".into());
                        result.edges.push(resolved);
                        if edge.kind == EdgeKind::Calls {
                            result.resolved_calls += 1;
                        }
                    }
                    None => {
                        result.edges.push(edge.clone());
                        if edge.kind == EdgeKind::Calls {
                            result.unresolved_calls += 1;
                        }
                    }
                }
            }
        }

        debug!(
            resolved_calls = result.resolved_calls,
            unresolved_calls = result.unresolved_calls,
            resolved_imports = result.resolved_imports,
            "cross-file resolution complete"
        );
        result
    }
}

/// Resolve an import string to a file node: dotted module, plain path, or a
/// relative `./x` specifier against the importing file's directory.
fn resolve_import_target(table: &SymbolTable, from_file: &str, target: &str) -> Option<String> {
    if let Some(id) = table.module(&target.replace(['/', ':'], ".").replace("..", ".")) {
        return Some(id.clone());
    }
    if let Some(id) = table.file(target) {
        return Some(id.clone());
    }
    if let Some(stripped) = target.strip_prefix("./") {
        let dir = from_file.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let candidate = if dir.is_empty() {
            stripped.to_string()
        } else {
            format!("{dir}/{stripped}")
        };
        let dotted = candidate.replace('/', ".");
        if let Some(id) = table.module(&dotted) {
            return Some(id.clone());
        }
    }
    None
}

/// Resolve a callee expression: exact FQN, then unique last-segment match.
/// Ambiguous suffixes stay unresolved rather than guessing.
fn resolve_symbol(table: &SymbolTable, callee: &str) -> Option<String> {
    let normalized = normalize_callee(callee);
    if let Some(entry) = table.by_fqn(&normalized) {
        return Some(entry.node_id.clone());
    }
    let last = normalized.rsplit('.').next()?;
    let candidates = table.by_suffix(last);
    if candidates.len() == 1 {
        return Some(candidates[0].node_id.clone());
    }
    // qualified callee: require the qualifier to appear in the FQN
    if normalized.contains('.') {
        let matching: Vec<_> = candidates
            .iter()
            .filter(|c| c.fqn.ends_with(&normalized))
            .collect();
        if matching.len() == 1 {
            return Some(matching[0].node_id.clone());
        }
    }
    None
}

/// Strip receiver syntax variance: `a::b`, `a->b`, `self.b` all normalize to
/// dotted form without the receiver keyword.
fn normalize_callee(callee: &str) -> String {
    let dotted = callee.replace("::", ".").replace("->", ".");
    dotted
        .strip_prefix("self.")
        .or_else(|| dotted.strip_prefix("this."))
        .unwrap_or(&dotted)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::languages::PythonSpec;
    use crate::features::parsing::BaseExtractor;

    fn docs() -> Vec<IRDocument> {
        let extractor = BaseExtractor::new("repo");
        let tokens = extractor
            .extract(
                &PythonSpec,
                "auth/tokens.py",
                "def issue(user):\n    return user\n",
            )
            .unwrap();
        let views = extractor
            .extract(
                &PythonSpec,
                "api/views.py",
                "import auth.tokens\n\ndef login(user):\n    return issue(user)\n",
            )
            .unwrap();
        vec![tokens, views]
    }

    #[test]
    fn rewrites_unique_suffix_call_to_definition() {
        let documents = docs();
        let result = CrossFileResolver::resolve(&documents);
        assert_eq!(result.resolved_calls, 1);
        let call = result
            .edges
            .iter()
            .find(|e| e.kind == EdgeKind::Calls && e.attrs.contains_key("resolved"))
            .unwrap();
        assert!(!is_external_sentinel(&call.target_id));
    }

    #[test]
    fn resolves_dotted_import_to_module_file() {
        let documents = docs();
        let result = CrossFileResolver::resolve(&documents);
        assert_eq!(result.resolved_imports, 1);
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::Imports));
    }

    #[test]
    fn unknown_callee_keeps_sentinel() {
        let extractor = BaseExtractor::new("repo");
        let doc = extractor
            .extract(&PythonSpec, "a.py", "def f():\n    mystery()\n")
            .unwrap();
        let result = CrossFileResolver::resolve(std::slice::from_ref(&doc));
        assert_eq!(result.unresolved_calls, 1);
        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Calls && is_external_sentinel(&e.target_id)));
    }
}
