//! Rust language spec
//!
//! `impl` blocks are treated as class scopes so their functions become
//! methods under the implemented type's FQN.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};

pub struct RustSpec;

impl LanguageSpec for RustSpec {
    fn language_id(&self) -> LanguageId {
        LanguageId::Rust
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_rust::language()
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &["function_item"]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &["struct_item", "enum_item", "trait_item", "union_item", "impl_item"]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["use_declaration"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["let_declaration", "assignment_expression"]
    }

    fn declaration_name(&self, node: &TsNode, source: &str) -> Option<String> {
        if node.kind() == "impl_item" {
            return node
                .child_by_field_name("type")
                .map(|t| node_text(&t, source).to_string());
        }
        node.child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string())
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        node.child_by_field_name("argument")
            .map(|a| node_text(&a, source).to_string())
            .or_else(|| {
                let text = node_text(node, source);
                Some(
                    text.trim()
                        .trim_start_matches("pub ")
                        .trim_start_matches("use")
                        .trim()
                        .trim_end_matches(';')
                        .to_string(),
                )
            })
    }

    fn visibility(&self, _name: &str, node: &TsNode, source: &str) -> Option<String> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "visibility_modifier" {
                let vis = node_text(&child, source);
                return Some(if vis == "pub" {
                    "public".to_string()
                } else {
                    "internal".to_string() // pub(crate) and friends
                });
            }
        }
        Some("private".to_string())
    }

    fn is_async(&self, node: &TsNode, source: &str) -> bool {
        node_text(node, source)
            .split_whitespace()
            .take(3)
            .any(|tok| tok == "async")
    }

    fn module_path(&self, file_path: &str) -> String {
        let no_ext = file_path.trim_end_matches(".rs");
        let dotted = no_ext.replace(['/', '\\'], ".");
        dotted
            .trim_end_matches(".mod")
            .trim_end_matches(".lib")
            .trim_end_matches(".main")
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::base::BaseExtractor;
    use crate::shared::models::NodeKind;

    const SOURCE: &str = r#"
use std::collections::HashMap;

pub struct SessionStore {
    cache: HashMap<String, String>,
}

impl SessionStore {
    pub fn put(&mut self, key: String, value: String) {
        self.cache.insert(key, value);
    }

    async fn refresh(&self) {}
}

fn helper() {}
"#;

    #[test]
    fn impl_functions_become_methods() {
        let doc = BaseExtractor::new("repo")
            .extract(&RustSpec, "src/session.rs", SOURCE)
            .unwrap();

        let put = doc.nodes.iter().find(|n| n.name == "put").unwrap();
        assert_eq!(put.kind, NodeKind::Method);
        assert_eq!(put.fqn, "src.session.SessionStore.put");
        assert_eq!(put.visibility.as_deref(), Some("public"));

        let refresh = doc.nodes.iter().find(|n| n.name == "refresh").unwrap();
        assert_eq!(refresh.attrs.get("async").map(String::as_str), Some("true"));
        assert_eq!(refresh.visibility.as_deref(), Some("private"));

        let helper = doc.nodes.iter().find(|n| n.name == "helper").unwrap();
        assert_eq!(helper.kind, NodeKind::Function);
    }

    #[test]
    fn use_declaration_target() {
        let doc = BaseExtractor::new("repo")
            .extract(&RustSpec, "src/session.rs", SOURCE)
            .unwrap();
        let import = doc.nodes_of_kind(NodeKind::Import).next().unwrap();
        assert_eq!(
            import.attrs.get("target").map(String::as_str),
            Some("std::collections::HashMap")
        );
    }
}
