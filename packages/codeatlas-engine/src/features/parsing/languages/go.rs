//! Go language spec
//!
//! Visibility follows the exported-identifier convention (leading capital).

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};

pub struct GoSpec;

impl LanguageSpec for GoSpec {
    fn language_id(&self) -> LanguageId {
        LanguageId::Go
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_go::language()
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &["function_declaration", "method_declaration", "func_literal"]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &["type_declaration"]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["import_spec"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["short_var_declaration", "assignment_statement", "var_declaration"]
    }

    fn declaration_name(&self, node: &TsNode, source: &str) -> Option<String> {
        if node.kind() == "type_declaration" {
            // type_declaration → type_spec(name: type_identifier)
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "type_spec" {
                    return child
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, source).to_string());
                }
            }
            return None;
        }
        node.child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string())
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        node.child_by_field_name("path")
            .map(|p| node_text(&p, source).trim_matches('"').to_string())
            .or_else(|| Some(node_text(node, source).trim_matches('"').to_string()))
    }

    fn visibility(&self, name: &str, _node: &TsNode, _source: &str) -> Option<String> {
        if name.chars().next().is_some_and(|c| c.is_uppercase()) {
            Some("public".to_string())
        } else {
            Some("private".to_string())
        }
    }

    fn module_path(&self, file_path: &str) -> String {
        // Go resolves by package (directory), not file
        match file_path.rsplit_once('/') {
            Some((dir, _)) => dir.replace(['/', '\\'], "."),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::base::BaseExtractor;
    use crate::shared::models::NodeKind;

    const SOURCE: &str = r#"
package session

import "fmt"

type Store struct {
    cache map[string]string
}

func (s *Store) Put(key, value string) {
    s.cache[key] = value
}

func helper() {
    fmt.Println("x")
}
"#;

    #[test]
    fn receiver_methods_and_exported_names() {
        let doc = BaseExtractor::new("repo")
            .extract(&GoSpec, "pkg/session/store.go", SOURCE)
            .unwrap();

        let store = doc.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(store.name, "Store");
        assert_eq!(store.visibility.as_deref(), Some("public"));

        let put = doc.nodes.iter().find(|n| n.name == "Put").unwrap();
        assert_eq!(put.visibility.as_deref(), Some("public"));

        let helper = doc.nodes.iter().find(|n| n.name == "helper").unwrap();
        assert_eq!(helper.visibility.as_deref(), Some("private"));
        assert_eq!(helper.fqn, "pkg.session.helper");
    }

    #[test]
    fn import_path_is_unquoted() {
        let doc = BaseExtractor::new("repo")
            .extract(&GoSpec, "pkg/session/store.go", SOURCE)
            .unwrap();
        let import = doc.nodes_of_kind(NodeKind::Import).next().unwrap();
        assert_eq!(import.attrs.get("target").map(String::as_str), Some("fmt"));
    }
}
