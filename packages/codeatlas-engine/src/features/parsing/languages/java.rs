//! Java language spec

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};

pub struct JavaSpec;

impl LanguageSpec for JavaSpec {
    fn language_id(&self) -> LanguageId {
        LanguageId::Java
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_java::language()
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &["method_declaration", "constructor_declaration"]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &[
            "class_declaration",
            "interface_declaration",
            "enum_declaration",
            "record_declaration",
        ]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["import_declaration"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["method_invocation", "object_creation_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        // variable_declarator, not local_variable_declaration: the
        // declaration's first child is the type, not the name
        &["assignment_expression", "variable_declarator"]
    }

    fn callee_name(&self, node: &TsNode, source: &str) -> Option<String> {
        if node.kind() == "object_creation_expression" {
            return node
                .child_by_field_name("type")
                .map(|t| node_text(&t, source).to_string());
        }
        let name = node.child_by_field_name("name")?;
        let name_text = node_text(&name, source);
        match node.child_by_field_name("object") {
            Some(obj) => Some(format!("{}.{}", node_text(&obj, source), name_text)),
            None => Some(name_text.to_string()),
        }
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        let text = node_text(node, source);
        Some(
            text.trim()
                .trim_start_matches("import")
                .trim_start_matches(" static")
                .trim()
                .trim_end_matches(';')
                .to_string(),
        )
    }

    fn visibility(&self, _name: &str, node: &TsNode, source: &str) -> Option<String> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "modifiers" {
                let mods = node_text(&child, source);
                if mods.contains("private") {
                    return Some("private".to_string());
                }
                if mods.contains("protected") {
                    return Some("protected".to_string());
                }
                if mods.contains("public") {
                    return Some("public".to_string());
                }
            }
        }
        Some("internal".to_string()) // package-private default
    }

    fn module_path(&self, file_path: &str) -> String {
        file_path
            .trim_end_matches(".java")
            .replace(['/', '\\'], ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::base::BaseExtractor;
    use crate::shared::models::NodeKind;

    const SOURCE: &str = r#"
import java.util.Map;

public class TokenService {
    private Map<String, String> cache;

    public String issue(String user) {
        return cache.get(user);
    }

    String packagePrivate() { return ""; }
}
"#;

    #[test]
    fn extracts_methods_with_visibility() {
        let doc = BaseExtractor::new("repo")
            .extract(&JavaSpec, "svc/TokenService.java", SOURCE)
            .unwrap();

        let class = doc.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(class.name, "TokenService");
        assert_eq!(class.visibility.as_deref(), Some("public"));

        let issue = doc.nodes.iter().find(|n| n.name == "issue").unwrap();
        assert_eq!(issue.kind, NodeKind::Method);
        assert_eq!(issue.visibility.as_deref(), Some("public"));

        let pp = doc.nodes.iter().find(|n| n.name == "packagePrivate").unwrap();
        assert_eq!(pp.visibility.as_deref(), Some("internal"));
    }

    #[test]
    fn qualified_callee_includes_receiver() {
        let doc = BaseExtractor::new("repo")
            .extract(&JavaSpec, "svc/TokenService.java", SOURCE)
            .unwrap();
        assert!(doc
            .edges
            .iter()
            .any(|e| e.target_id == "external::java::cache.get"));
    }
}
