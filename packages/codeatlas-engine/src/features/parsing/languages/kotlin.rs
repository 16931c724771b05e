//! Kotlin language spec
//!
//! The Kotlin grammar has no `name` field on declarations; names are
//! `simple_identifier` children.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};

pub struct KotlinSpec;

fn simple_identifier(node: &TsNode, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "simple_identifier" || child.kind() == "type_identifier" {
            return Some(node_text(&child, source).to_string());
        }
    }
    None
}

impl LanguageSpec for KotlinSpec {
    fn language_id(&self) -> LanguageId {
        LanguageId::Kotlin
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_kotlin::language()
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &["function_declaration"]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &["class_declaration", "object_declaration", "companion_object"]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["import_header"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["property_declaration", "assignment"]
    }

    fn declaration_name(&self, node: &TsNode, source: &str) -> Option<String> {
        simple_identifier(node, source)
    }

    fn callee_name(&self, node: &TsNode, source: &str) -> Option<String> {
        // call_expression = <callee expression> <call_suffix>
        node.named_child(0)
            .map(|callee| node_text(&callee, source).to_string())
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        let text = node_text(node, source);
        Some(
            text.trim()
                .trim_start_matches("import")
                .trim()
                .trim_end_matches(".*")
                .to_string(),
        )
    }

    fn visibility(&self, _name: &str, node: &TsNode, source: &str) -> Option<String> {
        let header = node_text(node, source);
        let header = header.lines().next().unwrap_or("");
        if header.contains("private ") {
            Some("private".to_string())
        } else if header.contains("internal ") {
            Some("internal".to_string())
        } else if header.contains("protected ") {
            Some("protected".to_string())
        } else {
            Some("public".to_string())
        }
    }

    fn module_path(&self, file_path: &str) -> String {
        file_path
            .trim_end_matches(".kts")
            .trim_end_matches(".kt")
            .replace(['/', '\\'], ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::base::BaseExtractor;
    use crate::shared::models::NodeKind;

    const SOURCE: &str = r#"
import com.example.tokens.Issuer

class SessionManager {
    private val issuer = Issuer()

    fun login(user: String): String {
        return issuer.issue(user)
    }
}
"#;

    #[test]
    fn extracts_class_and_method() {
        let doc = BaseExtractor::new("repo")
            .extract(&KotlinSpec, "app/SessionManager.kt", SOURCE)
            .unwrap();

        let class = doc.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(class.name, "SessionManager");

        let login = doc.nodes.iter().find(|n| n.name == "login").unwrap();
        assert_eq!(login.kind, NodeKind::Method);
        assert_eq!(login.fqn, "app.SessionManager.SessionManager.login");
    }

    #[test]
    fn import_target_strips_keyword() {
        let doc = BaseExtractor::new("repo")
            .extract(&KotlinSpec, "app/SessionManager.kt", SOURCE)
            .unwrap();
        let import = doc.nodes_of_kind(NodeKind::Import).next().unwrap();
        assert_eq!(
            import.attrs.get("target").map(String::as_str),
            Some("com.example.tokens.Issuer")
        );
    }
}
