//! C++ language spec
//!
//! Shares the declarator unwrapping with C and adds classes, namespaces-as-
//! scopes (via qualified names), and `new` expressions.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};
use super::c_lang::declarator_name;

pub struct CppSpec;

impl LanguageSpec for CppSpec {
    fn language_id(&self) -> LanguageId {
        LanguageId::Cpp
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_cpp::language()
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &["function_definition", "lambda_expression"]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &["class_specifier", "struct_specifier", "enum_specifier", "union_specifier"]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["preproc_include", "using_declaration"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call_expression", "new_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["assignment_expression", "init_declarator"]
    }

    fn declaration_name(&self, node: &TsNode, source: &str) -> Option<String> {
        match node.kind() {
            "function_definition" => declarator_name(node, source),
            "lambda_expression" => None,
            _ => node
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string()),
        }
    }

    fn callee_name(&self, node: &TsNode, source: &str) -> Option<String> {
        if node.kind() == "new_expression" {
            return node
                .child_by_field_name("type")
                .map(|t| node_text(&t, source).to_string());
        }
        node.child_by_field_name("function")
            .map(|f| node_text(&f, source).to_string())
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        if node.kind() == "using_declaration" {
            let text = node_text(node, source);
            return Some(
                text.trim()
                    .trim_start_matches("using")
                    .trim_start_matches(" namespace")
                    .trim()
                    .trim_end_matches(';')
                    .to_string(),
            );
        }
        node.child_by_field_name("path")
            .map(|p| node_text(&p, source).trim_matches(['"', '<', '>'].as_ref()).to_string())
    }

    fn visibility(&self, _name: &str, _node: &TsNode, _source: &str) -> Option<String> {
        // access specifiers are positional in the class body; default public
        Some("public".to_string())
    }

    fn module_path(&self, file_path: &str) -> String {
        let no_ext = file_path
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_path);
        no_ext.replace(['/', '\\'], ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::base::BaseExtractor;
    use crate::shared::models::NodeKind;

    const SOURCE: &str = r#"
#include <string>

class SessionStore {
public:
    void put(const std::string& key) {
        keys.push_back(key);
    }
private:
    std::vector<std::string> keys;
};
"#;

    #[test]
    fn class_methods_are_scoped() {
        let doc = BaseExtractor::new("repo")
            .extract(&CppSpec, "src/session.cc", SOURCE)
            .unwrap();

        let class = doc.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(class.name, "SessionStore");

        let put = doc.nodes.iter().find(|n| n.name == "put").unwrap();
        assert_eq!(put.kind, NodeKind::Method);
        assert_eq!(put.fqn, "src.session.SessionStore.put");
    }
}
