//! Python language spec
//!
//! Handles decorated definitions, `async def`, and the `__init__.py`
//! package-module convention.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};

pub struct PythonSpec;

impl LanguageSpec for PythonSpec {
    fn language_id(&self) -> LanguageId {
        LanguageId::Python
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_python::language()
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &["function_definition"]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &["class_definition"]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["import_statement", "import_from_statement"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["assignment", "augmented_assignment"]
    }

    fn is_async(&self, node: &TsNode, source: &str) -> bool {
        // `async def` keeps `def` as the declaration; the keyword is a
        // leading child of function_definition
        node_text(node, source).trim_start().starts_with("async")
    }

    fn signature(&self, node: &TsNode, source: &str) -> Option<String> {
        node_text(node, source)
            .lines()
            .next()
            .map(|l| l.trim_end_matches(':').trim().to_string())
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        // `from a.b import c` → a.b ; `import a.b` → a.b
        if node.kind() == "import_from_statement" {
            node.child_by_field_name("module_name")
                .map(|m| node_text(&m, source).to_string())
        } else {
            node.named_child(0).map(|m| node_text(&m, source).to_string())
        }
    }

    fn module_path(&self, file_path: &str) -> String {
        let no_ext = file_path.trim_end_matches(".py").trim_end_matches(".pyi");
        let dotted = no_ext.replace(['/', '\\'], ".");
        dotted
            .trim_end_matches(".__init__")
            .trim_end_matches("__init__")
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
import os
from auth import tokens

class Session:
    def login(self, user):
        tokens.issue(user)

def _helper():
    x = 1
"#;

    #[test]
    fn extracts_classes_methods_and_imports() {
        let doc = BaseExtractor::new("repo")
            .extract(&PythonSpec, "app/session.py", SOURCE)
            .unwrap();

        let class = doc.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(class.fqn, "app.session.Session");

        let method = doc.nodes.iter().find(|n| n.kind == NodeKind::Method).unwrap();
        assert_eq!(method.name, "login");
        assert_eq!(method.fqn, "app.session.Session.login");

        let helper = doc
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Function)
            .unwrap();
        assert_eq!(helper.visibility.as_deref(), Some("private"));

        let imports: Vec<_> = doc.nodes_of_kind(NodeKind::Import).collect();
        assert_eq!(imports.len(), 2);
        assert!(imports.iter().any(|i| i.attrs.get("target").map(String::as_str) == Some("os")));
        assert!(imports.iter().any(|i| i.attrs.get("target").map(String::as_str) == Some("auth")));
    }

    #[test]
    fn call_sites_point_at_sentinels() {
        let doc = BaseExtractor::new("repo")
            .extract(&PythonSpec, "app/session.py", SOURCE)
            .unwrap();
        let call_edge = doc
            .edges
            .iter()
            .find(|e| e.target_id.starts_with("external::python::tokens.issue"))
            .unwrap();
        assert!(call_edge.attrs.contains_key("call_site_line"));
    }

    #[test]
    fn init_py_maps_to_package_module() {
        assert_eq!(PythonSpec.module_path("pkg/__init__.py"), "pkg");
        assert_eq!(PythonSpec.module_path("pkg/sub/mod.py"), "pkg.sub.mod");
    }
}
