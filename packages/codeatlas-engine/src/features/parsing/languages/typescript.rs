//! TypeScript / JavaScript / TSX language spec
//!
//! JavaScript parses with the TypeScript grammar (strict superset for the
//! constructs extracted here); TSX files use the dedicated TSX grammar.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};

pub struct TypeScriptSpec {
    language_id: LanguageId,
    tsx: bool,
}

impl TypeScriptSpec {
    pub fn typescript() -> Self {
        Self {
            language_id: LanguageId::TypeScript,
            tsx: false,
        }
    }

    pub fn tsx() -> Self {
        Self {
            language_id: LanguageId::TypeScript,
            tsx: true,
        }
    }

    pub fn javascript() -> Self {
        Self {
            language_id: LanguageId::JavaScript,
            tsx: false,
        }
    }
}

impl LanguageSpec for TypeScriptSpec {
    fn language_id(&self) -> LanguageId {
        self.language_id
    }

    fn grammar(&self) -> TsLanguage {
        if self.tsx {
            tree_sitter_typescript::language_tsx()
        } else {
            tree_sitter_typescript::language_typescript()
        }
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &[
            "function_declaration",
            "generator_function_declaration",
            "method_definition",
            "arrow_function",
            "function_expression",
        ]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &[
            "class_declaration",
            "abstract_class_declaration",
            "interface_declaration",
            "enum_declaration",
        ]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["import_statement"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call_expression", "new_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["variable_declarator", "assignment_expression"]
    }

    fn declaration_name(&self, node: &TsNode, source: &str) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name") {
            return Some(node_text(&name, source).to_string());
        }
        // `const handler = async () => {}` takes the declarator name
        if matches!(node.kind(), "arrow_function" | "function_expression") {
            let mut parent = node.parent();
            while let Some(p) = parent {
                if p.kind() == "variable_declarator" {
                    return p
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, source).to_string());
                }
                if p.kind() == "pair" {
                    return p
                        .child_by_field_name("key")
                        .map(|n| node_text(&n, source).to_string());
                }
                // stop at statement boundaries
                if p.kind().ends_with("statement") || p.kind().ends_with("declaration") {
                    break;
                }
                parent = p.parent();
            }
        }
        None
    }

    fn callee_name(&self, node: &TsNode, source: &str) -> Option<String> {
        let callee = node
            .child_by_field_name("function")
            .or_else(|| node.child_by_field_name("constructor"))?;
        Some(node_text(&callee, source).to_string())
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        node.child_by_field_name("source")
            .map(|s| node_text(&s, source).trim_matches(['"', '\''].as_ref()).to_string())
    }

    fn visibility(&self, _name: &str, node: &TsNode, source: &str) -> Option<String> {
        let header = node_text(node, source);
        let header = header.lines().next().unwrap_or("");
        if header.contains("private ") {
            Some("private".to_string())
        } else if header.contains("protected ") {
            Some("protected".to_string())
        } else {
            Some("public".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::base::BaseExtractor;
    use crate::shared::models::NodeKind;

    const SOURCE: &str = r#"
import { issue } from "./tokens";

export class SessionStore {
    private cache: Map<string, string> = new Map();

    put(key: string, value: string) {
        this.cache.set(key, value);
    }
}

export const login = async (user: string) => {
    return issue(user);
};
"#;

    #[test]
    fn extracts_class_method_and_named_arrow() {
        let doc = BaseExtractor::new("repo")
            .extract(&TypeScriptSpec::typescript(), "src/session.ts", SOURCE)
            .unwrap();

        let class = doc.nodes.iter().find(|n| n.kind == NodeKind::Class).unwrap();
        assert_eq!(class.name, "SessionStore");

        let method = doc.nodes.iter().find(|n| n.kind == NodeKind::Method).unwrap();
        assert_eq!(method.fqn, "src.session.SessionStore.put");

        let arrow = doc
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Function && n.name == "login");
        assert!(arrow.is_some(), "named arrow function should not be a lambda");
    }

    #[test]
    fn import_source_is_unquoted() {
        let doc = BaseExtractor::new("repo")
            .extract(&TypeScriptSpec::typescript(), "src/session.ts", SOURCE)
            .unwrap();
        let import = doc.nodes_of_kind(NodeKind::Import).next().unwrap();
        assert_eq!(import.attrs.get("target").map(String::as_str), Some("./tokens"));
    }
}
