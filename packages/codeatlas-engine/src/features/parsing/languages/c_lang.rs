//! C language spec
//!
//! Function names sit behind nested declarators (pointers, arrays), so the
//! name hook unwraps `function_declarator` chains.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

use super::super::ports::{node_text, LanguageId, LanguageSpec};

pub struct CSpec;

pub(super) fn declarator_name(node: &TsNode, source: &str) -> Option<String> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "qualified_identifier" => {
                return Some(node_text(&current, source).to_string());
            }
            _ => match current.child_by_field_name("declarator") {
                Some(inner) => current = inner,
                None => return super::super::ports::first_identifier(&current, source),
            },
        }
    }
}

impl LanguageSpec for CSpec {
    fn language_id(&self) -> LanguageId {
        LanguageId::C
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_c::language()
    }

    fn function_node_types(&self) -> &'static [&'static str] {
        &["function_definition"]
    }

    fn class_node_types(&self) -> &'static [&'static str] {
        &["struct_specifier", "enum_specifier", "union_specifier"]
    }

    fn import_node_types(&self) -> &'static [&'static str] {
        &["preproc_include"]
    }

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["assignment_expression", "init_declarator"]
    }

    fn declaration_name(&self, node: &TsNode, source: &str) -> Option<String> {
        if node.kind() == "function_definition" {
            return declarator_name(node, source);
        }
        node.child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string())
    }

    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        node.child_by_field_name("path")
            .map(|p| node_text(&p, source).trim_matches(['"', '<', '>'].as_ref()).to_string())
    }

    fn visibility(&self, _name: &str, node: &TsNode, source: &str) -> Option<String> {
        if node_text(node, source).trim_start().starts_with("static") {
            Some("private".to_string())
        } else {
            Some("public".to_string())
        }
    }

    fn module_path(&self, file_path: &str) -> String {
        file_path
            .trim_end_matches(".c")
            .trim_end_matches(".h")
            .replace(['/', '\\'], ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::base::BaseExtractor;
    use crate::shared::models::NodeKind;

    const SOURCE: &str = r#"
#include <stdio.h>
#include "session.h"

struct session {
    int id;
};

static int next_id = 0;

int session_open(struct session *s) {
    s->id = next_id;
    printf("opened %d", s->id);
    return s->id;
}
"#;

    #[test]
    fn unwraps_pointer_declarators() {
        let doc = BaseExtractor::new("repo")
            .extract(&CSpec, "src/session.c", SOURCE)
            .unwrap();
        let open = doc
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Function)
            .unwrap();
        assert_eq!(open.name, "session_open");
    }

    #[test]
    fn includes_are_imports() {
        let doc = BaseExtractor::new("repo")
            .extract(&CSpec, "src/session.c", SOURCE)
            .unwrap();
        let targets: Vec<_> = doc
            .nodes_of_kind(NodeKind::Import)
            .filter_map(|n| n.attrs.get("target").cloned())
            .collect();
        assert!(targets.contains(&"stdio.h".to_string()));
        assert!(targets.contains(&"session.h".to_string()));
    }
}
