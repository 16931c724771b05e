//! Parsing ports: the language contract every front-end implements
//!
//! One `BaseExtractor` owns all shared extraction logic; a `LanguageSpec`
//! only declares its AST node-type sets and overrides the hooks where its
//! grammar differs. The engine core never switches on a language name.

use tree_sitter::{Language as TsLanguage, Node as TsNode};

/// Language identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageId {
    Python,
    TypeScript,
    JavaScript,
    Java,
    Kotlin,
    Rust,
    Go,
    C,
    Cpp,
}

impl LanguageId {
    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::Python => "python",
            LanguageId::TypeScript => "typescript",
            LanguageId::JavaScript => "javascript",
            LanguageId::Java => "java",
            LanguageId::Kotlin => "kotlin",
            LanguageId::Rust => "rust",
            LanguageId::Go => "go",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Some(LanguageId::Python),
            "ts" | "tsx" => Some(LanguageId::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(LanguageId::JavaScript),
            "java" => Some(LanguageId::Java),
            "kt" | "kts" => Some(LanguageId::Kotlin),
            "rs" => Some(LanguageId::Rust),
            "go" => Some(LanguageId::Go),
            "c" | "h" => Some(LanguageId::C),
            "cc" | "cpp" | "cxx" | "hpp" | "hh" => Some(LanguageId::Cpp),
            _ => None,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            LanguageId::Python => &["py", "pyi"],
            LanguageId::TypeScript => &["ts", "tsx"],
            LanguageId::JavaScript => &["js", "jsx", "mjs", "cjs"],
            LanguageId::Java => &["java"],
            LanguageId::Kotlin => &["kt", "kts"],
            LanguageId::Rust => &["rs"],
            LanguageId::Go => &["go"],
            LanguageId::C => &["c", "h"],
            LanguageId::Cpp => &["cc", "cpp", "cxx", "hpp", "hh"],
        }
    }
}

/// Per-language configuration and hooks consumed by `BaseExtractor`
///
/// Defaults cover the common tree-sitter conventions (a `name` field on
/// declarations, a `function` field on call expressions, a `parameters`
/// list). Languages override only what differs.
pub trait LanguageSpec: Send + Sync {
    fn language_id(&self) -> LanguageId;

    /// Tree-sitter grammar for this language
    fn grammar(&self) -> TsLanguage;

    // Node-type sets

    fn function_node_types(&self) -> &'static [&'static str];

    fn class_node_types(&self) -> &'static [&'static str];

    fn import_node_types(&self) -> &'static [&'static str];

    fn call_node_types(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn assignment_node_types(&self) -> &'static [&'static str] {
        &["assignment_expression"]
    }

    // Overridable hooks

    /// Name of a function/class declaration node
    fn declaration_name(&self, node: &TsNode, source: &str) -> Option<String> {
        node.child_by_field_name("name")
            .map(|n| node_text(&n, source).to_string())
    }

    /// Parameter names of a function declaration
    fn parameter_names(&self, node: &TsNode, source: &str) -> Vec<String> {
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut cursor = params.walk();
        let mut out = Vec::new();
        for child in params.named_children(&mut cursor) {
            if let Some(name) = first_identifier(&child, source) {
                out.push(name);
            }
        }
        out
    }

    /// Callee expression text of a call node
    fn callee_name(&self, node: &TsNode, source: &str) -> Option<String> {
        node.child_by_field_name("function")
            .map(|n| node_text(&n, source).to_string())
    }

    /// Import target cleaned of keywords/quotes
    fn import_target(&self, node: &TsNode, source: &str) -> Option<String> {
        let text = node_text(node, source);
        let cleaned = text
            .trim()
            .trim_start_matches("import")
            .trim_start_matches("from")
            .trim_start_matches("use")
            .trim_start_matches("#include")
            .trim()
            .trim_end_matches(';')
            .trim_matches(|c| c == '"' || c == '\'' || c == '<' || c == '>')
            .trim()
            .to_string();
        (!cleaned.is_empty()).then_some(cleaned)
    }

    /// Visibility of a declared symbol; default is the underscore convention
    fn visibility(&self, name: &str, _node: &TsNode, _source: &str) -> Option<String> {
        if name.starts_with('_') {
            Some("private".to_string())
        } else {
            Some("public".to_string())
        }
    }

    /// One-line signature; default is the header up to the body
    fn signature(&self, node: &TsNode, source: &str) -> Option<String> {
        let text = node_text(node, source);
        text.lines().next().map(|l| l.trim_end_matches('{').trim().to_string())
    }

    /// True when the declaration is an async form
    fn is_async(&self, node: &TsNode, source: &str) -> bool {
        node_text(node, source).trim_start().starts_with("async ")
    }

    /// Module path from a file path; default strips the extension and maps
    /// separators to dots
    fn module_path(&self, file_path: &str) -> String {
        let no_ext = file_path
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_path);
        no_ext.replace(['/', '\\'], ".")
    }
}

/// Text of a tree-sitter node, empty on out-of-range (defensive against
/// grammar/source mismatches)
pub fn node_text<'a>(node: &TsNode, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// First descendant whose kind names an identifier
pub fn first_identifier(node: &TsNode, source: &str) -> Option<String> {
    if node.kind().contains("identifier") {
        return Some(node_text(node, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(found) = first_identifier(&child, source) {
            return Some(found);
        }
    }
    None
}
