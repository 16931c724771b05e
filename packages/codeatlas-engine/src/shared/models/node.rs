//! Language-neutral IR nodes
//!
//! Every parser front-end lowers its AST into these nodes; all later stages
//! (chunking, graph building, analyses) consume them. IR documents are
//! transient within a pipeline run; their projections are what persist.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::span::Span;

/// Node kind in the language-neutral IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    File,
    Class,
    Interface,
    Function,
    Method,
    Lambda,
    Variable,
    Parameter,
    Field,
    Import,
    Call,
    Literal,
    TypeAlias,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::File => "file",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Lambda => "lambda",
            NodeKind::Variable => "variable",
            NodeKind::Parameter => "parameter",
            NodeKind::Field => "field",
            NodeKind::Import => "import",
            NodeKind::Call => "call",
            NodeKind::Literal => "literal",
            NodeKind::TypeAlias => "type_alias",
        }
    }

    /// Kinds that open a lexical scope for FQN building
    pub fn opens_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::Module
                | NodeKind::Class
                | NodeKind::Interface
                | NodeKind::Function
                | NodeKind::Method
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Method | NodeKind::Lambda)
    }
}

/// A single IR node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRNode {
    /// Stable, content/structure-derived identifier (unique per repo+snapshot)
    pub node_id: String,
    pub kind: NodeKind,
    /// Fully qualified dotted name, unique within its scope
    pub fqn: String,
    pub name: String,
    pub language: String,
    pub file_path: String,
    pub span: Span,
    pub type_info: Option<String>,
    pub signature: Option<String>,
    pub visibility: Option<String>,
    pub attrs: HashMap<String, String>,
}

impl IRNode {
    pub fn new(
        node_id: impl Into<String>,
        kind: NodeKind,
        fqn: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
        file_path: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            fqn: fqn.into(),
            name: name.into(),
            language: language.into(),
            file_path: file_path.into(),
            span,
            type_info: None,
            signature: None,
            visibility: None,
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// Per-file IR: the output of one front-end run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IRDocument {
    pub file_path: String,
    pub language: String,
    pub nodes: Vec<IRNode>,
    pub edges: Vec<super::edge::IREdge>,
}

impl IRDocument {
    pub fn new(file_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            language: language.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node_by_id(&self, node_id: &str) -> Option<&IRNode> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &IRNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }
}
