//! Base extractor
//!
//! Owns the logic every language shares: the tree walk, the scope stack and
//! FQN builder, function/class/import/call extraction, and stable-ID
//! assignment. Language modules contribute node-type sets and hooks only.

use tree_sitter::{Node as TsNode, Parser};

use super::ports::LanguageSpec;
use crate::shared::ids::{external_sentinel, member_hash, span_hash, stable_node_id};
use crate::shared::models::{EdgeKind, EngineError, IRDocument, IREdge, IRNode, NodeKind, Result, Span};
use crate::shared::scope_stack::ScopeStack;

pub struct BaseExtractor {
    repo_id: String,
}

impl BaseExtractor {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
        }
    }

    /// Parse one file and lower it to an IR document.
    ///
    /// Tree-sitter is error-tolerant: a file with syntax errors still yields
    /// partial IR. Only a grammar-load or total parse failure is an error.
    pub fn extract(
        &self,
        spec: &dyn LanguageSpec,
        file_path: &str,
        source: &str,
    ) -> Result<IRDocument> {
        let mut parser = Parser::new();
        parser
            .set_language(&spec.grammar())
            .map_err(|e| EngineError::parse(file_path, format!("grammar load failed: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| EngineError::parse(file_path, "parser produced no tree"))?;

        let language = spec.language_id().name();
        let mut walk = Walk {
            spec,
            source,
            file_path,
            language,
            repo_id: &self.repo_id,
            scopes: ScopeStack::with_module(&spec.module_path(file_path)),
            doc: IRDocument::new(file_path, language),
            owners: Vec::new(),
        };

        let root = tree.root_node();
        let file_span = span_of(&root);
        let file_id = walk.stable_id(NodeKind::File, &file_span);
        let mut file_node = IRNode::new(
            file_id.clone(),
            NodeKind::File,
            spec.module_path(file_path),
            file_path,
            language,
            file_path,
            file_span,
        );
        if root.has_error() {
            file_node = file_node.with_attr("has_syntax_errors", "true");
        }
        walk.doc.nodes.push(file_node);
        walk.owners.push(file_id);

        walk.visit(&root);
        Ok(walk.doc)
    }
}

struct Walk<'a> {
    spec: &'a dyn LanguageSpec,
    source: &'a str,
    file_path: &'a str,
    language: &'static str,
    repo_id: &'a str,
    scopes: ScopeStack,
    doc: IRDocument,
    /// Stack of enclosing container node ids (file → class → function ...)
    owners: Vec<String>,
}

impl<'a> Walk<'a> {
    fn stable_id(&self, kind: NodeKind, span: &Span) -> String {
        let hash = span_hash(self.file_path, span);
        stable_node_id(self.language, self.repo_id, kind.as_str(), &hash)
    }

    fn owner(&self) -> String {
        self.owners
            .last()
            .cloned()
            .unwrap_or_else(|| self.file_path.to_string())
    }

    fn visit(&mut self, node: &TsNode) {
        let kind = node.kind();
        if self.spec.function_node_types().contains(&kind) {
            self.extract_function(node);
            return; // children visited inside with the new scope
        }
        if self.spec.class_node_types().contains(&kind) {
            self.extract_class(node);
            return;
        }
        if self.spec.import_node_types().contains(&kind) {
            self.extract_import(node);
        } else if self.spec.call_node_types().contains(&kind) {
            self.extract_call(node);
        } else if self.spec.assignment_node_types().contains(&kind) {
            self.extract_assignment(node);
        }

        let mut cursor = node.walk();
        let children: Vec<TsNode> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(&child);
        }
    }

    /// Shared function/method extraction: name, FQN, signature, parameters
    fn extract_function(&mut self, node: &TsNode) {
        let span = span_of(node);
        let (name, node_kind) = match self.spec.declaration_name(node, self.source) {
            Some(name) => {
                let kind = if self.scopes.is_inside_class() {
                    NodeKind::Method
                } else {
                    NodeKind::Function
                };
                (name, kind)
            }
            None => (format!("<lambda@{}>", span.start_line), NodeKind::Lambda),
        };
        let fqn = self.scopes.qualify(&name);
        let node_id = self.stable_id(node_kind, &span);

        let mut ir = IRNode::new(
            node_id.clone(),
            node_kind,
            &fqn,
            &name,
            self.language,
            self.file_path,
            span,
        );
        ir.signature = self.spec.signature(node, self.source);
        ir.visibility = self.spec.visibility(&name, node, self.source);
        if self.spec.is_async(node, self.source) {
            ir.attrs.insert("async".into(), "true".into());
        }
        self.doc.nodes.push(ir);
        self.doc
            .edges
            .push(IREdge::new(self.owner(), &node_id, EdgeKind::Contains));

        for param in self.spec.parameter_names(node, self.source) {
            let hash = member_hash(self.file_path, &span, &param);
            let param_id =
                stable_node_id(self.language, self.repo_id, NodeKind::Parameter.as_str(), &hash);
            let param_fqn = format!("{fqn}.{param}");
            self.doc.nodes.push(IRNode::new(
                param_id.clone(),
                NodeKind::Parameter,
                param_fqn,
                param,
                self.language,
                self.file_path,
                span,
            ));
            self.doc
                .edges
                .push(IREdge::new(&node_id, &param_id, EdgeKind::Defines));
        }

        self.scopes.push(&name, false);
        self.owners.push(node_id);
        let mut cursor = node.walk();
        let children: Vec<TsNode> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(&child);
        }
        self.owners.pop();
        self.scopes.pop();
    }

    /// Shared class/interface/struct extraction
    fn extract_class(&mut self, node: &TsNode) {
        let span = span_of(node);
        let Some(name) = self.spec.declaration_name(node, self.source) else {
            // anonymous class expressions still get their children visited
            let mut cursor = node.walk();
            let children: Vec<TsNode> = node.named_children(&mut cursor).collect();
            for child in children {
                self.visit(&child);
            }
            return;
        };
        let fqn = self.scopes.qualify(&name);
        let node_id = self.stable_id(NodeKind::Class, &span);

        let mut ir = IRNode::new(
            node_id.clone(),
            NodeKind::Class,
            &fqn,
            &name,
            self.language,
            self.file_path,
            span,
        );
        ir.visibility = self.spec.visibility(&name, node, self.source);
        self.doc.nodes.push(ir);
        self.doc
            .edges
            .push(IREdge::new(self.owner(), &node_id, EdgeKind::Contains));

        self.scopes.push(&name, true);
        self.owners.push(node_id);
        let mut cursor = node.walk();
        let children: Vec<TsNode> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(&child);
        }
        self.owners.pop();
        self.scopes.pop();
    }

    fn extract_import(&mut self, node: &TsNode) {
        let Some(target) = self.spec.import_target(node, self.source) else {
            return;
        };
        let span = span_of(node);
        let node_id = self.stable_id(NodeKind::Import, &span);
        let ir = IRNode::new(
            node_id.clone(),
            NodeKind::Import,
            self.scopes.qualify(&format!("<import:{target}>")),
            &target,
            self.language,
            self.file_path,
            span,
        )
        .with_attr("target", &target);
        self.doc.nodes.push(ir);
        self.doc
            .edges
            .push(IREdge::new(self.owner(), &node_id, EdgeKind::Contains));
    }

    /// Call sites become Call nodes plus a CALLS edge to an external
    /// sentinel; the cross-file resolver rewrites sentinels it can resolve.
    fn extract_call(&mut self, node: &TsNode) {
        let Some(callee) = self.spec.callee_name(node, self.source) else {
            return;
        };
        let span = span_of(node);
        let node_id = self.stable_id(NodeKind::Call, &span);
        let mut ir = IRNode::new(
            node_id.clone(),
            NodeKind::Call,
            self.scopes.qualify(&format!("<call:{callee}@{}>", span.start_line)),
            &callee,
            self.language,
            self.file_path,
            span,
        )
        .with_attr("callee", &callee);
        let mut args = Vec::new();
        if let Some(arguments) = node.child_by_field_name("arguments") {
            let mut cursor = arguments.walk();
            for child in arguments.named_children(&mut cursor) {
                if let Some(name) = super::ports::first_identifier(&child, self.source) {
                    args.push(name);
                }
            }
        }
        if !args.is_empty() {
            ir = ir.with_attr("args", args.join(","));
        }
        self.doc.nodes.push(ir);
        self.doc
            .edges
            .push(IREdge::new(self.owner(), &node_id, EdgeKind::Contains));
        self.doc.edges.push(
            IREdge::new(
                self.owner(),
                external_sentinel(self.language, &callee),
                EdgeKind::Calls,
            )
            .with_attr("call_site_line", span.start_line.to_string()),
        );
    }

    /// Assignments yield Variable nodes plus WRITES (lhs) and READS (rhs)
    fn extract_assignment(&mut self, node: &TsNode) {
        let lhs = node
            .child_by_field_name("left")
            .or_else(|| node.child_by_field_name("name"))
            .or_else(|| node.named_child(0));
        let Some(lhs) = lhs else { return };
        let Some(var_name) = super::ports::first_identifier(&lhs, self.source) else {
            return;
        };

        let span = span_of(node);
        let fqn = self.scopes.qualify(&var_name);
        let existing = self
            .doc
            .nodes
            .iter()
            .position(|n| n.kind == NodeKind::Variable && n.fqn == fqn);
        let var_id = match existing {
            Some(index) => self.doc.nodes[index].node_id.clone(),
            None => {
                let hash = member_hash(self.file_path, &span, &var_name);
                let id = stable_node_id(
                    self.language,
                    self.repo_id,
                    NodeKind::Variable.as_str(),
                    &hash,
                );
                self.doc.nodes.push(IRNode::new(
                    id.clone(),
                    NodeKind::Variable,
                    &fqn,
                    &var_name,
                    self.language,
                    self.file_path,
                    span,
                ));
                id
            }
        };

        self.doc.edges.push(
            IREdge::new(self.owner(), &var_id, EdgeKind::Writes)
                .with_attr("line", span.start_line.to_string()),
        );
        if let Some(rhs) = node
            .child_by_field_name("right")
            .or_else(|| node.child_by_field_name("value"))
        {
            if let Some(read_name) = super::ports::first_identifier(&rhs, self.source) {
                if read_name != var_name {
                    self.doc.edges.push(
                        IREdge::new(self.owner(), external_sentinel(self.language, &read_name), EdgeKind::Reads)
                            .with_attr("line", span.start_line.to_string()),
                    );
                }
            }
        }
    }
}

fn span_of(node: &TsNode) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span::new(
        start.row as u32,
        start.column as u32,
        end.row as u32,
        end.column as u32,
    )
}
