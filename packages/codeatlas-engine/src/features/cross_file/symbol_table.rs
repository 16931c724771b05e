//! Global symbol table across IR documents
//!
//! Backs import and callee resolution: exact FQN lookup, module lookup, and
//! a last-segment suffix index for unqualified call sites.

use std::collections::HashMap;

use crate::shared::models::{IRDocument, NodeKind};

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub node_id: String,
    pub fqn: String,
    pub kind: NodeKind,
    pub file_path: String,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    by_fqn: HashMap<String, SymbolEntry>,
    /// last FQN segment → entries (for unqualified callee lookup)
    by_suffix: HashMap<String, Vec<SymbolEntry>>,
    /// module path (dotted) → file node id
    modules: HashMap<String, String>,
    /// plain file path → file node id
    files: HashMap<String, String>,
}

impl SymbolTable {
    pub fn build(documents: &[IRDocument]) -> Self {
        let mut table = Self::default();
        for doc in documents {
            for node in &doc.nodes {
                match node.kind {
                    NodeKind::File => {
                        table.modules.insert(node.fqn.clone(), node.node_id.clone());
                        table.files.insert(doc.file_path.clone(), node.node_id.clone());
                    }
                    NodeKind::Function
                    | NodeKind::Method
                    | NodeKind::Class
                    | NodeKind::Interface
                    | NodeKind::Variable => {
                        let entry = SymbolEntry {
                            node_id: node.node_id.clone(),
                            fqn: node.fqn.clone(),
                            kind: node.kind,
                            file_path: node.file_path.clone(),
                        };
                        table.by_fqn.insert(node.fqn.clone(), entry.clone());
                        if let Some(last) = node.fqn.rsplit('.').next() {
                            table.by_suffix.entry(last.to_string()).or_default().push(entry);
                        }
                    }
                    _ => {}
                }
            }
        }
        table
    }

    pub fn by_fqn(&self, fqn: &str) -> Option<&SymbolEntry> {
        self.by_fqn.get(fqn)
    }

    /// Entries whose FQN ends with the given segment
    pub fn by_suffix(&self, segment: &str) -> &[SymbolEntry] {
        self.by_suffix
            .get(segment)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// File node id for a dotted module path
    pub fn module(&self, module_path: &str) -> Option<&String> {
        self.modules.get(module_path)
    }

    pub fn file(&self, file_path: &str) -> Option<&String> {
        self.files.get(file_path)
    }

    pub fn symbol_count(&self) -> usize {
        self.by_fqn.len()
    }
}
