//! Chunk hierarchy builder
//!
//! Build order: repo → projects (top-level directories) → modules (directory
//! grouping) → files → classes → functions/methods. Every child's
//! `parent_id` points at a chunk produced earlier in the same build, and
//! every leaf chunk carries a mapping back to its originating IR node.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use codeatlas_store::{Chunk, ChunkKind};
use tracing::debug;

use super::id_gen::ChunkIdGenerator;
use crate::shared::ids::content_hash;
use crate::shared::models::{IRDocument, IRNode, NodeKind};

/// Output of one hierarchy build
#[derive(Debug, Default)]
pub struct ChunkBuildResult {
    pub chunks: Vec<Chunk>,
    /// chunk_id → IR node ids it projects (leaf and class chunks). The same
    /// ids address the promoted graph nodes.
    pub chunk_to_ir: HashMap<String, Vec<String>>,
    pub warnings: Vec<String>,
}

pub struct ChunkBuilder {
    repo_id: String,
    snapshot_id: String,
}

impl ChunkBuilder {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
        }
    }

    pub fn build(
        &self,
        documents: &[IRDocument],
        contents: &HashMap<String, String>,
    ) -> ChunkBuildResult {
        let mut result = ChunkBuildResult::default();
        let mut ids = ChunkIdGenerator::new(&self.repo_id);

        // Exactly one repo chunk per snapshot
        let repo_hash = content_hash(&self.repo_id);
        let repo_chunk_id = ids.issue(ChunkKind::Repo, &self.repo_id, &repo_hash);
        result.chunks.push(self.make_chunk(
            &repo_chunk_id,
            ChunkKind::Repo,
            &self.repo_id,
            "",
            0,
            0,
            self.repo_id.clone(),
            None,
        ));

        // Projects: top-level directories that contain source files
        let mut top_dirs: BTreeSet<String> = BTreeSet::new();
        let mut all_dirs: BTreeSet<String> = BTreeSet::new();
        for doc in documents {
            if let Some((dir, _)) = doc.file_path.rsplit_once('/') {
                all_dirs.insert(dir.to_string());
                let top = dir.split('/').next().unwrap_or(dir);
                top_dirs.insert(top.to_string());
                // intermediate directories become modules as well
                let mut prefix = String::new();
                for segment in dir.split('/') {
                    if !prefix.is_empty() {
                        prefix.push('/');
                    }
                    prefix.push_str(segment);
                    all_dirs.insert(prefix.clone());
                }
            }
        }

        let mut project_ids: BTreeMap<String, String> = BTreeMap::new();
        for dir in &top_dirs {
            let hash = content_hash(dir);
            let id = ids.issue(ChunkKind::Project, dir, &hash);
            result.chunks.push(self.make_chunk(
                &id,
                ChunkKind::Project,
                dir,
                dir,
                0,
                0,
                dir.clone(),
                Some(repo_chunk_id.clone()),
            ));
            project_ids.insert(dir.clone(), id);
        }

        // Modules: one per directory, nested under the closest ancestor
        let mut module_ids: BTreeMap<String, String> = BTreeMap::new();
        for dir in &all_dirs {
            let fqn = dir.replace('/', ".");
            let hash = content_hash(dir);
            let id = ids.issue(ChunkKind::Module, &fqn, &hash);
            let parent = match dir.rsplit_once('/') {
                Some((parent_dir, _)) => module_ids
                    .get(parent_dir)
                    .cloned()
                    .unwrap_or_else(|| repo_chunk_id.clone()),
                None => project_ids
                    .get(dir)
                    .cloned()
                    .unwrap_or_else(|| repo_chunk_id.clone()),
            };
            result.chunks.push(self.make_chunk(
                &id,
                ChunkKind::Module,
                &fqn,
                dir,
                0,
                0,
                dir.clone(),
                Some(parent),
            ));
            module_ids.insert(dir.clone(), id);
        }

        // Files, classes, leaves
        for doc in documents {
            let content = contents
                .get(&doc.file_path)
                .cloned()
                .unwrap_or_default();
            let file_node = doc.nodes.iter().find(|n| n.kind == NodeKind::File);
            let file_fqn = file_node
                .map(|n| n.fqn.clone())
                .unwrap_or_else(|| doc.file_path.replace('/', "."));
            let end_line = content.lines().count().saturating_sub(1) as u32;

            let parent = match doc.file_path.rsplit_once('/') {
                Some((dir, _)) => module_ids
                    .get(dir)
                    .cloned()
                    .unwrap_or_else(|| repo_chunk_id.clone()),
                None => repo_chunk_id.clone(),
            };

            let file_hash = content_hash(&content);
            let file_chunk_id = ids.issue(ChunkKind::File, &file_fqn, &file_hash);
            let mut file_chunk = self.make_chunk(
                &file_chunk_id,
                ChunkKind::File,
                &file_fqn,
                &doc.file_path,
                0,
                end_line,
                content.clone(),
                Some(parent),
            );
            file_chunk.language = Some(doc.language.clone());
            result.chunks.push(file_chunk);
            if let Some(node) = file_node {
                result
                    .chunk_to_ir
                    .entry(file_chunk_id.clone())
                    .or_default()
                    .push(node.node_id.clone());
            }

            // Classes first so methods can attach to them
            let mut class_ids: HashMap<String, String> = HashMap::new();
            for node in doc.nodes_of_kind(NodeKind::Class) {
                let body = slice_lines(&content, node.span.start_line, node.span.end_line);
                let hash = content_hash(&body);
                let id = ids.issue(ChunkKind::Class, &node.fqn, &hash);
                let mut chunk = self.make_chunk(
                    &id,
                    ChunkKind::Class,
                    &node.fqn,
                    &doc.file_path,
                    node.span.start_line,
                    node.span.end_line,
                    body,
                    Some(file_chunk_id.clone()),
                );
                chunk.language = Some(doc.language.clone());
                chunk.visibility = node.visibility.clone();
                result.chunks.push(chunk);
                result
                    .chunk_to_ir
                    .entry(id.clone())
                    .or_default()
                    .push(node.node_id.clone());
                class_ids.insert(node.fqn.clone(), id);
            }

            for node in doc
                .nodes
                .iter()
                .filter(|n| matches!(n.kind, NodeKind::Function | NodeKind::Method | NodeKind::Lambda))
            {
                let kind = if node.kind == NodeKind::Method {
                    ChunkKind::Method
                } else {
                    ChunkKind::Function
                };
                let parent = enclosing_class(node, &class_ids)
                    .unwrap_or_else(|| file_chunk_id.clone());
                let body = slice_lines(&content, node.span.start_line, node.span.end_line);
                let hash = content_hash(&body);
                let id = ids.issue(kind, &node.fqn, &hash);
                let mut chunk = self.make_chunk(
                    &id,
                    kind,
                    &node.fqn,
                    &doc.file_path,
                    node.span.start_line,
                    node.span.end_line,
                    body,
                    Some(parent),
                );
                chunk.language = Some(doc.language.clone());
                chunk.visibility = node.visibility.clone();
                if let Some(sig) = &node.signature {
                    chunk.attrs.insert("signature".into(), sig.clone());
                }
                result.chunks.push(chunk);
                result
                    .chunk_to_ir
                    .entry(id.clone())
                    .or_default()
                    .push(node.node_id.clone());
            }
        }

        debug!(
            chunks = result.chunks.len(),
            mapped = result.chunk_to_ir.len(),
            "chunk hierarchy built"
        );
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn make_chunk(
        &self,
        chunk_id: &str,
        kind: ChunkKind,
        fqn: &str,
        file_path: &str,
        start_line: u32,
        end_line: u32,
        content: String,
        parent_id: Option<String>,
    ) -> Chunk {
        let mut chunk = Chunk::new(
            chunk_id,
            &self.repo_id,
            &self.snapshot_id,
            kind,
            fqn,
            file_path,
            start_line,
            end_line,
            content,
        );
        chunk.parent_id = parent_id;
        chunk
    }
}

/// Nearest class whose FQN strictly prefixes the node's FQN
fn enclosing_class(node: &IRNode, class_ids: &HashMap<String, String>) -> Option<String> {
    let mut best: Option<(&str, &String)> = None;
    for (class_fqn, id) in class_ids {
        if node.fqn.starts_with(class_fqn.as_str())
            && node.fqn[class_fqn.len()..].starts_with('.')
        {
            match best {
                Some((current, _)) if current.len() >= class_fqn.len() => {}
                _ => best = Some((class_fqn, id)),
            }
        }
    }
    best.map(|(_, id)| id.clone())
}

fn slice_lines(content: &str, start_line: u32, end_line: u32) -> String {
    content
        .lines()
        .skip(start_line as usize)
        .take((end_line.saturating_sub(start_line) + 1) as usize)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::languages::PythonSpec;
    use crate::features::parsing::BaseExtractor;

    fn build_fixture() -> ChunkBuildResult {
        let source = "class A:\n    def m(self):\n        pass\n\ndef top():\n    pass\n";
        let doc = BaseExtractor::new("repo")
            .extract(&PythonSpec, "api/views.py", source)
            .unwrap();
        let mut contents = HashMap::new();
        contents.insert("api/views.py".to_string(), source.to_string());
        ChunkBuilder::new("repo", "repo:main").build(&[doc], &contents)
    }

    #[test]
    fn builds_all_six_tiers() {
        let result = build_fixture();
        let kind_count = |k: ChunkKind| result.chunks.iter().filter(|c| c.kind == k).count();
        assert_eq!(kind_count(ChunkKind::Repo), 1);
        assert_eq!(kind_count(ChunkKind::Project), 1);
        assert_eq!(kind_count(ChunkKind::Module), 1);
        assert_eq!(kind_count(ChunkKind::File), 1);
        assert_eq!(kind_count(ChunkKind::Class), 1);
        assert_eq!(kind_count(ChunkKind::Method), 1);
        assert_eq!(kind_count(ChunkKind::Function), 1);
    }

    #[test]
    fn parents_exist_and_precede_children() {
        let result = build_fixture();
        let mut seen = std::collections::HashSet::new();
        for chunk in &result.chunks {
            if let Some(parent) = &chunk.parent_id {
                assert!(seen.contains(parent), "parent of {} not built yet", chunk.chunk_id);
            }
            seen.insert(chunk.chunk_id.clone());
        }
    }

    #[test]
    fn method_nests_under_class() {
        let result = build_fixture();
        let class = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Class)
            .unwrap();
        let method = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Method)
            .unwrap();
        assert_eq!(method.parent_id.as_deref(), Some(class.chunk_id.as_str()));
        assert!(method.start_line >= class.start_line);
        assert!(method.end_line <= class.end_line);
    }

    #[test]
    fn leaf_chunks_map_back_to_ir_nodes() {
        let result = build_fixture();
        let method = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Method)
            .unwrap();
        assert!(result.chunk_to_ir.contains_key(&method.chunk_id));
    }

    #[test]
    fn rebuild_produces_identical_chunk_ids() {
        let a = build_fixture();
        let b = build_fixture();
        let ids_a: Vec<_> = a.chunks.iter().map(|c| &c.chunk_id).collect();
        let ids_b: Vec<_> = b.chunks.iter().map(|c| &c.chunk_id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
