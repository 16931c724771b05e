//! Chunk ID generation
//!
//! Format: `chunk:{repo_id}:{kind}:{fqn}`, stable across runs because it is
//! derived from structure, not allocation order. Two distinct chunks can
//! legitimately claim the same (kind, fqn) (overload sets, shadowed files);
//! the collision loser gets a short content-hash suffix, which is itself
//! deterministic.

use std::collections::HashSet;

use codeatlas_store::ChunkKind;

pub struct ChunkIdGenerator {
    repo_id: String,
    issued: HashSet<String>,
}

impl ChunkIdGenerator {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            issued: HashSet::new(),
        }
    }

    /// Issue the canonical ID, suffixing with the first 8 hex chars of the
    /// content hash when the canonical form is taken.
    pub fn issue(&mut self, kind: ChunkKind, fqn: &str, content_hash: &str) -> String {
        let canonical = format!("chunk:{}:{}:{}", self.repo_id, kind.as_str(), fqn);
        if self.issued.insert(canonical.clone()) {
            return canonical;
        }
        let short_hash = &content_hash[..content_hash.len().min(8)];
        let suffixed = format!("{canonical}:{short_hash}");
        self.issued.insert(suffixed.clone());
        suffixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_then_suffixed_on_collision() {
        let mut generator = ChunkIdGenerator::new("backend");
        let first = generator.issue(ChunkKind::Function, "pkg.handler", "aaaabbbbcccc");
        let second = generator.issue(ChunkKind::Function, "pkg.handler", "ddddeeeeffff");
        assert_eq!(first, "chunk:backend:function:pkg.handler");
        assert_eq!(second, "chunk:backend:function:pkg.handler:ddddeeee");
    }

    #[test]
    fn kinds_do_not_collide() {
        let mut generator = ChunkIdGenerator::new("backend");
        let file = generator.issue(ChunkKind::File, "pkg.mod", "aaaa0000");
        let module = generator.issue(ChunkKind::Module, "pkg.mod", "bbbb1111");
        assert_ne!(file, module);
        assert!(!module.ends_with("bbbb1111"));
    }
}
