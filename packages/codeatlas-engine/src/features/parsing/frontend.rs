//! Parser front-end service
//!
//! Fans the base extractor out over a batch of files with rayon. A failure
//! on one file never aborts the batch: the file is reported with its error
//! and skipped.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::base::BaseExtractor;
use super::registry::ExtractorRegistry;
use crate::shared::models::{EngineError, IRDocument, Result};

/// One file to parse: (repo-relative path, content)
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Batch result: documents for parsed files, errors for failed ones
#[derive(Debug, Default)]
pub struct FrontendResult {
    pub documents: Vec<IRDocument>,
    pub errors: Vec<(String, EngineError)>,
    pub skipped_unsupported: usize,
}

pub struct ParserFrontend {
    registry: ExtractorRegistry,
    repo_id: String,
}

impl ParserFrontend {
    pub fn new(repo_id: impl Into<String>, registry: ExtractorRegistry) -> Self {
        Self {
            registry,
            repo_id: repo_id.into(),
        }
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Parse all supported files in parallel (work-stealing over the rayon
    /// pool). Documents come back sorted by path for determinism.
    pub fn extract_all(&self, files: &[SourceFile]) -> FrontendResult {
        let outcomes: Vec<_> = files
            .par_iter()
            .map(|file| {
                let Some(spec) = self.registry.spec_for_path(&file.path) else {
                    return (file.path.clone(), None);
                };
                let extractor = BaseExtractor::new(self.repo_id.as_str());
                match extractor.extract(spec.as_ref(), &file.path, &file.content) {
                    Ok(doc) => (file.path.clone(), Some(Ok(doc))),
                    Err(err) => (file.path.clone(), Some(Err(err))),
                }
            })
            .collect();

        let mut result = FrontendResult::default();
        for (path, outcome) in outcomes {
            match outcome {
                None => {
                    debug!(file = %path, "no extractor registered, skipping");
                    result.skipped_unsupported += 1;
                }
                Some(Ok(doc)) => result.documents.push(doc),
                Some(Err(err)) => {
                    warn!(file = %path, error = %err, "extraction failed, skipping file");
                    result.errors.push((path, err));
                }
            }
        }
        result.documents.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        result
    }

    /// Walk a repository root and load every file a registered extractor
    /// supports. Hidden directories and common build output are skipped;
    /// non-UTF-8 files are reported and skipped.
    pub fn scan_repository(&self, root: &Path) -> Result<Vec<SourceFile>> {
        const SKIP_DIRS: &[&str] = &[
            ".git",
            "node_modules",
            "target",
            "build",
            "dist",
            "__pycache__",
            ".venv",
        ];
        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !(e.file_type().is_dir()
                    && (SKIP_DIRS.contains(&name.as_ref()) || name.starts_with('.')))
            })
        {
            let entry =
                entry.map_err(|e| EngineError::parse(root.display().to_string(), e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            if self.registry.spec_for_path(&relative).is_none() {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(content) => files.push(SourceFile::new(relative, content)),
                Err(err) => {
                    warn!(file = %relative, error = %err, "unreadable file skipped");
                }
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_skips_build_output_and_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/dep")).unwrap();
        std::fs::write(dir.path().join("src/app.py"), "def f():\n    pass\n").unwrap();
        std::fs::write(dir.path().join("src/notes.txt"), "not code").unwrap();
        std::fs::write(
            dir.path().join("node_modules/dep/index.js"),
            "module.exports = 1;\n",
        )
        .unwrap();

        let frontend = ParserFrontend::new("repo", ExtractorRegistry::with_builtin_languages());
        let files = frontend.scan_repository(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/app.py"]);
    }

    #[test]
    fn batch_survives_per_file_failures() {
        let frontend = ParserFrontend::new("repo", ExtractorRegistry::with_builtin_languages());
        let files = vec![
            SourceFile::new("ok.py", "def f():\n    pass\n"),
            SourceFile::new("data.json", "{}"),
            SourceFile::new("also_ok.go", "package p\nfunc G() {}\n"),
        ];
        let result = frontend.extract_all(&files);
        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.skipped_unsupported, 1);
        assert_eq!(result.documents[0].file_path, "also_ok.go");
        assert_eq!(result.documents[1].file_path, "ok.py");
    }
}
