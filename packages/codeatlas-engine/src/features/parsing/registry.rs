//! Extractor registry
//!
//! Maps file extensions to language specs through a lock-free concurrent
//! map. New languages register themselves; nothing in the core switches on
//! a language name.

use dashmap::DashMap;
use std::sync::Arc;

use super::languages::{
    CSpec, CppSpec, GoSpec, JavaSpec, KotlinSpec, PythonSpec, RustSpec, TypeScriptSpec,
};
use super::ports::LanguageSpec;

pub struct ExtractorRegistry {
    by_extension: DashMap<String, Arc<dyn LanguageSpec>>,
}

impl ExtractorRegistry {
    /// Empty registry (tests, exotic embeddings)
    pub fn empty() -> Self {
        Self {
            by_extension: DashMap::new(),
        }
    }

    /// Registry with all built-in languages
    pub fn with_builtin_languages() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(PythonSpec));
        registry.register(Arc::new(JavaSpec));
        registry.register(Arc::new(KotlinSpec));
        registry.register(Arc::new(RustSpec));
        registry.register(Arc::new(GoSpec));
        registry.register(Arc::new(CSpec));
        registry.register(Arc::new(CppSpec));
        registry.register(Arc::new(TypeScriptSpec::javascript()));
        // TS registered last so .ts/.tsx win over the shared JS entry
        registry.register(Arc::new(TypeScriptSpec::typescript()));
        registry.register_for_extensions(Arc::new(TypeScriptSpec::tsx()), &["tsx"]);
        registry
    }

    /// Register a spec under every extension its language claims
    pub fn register(&self, spec: Arc<dyn LanguageSpec>) {
        for ext in spec.language_id().extensions() {
            self.by_extension.insert((*ext).to_string(), Arc::clone(&spec));
        }
    }

    /// Register a spec under explicit extensions (grammar variants)
    pub fn register_for_extensions(&self, spec: Arc<dyn LanguageSpec>, extensions: &[&str]) {
        for ext in extensions {
            self.by_extension.insert((*ext).to_string(), Arc::clone(&spec));
        }
    }

    pub fn spec_for_path(&self, file_path: &str) -> Option<Arc<dyn LanguageSpec>> {
        let ext = file_path.rsplit_once('.')?.1;
        self.by_extension
            .get(&ext.to_lowercase())
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.by_extension.iter().map(|e| e.key().clone()).collect();
        exts.sort();
        exts
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtin_languages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::ports::LanguageId;

    #[test]
    fn builtin_registry_resolves_known_extensions() {
        let registry = ExtractorRegistry::with_builtin_languages();
        assert_eq!(
            registry.spec_for_path("a/b.py").unwrap().language_id(),
            LanguageId::Python
        );
        assert_eq!(
            registry.spec_for_path("a/b.tsx").unwrap().language_id(),
            LanguageId::TypeScript
        );
        assert_eq!(
            registry.spec_for_path("a/b.go").unwrap().language_id(),
            LanguageId::Go
        );
        assert!(registry.spec_for_path("a/b.csv").is_none());
        assert!(registry.spec_for_path("Makefile").is_none());
    }
}
