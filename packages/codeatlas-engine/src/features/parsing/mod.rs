//! Parser front-ends: per-language AST → language-neutral IR
//!
//! One [`base::BaseExtractor`] carries the shared traversal, scope/FQN and
//! extraction logic; [`ports::LanguageSpec`] implementations contribute node
//! type sets and the hooks their grammar needs.

pub mod base;
pub mod frontend;
pub mod languages;
pub mod ports;
pub mod registry;

pub use base::BaseExtractor;
pub use frontend::{FrontendResult, ParserFrontend, SourceFile};
pub use ports::{LanguageId, LanguageSpec};
pub use registry::ExtractorRegistry;
