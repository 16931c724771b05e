//! Lexical full-text index (Tantivy) behind the `IndexPlugin` contract

pub mod content_provider;
pub mod index;
pub mod schema;

pub use content_provider::{
    ChunkSource, FileContentProvider, InMemoryChunkSource, StaticContentProvider,
};
pub use index::{LexicalHit, TantivyLexicalIndex};
pub use schema::{build_schema, SchemaFields};
