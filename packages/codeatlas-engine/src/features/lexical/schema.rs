//! Tantivy schema for the lexical index
//!
//! One document per live chunk. `file_path` is a raw (non-tokenized) field
//! so incremental updates can delete a whole file's documents by term.

use tantivy::schema::{Field, Schema, SchemaBuilder, STORED, STRING, TEXT};

#[derive(Debug, Clone, Copy)]
pub struct SchemaFields {
    pub chunk_id: Field,
    pub repo_id: Field,
    pub file_path: Field,
    pub kind: Field,
    pub fqn: Field,
    pub start_line: Field,
    pub content: Field,
}

pub fn build_schema() -> (Schema, SchemaFields) {
    let mut builder = SchemaBuilder::new();
    let chunk_id = builder.add_text_field("chunk_id", STRING | STORED);
    let repo_id = builder.add_text_field("repo_id", STRING | STORED);
    let file_path = builder.add_text_field("file_path", STRING | STORED);
    let kind = builder.add_text_field("kind", STRING | STORED);
    let fqn = builder.add_text_field("fqn", TEXT | STORED);
    let start_line = builder.add_u64_field("start_line", STORED);
    let content = builder.add_text_field("content", TEXT);
    let schema = builder.build();
    (
        schema,
        SchemaFields {
            chunk_id,
            repo_id,
            file_path,
            kind,
            fqn,
            start_line,
            content,
        },
    )
}
