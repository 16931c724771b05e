//! Line → chunk resolution
//!
//! Returns the narrowest chunk containing a line, tie-broken by kind
//! priority (function/method > class > file) and then by smaller span.

use codeatlas_store::Chunk;

/// Narrowest chunk in `chunks` covering (file_path, line)
pub fn find_chunk_by_file_and_line<'a>(
    chunks: &'a [Chunk],
    repo_id: &str,
    file_path: &str,
    line: u32,
) -> Option<&'a Chunk> {
    chunks
        .iter()
        .filter(|c| {
            !c.is_deleted
                && c.repo_id == repo_id
                && c.file_path == file_path
                && c.contains_line(line)
        })
        .min_by_key(|c| (c.kind.lookup_priority(), c.line_count()))
}
