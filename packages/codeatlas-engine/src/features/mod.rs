//! Feature slices

pub mod chunking;
pub mod clone_detection;
pub mod cross_file;
pub mod effects;
pub mod graph;
pub mod lexical;
pub mod multi_index;
pub mod parsing;
pub mod points_to;
pub mod repomap;
pub mod retrieval;
pub mod taint;
