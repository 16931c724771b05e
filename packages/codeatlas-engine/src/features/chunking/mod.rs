//! Chunk hierarchy: six-tier persistable code units with line spans

pub mod builder;
pub mod id_gen;
pub mod lookup;
pub mod validator;

pub use builder::{ChunkBuildResult, ChunkBuilder};
pub use id_gen::ChunkIdGenerator;
pub use lookup::find_chunk_by_file_and_line;
pub use validator::{BoundaryValidator, ValidationReport};
