//! Graph core: symbol/type/signature nodes with typed, deduplicated edges

pub mod builder;
pub mod model;

pub use builder::GraphBuilder;
pub use model::{CodeGraph, GraphNode};
