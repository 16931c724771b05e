//! Shared domain models and utilities

pub mod ids;
pub mod models;
pub mod scope_stack;
