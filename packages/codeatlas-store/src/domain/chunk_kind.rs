//! Chunk kind enumeration
//!
//! The six structural tiers (Repo → Project → Module → File → Class →
//! Function/Method) plus role-specific kinds used by framework-aware
//! chunking (routes, services, jobs, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic level of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Repository root (exactly one per snapshot)
    Repo,
    /// Sub-project within a monorepo
    Project,
    /// Package-like grouping of files
    Module,
    /// Source file
    File,
    /// Class / interface / struct
    Class,
    /// Free function (leaf)
    Function,
    /// Method bound to a class (leaf)
    Method,

    // Role-specific kinds
    /// HTTP route handler
    Route,
    /// Service-layer component
    Service,
    /// Data-access component
    Repository,
    /// Configuration unit
    Config,
    /// Background job / task
    Job,
    /// Middleware component
    Middleware,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Repo => "repo",
            ChunkKind::Project => "project",
            ChunkKind::Module => "module",
            ChunkKind::File => "file",
            ChunkKind::Class => "class",
            ChunkKind::Function => "function",
            ChunkKind::Method => "method",
            ChunkKind::Route => "route",
            ChunkKind::Service => "service",
            ChunkKind::Repository => "repository",
            ChunkKind::Config => "config",
            ChunkKind::Job => "job",
            ChunkKind::Middleware => "middleware",
        }
    }

    /// Hierarchy depth (0 = repo, 5 = function/method)
    pub fn hierarchy_level(&self) -> usize {
        match self {
            ChunkKind::Repo => 0,
            ChunkKind::Project => 1,
            ChunkKind::Module => 2,
            ChunkKind::File | ChunkKind::Config => 3,
            ChunkKind::Class | ChunkKind::Service | ChunkKind::Repository => 4,
            ChunkKind::Function
            | ChunkKind::Method
            | ChunkKind::Route
            | ChunkKind::Job
            | ChunkKind::Middleware => 5,
        }
    }

    /// Leaf chunks are functions and methods (and their role variants)
    pub fn is_leaf(&self) -> bool {
        self.hierarchy_level() == 5
    }

    /// Lookup priority for line-based resolution: smaller wins
    pub fn lookup_priority(&self) -> u8 {
        match self.hierarchy_level() {
            5 => 1,
            4 => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChunkKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "repo" => Ok(ChunkKind::Repo),
            "project" => Ok(ChunkKind::Project),
            "module" => Ok(ChunkKind::Module),
            "file" => Ok(ChunkKind::File),
            "class" => Ok(ChunkKind::Class),
            "function" => Ok(ChunkKind::Function),
            "method" => Ok(ChunkKind::Method),
            "route" => Ok(ChunkKind::Route),
            "service" => Ok(ChunkKind::Service),
            "repository" => Ok(ChunkKind::Repository),
            "config" => Ok(ChunkKind::Config),
            "job" => Ok(ChunkKind::Job),
            "middleware" => Ok(ChunkKind::Middleware),
            other => Err(format!("unknown chunk kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for kind in [
            ChunkKind::Repo,
            ChunkKind::Module,
            ChunkKind::Method,
            ChunkKind::Middleware,
        ] {
            assert_eq!(kind.as_str().parse::<ChunkKind>().unwrap(), kind);
        }
    }

    #[test]
    fn leaves_are_level_five() {
        assert!(ChunkKind::Function.is_leaf());
        assert!(ChunkKind::Method.is_leaf());
        assert!(ChunkKind::Route.is_leaf());
        assert!(!ChunkKind::Class.is_leaf());
        assert!(!ChunkKind::File.is_leaf());
    }

    #[test]
    fn function_outranks_class_and_file_in_lookup() {
        assert!(ChunkKind::Function.lookup_priority() < ChunkKind::Class.lookup_priority());
        assert!(ChunkKind::Class.lookup_priority() < ChunkKind::File.lookup_priority());
    }
}
