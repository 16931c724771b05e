//! Points-to analysis domain
//!
//! Four constraint forms following Andersen's formulation:
//! - ALLOC: `x = new T()`  → pts(x) ⊇ {alloc_site}
//! - COPY:  `x = y`        → pts(x) ⊇ pts(y)
//! - LOAD:  `x = *y`       → ∀o ∈ pts(y): pts(x) ⊇ pts(o)
//! - STORE: `*x = y`       → ∀o ∈ pts(x): pts(o) ⊇ pts(y)

use serde::{Deserialize, Serialize};

use super::sparse_bitmap::SparseBitmap;
use rustc_hash::FxHashMap;

/// Variable identifier (interned index)
pub type VarId = u32;

/// Abstract allocation-site identifier
pub type LocationId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Alloc,
    Copy,
    Load,
    Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    /// Destination variable
    pub lhs: VarId,
    /// Source variable, or the location for ALLOC
    pub rhs: u32,
}

impl Constraint {
    #[inline]
    pub fn alloc(lhs: VarId, location: LocationId) -> Self {
        Self {
            kind: ConstraintKind::Alloc,
            lhs,
            rhs: location,
        }
    }

    #[inline]
    pub fn copy(lhs: VarId, rhs: VarId) -> Self {
        Self {
            kind: ConstraintKind::Copy,
            lhs,
            rhs,
        }
    }

    #[inline]
    pub fn load(lhs: VarId, pointer: VarId) -> Self {
        Self {
            kind: ConstraintKind::Load,
            lhs,
            rhs: pointer,
        }
    }

    #[inline]
    pub fn store(pointer: VarId, rhs: VarId) -> Self {
        Self {
            kind: ConstraintKind::Store,
            lhs: pointer,
            rhs,
        }
    }
}

/// The points-to relation: var → sparse set of abstract locations
#[derive(Debug, Clone, Default)]
pub struct PointsToGraph {
    points_to: FxHashMap<VarId, SparseBitmap>,
}

impl PointsToGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: VarId, location: LocationId) -> bool {
        self.points_to.entry(var).or_default().insert(location)
    }

    /// Union `from`'s set into `into`; true when `into` grew
    pub fn union_into(&mut self, into: VarId, from: VarId) -> bool {
        if into == from {
            return false;
        }
        let Some(source) = self.points_to.get(&from).cloned() else {
            return false;
        };
        self.points_to.entry(into).or_default().union_with(&source)
    }

    pub fn points_to(&self, var: VarId) -> Option<&SparseBitmap> {
        self.points_to.get(&var)
    }

    pub fn locations_of(&self, var: VarId) -> Vec<LocationId> {
        self.points_to
            .get(&var)
            .map(|b| b.iter().collect())
            .unwrap_or_default()
    }

    /// Two variables may alias when their location sets intersect
    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        match (self.points_to.get(&a), self.points_to.get(&b)) {
            (Some(sa), Some(sb)) => sa.intersects(sb),
            _ => false,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.points_to.len()
    }

    pub fn total_edges(&self) -> usize {
        self.points_to.values().map(SparseBitmap::len).sum()
    }
}

/// How the analyzer picks a solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisMode {
    /// Inclusion-based, precise, O(n²) practical
    Andersen,
    /// Unification-based, fast, coarser
    Steensgaard,
    /// Steensgaard above the constraint-count threshold, else Andersen
    Auto,
}
