//! Wire-stable API types
//!
//! The HTTP/MCP surface itself lives outside the core; these are the shapes
//! it serializes. `ResultEnvelope` is the replayable analysis output:
//! claims backed by evidences plus a `replay_ref` that pins the snapshot
//! and stage versions the run used.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::models::{ErrorEntry, ResponseStatus};

/// A statement the engine is prepared to defend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    pub statement: String,
    /// evidence ids backing this claim
    pub evidence_ids: Vec<String>,
    pub confidence: f64,
}

/// A concrete observation tied to code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: String,
    pub chunk_id: Option<String>,
    pub file_path: String,
    pub line: Option<u32>,
    pub excerpt: String,
}

/// Resolution of conflicting claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arbitration {
    pub claim_ids: Vec<String>,
    pub accepted_claim_id: Option<String>,
    pub rationale: String,
}

/// Replayable analysis result envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub request_id: String,
    pub claims: Vec<Claim>,
    pub evidences: Vec<Evidence>,
    pub arbitrated: Vec<Arbitration>,
    /// snapshot + stage-version pin; equal refs must replay byte-equal
    pub replay_ref: String,
    /// component → version string
    pub versions: BTreeMap<String, String>,
}

/// Generic response wrapper: every user-visible surface carries a status
/// and an error array, never an exception
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub errors: Vec<ErrorEntry>,
    pub txn_id: Option<u64>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, txn_id: Option<u64>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            errors: Vec::new(),
            txn_id,
            data: Some(data),
        }
    }

    pub fn degraded(data: T, errors: Vec<ErrorEntry>, txn_id: Option<u64>) -> Self {
        Self {
            status: ResponseStatus::Degraded,
            errors,
            txn_id,
            data: Some(data),
        }
    }

    pub fn failed(errors: Vec<ErrorEntry>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            errors,
            txn_id: None,
            data: None,
        }
    }
}
