//! Control-flow graph primitives shared by the flow-sensitive analyses

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CfgBlockKind {
    Entry,
    Exit,
    Basic,
    Condition,
    LoopHeader,
    Exception,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CfgEdgeKind {
    Normal,
    Branch,
    LoopBack,
    Exception,
}

/// A basic block owned by one function's CFG
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgBlock {
    pub block_id: String,
    pub function_id: String,
    pub kind: CfgBlockKind,
    /// Statement-level node ids in execution order
    pub statements: Vec<String>,
}

impl CfgBlock {
    pub fn new(function_id: &str, index: usize, kind: CfgBlockKind) -> Self {
        Self {
            block_id: format!("cfg:{function_id}:block:{index}"),
            function_id: function_id.to_string(),
            kind,
            statements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CfgEdge {
    pub from_block: String,
    pub to_block: String,
    pub kind: CfgEdgeKind,
}
