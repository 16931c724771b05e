//! Taint analysis domain
//!
//! The solvers run over a small interprocedural program model lowered from
//! the code graph: linear statement lists per function plus call/return
//! wiring. Facts are taint labels attached to variables; the lattice is the
//! powerset of labels.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Function identifier inside a `TaintProgram`
pub type FunctionId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    /// `to = from`
    Assign { to: String, from: String },
    /// `to = <source>()`: introduces the source's taint label
    SourceCall {
        to: String,
        source_name: String,
        line: u32,
    },
    /// `<sink>(from)`: a path terminates here if `from` is tainted
    SinkCall {
        from: String,
        sink_name: String,
        line: u32,
    },
    /// `to = sanitize(from)`: clears labels the sanitizer covers
    Sanitize {
        to: String,
        from: String,
        sanitizer_name: String,
    },
    /// `to = callee(args...)`; args map positionally onto callee params
    Call {
        callee: FunctionId,
        args: Vec<String>,
        /// variable receiving the return value, if any
        to: Option<String>,
        line: u32,
    },
    /// `return value`
    Return { value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintFunction {
    pub id: FunctionId,
    pub params: Vec<String>,
    pub statements: Vec<Statement>,
}

/// Interprocedural program model consumed by the solvers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaintProgram {
    pub functions: HashMap<FunctionId, TaintFunction>,
    /// analysis entry points
    pub entry_points: Vec<FunctionId>,
}

impl TaintProgram {
    pub fn add_function(&mut self, function: TaintFunction) {
        self.functions.insert(function.id.clone(), function);
    }

    pub fn function(&self, id: &str) -> Option<&TaintFunction> {
        self.functions.get(id)
    }
}

/// One taint fact: `variable` carries `label`, originating at `source_name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaintFact {
    pub variable: String,
    pub label: String,
    pub source_name: String,
    /// true once the fact has flowed through a sanitizer that did not cover
    /// its label
    pub sanitizer_passed: bool,
}

/// One hop of an interprocedural path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintStep {
    pub function: FunctionId,
    pub description: String,
    pub line: u32,
}

/// A complete source → sink flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintPath {
    pub source_name: String,
    pub sink_name: String,
    pub label: String,
    pub steps: Vec<TaintStep>,
    /// the flow passed a sanitizer that did not clear this label
    pub sanitizer_passed: bool,
}

/// Identical output shape across IFDS / IDE / interprocedural-dataflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaintAnalysisResult {
    pub paths: Vec<TaintPath>,
    pub partial: bool,
    pub functions_analyzed: usize,
    pub facts_propagated: usize,
}

/// Which labels a source introduces and a sanitizer clears
#[derive(Debug, Clone, Default)]
pub struct TaintPolicy {
    /// source name → label it introduces
    pub sources: HashMap<String, String>,
    /// sink name → labels it is sensitive to (empty = all)
    pub sinks: HashMap<String, Vec<String>>,
    /// sanitizer name → labels it clears
    pub sanitizers: HashMap<String, Vec<String>>,
}

impl TaintPolicy {
    pub fn with_source(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.sources.insert(name.into(), label.into());
        self
    }

    pub fn with_sink(mut self, name: impl Into<String>, labels: &[&str]) -> Self {
        self.sinks
            .insert(name.into(), labels.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_sanitizer(mut self, name: impl Into<String>, labels: &[&str]) -> Self {
        self.sanitizers
            .insert(name.into(), labels.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn sink_accepts(&self, sink_name: &str, label: &str) -> bool {
        match self.sinks.get(sink_name) {
            Some(labels) if !labels.is_empty() => labels.iter().any(|l| l == label),
            Some(_) => true,
            None => false,
        }
    }

    pub fn sanitizer_clears(&self, sanitizer_name: &str, label: &str) -> bool {
        self.sanitizers
            .get(sanitizer_name)
            .is_some_and(|labels| labels.iter().any(|l| l == label))
    }
}

/// Solver strategy selector; all three share output shape and base machinery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStrategy {
    Ifds,
    Ide,
    InterproceduralDataflow,
}
