//! Lowering from IR documents to the taint program model
//!
//! Works from what the front-ends actually extract: call sites with callee
//! names and line numbers, plus READS/WRITES edges carrying line attrs. A
//! call is classified against the policy by the last segment of its callee;
//! a write on the call's line receives its result, a read on that line is
//! its argument. Coarse, but conservative in the right direction.

use std::collections::HashMap;

use super::domain::{Statement, TaintFunction, TaintPolicy, TaintProgram};
use crate::shared::models::{EdgeKind, IRDocument, NodeKind};

pub struct TaintProgramBuilder;

impl TaintProgramBuilder {
    pub fn build(documents: &[IRDocument], policy: &TaintPolicy) -> TaintProgram {
        let mut program = TaintProgram::default();

        // function name (last segment) → function id, for local call wiring
        let mut local_functions: HashMap<String, String> = HashMap::new();
        for doc in documents {
            for node in &doc.nodes {
                if node.kind.is_callable() {
                    local_functions.insert(node.name.clone(), node.node_id.clone());
                }
            }
        }

        for doc in documents {
            for function in doc.nodes.iter().filter(|n| n.kind.is_callable()) {
                let params: Vec<String> = doc
                    .edges
                    .iter()
                    .filter(|e| e.kind == EdgeKind::Defines && e.source_id == function.node_id)
                    .filter_map(|e| doc.node_by_id(&e.target_id))
                    .filter(|n| n.kind == NodeKind::Parameter)
                    .map(|n| n.name.clone())
                    .collect();

                // writes/reads per line inside this function
                let mut write_at: HashMap<u32, String> = HashMap::new();
                let mut read_at: HashMap<u32, String> = HashMap::new();
                for edge in &doc.edges {
                    if edge.source_id != function.node_id {
                        continue;
                    }
                    let Some(line) = edge.attrs.get("line").and_then(|l| l.parse().ok()) else {
                        continue;
                    };
                    match edge.kind {
                        EdgeKind::Writes => {
                            if let Some(var) = doc.node_by_id(&edge.target_id) {
                                write_at.insert(line, var.name.clone());
                            }
                        }
                        EdgeKind::Reads => {
                            let name = edge
                                .target_id
                                .rsplit("::")
                                .next()
                                .unwrap_or(&edge.target_id);
                            read_at.insert(line, name.to_string());
                        }
                        _ => {}
                    }
                }

                // calls contained in this function, in line order
                let mut calls: Vec<(u32, String, Vec<String>)> = doc
                    .edges
                    .iter()
                    .filter(|e| e.kind == EdgeKind::Contains && e.source_id == function.node_id)
                    .filter_map(|e| doc.node_by_id(&e.target_id))
                    .filter(|n| n.kind == NodeKind::Call)
                    .map(|n| {
                        let args = n
                            .attrs
                            .get("args")
                            .map(|a| a.split(',').map(str::to_string).collect())
                            .unwrap_or_default();
                        (n.span.start_line, n.name.clone(), args)
                    })
                    .collect();
                calls.sort();

                let mut statements = Vec::new();
                let mut call_lines: Vec<u32> = Vec::new();
                for (line, callee, args) in calls {
                    call_lines.push(line);
                    let short = callee.rsplit('.').next().unwrap_or(&callee).to_string();
                    let to = write_at
                        .get(&line)
                        .cloned()
                        .unwrap_or_else(|| format!("tmp@{line}"));
                    let from = args
                        .first()
                        .cloned()
                        .or_else(|| read_at.get(&line).cloned())
                        .unwrap_or_else(|| format!("tmp@{line}"));

                    if policy.sources.contains_key(&short) {
                        statements.push(Statement::SourceCall {
                            to,
                            source_name: short,
                            line,
                        });
                    } else if policy.sinks.contains_key(&short) {
                        statements.push(Statement::SinkCall {
                            from,
                            sink_name: short,
                            line,
                        });
                    } else if policy.sanitizers.contains_key(&short) {
                        statements.push(Statement::Sanitize {
                            to,
                            from,
                            sanitizer_name: short,
                        });
                    } else if let Some(callee_id) = local_functions.get(&short) {
                        if callee_id != &function.node_id {
                            let call_args = if args.is_empty() { vec![from] } else { args };
                            statements.push(Statement::Call {
                                callee: callee_id.clone(),
                                args: call_args,
                                to: Some(to),
                                line,
                            });
                        }
                    }
                }

                // plain assignments on lines without calls
                for (&line, to) in &write_at {
                    if call_lines.contains(&line) {
                        continue;
                    }
                    if let Some(from) = read_at.get(&line) {
                        statements.push(Statement::Assign {
                            to: to.clone(),
                            from: from.clone(),
                        });
                    }
                }

                program.add_function(TaintFunction {
                    id: function.node_id.clone(),
                    params,
                    statements,
                });
                program.entry_points.push(function.node_id.clone());
            }
        }
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::languages::PythonSpec;
    use crate::features::parsing::BaseExtractor;
    use crate::features::taint::analyzer::TaintAnalyzer;
    use crate::features::taint::domain::SolverStrategy;

    #[test]
    fn end_to_end_source_to_sink_from_python() {
        let source = "def handler():\n    user = read_param()\n    execute(user)\n";
        let doc = BaseExtractor::new("repo")
            .extract(&PythonSpec, "app.py", source)
            .unwrap();
        let policy = TaintPolicy::default()
            .with_source("read_param", "user_input")
            .with_sink("execute", &["user_input"]);
        let program = TaintProgramBuilder::build(std::slice::from_ref(&doc), &policy);
        let result = TaintAnalyzer::new(SolverStrategy::Ifds).analyze(&program, &policy);
        assert_eq!(result.paths.len(), 1);
        assert_eq!(result.paths[0].source_name, "read_param");
        assert_eq!(result.paths[0].sink_name, "execute");
    }
}
