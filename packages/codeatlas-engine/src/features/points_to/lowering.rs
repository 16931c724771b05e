//! IR → points-to constraint lowering
//!
//! Conservative lowering from what the front-ends record: a write paired
//! with a read on the same line becomes a COPY, a bare write becomes an
//! ALLOC at a fresh abstract site. Variables are interned per FQN so
//! cross-function flows through module-level variables are visible.

use std::collections::HashMap;

use super::domain::{Constraint, VarId};
use crate::shared::ids::is_external_sentinel;
use crate::shared::models::{EdgeKind, IRDocument};

#[derive(Default)]
pub struct VariableInterner {
    by_name: HashMap<String, VarId>,
    names: Vec<String>,
}

impl VariableInterner {
    pub fn intern(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.names.len() as VarId;
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub struct ConstraintLowering;

impl ConstraintLowering {
    pub fn lower(documents: &[IRDocument]) -> (Vec<Constraint>, VariableInterner) {
        let mut interner = VariableInterner::default();
        let mut constraints = Vec::new();
        let mut next_location: u32 = 0;

        for doc in documents {
            // pair writes with reads by (owner, line)
            let mut reads: HashMap<(&str, &str), &str> = HashMap::new();
            for edge in &doc.edges {
                if edge.kind == EdgeKind::Reads {
                    if let Some(line) = edge.attrs.get("line") {
                        let name = edge
                            .target_id
                            .rsplit("::")
                            .next()
                            .unwrap_or(&edge.target_id);
                        reads.insert((edge.source_id.as_str(), line.as_str()), name);
                    }
                }
            }
            // a "read" that is actually the callee of a call on that line
            // means the write is an allocation site, not a copy
            let calls_by_line: std::collections::HashSet<(u32, &str)> = doc
                .nodes
                .iter()
                .filter(|n| n.kind == crate::shared::models::NodeKind::Call)
                .map(|n| {
                    (
                        n.span.start_line,
                        n.name.rsplit('.').next().unwrap_or(&n.name),
                    )
                })
                .collect();
            for edge in &doc.edges {
                if edge.kind != EdgeKind::Writes {
                    continue;
                }
                let Some(target) = doc.node_by_id(&edge.target_id) else {
                    continue;
                };
                let lhs = interner.intern(&target.fqn);
                let line_attr = edge.attrs.get("line");
                let line_number: Option<u32> = line_attr.and_then(|l| l.parse().ok());
                let rhs_name = line_attr
                    .and_then(|line| reads.get(&(edge.source_id.as_str(), line.as_str())))
                    .filter(|name| {
                        // callee on the same line ⇒ allocation, not copy
                        !line_number
                            .is_some_and(|l| calls_by_line.contains(&(l, **name)))
                    });
                match rhs_name {
                    Some(name) if !is_external_sentinel(name) => {
                        // scope-local first: prefer a variable in the same
                        // enclosing scope, fall back to the bare name
                        let scoped = format!(
                            "{}.{}",
                            target.fqn.rsplit_once('.').map(|(s, _)| s).unwrap_or(""),
                            name
                        );
                        let rhs = interner
                            .lookup(&scoped)
                            .unwrap_or_else(|| interner.intern(name));
                        constraints.push(Constraint::copy(lhs, rhs));
                    }
                    _ => {
                        constraints.push(Constraint::alloc(lhs, next_location));
                        next_location += 1;
                    }
                }
            }
        }
        (constraints, interner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::languages::PythonSpec;
    use crate::features::parsing::BaseExtractor;
    use crate::features::points_to::andersen::AndersenSolver;

    #[test]
    fn assignment_chain_produces_aliases() {
        let source = "def f():\n    a = object()\n    b = a\n    c = b\n";
        let doc = BaseExtractor::new("repo")
            .extract(&PythonSpec, "m.py", source)
            .unwrap();
        let (constraints, interner) = ConstraintLowering::lower(std::slice::from_ref(&doc));
        assert!(!constraints.is_empty());

        let mut solver = AndersenSolver::default();
        solver.add_constraints(constraints);
        let result = solver.solve();

        let a = interner.lookup("m.f.a").unwrap();
        let c = interner.lookup("m.f.c").unwrap();
        assert!(result.may_alias(a, c));
    }
}
