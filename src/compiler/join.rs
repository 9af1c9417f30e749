//! Join construction
//!
//! Greedy: take the first operator of the rule's worklist, join it with the
//! first later operator sharing a variable (or, failing that, the very next
//! one), put the join at the back and repeat until one operator remains.
//! There is no cost model.

use fnv::FnvHashMap;
use tracing::{debug, warn};

use crate::canonical::Canonicalizer;
use crate::error::{TopologyError, TopologyResult};
use crate::rule::ClauseEntry;
use crate::term::Variable;

use super::operator::{JoinOp, JoinWindow, Operator, OperatorKind};
use super::registry::CompileContext;

/// An operator as seen from one rule: its registry name, the rule's
/// variables at each output position, and the rule clauses it matches
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Partial {
    pub name: String,
    pub vars: Vec<Variable>,
    pub clauses: Vec<ClauseEntry>,
}

impl Partial {
    fn shares_variable(&self, other: &Partial) -> bool {
        self.vars.iter().any(|v| other.vars.contains(v))
    }
}

/// Per-rule occurrence counter.
///
/// A join's two inputs must be distinct operators, so the second use of a
/// key within one rule gets its own name (`key#2`). First uses keep the bare
/// key and are shared across rules.
#[derive(Debug, Default)]
pub(crate) struct Occurrences {
    seen: FnvHashMap<String, usize>,
}

impl Occurrences {
    pub fn name_for(&mut self, key: &str) -> String {
        let count = self.seen.entry(key.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            key.to_string()
        } else {
            format!("{}#{}", key, count)
        }
    }
}

/// A join made without any shared variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CrossJoin {
    pub left: String,
    pub right: String,
}

pub(crate) struct JoinStage<'a> {
    pub canonicalizer: &'a Canonicalizer,
    pub window: JoinWindow,
}

impl JoinStage<'_> {
    /// Reduce a non-empty worklist to the rule's prior
    pub fn reduce(
        &self,
        ctx: &mut CompileContext,
        rule: &str,
        mut worklist: Vec<Partial>,
        occurrences: &mut Occurrences,
        cross_joins: &mut Vec<CrossJoin>,
    ) -> TopologyResult<Partial> {
        while worklist.len() > 1 {
            let left = worklist.remove(0);
            let right = match worklist.iter().position(|p| left.shares_variable(p)) {
                Some(i) => worklist.remove(i),
                None => {
                    let right = worklist.remove(0);
                    warn!(
                        rule = rule,
                        left = %left.name,
                        right = %right.name,
                        "rule body is disconnected, joining without a shared variable"
                    );
                    cross_joins.push(CrossJoin {
                        left: left.name.clone(),
                        right: right.name.clone(),
                    });
                    right
                }
            };
            let joined = self.join(ctx, &left, &right, occurrences)?;
            worklist.push(joined);
        }

        worklist
            .pop()
            .ok_or_else(|| TopologyError::empty_prior(rule))
    }

    fn join(
        &self,
        ctx: &mut CompileContext,
        left: &Partial,
        right: &Partial,
        occurrences: &mut Occurrences,
    ) -> TopologyResult<Partial> {
        let mut template = left.clauses.clone();
        template.extend(right.clauses.iter().cloned());

        let canon = self.canonicalizer.canonicalize(&template);
        let name = occurrences.name_for(&canon.key);
        let vars = canon.order.clone();

        if ctx.lookup(&name, OperatorKind::Join, vars.len())?.is_some() {
            debug!(join = %name, "reusing join");
        } else {
            let op = JoinOp {
                name: name.clone(),
                left: left.name.clone(),
                right: right.name.clone(),
                match_left: positions(&left.vars, &right.vars),
                match_right: positions(&right.vars, &left.vars),
                template_left: positions(&vars, &left.vars),
                template_right: positions(&vars, &right.vars),
                vars: canon.vars(),
                template: canon.entries,
                window: self.window,
            };
            debug!(
                join = %name,
                left = %op.left,
                right = %op.right,
                key = ?op.left_key(),
                "created join"
            );
            ctx.register(Operator::Join(op))?;
        }

        Ok(Partial { name, vars, clauses: template })
    }
}

/// For each of `from`, its position in `to`
fn positions(from: &[Variable], to: &[Variable]) -> Vec<Option<usize>> {
    from.iter().map(|v| to.iter().position(|w| w == v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Node;

    fn var(name: &str) -> Variable {
        Variable::new(name.into())
    }

    #[test]
    fn test_positions() {
        let left = [var("a"), var("p"), var("b")];
        let right = [var("b"), var("p"), var("c")];
        assert_eq!(positions(&left, &right), vec![None, Some(1), Some(0)]);
        assert_eq!(positions(&right, &left), vec![Some(2), Some(1), None]);
    }

    #[test]
    fn test_occurrences() {
        let mut occurrences = Occurrences::default();
        assert_eq!(occurrences.name_for("k"), "k");
        assert_eq!(occurrences.name_for("k"), "k#2");
        assert_eq!(occurrences.name_for("j"), "j");
        assert_eq!(occurrences.name_for("k"), "k#3");
    }

    #[test]
    fn test_reduce_single_item_is_prior() {
        let canonicalizer = Canonicalizer::new();
        let stage = JoinStage { canonicalizer: &canonicalizer, window: JoinWindow::default() };
        let mut ctx = CompileContext::new();
        let item = Partial {
            name: "f".into(),
            vars: vec![var("a")],
            clauses: vec![ClauseEntry::triple(Node::var("a"), Node::uri("p"), Node::uri("o"))],
        };
        let prior = stage
            .reduce(&mut ctx, "r", vec![item.clone()], &mut Occurrences::default(), &mut vec![])
            .unwrap();
        assert_eq!(prior, item);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_reduce_empty_worklist_is_empty_prior() {
        let canonicalizer = Canonicalizer::new();
        let stage = JoinStage { canonicalizer: &canonicalizer, window: JoinWindow::default() };
        let err = stage
            .reduce(&mut CompileContext::new(), "r", vec![], &mut Occurrences::default(), &mut vec![])
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::EmptyPrior);
    }
}
