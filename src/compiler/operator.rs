//! Network operators
//!
//! Every node of the compiled network is one [`Operator`]. Shared operators
//! (filters and joins) are named by their canonical key; terminals, the
//! conflict set and the axiom source carry synthesized names.
//!
//! `vars` is positional: position `i` of an operator's output tuple holds
//! `vars[i]`, and downstream join indices refer to those positions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::{ClauseEntry, Functor, Rule, TriplePattern};
use crate::term::Variable;

/// Operator discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Filter,
    Join,
    Terminal,
    ConflictSet,
    AxiomSource,
}

impl OperatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Filter => "filter",
            OperatorKind::Join => "join",
            OperatorKind::Terminal => "terminal",
            OperatorKind::ConflictSet => "conflict_set",
            OperatorKind::AxiomSource => "axiom_source",
        }
    }

    /// Operators that may be shared between rules
    pub fn is_shared(&self) -> bool {
        matches!(self, OperatorKind::Filter | OperatorKind::Join)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches a single triple pattern against the fact stream
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOp {
    pub name: String,
    /// Pattern in canonical variables
    pub pattern: TriplePattern,
    pub vars: Vec<Variable>,
}

/// Bounds each side's memory in the executing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWindow {
    /// Maximum tuples retained per side
    pub capacity: usize,
    /// Maximum tuple age in seconds
    pub range_secs: u64,
}

impl Default for JoinWindow {
    fn default() -> Self {
        JoinWindow {
            capacity: 5000,
            range_secs: 15 * 60,
        }
    }
}

/// Equi-join of two operator outputs
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOp {
    pub name: String,
    pub left: String,
    pub right: String,
    /// Joined clause template in canonical variables
    pub template: Vec<ClauseEntry>,
    pub vars: Vec<Variable>,
    /// `match_left[l]`: position in the right output of the left var at `l`
    pub match_left: Vec<Option<usize>>,
    /// `match_right[r]`: position in the left output of the right var at `r`
    pub match_right: Vec<Option<usize>>,
    /// `template_left[n]`: position in the left output of output var `n`
    pub template_left: Vec<Option<usize>>,
    /// `template_right[n]`: position in the right output of output var `n`
    pub template_right: Vec<Option<usize>>,
    pub window: JoinWindow,
}

impl JoinOp {
    /// Left-side positions of the join key
    pub fn left_key(&self) -> Vec<usize> {
        self.match_left
            .iter()
            .enumerate()
            .filter_map(|(l, m)| m.map(|_| l))
            .collect()
    }

    /// Right-side positions of the join key, aligned with [`JoinOp::left_key`]
    pub fn right_key(&self) -> Vec<usize> {
        self.match_left.iter().filter_map(|m| *m).collect()
    }

    /// No shared variable between the sides
    pub fn is_cross(&self) -> bool {
        self.match_left.iter().all(Option::is_none)
    }
}

/// Fires one rule's head once its body is matched
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalOp {
    pub name: String,
    pub rule: String,
    pub prior: String,
    /// Rule variables bound at each position of the prior's output
    pub vars: Vec<Variable>,
    /// Body functors evaluated before the head fires
    pub guards: Vec<Functor>,
    pub head: Vec<ClauseEntry>,
}

/// Global sink of derived facts, feeding back into every filter
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictSetOp {
    pub name: String,
}

/// Emits every axiom head once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct AxiomSourceOp {
    pub name: String,
    pub axioms: Vec<TriplePattern>,
}

/// A node of the compiled network
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Filter(FilterOp),
    Join(JoinOp),
    Terminal(TerminalOp),
    ConflictSet(ConflictSetOp),
    AxiomSource(AxiomSourceOp),
}

impl Operator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Filter(_) => OperatorKind::Filter,
            Operator::Join(_) => OperatorKind::Join,
            Operator::Terminal(_) => OperatorKind::Terminal,
            Operator::ConflictSet(_) => OperatorKind::ConflictSet,
            Operator::AxiomSource(_) => OperatorKind::AxiomSource,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Operator::Filter(op) => &op.name,
            Operator::Join(op) => &op.name,
            Operator::Terminal(op) => &op.name,
            Operator::ConflictSet(op) => &op.name,
            Operator::AxiomSource(op) => &op.name,
        }
    }

    /// Output variables, positionally
    pub fn vars(&self) -> &[Variable] {
        match self {
            Operator::Filter(op) => &op.vars,
            Operator::Join(op) => &op.vars,
            Operator::Terminal(op) => &op.vars,
            Operator::ConflictSet(_) | Operator::AxiomSource(_) => &[],
        }
    }

    /// The synthetic rule this operator computes: its head is exactly what
    /// it outputs
    pub fn sub_rule(&self) -> Rule {
        match self {
            Operator::Filter(op) => {
                let clause = vec![ClauseEntry::Triple(op.pattern.clone())];
                Rule::named(op.name.clone(), clause.clone(), clause)
            }
            Operator::Join(op) => {
                Rule::named(op.name.clone(), op.template.clone(), op.template.clone())
            }
            Operator::Terminal(op) => {
                let body = op.guards.iter().cloned().map(ClauseEntry::Functor).collect();
                Rule::named(op.name.clone(), body, op.head.clone())
            }
            Operator::ConflictSet(op) => Rule::named(op.name.clone(), vec![], vec![]),
            Operator::AxiomSource(op) => Rule::named(
                op.name.clone(),
                vec![],
                op.axioms.iter().cloned().map(ClauseEntry::Triple).collect(),
            ),
        }
    }

    pub fn as_join(&self) -> Option<&JoinOp> {
        match self {
            Operator::Join(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> Option<&FilterOp> {
        match self {
            Operator::Filter(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&TerminalOp> {
        match self {
            Operator::Terminal(op) => Some(op),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Node;

    fn join(match_left: Vec<Option<usize>>) -> JoinOp {
        JoinOp {
            name: "j".into(),
            left: "a".into(),
            right: "b".into(),
            template: vec![],
            vars: vec![],
            match_left,
            match_right: vec![],
            template_left: vec![],
            template_right: vec![],
            window: JoinWindow::default(),
        }
    }

    #[test]
    fn test_join_keys_are_aligned() {
        let op = join(vec![None, Some(2), Some(0)]);
        assert_eq!(op.left_key(), vec![1, 2]);
        assert_eq!(op.right_key(), vec![2, 0]);
        assert!(!op.is_cross());
        assert!(join(vec![None, None]).is_cross());
    }

    #[test]
    fn test_default_window() {
        let window = JoinWindow::default();
        assert_eq!(window.capacity, 5000);
        assert_eq!(window.range_secs, 900);
    }

    #[test]
    fn test_filter_sub_rule_outputs_its_pattern() {
        let pattern = TriplePattern::new(Node::var("0"), Node::uri("p"), Node::var("1"));
        let op = Operator::Filter(FilterOp {
            name: "(?0 <p> ?1)".into(),
            pattern: pattern.clone(),
            vars: vec![Variable::new("0".into()), Variable::new("1".into())],
        });
        assert_eq!(op.kind(), OperatorKind::Filter);
        assert_eq!(op.vars().len(), 2);
        assert_eq!(op.sub_rule().head, vec![ClauseEntry::Triple(pattern)]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(OperatorKind::ConflictSet.to_string(), "conflict_set");
        assert!(OperatorKind::Join.is_shared());
        assert!(!OperatorKind::Terminal.is_shared());
    }
}
