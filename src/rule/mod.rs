//! Clause and rule model
//!
//! A rule is a named pair of clause lists, `body -> head`. Each clause entry
//! is one of:
//! - a triple pattern `(S P O)` matched against the fact stream,
//! - a functor `name(args…)`, a builtin guard in a body or an action in a head,
//! - a nested rule, for meta-rules that derive rules.
//!
//! All of these are immutable once built; compilation works on canonical
//! copies rather than mutating the caller's rules.

use std::fmt;

use crate::term::{Node, Variable};

/// A triple pattern `(subject predicate object)`
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
}

impl TriplePattern {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        TriplePattern { subject, predicate, object }
    }

    /// The three positions in subject, predicate, object order
    pub fn nodes(&self) -> [&Node; 3] {
        [&self.subject, &self.predicate, &self.object]
    }
}

impl fmt::Debug for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?} {:?} {:?})", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}

/// A functor `name(arg …)`
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Functor {
    pub name: String,
    pub args: Vec<Node>,
}

impl Functor {
    pub fn new(name: impl Into<String>, args: Vec<Node>) -> Self {
        Functor { name: name.into(), args }
    }
}

impl fmt::Debug for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// One entry of a rule body or head
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ClauseEntry {
    /// A triple pattern
    Triple(TriplePattern),
    /// A builtin guard or head action
    Functor(Functor),
    /// A nested rule (meta-rules)
    Rule(Box<Rule>),
}

impl ClauseEntry {
    /// Shorthand for a triple pattern entry
    pub fn triple(subject: Node, predicate: Node, object: Node) -> Self {
        ClauseEntry::Triple(TriplePattern::new(subject, predicate, object))
    }

    /// Shorthand for a functor entry
    pub fn functor(name: impl Into<String>, args: Vec<Node>) -> Self {
        ClauseEntry::Functor(Functor::new(name, args))
    }

    /// Get the triple pattern if this entry is one
    pub fn as_triple(&self) -> Option<&TriplePattern> {
        match self {
            ClauseEntry::Triple(t) => Some(t),
            _ => None,
        }
    }

    /// Get the functor if this entry is one
    pub fn as_functor(&self) -> Option<&Functor> {
        match self {
            ClauseEntry::Functor(f) => Some(f),
            _ => None,
        }
    }

    /// Append the variables of this entry, in order of first appearance
    pub fn collect_variables(&self, vars: &mut Vec<Variable>) {
        match self {
            ClauseEntry::Triple(t) => {
                for node in t.nodes() {
                    push_variable(node, vars);
                }
            }
            ClauseEntry::Functor(f) => {
                for node in &f.args {
                    push_variable(node, vars);
                }
            }
            ClauseEntry::Rule(r) => {
                for entry in r.body.iter().chain(r.head.iter()) {
                    entry.collect_variables(vars);
                }
            }
        }
    }
}

fn push_variable(node: &Node, vars: &mut Vec<Variable>) {
    if let Node::Variable(v) = node {
        if !vars.contains(v) {
            vars.push(v.clone());
        }
    }
}

/// Distinct variables of a clause list, in order of first appearance
pub fn variables_of(entries: &[ClauseEntry]) -> Vec<Variable> {
    let mut vars = Vec::new();
    for entry in entries {
        entry.collect_variables(&mut vars);
    }
    vars
}

impl fmt::Debug for ClauseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ClauseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseEntry::Triple(t) => write!(f, "{}", t),
            ClauseEntry::Functor(func) => write!(f, "{}", func),
            ClauseEntry::Rule(r) => write!(f, "{}", r),
        }
    }
}

impl From<TriplePattern> for ClauseEntry {
    fn from(t: TriplePattern) -> Self {
        ClauseEntry::Triple(t)
    }
}

impl From<Functor> for ClauseEntry {
    fn from(f: Functor) -> Self {
        ClauseEntry::Functor(f)
    }
}

/// A forward-chaining rule (body -> head)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    /// Name/identifier for the rule (optional)
    pub name: Option<String>,
    /// Antecedent clauses
    pub body: Vec<ClauseEntry>,
    /// Consequent clauses
    pub head: Vec<ClauseEntry>,
}

impl Rule {
    /// Create a new unnamed rule
    pub fn new(body: Vec<ClauseEntry>, head: Vec<ClauseEntry>) -> Self {
        Rule { name: None, body, head }
    }

    /// Create a named rule
    pub fn named(name: impl Into<String>, body: Vec<ClauseEntry>, head: Vec<ClauseEntry>) -> Self {
        Rule { name: Some(name.into()), body, head }
    }

    /// An axiom is a rule with an empty body: its head holds unconditionally
    pub fn is_axiom(&self) -> bool {
        self.body.is_empty()
    }

    /// Triple patterns of the body, in order
    pub fn body_patterns(&self) -> impl Iterator<Item = &TriplePattern> {
        self.body.iter().filter_map(ClauseEntry::as_triple)
    }

    /// Functor guards of the body, in order
    pub fn body_functors(&self) -> impl Iterator<Item = &Functor> {
        self.body.iter().filter_map(ClauseEntry::as_functor)
    }

    /// Distinct variables of body and head, in order of first appearance
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = variables_of(&self.body);
        for entry in &self.head {
            entry.collect_variables(&mut vars);
        }
        vars
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        if let Some(name) = &self.name {
            write!(f, "{} : ", name)?;
        }
        for entry in &self.body {
            write!(f, "{} ", entry)?;
        }
        write!(f, "->")?;
        for entry in &self.head {
            write!(f, " {}", entry)?;
        }
        write!(f, " ]")
    }
}
