//! Node representations for rule clauses
//!
//! This module defines the ground and non-ground nodes that appear inside
//! triple patterns and functor arguments:
//! - URIs (named nodes)
//! - Literals (with optional datatype or language tag)
//! - Blank nodes (labelled anonymous nodes)
//! - Variables (rule-scoped, e.g. `?x`)

use std::fmt;
use std::sync::Arc;

pub mod uri;
mod literal;
mod blank;
mod variable;

pub use uri::Uri;
pub use literal::{Literal, LiteralKind};
pub use blank::BlankNode;
pub use variable::Variable;

/// A node in a triple pattern or functor argument list
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// A rule variable
    Variable(Variable),
    /// A URI reference (named node)
    Uri(Arc<Uri>),
    /// A literal value
    Literal(Arc<Literal>),
    /// A blank node
    Blank(BlankNode),
}

impl Node {
    /// Create a URI node
    pub fn uri(s: impl Into<String>) -> Self {
        Node::Uri(Arc::new(Uri::new(s)))
    }

    /// Create a plain literal
    pub fn literal(s: impl Into<String>) -> Self {
        Node::Literal(Arc::new(Literal::simple(s)))
    }

    /// Create a typed literal
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal(Arc::new(Literal::typed(value, datatype)))
    }

    /// Create a language-tagged literal
    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Node::Literal(Arc::new(Literal::lang(value, lang)))
    }

    /// Create a blank node with a label
    pub fn blank(label: impl Into<String>) -> Self {
        Node::Blank(BlankNode::labeled(label.into()))
    }

    /// Create a variable
    pub fn var(name: impl Into<String>) -> Self {
        Node::Variable(Variable::new(name.into()))
    }

    /// Check if this node is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Node::Variable(_))
    }

    /// Check if this node is ground (not a variable)
    pub fn is_ground(&self) -> bool {
        !self.is_variable()
    }

    /// Get the variable if this is a variable node
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Node::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Get the URI if this is a URI node
    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Node::Uri(u) => Some(u),
            _ => None,
        }
    }

    /// Get the literal if this is a literal node
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Variable(v) => write!(f, "{:?}", v),
            Node::Uri(u) => write!(f, "{:?}", u),
            Node::Literal(l) => write!(f, "{:?}", l),
            Node::Blank(b) => write!(f, "{:?}", b),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Variable(v) => write!(f, "{}", v),
            Node::Uri(u) => write!(f, "{}", u),
            Node::Literal(l) => write!(f, "{}", l),
            Node::Blank(b) => write!(f, "{}", b),
        }
    }
}

impl From<Variable> for Node {
    fn from(v: Variable) -> Self {
        Node::Variable(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let uri = Node::uri("http://example.org/foo");
        assert!(matches!(uri, Node::Uri(_)));

        let lit = Node::literal("hello");
        assert!(matches!(lit, Node::Literal(_)));

        let blank = Node::blank("b1");
        assert!(matches!(blank, Node::Blank(_)));

        let var = Node::var("x");
        assert!(var.is_variable());
        assert_eq!(var.as_variable().map(|v| v.name()), Some("x"));
    }

    #[test]
    fn test_ground_check() {
        assert!(Node::uri("http://example.org/").is_ground());
        assert!(Node::literal("hello").is_ground());
        assert!(!Node::var("x").is_ground());
    }

    #[test]
    fn test_display() {
        assert_eq!(Node::uri("http://example.org/p").to_string(), "<http://example.org/p>");
        assert_eq!(Node::var("a").to_string(), "?a");
        assert_eq!(Node::blank("n").to_string(), "_:n");
    }
}
