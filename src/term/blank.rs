//! Blank node representation

use std::fmt;

/// A labelled blank node
///
/// Blank nodes in rules are constants: two patterns mentioning `_:b` refer
/// to the same node, so the label is the whole identity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlankNode {
    label: String,
}

impl BlankNode {
    /// Create a blank node with a label; a leading `_:` is stripped
    pub fn labeled(label: String) -> Self {
        let label = match label.strip_prefix("_:") {
            Some(stripped) => stripped.to_string(),
            None => label,
        };
        BlankNode { label }
    }

    /// Get the label
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.label)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.label)
    }
}
