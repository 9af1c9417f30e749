//! Variable representation for rule patterns

use std::fmt;

/// A rule variable, written `?name`
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Create a variable; a leading `?` is stripped
    pub fn new(name: String) -> Self {
        let name = match name.strip_prefix('?') {
            Some(stripped) => stripped.to_string(),
            None => name,
        };
        Variable { name }
    }

    /// Get the variable name (without the `?`)
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}
