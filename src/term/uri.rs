//! Named nodes

use std::fmt;

/// An absolute or bare IRI, rendered as `<…>`
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri(String);

impl Uri {
    pub fn new(iri: impl Into<String>) -> Self {
        Uri(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text after the last `#` or `/`
    pub fn local_name(&self) -> &str {
        self.0.rsplit(['#', '/']).next().unwrap_or(&self.0)
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for Uri {
    fn from(iri: &str) -> Self {
        Uri::new(iri)
    }
}

impl From<String> for Uri {
    fn from(iri: String) -> Self {
        Uri::new(iri)
    }
}

/// Namespaces every rule file can use without declaring them
pub mod ns {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(Uri::new(format!("{}type", ns::RDF)).local_name(), "type");
        assert_eq!(Uri::new("http://example.org/people/alice").local_name(), "alice");
        assert_eq!(Uri::new("ancestor").local_name(), "ancestor");
    }

    #[test]
    fn test_display_and_order() {
        let a = Uri::from("a");
        let b = Uri::from(String::from("b"));
        assert_eq!(a.to_string(), "<a>");
        assert!(a < b);
    }
}
