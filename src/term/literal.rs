//! Literal constants

use std::fmt;

/// What qualifies a literal's lexical form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Simple,
    /// Lower-cased language tag
    Lang(String),
    /// Datatype IRI
    Typed(String),
}

/// A literal constant in a pattern or functor argument
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    lexical: String,
    kind: LiteralKind,
}

impl Literal {
    pub fn simple(lexical: impl Into<String>) -> Self {
        Literal { lexical: lexical.into(), kind: LiteralKind::Simple }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Literal {
            lexical: lexical.into(),
            kind: LiteralKind::Typed(datatype.into()),
        }
    }

    /// Language tags compare case-insensitively, so they are stored lower-cased
    pub fn lang(lexical: impl Into<String>, tag: impl Into<String>) -> Self {
        let mut tag: String = tag.into();
        tag.make_ascii_lowercase();
        Literal {
            lexical: lexical.into(),
            kind: LiteralKind::Lang(tag),
        }
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn kind(&self) -> &LiteralKind {
        &self.kind
    }

    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            LiteralKind::Lang(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn datatype(&self) -> Option<&str> {
        match &self.kind {
            LiteralKind::Typed(iri) => Some(iri),
            _ => None,
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// Rendered in the rule syntax; canonical keys are re-parsed.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.lexical.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c => write!(f, "{}", c)?,
            }
        }
        f.write_str("\"")?;
        match &self.kind {
            LiteralKind::Simple => Ok(()),
            LiteralKind::Lang(tag) => write!(f, "@{}", tag),
            LiteralKind::Typed(iri) => write!(f, "^^<{}>", iri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::uri::ns;

    #[test]
    fn test_kinds() {
        let simple = Literal::simple("Alice");
        assert_eq!(simple.kind(), &LiteralKind::Simple);
        assert_eq!(simple.to_string(), "\"Alice\"");

        let tagged = Literal::lang("chat", "FR");
        assert_eq!(tagged.language(), Some("fr"));
        assert_eq!(tagged.to_string(), "\"chat\"@fr");

        let number = Literal::typed("7", format!("{}integer", ns::XSD));
        assert_eq!(number.lexical(), "7");
        assert_eq!(number.to_string(), format!("\"7\"^^<{}integer>", ns::XSD));
    }

    #[test]
    fn test_distinct_kinds_are_distinct_constants() {
        assert_ne!(Literal::simple("1"), Literal::typed("1", format!("{}integer", ns::XSD)));
        assert_ne!(Literal::simple("a"), Literal::lang("a", "en"));
    }

    #[test]
    fn test_quotes_and_control_characters_are_escaped() {
        let lit = Literal::simple("a \"b\"\n\\");
        assert_eq!(lit.to_string(), "\"a \\\"b\\\"\\n\\\\\"");
    }
}
