//! Rule-language parser
//!
//! Parses the Jena forward-rule text syntax:
//!
//! ```text
//! @prefix ex: <http://example.org/> .
//!
//! [transitive: (?a ex:ancestor ?b) (?b ex:ancestor ?c) -> (?a ex:ancestor ?c)]
//! [guarded: (?a ex:p ?b) notEqual(?a, ?b) -> (?b ex:q ?a)]
//! [axiom: -> (ex:alice ex:ancestor ex:bob)]
//! ```
//!
//! Clause entries are triple patterns `(S P O)`, functors `name(args…)` and
//! nested rules `[ … ]`. Nodes are variables `?x`, IRIs `<…>`, prefixed
//! names `p:local`, literals (`"v"`, `"v"@en`, `"v"^^<dt>`, numbers), blank
//! nodes `_:b` and bare words, which are read as IRIs.
//!
//! The canonical strings produced by [`crate::canonical`] are valid input
//! for this parser.

use nom::{
    IResult,
    bytes::complete::{tag, take_while, take_while1, escaped},
    character::complete::{char, multispace1, digit1, none_of, one_of},
    combinator::{opt, map, value, recognize, peek},
    sequence::{delimited, preceded, pair, tuple},
    branch::alt,
    multi::many0,
};

use indexmap::IndexMap;

use crate::rule::{ClauseEntry, Functor, Rule, TriplePattern};
use crate::term::uri::ns;
use crate::term::Node;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Undefined prefix: {prefix}")]
    UndefinedPrefix { prefix: String },

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Expected exactly one rule, found {found}")]
    NotASingleRule { found: usize },
}

/// Parser state holding prefix mappings
#[derive(Debug, Clone, Default)]
pub struct ParserState {
    prefixes: IndexMap<String, String>,
}

impl ParserState {
    pub fn new() -> Self {
        let mut state = Self::default();
        state.add_prefix("rdf", ns::RDF);
        state.add_prefix("rdfs", ns::RDFS);
        state.add_prefix("xsd", ns::XSD);
        state.add_prefix("owl", ns::OWL);
        state
    }

    pub fn add_prefix(&mut self, prefix: &str, namespace: &str) {
        self.prefixes.insert(prefix.to_string(), namespace.to_string());
    }

    pub fn resolve_prefix(&self, prefix: &str, local: &str) -> Option<String> {
        self.prefixes.get(prefix).map(|ns| format!("{}{}", ns, local))
    }

    pub fn prefixes(&self) -> &IndexMap<String, String> {
        &self.prefixes
    }
}

/// Parse whitespace and comments (`#…` and `//…` to end of line)
fn ws(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), preceded(char('#'), take_while(|c| c != '\n'))),
            value((), preceded(tag("//"), take_while(|c| c != '\n'))),
        ))),
    )(input)
}

/// Whitespace, plus commas used as argument separators
fn arg_sep(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), value((), char(','))))))(input)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char)))(input)
}

/// Parse an IRI reference <...>
fn iri_ref(input: &str) -> IResult<&str, &str> {
    delimited(
        char('<'),
        take_while(|c| c != '>' && c != ' ' && c != '\n' && c != '\r'),
        char('>'),
    )(input)
}

/// Parse a prefixed name (prefix:local); the prefix may be empty
fn prefixed_name(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, prefix) = take_while(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char(':')(input)?;
    let (input, local) = take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)?;
    Ok((input, (prefix, local)))
}

/// Parse a variable ?name
fn variable(input: &str) -> IResult<&str, Node> {
    let (input, _) = char('?')(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    Ok((input, Node::var(name)))
}

/// Parse a blank node _:label
fn blank_node(input: &str) -> IResult<&str, Node> {
    let (input, _) = tag("_:")(input)?;
    let (input, label) = take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)?;
    Ok((input, Node::blank(label)))
}

/// Parse a quoted string with escape sequences
fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            opt(escaped(none_of("\\\""), '\\', one_of("\"\\nrt'"))),
            char('"'),
        ),
        |s: Option<&str>| unescape_string(s.unwrap_or("")),
    )(input)
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Parse a numeric literal into an xsd:integer or xsd:decimal
fn numeric_literal(input: &str) -> IResult<&str, Node> {
    let (input, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;
    let datatype = if text.contains('.') { "decimal" } else { "integer" };
    Ok((input, Node::typed_literal(text, format!("{}{}", ns::XSD, datatype))))
}

/// Rule parser with prefix state
#[derive(Debug, Clone)]
pub struct RuleParser {
    state: ParserState,
}

impl Default for RuleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleParser {
    pub fn new() -> Self {
        RuleParser { state: ParserState::new() }
    }

    /// Create a parser with additional prefixes registered
    pub fn with_prefixes<'a>(prefixes: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut parser = Self::new();
        for (prefix, namespace) in prefixes {
            parser.state.add_prefix(prefix, namespace);
        }
        parser
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Parse a whole document of prefix directives and rules
    pub fn parse_document(&mut self, input: &str) -> Result<Vec<Rule>, ParseError> {
        let mut rules = Vec::new();
        let mut rest = input;

        loop {
            rest = ws(rest).map(|(r, _)| r).unwrap_or(rest);
            if rest.is_empty() {
                break;
            }

            if rest.starts_with("@prefix") {
                match self.prefix_directive(rest) {
                    Ok((r, (prefix, namespace))) => {
                        self.state.add_prefix(prefix, namespace);
                        rest = r;
                    }
                    Err(_) => return Err(self.error_at(input, rest, "malformed @prefix directive")),
                }
                continue;
            }

            match self.rule(rest) {
                Ok((r, rule)) => {
                    rules.push(rule);
                    rest = r;
                }
                Err(nom::Err::Incomplete(_)) => return Err(ParseError::UnexpectedEof),
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                    return Err(self.error_at(input, e.input, "expected a rule"));
                }
            }
        }

        Ok(rules)
    }

    /// Parse exactly one rule
    pub fn parse_rule(&self, input: &str) -> Result<Rule, ParseError> {
        let mut scratch = self.clone();
        let mut rules = scratch.parse_document(input)?;
        if rules.len() != 1 {
            return Err(ParseError::NotASingleRule { found: rules.len() });
        }
        Ok(rules.remove(0))
    }

    /// Parse a whitespace-separated clause list (no surrounding brackets)
    pub fn parse_clauses(&self, input: &str) -> Result<Vec<ClauseEntry>, ParseError> {
        match self.clause_list(input) {
            Ok((rest, clauses)) => {
                let rest = ws(rest).map(|(r, _)| r).unwrap_or(rest);
                if rest.is_empty() {
                    Ok(clauses)
                } else {
                    Err(self.error_at(input, rest, "unexpected trailing input"))
                }
            }
            Err(nom::Err::Incomplete(_)) => Err(ParseError::UnexpectedEof),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                Err(self.error_at(input, e.input, "expected a clause"))
            }
        }
    }

    fn error_at(&self, full: &str, rest: &str, message: &str) -> ParseError {
        if rest.trim().is_empty() {
            return ParseError::UnexpectedEof;
        }
        // A prefixed name that failed to resolve is the most useful diagnosis
        if let Ok((_, (prefix, _))) = prefixed_name(rest.trim_start()) {
            if !self.state.prefixes.contains_key(prefix) {
                return ParseError::UndefinedPrefix { prefix: prefix.to_string() };
            }
        }
        ParseError::Syntax {
            position: full.len() - rest.len(),
            message: message.to_string(),
        }
    }

    fn prefix_directive<'a>(&self, input: &'a str) -> IResult<&'a str, (&'a str, &'a str)> {
        let (input, _) = tag("@prefix")(input)?;
        let (input, _) = ws(input)?;
        let (input, prefix) = take_while(|c: char| c.is_alphanumeric() || c == '_')(input)?;
        let (input, _) = char(':')(input)?;
        let (input, _) = ws(input)?;
        let (input, namespace) = iri_ref(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = opt(char('.'))(input)?;
        Ok((input, (prefix, namespace)))
    }

    fn rule<'a>(&self, input: &'a str) -> IResult<&'a str, Rule> {
        let (input, _) = char('[')(input)?;
        let (input, _) = ws(input)?;
        let (input, name) = opt(|i| self.rule_name(i))(input)?;
        let (input, body) = self.clause_list(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = tag("->")(input)?;
        let (input, head) = self.clause_list(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = char(']')(input)?;
        Ok((input, Rule { name: name.map(str::to_string), body, head }))
    }

    /// `name :` followed by whitespace or the first clause
    fn rule_name<'a>(&self, input: &'a str) -> IResult<&'a str, &'a str> {
        let (input, name) = identifier(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = char(':')(input)?;
        let (input, _) = peek(alt((
            value((), multispace1),
            value((), char('(')),
            value((), char('[')),
            value((), tag("->")),
        )))(input)?;
        let (input, _) = ws(input)?;
        Ok((input, name))
    }

    fn clause_list<'a>(&self, input: &'a str) -> IResult<&'a str, Vec<ClauseEntry>> {
        many0(preceded(ws, |i| self.clause(i)))(input)
    }

    fn clause<'a>(&self, input: &'a str) -> IResult<&'a str, ClauseEntry> {
        alt((
            |i| self.triple_pattern(i),
            map(|i| self.rule(i), |r| ClauseEntry::Rule(Box::new(r))),
            |i| self.functor(i),
        ))(input)
    }

    fn triple_pattern<'a>(&self, input: &'a str) -> IResult<&'a str, ClauseEntry> {
        let (input, _) = char('(')(input)?;
        let (input, _) = ws(input)?;
        let (input, subject) = self.node(input)?;
        let (input, _) = arg_sep(input)?;
        let (input, predicate) = self.node(input)?;
        let (input, _) = arg_sep(input)?;
        let (input, object) = self.node(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = char(')')(input)?;
        Ok((input, ClauseEntry::Triple(TriplePattern::new(subject, predicate, object))))
    }

    fn functor<'a>(&self, input: &'a str) -> IResult<&'a str, ClauseEntry> {
        let (input, name) = identifier(input)?;
        let (input, _) = char('(')(input)?;
        let (input, _) = arg_sep(input)?;
        let (input, args) = many0(|i| {
            let (i, node) = self.node(i)?;
            let (i, _) = arg_sep(i)?;
            Ok((i, node))
        })(input)?;
        let (input, _) = char(')')(input)?;
        Ok((input, ClauseEntry::Functor(Functor::new(name, args))))
    }

    fn node<'a>(&self, input: &'a str) -> IResult<&'a str, Node> {
        alt((
            variable,
            map(iri_ref, Node::uri),
            blank_node,
            |i| self.literal(i),
            numeric_literal,
            |i| self.prefixed_node(i),
            map(identifier, Node::uri),
        ))(input)
    }

    fn literal<'a>(&self, input: &'a str) -> IResult<&'a str, Node> {
        let (input, lexical) = string_literal(input)?;
        if let Ok((rest, lang)) = preceded(
            char::<&str, nom::error::Error<&str>>('@'),
            take_while1(|c: char| c.is_alphanumeric() || c == '-'),
        )(input)
        {
            return Ok((rest, Node::lang_literal(lexical, lang)));
        }
        if let Ok((rest, _)) = tag::<&str, &str, nom::error::Error<&str>>("^^")(input) {
            let (rest, datatype) = alt((
                map(iri_ref, str::to_string),
                |i| self.resolved_name(i),
            ))(rest)?;
            return Ok((rest, Node::typed_literal(lexical, datatype)));
        }
        Ok((input, Node::literal(lexical)))
    }

    fn prefixed_node<'a>(&self, input: &'a str) -> IResult<&'a str, Node> {
        map(|i| self.resolved_name(i), Node::uri)(input)
    }

    fn resolved_name<'a>(&self, input: &'a str) -> IResult<&'a str, String> {
        let (rest, (prefix, local)) = prefixed_name(input)?;
        match self.state.resolve_prefix(prefix, local) {
            Some(uri) => Ok((rest, uri)),
            None => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            ))),
        }
    }
}

/// Parse a rule document with the default prefixes
pub fn parse_rules(input: &str) -> Result<Vec<Rule>, ParseError> {
    RuleParser::new().parse_document(input)
}

/// Parse a single rule with the default prefixes
pub fn parse_rule(input: &str) -> Result<Rule, ParseError> {
    RuleParser::new().parse_rule(input)
}
