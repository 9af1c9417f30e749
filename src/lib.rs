//! rete-topology - compile forward-chaining rules into dataflow topologies
//!
//! Rules written in the Jena rule syntax are compiled into a shared network
//! of operators, then wired onto a streaming engine as a cyclic graph.
//!
//! # Architecture
//!
//! - [`parser`] - rule-file parser (`@prefix`, triple patterns, functors, nested rules)
//! - [`canonical`] - variable-blind canonical keys, the basis of operator sharing
//! - [`compiler`] - filters, greedy joins, terminals and the conflict set
//! - [`topology`] - the [`topology::TopologyBuilder`] seam and the wiring pass
//! - [`config`] - TOML configuration with environment overrides and profiles
//!
//! # Example
//!
//! ```rust
//! use rete_topology::{parse_rules, wire, TopologyCompiler, TopologyGraph};
//!
//! let rules = parse_rules(
//!     "[trans: (?a <ancestor> ?b) (?b <ancestor> ?c) -> (?a <ancestor> ?c)]",
//! ).unwrap();
//! let network = TopologyCompiler::default().compile(&rules).unwrap();
//! assert_eq!(network.joins().count(), 1);
//!
//! let mut graph = TopologyGraph::new("closure");
//! wire(&network, &mut graph).unwrap();
//! assert_eq!(graph.outputs("conflict_set").len(), 2);
//! ```

pub mod canonical;
pub mod compiler;
pub mod config;
pub mod error;
pub mod parser;
pub mod rule;
pub mod term;
pub mod topology;

// Re-export term and rule types
pub use term::{BlankNode, Literal, LiteralKind, Node, Uri, Variable};
pub use rule::{ClauseEntry, Functor, Rule, TriplePattern};

// Re-export parser types
pub use parser::{parse_rule, parse_rules, ParseError, ParserState, RuleParser};

// Re-export canonicalization
pub use canonical::{canonicalize, canonicalize_rule, Canonical, Canonicalizer};

// Re-export compiler types
pub use compiler::{
    CompileContext, CompileOptions, CompileReport, CompileWarning, CompiledNetwork, JoinWindow,
    Operator, OperatorKind, SkippedRule, TopologyCompiler,
};

// Re-export wiring types
pub use topology::graph::{GraphEdge, GraphNode, NodeId, TopologyGraph};
pub use topology::{wire, Grouping, TopologyBuilder, Wiring, WiringOptions};

// Re-export configuration types
pub use config::{
    ConfigError, DeploymentProfile, FeedbackGrouping, LogLevel, OutputFormat, ReteConfig,
};

// Re-export error types
pub use error::{ErrorCode, ErrorContext, TopologyError, TopologyResult};
