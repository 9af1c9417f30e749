//! Topology wiring
//!
//! [`Wiring::wire`] declares a [`CompiledNetwork`] against any engine that
//! implements [`TopologyBuilder`]:
//!
//! - the raw-fact source and the axiom source are declared as sources;
//! - filters read the raw source (shuffle) and the conflict set (the
//!   feedback edge, which makes the graph cyclic);
//! - each join side is grouped on that side's join-key fields, so tuples
//!   that can match land on the same join instance;
//! - terminals read their prior and feed the conflict set (shuffle), which
//!   also takes the axiom source (global).
//!
//! [`graph::TopologyGraph`] is an in-memory builder that records the result.

pub mod graph;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compiler::{CompiledNetwork, Operator, OperatorKind};
use crate::config::{FeedbackGrouping, ReteConfig};
use crate::error::{ErrorCode, TopologyResult};
use crate::rule::TriplePattern;
use crate::topology_error;

/// Stream partitioning on an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// Round-robin
    Shuffle,
    /// Equal values at these positions go to the same instance
    Fields(Vec<usize>),
    /// Every instance receives every tuple
    All,
    /// Everything goes to a single instance
    Global,
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Shuffle => write!(f, "shuffle"),
            Grouping::Fields(fields) => {
                let fields: Vec<String> = fields.iter().map(|i| i.to_string()).collect();
                write!(f, "fields[{}]", fields.join(","))
            }
            Grouping::All => write!(f, "all"),
            Grouping::Global => write!(f, "global"),
        }
    }
}

impl From<FeedbackGrouping> for Grouping {
    fn from(feedback: FeedbackGrouping) -> Self {
        match feedback {
            FeedbackGrouping::Shuffle => Grouping::Shuffle,
            FeedbackGrouping::All => Grouping::All,
        }
    }
}

/// The engine-side graph construction interface
pub trait TopologyBuilder {
    type Handle: Clone;

    /// Declare a tuple source owned by the engine
    fn declare_source(&mut self, name: &str) -> Self::Handle;

    /// Declare an operator with its instance count
    fn declare_operator(&mut self, name: &str, kind: OperatorKind, parallelism: usize) -> Self::Handle;

    /// Add an edge `from → to`
    fn connect(&mut self, from: &Self::Handle, to: &Self::Handle, grouping: Grouping);

    /// Hand the axiom heads to the axiom source
    fn emit_axioms(&mut self, _source: &Self::Handle, _axioms: &[TriplePattern]) {}
}

/// Per-kind parallelism and the engine-facing limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringOptions {
    pub default_parallelism: usize,
    pub filter_parallelism: Option<usize>,
    pub join_parallelism: Option<usize>,
    pub terminal_parallelism: Option<usize>,
    pub max_parallelism: usize,
    pub feedback: FeedbackGrouping,
}

impl Default for WiringOptions {
    fn default() -> Self {
        WiringOptions::from_config(&ReteConfig::default())
    }
}

impl WiringOptions {
    pub fn from_config(config: &ReteConfig) -> Self {
        WiringOptions {
            default_parallelism: config.parallelism.default,
            filter_parallelism: config.parallelism.filter,
            join_parallelism: config.parallelism.join,
            terminal_parallelism: config.parallelism.terminal,
            max_parallelism: config.topology.max_parallelism,
            feedback: config.topology.feedback,
        }
    }

    /// Instances to declare for an operator kind
    pub fn parallelism(&self, kind: OperatorKind) -> usize {
        let wanted = match kind {
            OperatorKind::ConflictSet | OperatorKind::AxiomSource => return 1,
            OperatorKind::Filter => self.filter_parallelism,
            OperatorKind::Join => self.join_parallelism,
            OperatorKind::Terminal => self.terminal_parallelism,
        };
        wanted
            .unwrap_or(self.default_parallelism)
            .clamp(1, self.max_parallelism.max(1))
    }
}

/// Declares compiled networks against a builder
#[derive(Debug, Clone, Default)]
pub struct Wiring {
    options: WiringOptions,
}

impl Wiring {
    pub fn new(options: WiringOptions) -> Self {
        Wiring { options }
    }

    pub fn options(&self) -> &WiringOptions {
        &self.options
    }

    pub fn wire<B: TopologyBuilder>(&self, network: &CompiledNetwork, builder: &mut B) -> TopologyResult<()> {
        let source = builder.declare_source(network.source());
        let axioms = builder.declare_source(network.axiom_source());
        builder.emit_axioms(&axioms, network.axioms());

        let conflict_set = builder.declare_operator(
            network.conflict_set(),
            OperatorKind::ConflictSet,
            self.options.parallelism(OperatorKind::ConflictSet),
        );

        let mut handles: IndexMap<&str, B::Handle> = IndexMap::new();
        for op in network.operators().iter() {
            let kind = op.kind();
            match op {
                Operator::ConflictSet(_) | Operator::AxiomSource(_) => continue,
                Operator::Filter(_) | Operator::Join(_) | Operator::Terminal(_) => {
                    let parallelism = self.options.parallelism(kind);
                    debug!(operator = op.name(), kind = %kind, parallelism, "declaring operator");
                    let handle = builder.declare_operator(op.name(), kind, parallelism);
                    handles.insert(op.name(), handle);
                }
            }
        }

        let lookup = |name: &str| -> TopologyResult<B::Handle> {
            handles.get(name).cloned().ok_or_else(|| {
                topology_error!(ErrorCode::UnknownOperator, "Operator {} was never declared", name)
            })
        };

        let feedback = Grouping::from(self.options.feedback);
        for op in network.operators().iter() {
            match op {
                Operator::Filter(filter) => {
                    let handle = lookup(&filter.name)?;
                    builder.connect(&source, &handle, Grouping::Shuffle);
                    builder.connect(&conflict_set, &handle, feedback.clone());
                }
                Operator::Join(join) => {
                    let handle = lookup(&join.name)?;
                    let (left_grouping, right_grouping) = if join.is_cross() {
                        (Grouping::Global, Grouping::Global)
                    } else {
                        (Grouping::Fields(join.left_key()), Grouping::Fields(join.right_key()))
                    };
                    builder.connect(&lookup(&join.left)?, &handle, left_grouping);
                    builder.connect(&lookup(&join.right)?, &handle, right_grouping);
                }
                Operator::Terminal(terminal) => {
                    let handle = lookup(&terminal.name)?;
                    builder.connect(&lookup(&terminal.prior)?, &handle, Grouping::Shuffle);
                    builder.connect(&handle, &conflict_set, Grouping::Shuffle);
                }
                Operator::ConflictSet(_) => {
                    builder.connect(&axioms, &conflict_set, Grouping::Global);
                }
                Operator::AxiomSource(_) => {}
            }
        }

        Ok(())
    }
}

/// Wire a network with default options
pub fn wire<B: TopologyBuilder>(network: &CompiledNetwork, builder: &mut B) -> TopologyResult<()> {
    Wiring::default().wire(network, builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallelism() {
        let options = WiringOptions {
            default_parallelism: 3,
            filter_parallelism: None,
            join_parallelism: Some(10),
            terminal_parallelism: Some(0),
            max_parallelism: 4,
            feedback: FeedbackGrouping::Shuffle,
        };
        assert_eq!(options.parallelism(OperatorKind::Filter), 3);
        assert_eq!(options.parallelism(OperatorKind::Join), 4);
        assert_eq!(options.parallelism(OperatorKind::Terminal), 1);
        assert_eq!(options.parallelism(OperatorKind::ConflictSet), 1);
        assert_eq!(options.parallelism(OperatorKind::AxiomSource), 1);
    }

    #[test]
    fn test_grouping_display() {
        assert_eq!(Grouping::Fields(vec![1, 0]).to_string(), "fields[1,0]");
        assert_eq!(Grouping::from(FeedbackGrouping::All), Grouping::All);
    }
}
