//! In-memory topology graph
//!
//! A [`TopologyBuilder`] that records every declaration, for inspection,
//! JSON export and Graphviz rendering.


use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::compiler::OperatorKind;
use crate::config::ReteConfig;
use crate::error::TopologyResult;
use crate::rule::TriplePattern;

use super::{Grouping, TopologyBuilder};

/// Index of a node in a [`TopologyGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A declared source or operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    /// `None` for sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<OperatorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
}

impl GraphNode {
    pub fn is_source(&self) -> bool {
        self.kind.is_none()
    }
}

/// A typed edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub grouping: Grouping,
}

/// A recorded topology
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub name: String,
    pub workers: usize,
    pub max_parallelism: usize,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Axiom heads emitted by the axiom source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub axioms: Vec<String>,
    #[serde(skip)]
    index: IndexMap<String, NodeId>,
}

impl TopologyGraph {
    pub fn new(name: impl Into<String>) -> Self {
        TopologyGraph {
            name: name.into(),
            workers: 1,
            max_parallelism: 1,
            ..Default::default()
        }
    }

    pub fn from_config(config: &ReteConfig) -> Self {
        TopologyGraph {
            workers: config.topology.workers,
            max_parallelism: config.topology.max_parallelism,
            ..Self::new(config.topology.name.clone())
        }
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.index.get(name).map(|id| &self.nodes[id.0])
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Operators of one kind, in declaration order
    pub fn nodes_of(&self, kind: OperatorKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == Some(kind))
    }

    pub fn count(&self, kind: OperatorKind) -> usize {
        self.nodes_of(kind).count()
    }

    /// Inbound edges of a node as `(source name, grouping)`
    pub fn inputs(&self, name: &str) -> Vec<(&str, &Grouping)> {
        let Some(id) = self.id_of(name) else {
            return Vec::new();
        };
        self.edges
            .iter()
            .filter(|e| e.to == id)
            .map(|e| (self.nodes[e.from.0].name.as_str(), &e.grouping))
            .collect()
    }

    /// Outbound edges of a node as `(target name, grouping)`
    pub fn outputs(&self, name: &str) -> Vec<(&str, &Grouping)> {
        let Some(id) = self.id_of(name) else {
            return Vec::new();
        };
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| (self.nodes[e.to.0].name.as_str(), &e.grouping))
            .collect()
    }

    pub fn to_json(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Graphviz rendering; feedback edges into filters are dashed
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("digraph \"{}\" {{\n", escape(&self.name)));
        out.push_str("  rankdir=LR;\n");
        for (i, node) in self.nodes.iter().enumerate() {
            let (shape, label) = match (node.kind, node.parallelism) {
                (None, _) => ("house", node.name.clone()),
                (Some(kind), Some(p)) => (shape_of(kind), format!("{}\\n{} x{}", escape(&node.name), kind, p)),
                (Some(kind), None) => (shape_of(kind), format!("{}\\n{}", escape(&node.name), kind)),
            };
            let label = if node.is_source() { escape(&label) } else { label };
            out.push_str(&format!("  n{} [label=\"{}\" shape={}];\n", i, label, shape));
        }
        for edge in &self.edges {
            let feedback = self.nodes[edge.from.0].kind == Some(OperatorKind::ConflictSet)
                && self.nodes[edge.to.0].kind == Some(OperatorKind::Filter);
            let style = if feedback { " style=dashed" } else { "" };
            out.push_str(&format!(
                "  n{} -> n{} [label=\"{}\"{}];\n",
                edge.from.0, edge.to.0, edge.grouping, style
            ));
        }
        out.push_str("}\n");
        out
    }

    /// One line per node with its inputs
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "topology {} ({} workers, max parallelism {})\n",
            self.name, self.workers, self.max_parallelism
        ));
        for kind in [
            OperatorKind::Filter,
            OperatorKind::Join,
            OperatorKind::Terminal,
            OperatorKind::ConflictSet,
        ] {
            out.push_str(&format!("  {}s: {}\n", kind, self.count(kind)));
        }
        out.push_str(&format!("  axioms: {}\n", self.axioms.len()));
        for node in self.nodes.iter().filter(|n| !n.is_source()) {
            let inputs: Vec<String> = self
                .inputs(&node.name)
                .into_iter()
                .map(|(from, grouping)| format!("{} ({})", from, grouping))
                .collect();
            out.push_str(&format!(
                "{} [{} x{}] <- {}\n",
                node.name,
                node.kind.map(|k| k.as_str()).unwrap_or("source"),
                node.parallelism.unwrap_or(1),
                inputs.join(", ")
            ));
        }
        out
    }

    fn insert(&mut self, node: GraphNode) -> NodeId {
        if let Some(id) = self.index.get(&node.name) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(node.name.clone(), id);
        self.nodes.push(node);
        id
    }
}

impl TopologyBuilder for TopologyGraph {
    type Handle = NodeId;

    fn declare_source(&mut self, name: &str) -> NodeId {
        self.insert(GraphNode {
            name: name.to_string(),
            kind: None,
            parallelism: None,
        })
    }

    fn declare_operator(&mut self, name: &str, kind: OperatorKind, parallelism: usize) -> NodeId {
        self.insert(GraphNode {
            name: name.to_string(),
            kind: Some(kind),
            parallelism: Some(parallelism),
        })
    }

    fn connect(&mut self, from: &NodeId, to: &NodeId, grouping: Grouping) {
        self.edges.push(GraphEdge {
            from: *from,
            to: *to,
            grouping,
        });
    }

    fn emit_axioms(&mut self, _source: &NodeId, axioms: &[TriplePattern]) {
        self.axioms.extend(axioms.iter().map(|t| t.to_string()));
    }
}

fn shape_of(kind: OperatorKind) -> &'static str {
    match kind {
        OperatorKind::Filter => "box",
        OperatorKind::Join => "diamond",
        OperatorKind::Terminal => "octagon",
        OperatorKind::ConflictSet => "doublecircle",
        OperatorKind::AxiomSource => "house",
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::TopologyCompiler;
    use crate::config::FeedbackGrouping;
    use crate::parser::parse_rules;
    use crate::topology::{wire, Wiring, WiringOptions};

    fn build(text: &str) -> TopologyGraph {
        let network = TopologyCompiler::default()
            .compile(&parse_rules(text).unwrap())
            .unwrap();
        let mut graph = TopologyGraph::new("test");
        wire(&network, &mut graph).unwrap();
        graph
    }

    const RULES: &str = "
        [ax: -> (<alice> <ancestor> <bob>)]
        [trans: (?a <ancestor> ?b) (?b <ancestor> ?c) -> (?a <ancestor> ?c)]
        [r1: (?x <a> ?y) -> (?y <b> ?x)]
        [r2: (?p <a> ?q) (?q <c> ?r) -> (?p <d> ?r)]
    ";

    #[test]
    fn test_feedback_edge_into_every_filter() {
        let graph = build(RULES);
        assert_eq!(graph.count(OperatorKind::Filter), 4);
        for filter in graph.nodes_of(OperatorKind::Filter) {
            let inputs = graph.inputs(&filter.name);
            assert!(inputs.contains(&("conflict_set", &Grouping::Shuffle)));
            assert!(inputs.contains(&("source", &Grouping::Shuffle)));
        }
    }

    #[test]
    fn test_feedback_grouping_is_configurable() {
        let network = TopologyCompiler::default()
            .compile(&parse_rules(RULES).unwrap())
            .unwrap();
        let options = WiringOptions {
            feedback: FeedbackGrouping::All,
            ..WiringOptions::default()
        };
        let mut graph = TopologyGraph::new("test");
        Wiring::new(options).wire(&network, &mut graph).unwrap();
        let feedback = graph.outputs("conflict_set");
        assert_eq!(feedback.len(), 4);
        assert!(feedback.iter().all(|(_, g)| **g == Grouping::All));
    }

    #[test]
    fn test_join_sides_use_aligned_fields() {
        let graph = build("[trans: (?a ?p ?b) (?b ?p ?c) -> (?a ?p ?c)]");
        let join = graph.nodes_of(OperatorKind::Join).next().unwrap();
        let inputs = graph.inputs(&join.name);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0], ("(?0 ?1 ?2)", &Grouping::Fields(vec![1, 2])));
        assert_eq!(inputs[1], ("(?0 ?1 ?2)#2", &Grouping::Fields(vec![1, 0])));
    }

    #[test]
    fn test_cross_join_is_global() {
        let graph = build("[cross: (?a <p> ?b) (?c <q> ?d) -> (?a <r> ?d)]");
        let join = graph.nodes_of(OperatorKind::Join).next().unwrap();
        assert!(graph
            .inputs(&join.name)
            .iter()
            .all(|(_, g)| **g == Grouping::Global));
    }

    #[test]
    fn test_terminals_and_conflict_set() {
        let graph = build(RULES);
        assert_eq!(graph.count(OperatorKind::Terminal), 3);
        assert_eq!(graph.count(OperatorKind::ConflictSet), 1);

        let conflict_set = graph.node("conflict_set").unwrap();
        assert_eq!(conflict_set.parallelism, Some(1));

        let inputs = graph.inputs("conflict_set");
        assert_eq!(inputs.len(), 4);
        assert!(inputs.contains(&("axioms", &Grouping::Global)));
        assert_eq!(
            inputs.iter().filter(|(_, g)| **g == Grouping::Shuffle).count(),
            3
        );

        let terminal_inputs = graph.inputs("trans_terminal");
        assert_eq!(terminal_inputs.len(), 1);
        assert_eq!(terminal_inputs[0].1, &Grouping::Shuffle);
    }

    #[test]
    fn test_sources_and_axioms() {
        let graph = build(RULES);
        assert!(graph.node("source").unwrap().is_source());
        assert!(graph.node("axioms").unwrap().is_source());
        assert_eq!(graph.axioms, vec!["(<alice> <ancestor> <bob>)".to_string()]);
    }

    #[test]
    fn test_every_operator_declared_once() {
        let graph = build(RULES);
        let mut names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_wiring_is_deterministic() {
        assert_eq!(build(RULES), build(RULES));
    }

    #[test]
    fn test_json_and_dot() {
        let graph = build("[r: (?a <p> ?b) -> (?b <p> ?a)]");
        let json = graph.to_json().unwrap();
        assert!(json.contains("\"conflict_set\""));
        assert!(json.contains("\"shuffle\""));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["nodes"].as_array().unwrap().len(), 5);

        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph \"test\""));
        assert!(dot.contains("style=dashed"));
        assert!(dot.contains("r_terminal"));
    }

    #[test]
    fn test_summary_lists_counts() {
        let summary = build(RULES).summary();
        assert!(summary.contains("filters: 4"));
        assert!(summary.contains("joins: 2"));
        assert!(summary.contains("terminals: 3"));
    }

    #[test]
    fn test_renderings_are_line_per_item() {
        let graph = build("[r: (?a <p> ?b) -> (?b <p> ?a)]");

        let dot = graph.to_dot();
        assert!(dot.ends_with("}\n"));
        let lines: Vec<&str> = dot.lines().collect();
        assert_eq!(lines.len(), 2 + graph.nodes.len() + graph.edges.len() + 1);
        assert!(lines[1..lines.len() - 1].iter().all(|l| l.ends_with(';')));

        let summary = graph.summary();
        assert!(summary.ends_with('\n'));
        assert_eq!(summary.lines().count(), 1 + 4 + 1 + 3);
        assert!(summary.lines().any(|l| l.starts_with("r_terminal [terminal x")));
    }

    #[test]
    fn test_from_config() {
        let mut config = ReteConfig::default();
        config.topology.name = "closure".into();
        config.topology.workers = 3;
        let graph = TopologyGraph::from_config(&config);
        assert_eq!(graph.name, "closure");
        assert_eq!(graph.workers, 3);
        assert_eq!(graph.max_parallelism, 4);
    }
}
