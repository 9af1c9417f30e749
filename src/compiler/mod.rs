//! Rule-to-network compiler
//!
//! [`TopologyCompiler::compile`] turns a rule set into a [`CompiledNetwork`]:
//!
//! 1. axioms (empty bodies) are collected into the axiom source;
//! 2. every other rule is canonicalized, so variable names stop mattering;
//! 3. each body triple pattern gets a filter, shared across rules by
//!    canonical key;
//! 4. the rule's filters are joined pairwise until one prior remains
//!    (see [`join`]);
//! 5. a rule-specific terminal is attached to the prior and feeds the
//!    conflict set.
//!
//! A rule that cannot be compiled is recorded in the [`CompileReport`] and
//! the batch carries on. Registry invariant violations abort the batch.

pub mod operator;
pub mod registry;
mod join;

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::canonical::Canonicalizer;
use crate::config::ReteConfig;
use crate::error::{TopologyError, TopologyResult};
use crate::rule::{ClauseEntry, Rule, TriplePattern};

use self::join::{CrossJoin, JoinStage, Occurrences, Partial};
pub use self::operator::{
    AxiomSourceOp, ConflictSetOp, FilterOp, JoinOp, JoinWindow, Operator, OperatorKind,
    TerminalOp,
};
pub use self::registry::CompileContext;

/// Compiler inputs besides the rules themselves
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Raw-fact source identifier
    pub source: String,
    /// Axiom source identifier
    pub axiom_source: String,
    /// Conflict-set operator name
    pub conflict_set: String,
    pub window: JoinWindow,
    pub search_bound: usize,
    /// Builtins reported as unsupported
    pub unsupported_builtins: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions::from_config(&ReteConfig::default())
    }
}

impl CompileOptions {
    pub fn from_config(config: &ReteConfig) -> Self {
        CompileOptions {
            source: config.topology.source.clone(),
            axiom_source: config.topology.axiom_source.clone(),
            conflict_set: config.topology.conflict_set.clone(),
            window: JoinWindow {
                capacity: config.join.window_capacity,
                range_secs: config.join.window_range_secs,
            },
            search_bound: config.compiler.search_bound,
            unsupported_builtins: config.compiler.unsupported_builtins.clone(),
        }
    }

    /// Use other source identifiers
    pub fn with_sources(mut self, source: impl Into<String>, axiom_source: impl Into<String>) -> Self {
        self.source = source.into();
        self.axiom_source = axiom_source.into();
        self
    }
}

/// A non-fatal compiler diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompileWarning {
    /// Two operators joined without a shared variable
    CrossJoin { rule: String, left: String, right: String },
    /// A builtin that cannot run inside a streaming topology
    UnsupportedBuiltin { rule: String, builtin: String },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileWarning::CrossJoin { rule, left, right } => {
                write!(f, "{}: cross join of {} and {}", rule, left, right)
            }
            CompileWarning::UnsupportedBuiltin { rule, builtin } => {
                write!(f, "{}: builtin {} is not supported in a topology", rule, builtin)
            }
        }
    }
}

/// A rule that was left out of the network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRule {
    pub rule: String,
    pub error: TopologyError,
}

/// What happened to each rule of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompileReport {
    pub compiled: Vec<String>,
    pub axioms: Vec<String>,
    pub skipped: Vec<SkippedRule>,
    pub warnings: Vec<CompileWarning>,
}

impl CompileReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.warnings.is_empty()
    }
}

/// The output of one compile call
#[derive(Debug, Clone)]
pub struct CompiledNetwork {
    operators: CompileContext,
    source: String,
    axiom_source: String,
    conflict_set: String,
    report: CompileReport,
}

impl CompiledNetwork {
    pub fn operators(&self) -> &CompileContext {
        &self.operators
    }

    pub fn operator(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    pub fn filters(&self) -> impl Iterator<Item = &FilterOp> {
        self.operators.iter().filter_map(Operator::as_filter)
    }

    pub fn joins(&self) -> impl Iterator<Item = &JoinOp> {
        self.operators.iter().filter_map(Operator::as_join)
    }

    pub fn terminals(&self) -> impl Iterator<Item = &TerminalOp> {
        self.operators.iter().filter_map(Operator::as_terminal)
    }

    /// Terminal of a compiled rule
    pub fn terminal_for(&self, rule: &str) -> Option<&TerminalOp> {
        self.terminals().find(|t| t.rule == rule)
    }

    /// Axiom heads, in rule order
    pub fn axioms(&self) -> &[TriplePattern] {
        match self.operators.get(&self.axiom_source) {
            Some(Operator::AxiomSource(op)) => &op.axioms,
            _ => &[],
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn axiom_source(&self) -> &str {
        &self.axiom_source
    }

    pub fn conflict_set(&self) -> &str {
        &self.conflict_set
    }

    pub fn report(&self) -> &CompileReport {
        &self.report
    }
}

/// Compiles rule sets into operator networks
#[derive(Debug, Clone)]
pub struct TopologyCompiler {
    options: CompileOptions,
    canonicalizer: Canonicalizer,
}

impl Default for TopologyCompiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl TopologyCompiler {
    pub fn new(options: CompileOptions) -> Self {
        let canonicalizer = Canonicalizer::with_search_bound(options.search_bound);
        TopologyCompiler { options, canonicalizer }
    }

    pub fn from_config(config: &ReteConfig) -> Self {
        Self::new(CompileOptions::from_config(config))
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a rule set with a fresh registry
    pub fn compile(&self, rules: &[Rule]) -> TopologyResult<CompiledNetwork> {
        let options = &self.options;
        if options.source == options.axiom_source {
            return Err(TopologyError::validation(format!(
                "Raw-fact source and axiom source are both named {}",
                options.source
            )));
        }
        if options.conflict_set == options.source || options.conflict_set == options.axiom_source {
            return Err(TopologyError::validation(format!(
                "Conflict set {} shares its name with a source",
                options.conflict_set
            )));
        }

        let mut ctx = CompileContext::new();
        ctx.reserve(options.source.clone());
        let mut report = CompileReport::default();
        let named: Vec<(String, &Rule)> = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let name = rule.name.clone().unwrap_or_else(|| format!("rule_{}", i + 1));
                (name, rule)
            })
            .collect();

        let mut axioms = Vec::new();
        for (name, rule) in named.iter().filter(|(_, r)| r.is_axiom()) {
            match axiom_heads(name, rule) {
                Ok(heads) => {
                    axioms.extend(heads);
                    report.axioms.push(name.clone());
                }
                Err(error) => skip(&mut report, name, error),
            }
        }

        ctx.register(Operator::ConflictSet(ConflictSetOp {
            name: options.conflict_set.clone(),
        }))?;
        ctx.register(Operator::AxiomSource(AxiomSourceOp {
            name: options.axiom_source.clone(),
            axioms,
        }))?;

        for (name, rule) in named.iter().filter(|(_, r)| !r.is_axiom()) {
            match self.compile_rule(&mut ctx, name, rule, &mut report) {
                Ok(()) => report.compiled.push(name.clone()),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => skip(&mut report, name, error),
            }
        }

        info!(
            rules = rules.len(),
            compiled = report.compiled.len(),
            axioms = report.axioms.len(),
            skipped = report.skipped.len(),
            filters = ctx.count(OperatorKind::Filter),
            joins = ctx.count(OperatorKind::Join),
            "compiled rule set"
        );

        Ok(CompiledNetwork {
            operators: ctx,
            source: options.source.clone(),
            axiom_source: options.axiom_source.clone(),
            conflict_set: options.conflict_set.clone(),
            report,
        })
    }

    fn compile_rule(
        &self,
        ctx: &mut CompileContext,
        name: &str,
        rule: &Rule,
        report: &mut CompileReport,
    ) -> TopologyResult<()> {
        let canonical = self.canonicalizer.canonicalize_rule(rule);

        if let Some(nested) = canonical.body.iter().find(|e| matches!(e, ClauseEntry::Rule(_))) {
            return Err(TopologyError::unsupported_clause(nested)
                .with_context("rule", name)
                .with_hint("Nested rules may only appear in a rule head"));
        }
        if canonical.body_patterns().next().is_none() {
            return Err(TopologyError::empty_prior(name));
        }

        for functor in canonical.body.iter().chain(&canonical.head).filter_map(ClauseEntry::as_functor) {
            if self.options.unsupported_builtins.contains(&functor.name) {
                warn!(rule = name, builtin = %functor.name, "builtin is not supported in a topology");
                report.warnings.push(CompileWarning::UnsupportedBuiltin {
                    rule: name.to_string(),
                    builtin: functor.name.clone(),
                });
            }
        }

        let mut occurrences = Occurrences::default();
        let filters = self.build_filters(ctx, &canonical, &mut occurrences)?;

        let stage = JoinStage {
            canonicalizer: &self.canonicalizer,
            window: self.options.window,
        };
        let mut cross_joins = Vec::new();
        let prior = stage.reduce(ctx, name, filters, &mut occurrences, &mut cross_joins)?;
        for CrossJoin { left, right } in cross_joins {
            report.warnings.push(CompileWarning::CrossJoin {
                rule: name.to_string(),
                left,
                right,
            });
        }

        let terminal = TerminalOp {
            name: ctx.unique_name(&format!("{}_terminal", name)),
            rule: name.to_string(),
            prior: prior.name,
            vars: prior.vars,
            guards: canonical.body_functors().cloned().collect(),
            head: canonical.head.clone(),
        };
        debug!(terminal = %terminal.name, prior = %terminal.prior, "attached terminal");
        ctx.register(Operator::Terminal(terminal))
    }

    /// One worklist entry per distinct body pattern
    fn build_filters(
        &self,
        ctx: &mut CompileContext,
        rule: &Rule,
        occurrences: &mut Occurrences,
    ) -> TopologyResult<Vec<Partial>> {
        let mut worklist: Vec<Partial> = Vec::new();

        for pattern in rule.body_patterns() {
            let clause = ClauseEntry::Triple(pattern.clone());
            if worklist.iter().any(|p| p.clauses.first() == Some(&clause)) {
                continue;
            }

            let canon = self.canonicalizer.canonicalize(std::slice::from_ref(&clause));
            let name = occurrences.name_for(&canon.key);

            if ctx.lookup(&name, OperatorKind::Filter, canon.order.len())?.is_some() {
                debug!(filter = %name, "reusing filter");
            } else {
                let canonical_pattern = match canon.entries.first() {
                    Some(ClauseEntry::Triple(t)) => t.clone(),
                    _ => {
                        return Err(TopologyError::internal(format!(
                            "Canonical form of {} is not a triple pattern",
                            clause
                        )))
                    }
                };
                debug!(filter = %name, "created filter");
                ctx.register(Operator::Filter(FilterOp {
                    name: name.clone(),
                    pattern: canonical_pattern,
                    vars: canon.vars(),
                }))?;
            }

            worklist.push(Partial {
                name,
                vars: canon.order,
                clauses: vec![clause],
            });
        }

        Ok(worklist)
    }
}

fn axiom_heads(name: &str, rule: &Rule) -> TopologyResult<Vec<TriplePattern>> {
    rule.head
        .iter()
        .map(|entry| match entry {
            ClauseEntry::Triple(t) => Ok(t.clone()),
            other => Err(TopologyError::unsupported_clause(other)
                .with_context("rule", name)
                .with_hint("Axiom heads may only contain triple patterns")),
        })
        .collect()
}

fn skip(report: &mut CompileReport, rule: &str, error: TopologyError) {
    warn!(rule = rule, error = %error, "skipping rule");
    report.skipped.push(SkippedRule {
        rule: rule.to_string(),
        error,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::parser::parse_rules;
    use crate::term::{Node, Variable};

    fn compile(text: &str) -> CompiledNetwork {
        TopologyCompiler::default().compile(&parse_rules(text).unwrap()).unwrap()
    }

    fn var(name: &str) -> Variable {
        Variable::new(name.into())
    }

    #[test]
    fn test_transitive_closure() {
        let network = compile("[trans: (?a ?p ?b) (?b ?p ?c) -> (?a ?p ?c)]");

        assert_eq!(network.filters().count(), 2);
        assert_eq!(network.joins().count(), 1);
        assert_eq!(network.terminals().count(), 1);

        let join = network.joins().next().unwrap();
        // left is (?a ?p ?b), right is (?b ?p ?c): ?b sits at 2 and 0
        assert_eq!(join.match_left, vec![None, Some(1), Some(0)]);
        assert_eq!(join.match_right, vec![Some(2), Some(1), None]);
        assert_eq!(join.left_key(), vec![1, 2]);
        assert_eq!(join.right_key(), vec![1, 0]);
        assert_eq!(join.template_left, vec![Some(0), Some(1), Some(2), None]);
        assert_eq!(join.template_right, vec![None, Some(1), Some(0), Some(2)]);
        assert_ne!(join.left, join.right);

        let terminal = network.terminal_for("trans").unwrap();
        assert_eq!(terminal.name, "trans_terminal");
        assert_eq!(terminal.prior, join.name);
        assert!(network.report().is_clean());
    }

    #[test]
    fn test_shared_filter_across_rules() {
        let network = compile(
            "[r1: (?x a ?y) -> (?y b ?x)]
             [r2: (?p a ?q) (?q c ?r) -> (?p d ?r)]",
        );

        // three body patterns, the `a` one shared
        assert_eq!(network.filters().count(), 2);
        let shared = "(?0 <a> ?1)";
        assert!(network.operator(shared).is_some());
        assert_eq!(network.terminal_for("r1").unwrap().prior, shared);
        assert_eq!(network.joins().next().unwrap().left, shared);
    }

    #[test]
    fn test_sharing_ignores_variable_names() {
        let first = compile("[r1: (?x <type> ?y) -> (?y <seen> ?x)]");
        let both = compile(
            "[r1: (?x <type> ?y) -> (?y <seen> ?x)]
             [r2: (?a <type> ?b) -> (?a <typed> <yes>)]",
        );
        assert_eq!(first.filters().count(), 1);
        assert_eq!(both.filters().count(), 1);
        assert_eq!(both.terminals().count(), 2);
    }

    #[test]
    fn test_join_count_for_connected_body() {
        let network = compile(
            "[chain: (?a <p> ?b) (?b <q> ?c) (?c <r> ?d) (?d <s> ?e) -> (?a <t> ?e)]",
        );
        assert_eq!(network.filters().count(), 4);
        assert_eq!(network.joins().count(), 3);
        assert!(network.joins().all(|j| !j.is_cross()));
    }

    #[test]
    fn test_join_count_for_repeated_shape() {
        let network = compile(
            "[chain: (?a <p> ?b) (?b <p> ?c) (?c <p> ?d) (?d <p> ?e) -> (?a <p> ?e)]",
        );
        assert_eq!(network.filters().count(), 4);
        assert_eq!(network.joins().count(), 3);
        assert!(network.joins().all(|j| j.left != j.right));
    }

    #[test]
    fn test_disconnected_body_terminates_with_cross_join() {
        let network = compile("[cross: (?a <p> ?b) (?c <q> ?d) -> (?a <r> ?d)]");
        assert_eq!(network.joins().count(), 1);
        assert!(network.joins().next().unwrap().is_cross());
        assert_eq!(network.terminals().count(), 1);
        assert!(matches!(
            network.report().warnings.as_slice(),
            [CompileWarning::CrossJoin { rule, .. }] if rule == "cross"
        ));
    }

    #[test]
    fn test_join_is_shared_between_rules() {
        let network = compile(
            "[r1: (?a <p> ?b) (?b <q> ?c) -> (?a <x> ?c)]
             [r2: (?m <q> ?n) (?l <p> ?m) -> (?n <y> ?l)]",
        );
        assert_eq!(network.joins().count(), 1);
        assert_eq!(network.terminals().count(), 2);
        let r1 = network.terminal_for("r1").unwrap();
        let r2 = network.terminal_for("r2").unwrap();
        assert_eq!(r1.prior, r2.prior);
    }

    #[test]
    fn test_exact_duplicate_clause_is_dropped() {
        let network = compile("[dup: (?a <p> ?b) (?a <p> ?b) -> (?b <q> ?a)]");
        assert_eq!(network.filters().count(), 1);
        assert_eq!(network.joins().count(), 0);
    }

    #[test]
    fn test_axioms_feed_the_axiom_source() {
        let network = compile(
            "[ax1: -> (<alice> <knows> <bob>) (<bob> <knows> <carol>)]
             [r: (?a <knows> ?b) -> (?b <knows> ?a)]",
        );
        assert_eq!(network.axioms().len(), 2);
        assert_eq!(network.report().axioms, vec!["ax1".to_string()]);
        assert_eq!(network.report().compiled, vec!["r".to_string()]);
        assert_eq!(network.operators().count(OperatorKind::AxiomSource), 1);
        assert_eq!(network.operators().count(OperatorKind::ConflictSet), 1);
    }

    #[test]
    fn test_guards_and_unsupported_builtins() {
        let network = compile("[g: (?a <p> ?b) notEqual(?a ?b) -> (?b <p> ?a) drop(0)]");
        let terminal = network.terminal_for("g").unwrap();
        assert_eq!(terminal.guards.len(), 1);
        assert_eq!(terminal.guards[0].name, "notEqual");
        assert!(network.report().warnings.iter().any(|w| matches!(
            w,
            CompileWarning::UnsupportedBuiltin { builtin, .. } if builtin == "drop"
        )));
    }

    #[test]
    fn test_functor_only_body_is_skipped() {
        let network = compile(
            "[bad: now(?t) -> (?t <is> <now>)]
             [good: (?a <p> ?b) -> (?b <p> ?a)]",
        );
        assert_eq!(network.report().compiled, vec!["good".to_string()]);
        assert_eq!(network.report().skipped.len(), 1);
        assert_eq!(network.report().skipped[0].error.code, ErrorCode::EmptyPrior);
    }

    #[test]
    fn test_nested_rule_in_body_is_unsupported() {
        let network = compile(
            "[meta: [ (?x <p> ?y) -> (?y <p> ?x) ] (?a <q> ?b) -> (?a <r> ?b)]
             [ok: (?a <q> ?b) -> (?b <q> ?a)]",
        );
        let skipped = &network.report().skipped;
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].rule, "meta");
        assert_eq!(skipped[0].error.code, ErrorCode::UnsupportedClause);
        assert_eq!(network.filters().count(), 1);
    }

    #[test]
    fn test_nested_rule_in_head_compiles() {
        let network = compile("[meta: (?p <a> <Sym>) -> [ (?x ?p ?y) -> (?y ?p ?x) ] ]");
        assert_eq!(network.terminals().count(), 1);
        assert!(matches!(
            network.terminal_for("meta").unwrap().head[0],
            ClauseEntry::Rule(_)
        ));
    }

    #[test]
    fn test_unnamed_rules_and_terminal_names_are_unique() {
        let network = compile(
            "[(?a <p> ?b) -> (?b <p> ?a)]
             [x: (?a <q> ?b) -> (?b <q> ?a)]
             [x: (?a <r> ?b) -> (?b <r> ?a)]",
        );
        let names: Vec<&str> = network.terminals().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["rule_1_terminal", "x_terminal", "x_terminal_2"]);
    }

    #[test]
    fn test_terminal_vars_name_prior_positions() {
        let network = compile("[r: (?s <p> ?o) -> (?o <q> ?s)]");
        let terminal = network.terminal_for("r").unwrap();
        assert_eq!(terminal.vars, vec![var("0"), var("1")]);
        assert_eq!(terminal.head[0].to_string(), "(?1 <q> ?0)");
    }

    #[test]
    fn test_determinism() {
        let text = "[r1: (?x a ?y) -> (?y b ?x)]
                    [r2: (?p a ?q) (?q c ?r) -> (?p d ?r)]
                    [r3: (?a ?p ?b) (?b ?p ?c) -> (?a ?p ?c)]";
        let first = compile(text);
        let second = compile(text);
        let names = |n: &CompiledNetwork| -> Vec<String> {
            n.operators().iter().map(|op| op.name().to_string()).collect()
        };
        assert_eq!(names(&first), names(&second));
        assert_eq!(first.report(), second.report());
    }

    #[test]
    fn test_independent_compiles_do_not_share_state() {
        let compiler = TopologyCompiler::default();
        let rules = parse_rules("[r: (?a <p> ?b) -> (?b <p> ?a)]").unwrap();
        let first = compiler.compile(&rules).unwrap();
        let second = compiler.compile(&rules).unwrap();
        assert_eq!(first.operators().len(), second.operators().len());
        assert_eq!(first.terminal_for("r").unwrap().name, "r_terminal");
        assert_eq!(second.terminal_for("r").unwrap().name, "r_terminal");
    }

    #[test]
    fn test_window_comes_from_options() {
        let mut options = CompileOptions::default();
        options.window = JoinWindow { capacity: 10, range_secs: 60 };
        let rules = parse_rules("[r: (?a <p> ?b) (?b <q> ?c) -> (?a <r> ?c)]").unwrap();
        let network = TopologyCompiler::new(options).compile(&rules).unwrap();
        assert_eq!(network.joins().next().unwrap().window.capacity, 10);
    }

    #[test]
    fn test_clashing_sources_are_rejected() {
        let options = CompileOptions::default().with_sources("facts", "facts");
        let err = TopologyCompiler::new(options).compile(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut options = CompileOptions::default();
        options.conflict_set = "axioms".into();
        let err = TopologyCompiler::new(options).compile(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_empty_rule_set_yields_bare_network() {
        let network = compile("");
        assert_eq!(network.operators().len(), 2);
        assert!(network.axioms().is_empty());
        assert!(network.report().compiled.is_empty());
    }

    #[test]
    fn test_rules_built_in_code_compile() {
        let body = vec![ClauseEntry::triple(Node::var("a"), Node::uri("p"), Node::var("b"))];
        let head = vec![ClauseEntry::triple(Node::var("b"), Node::uri("q"), Node::blank("b.1"))];
        let rules = vec![
            Rule::named("my rule", body.clone(), head.clone()),
            Rule::named("other", body, head),
        ];
        let network = TopologyCompiler::default().compile(&rules).unwrap();

        assert!(network.report().skipped.is_empty());
        assert_eq!(network.report().compiled, vec!["my rule", "other"]);
        assert_eq!(network.filters().count(), 1);
        let terminal = network.terminal_for("my rule").unwrap();
        assert_eq!(terminal.name, "my rule_terminal");
    }

    #[test]
    fn test_terminal_never_takes_the_source_name() {
        let options = CompileOptions::default().with_sources("r_terminal", "axioms");
        let rules = parse_rules("[r: (?a <p> ?b) -> (?b <q> ?a)]").unwrap();
        let network = TopologyCompiler::new(options).compile(&rules).unwrap();

        assert_eq!(network.terminal_for("r").unwrap().name, "r_terminal_2");
        assert!(network.operators().get("r_terminal").is_none());
    }
}
