//! Operator registry
//!
//! One [`CompileContext`] exists per compile call. It maps operator names to
//! operators in insertion order, so iteration (and therefore wiring) is
//! deterministic. Nothing is ever removed. Names owned by the engine (the
//! raw-fact source) are reserved so no operator is ever given one.

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::error::{ErrorCode, TopologyError, TopologyResult};
use crate::topology_ensure;

use super::operator::{Operator, OperatorKind};

/// Name → operator arena for one compilation
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    operators: IndexMap<String, Operator>,
    reserved: IndexSet<String>,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `name` out of the registry
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    fn is_taken(&self, name: &str) -> bool {
        self.operators.contains_key(name) || self.reserved.contains(name)
    }

    pub fn get(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Look up a shared operator, checking that it has the shape the caller
    /// is about to rely on
    pub fn lookup(
        &self,
        key: &str,
        kind: OperatorKind,
        arity: usize,
    ) -> TopologyResult<Option<&Operator>> {
        let Some(existing) = self.operators.get(key) else {
            return Ok(None);
        };
        if existing.kind() != kind {
            return Err(TopologyError::registry_invariant(
                key,
                format!("Key is registered as a {} but a {} was expected", existing.kind(), kind),
            ));
        }
        if existing.vars().len() != arity {
            return Err(TopologyError::registry_invariant(
                key,
                format!(
                    "Operator outputs {} variables but {} were expected",
                    existing.vars().len(),
                    arity
                ),
            ));
        }
        Ok(Some(existing))
    }

    /// Add an operator under its own name
    pub fn register(&mut self, operator: Operator) -> TopologyResult<()> {
        let name = operator.name().to_string();
        topology_ensure!(
            !self.operators.contains_key(&name),
            ErrorCode::RegistryInvariantViolation,
            "Operator {} registered twice",
            name
        );
        topology_ensure!(
            !self.reserved.contains(&name),
            ErrorCode::RegistryInvariantViolation,
            "Operator {} takes a reserved name",
            name
        );
        trace!(name = %name, kind = %operator.kind(), "registered operator");
        self.operators.insert(name, operator);
        Ok(())
    }

    /// `base` if free, otherwise `base_2`, `base_3`, ...
    pub fn unique_name(&self, base: &str) -> String {
        if !self.is_taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.is_taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values()
    }

    pub fn of_kind(&self, kind: OperatorKind) -> impl Iterator<Item = &Operator> {
        self.operators.values().filter(move |op| op.kind() == kind)
    }

    pub fn count(&self, kind: OperatorKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::operator::{ConflictSetOp, FilterOp};
    use crate::rule::TriplePattern;
    use crate::term::{Node, Variable};

    fn filter(name: &str, arity: usize) -> Operator {
        Operator::Filter(FilterOp {
            name: name.into(),
            pattern: TriplePattern::new(Node::var("0"), Node::uri("p"), Node::var("1")),
            vars: (0..arity).map(|i| Variable::new(i.to_string())).collect(),
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut ctx = CompileContext::new();
        ctx.register(filter("f", 2)).unwrap();
        assert!(ctx.lookup("f", OperatorKind::Filter, 2).unwrap().is_some());
        assert!(ctx.lookup("g", OperatorKind::Filter, 2).unwrap().is_none());
        assert_eq!(ctx.count(OperatorKind::Filter), 1);
    }

    #[test]
    fn test_kind_mismatch_is_invariant_violation() {
        let mut ctx = CompileContext::new();
        ctx.register(filter("f", 2)).unwrap();
        let err = ctx.lookup("f", OperatorKind::Join, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::RegistryInvariantViolation);
        assert_eq!(err.field("key"), Some("f"));
    }

    #[test]
    fn test_arity_mismatch_is_invariant_violation() {
        let mut ctx = CompileContext::new();
        ctx.register(filter("f", 2)).unwrap();
        let err = ctx.lookup("f", OperatorKind::Filter, 3).unwrap_err();
        assert_eq!(err.code, ErrorCode::RegistryInvariantViolation);
    }

    #[test]
    fn test_double_registration_fails() {
        let mut ctx = CompileContext::new();
        ctx.register(filter("f", 2)).unwrap();
        let err = ctx.register(filter("f", 2)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unique_name() {
        let mut ctx = CompileContext::new();
        assert_eq!(ctx.unique_name("r_terminal"), "r_terminal");
        ctx.register(Operator::ConflictSet(ConflictSetOp { name: "r_terminal".into() }))
            .unwrap();
        assert_eq!(ctx.unique_name("r_terminal"), "r_terminal_2");
    }

    #[test]
    fn test_reserved_names_are_avoided() {
        let mut ctx = CompileContext::new();
        ctx.reserve("r_terminal");
        assert_eq!(ctx.unique_name("r_terminal"), "r_terminal_2");
        assert!(!ctx.contains("r_terminal"));

        let err = ctx
            .register(Operator::ConflictSet(ConflictSetOp { name: "r_terminal".into() }))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RegistryInvariantViolation);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut ctx = CompileContext::new();
        for name in ["c", "a", "b"] {
            ctx.register(filter(name, 2)).unwrap();
        }
        let names: Vec<&str> = ctx.iter().map(Operator::name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
