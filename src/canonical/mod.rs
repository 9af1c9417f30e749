//! Variable-name-independent canonical forms
//!
//! A clause list is canonicalized by ordering its entries and then numbering
//! variables in order of first appearance, so that
//!
//! ```text
//! (?b q ?c) (?a p ?b)      and      (?x p ?y) (?y q ?z)
//! ```
//!
//! both become `(?0 <p> ?1) (?1 <q> ?2)`. The resulting string is the
//! structural-equality key used wherever operators are shared.
//!
//! Entries are ordered by a variable-blind rendering (every variable written
//! as `?`). Entries that tie on that rendering are permuted and the ordering
//! giving the smallest canonical string wins; the number of permutations tried
//! is bounded by [`Canonicalizer::search_bound`], past which the stable sort
//! order is used as-is.

use indexmap::IndexMap;

use crate::rule::{ClauseEntry, Functor, Rule, TriplePattern};
use crate::term::{Node, Variable};

/// Default cap on the number of tie-break orderings tried per clause list
pub const DEFAULT_SEARCH_BOUND: usize = 720;

type VarIds = IndexMap<Variable, usize>;

/// A canonicalized clause list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// The canonical string, entries separated by single spaces
    pub key: String,
    /// Entries in canonical order with variables renamed `?0`, `?1`, ...
    pub entries: Vec<ClauseEntry>,
    /// The caller's variables, indexed by canonical id
    pub order: Vec<Variable>,
}

impl Canonical {
    /// The canonical variables `?0..?n` in id order
    pub fn vars(&self) -> Vec<Variable> {
        (0..self.order.len()).map(canonical_var).collect()
    }

    /// Canonical id of one of the caller's variables
    pub fn id_of(&self, var: &Variable) -> Option<usize> {
        self.order.iter().position(|v| v == var)
    }
}

/// The canonical variable for an id
pub fn canonical_var(id: usize) -> Variable {
    Variable::new(id.to_string())
}

/// Produces canonical strings for clause lists and rules
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    search_bound: usize,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Canonicalizer { search_bound: DEFAULT_SEARCH_BOUND }
    }
}

struct Rendered {
    key: String,
    entries: Vec<ClauseEntry>,
    ids: VarIds,
}

impl Canonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different tie-break search bound (at least one ordering is always tried)
    pub fn with_search_bound(search_bound: usize) -> Self {
        Canonicalizer { search_bound: search_bound.max(1) }
    }

    pub fn search_bound(&self) -> usize {
        self.search_bound
    }

    /// Canonicalize a clause list
    pub fn canonicalize(&self, entries: &[ClauseEntry]) -> Canonical {
        let rendered = self.render_list(entries, &VarIds::new());
        Canonical {
            key: rendered.key,
            entries: rendered.entries,
            order: rendered.ids.into_keys().collect(),
        }
    }

    /// Rename a rule's variables with one numbering shared by body and head
    pub fn canonicalize_rule(&self, rule: &Rule) -> Rule {
        let mut ids = VarIds::new();
        self.render_rule(rule, &mut ids).1
    }

    /// The canonical string of a whole rule
    pub fn rule_key(&self, rule: &Rule) -> String {
        let mut ids = VarIds::new();
        self.render_rule(rule, &mut ids).0
    }

    fn render_list(&self, entries: &[ClauseEntry], ids: &VarIds) -> Rendered {
        let blind: Vec<String> = entries.iter().map(blind_key).collect();
        let mut sorted: Vec<usize> = (0..entries.len()).collect();
        sorted.sort_by(|a, b| blind[*a].cmp(&blind[*b]));

        let mut best: Option<Rendered> = None;
        for order in self.candidate_orders(&sorted, &blind) {
            let mut candidate_ids = ids.clone();
            let mut parts = Vec::with_capacity(order.len());
            let mut renamed = Vec::with_capacity(order.len());
            for index in order {
                let (text, entry) = self.render_entry(&entries[index], &mut candidate_ids);
                parts.push(text);
                renamed.push(entry);
            }
            let key = parts.join(" ");
            if best.as_ref().map_or(true, |b| key < b.key) {
                best = Some(Rendered { key, entries: renamed, ids: candidate_ids });
            }
        }

        best.unwrap_or_else(|| Rendered {
            key: String::new(),
            entries: Vec::new(),
            ids: ids.clone(),
        })
    }

    /// Orderings to try: every permutation within each run of blind-equal
    /// entries, or just the sorted order when that would exceed the bound
    fn candidate_orders(&self, sorted: &[usize], blind: &[String]) -> Vec<Vec<usize>> {
        let groups: Vec<&[usize]> = sorted
            .chunk_by(|a, b| blind[*a] == blind[*b])
            .collect();

        let mut space: usize = 1;
        for group in &groups {
            space = match (1..=group.len()).try_fold(space, |acc, n| acc.checked_mul(n)) {
                Some(n) if n <= self.search_bound => n,
                _ => return vec![sorted.to_vec()],
            };
        }

        let mut orders = vec![Vec::with_capacity(sorted.len())];
        for group in groups {
            let perms = permutations(group);
            let mut next = Vec::with_capacity(orders.len() * perms.len());
            for prefix in &orders {
                for perm in &perms {
                    let mut order = prefix.clone();
                    order.extend_from_slice(perm);
                    next.push(order);
                }
            }
            orders = next;
        }
        orders
    }

    fn render_entry(&self, entry: &ClauseEntry, ids: &mut VarIds) -> (String, ClauseEntry) {
        match entry {
            ClauseEntry::Triple(t) => {
                let (s, subject) = render_node(&t.subject, ids);
                let (p, predicate) = render_node(&t.predicate, ids);
                let (o, object) = render_node(&t.object, ids);
                (
                    format!("({} {} {})", s, p, o),
                    ClauseEntry::Triple(TriplePattern::new(subject, predicate, object)),
                )
            }
            ClauseEntry::Functor(f) => {
                let mut parts = Vec::with_capacity(f.args.len());
                let mut args = Vec::with_capacity(f.args.len());
                for arg in &f.args {
                    let (text, node) = render_node(arg, ids);
                    parts.push(text);
                    args.push(node);
                }
                (
                    format!("{}({})", f.name, parts.join(" ")),
                    ClauseEntry::Functor(Functor::new(f.name.clone(), args)),
                )
            }
            ClauseEntry::Rule(r) => {
                let (text, rule) = self.render_rule(r, ids);
                (text, ClauseEntry::Rule(Box::new(rule)))
            }
        }
    }

    fn render_rule(&self, rule: &Rule, ids: &mut VarIds) -> (String, Rule) {
        let body = self.render_list(&rule.body, ids);
        let head = self.render_list(&rule.head, &body.ids);
        *ids = head.ids;

        let mut text = String::from("[ ");
        if let Some(name) = &rule.name {
            text.push_str(name);
            text.push_str(" : ");
        }
        if !body.key.is_empty() {
            text.push_str(&body.key);
            text.push(' ');
        }
        text.push_str("->");
        if !head.key.is_empty() {
            text.push(' ');
            text.push_str(&head.key);
        }
        text.push_str(" ]");

        let renamed = Rule {
            name: rule.name.clone(),
            body: body.entries,
            head: head.entries,
        };
        (text, renamed)
    }
}

fn render_node(node: &Node, ids: &mut VarIds) -> (String, Node) {
    match node {
        Node::Variable(v) => {
            let next = ids.len();
            let id = *ids.entry(v.clone()).or_insert(next);
            (format!("?{}", id), Node::Variable(canonical_var(id)))
        }
        other => (other.to_string(), other.clone()),
    }
}

/// Rendering with every variable written as `?`
fn blind_key(entry: &ClauseEntry) -> String {
    fn node(n: &Node) -> String {
        match n {
            Node::Variable(_) => "?".to_string(),
            other => other.to_string(),
        }
    }

    match entry {
        ClauseEntry::Triple(t) => {
            format!("({} {} {})", node(&t.subject), node(&t.predicate), node(&t.object))
        }
        ClauseEntry::Functor(f) => {
            let args: Vec<String> = f.args.iter().map(node).collect();
            format!("{}({})", f.name, args.join(" "))
        }
        ClauseEntry::Rule(r) => {
            let mut body: Vec<String> = r.body.iter().map(blind_key).collect();
            let mut head: Vec<String> = r.head.iter().map(blind_key).collect();
            body.sort();
            head.sort();
            format!(
                "[ {} : {} -> {} ]",
                r.name.as_deref().unwrap_or(""),
                body.join(" "),
                head.join(" ")
            )
        }
    }
}

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            out.push(tail);
        }
    }
    out
}

/// Canonicalize a clause list with the default search bound
pub fn canonicalize(entries: &[ClauseEntry]) -> Canonical {
    Canonicalizer::default().canonicalize(entries)
}

/// Canonicalize a rule with the default search bound
pub fn canonicalize_rule(rule: &Rule) -> Rule {
    Canonicalizer::default().canonicalize_rule(rule)
}
