//! Conjunctive triple-pattern matching over a [`Graph`]
//!
//! Patterns are joined left to right with a nested-loop backtracking join.
//! Variables bound by an earlier pattern are substituted into later lookups.

use super::store::Graph;
use super::types::{BNode, Literal, NodeValue, Uri};
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// Variable name → bound value
pub type Bindings = BTreeMap<String, NodeValue>;

/// One position of a triple pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternTerm<T> {
    /// Matches anything, binds nothing
    Any,
    /// Named variable (without the leading `?`)
    Variable(String),
    /// Fixed value
    Bound(T),
}

impl<T> PatternTerm<T> {
    /// Create a variable term
    pub fn var(name: impl Into<String>) -> Self {
        PatternTerm::Variable(name.into())
    }

    fn variable(&self) -> Option<&str> {
        match self {
            PatternTerm::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl<T> Default for PatternTerm<T> {
    fn default() -> Self {
        PatternTerm::Any
    }
}

/// `?name` is a variable, anything else a fixed string
impl From<&str> for PatternTerm<String> {
    fn from(token: &str) -> Self {
        match token.strip_prefix('?') {
            Some(name) => PatternTerm::Variable(name.to_string()),
            None => PatternTerm::Bound(token.to_string()),
        }
    }
}

impl From<String> for PatternTerm<String> {
    fn from(token: String) -> Self {
        PatternTerm::from(token.as_str())
    }
}

impl<T> From<Option<T>> for PatternTerm<String>
where
    T: Into<PatternTerm<String>>,
{
    fn from(token: Option<T>) -> Self {
        token.map_or(PatternTerm::Any, Into::into)
    }
}

/// `?name` is a variable, anything else a fixed URI
impl From<&str> for PatternTerm<NodeValue> {
    fn from(token: &str) -> Self {
        match token.strip_prefix('?') {
            Some(name) => PatternTerm::Variable(name.to_string()),
            None => PatternTerm::Bound(Uri::new(token).into()),
        }
    }
}

impl From<NodeValue> for PatternTerm<NodeValue> {
    fn from(node: NodeValue) -> Self {
        PatternTerm::Bound(node)
    }
}

impl From<Uri> for PatternTerm<NodeValue> {
    fn from(uri: Uri) -> Self {
        PatternTerm::Bound(uri.into())
    }
}

impl From<BNode> for PatternTerm<NodeValue> {
    fn from(bnode: BNode) -> Self {
        PatternTerm::Bound(bnode.into())
    }
}

impl From<Literal> for PatternTerm<NodeValue> {
    fn from(literal: Literal) -> Self {
        PatternTerm::Bound(literal.into())
    }
}

/// Triple pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriplePattern {
    /// Subject position
    pub subject: PatternTerm<String>,
    /// Predicate position
    pub predicate: PatternTerm<String>,
    /// Object position
    pub object: PatternTerm<NodeValue>,
}

impl TriplePattern {
    /// Create a new triple pattern
    ///
    /// ```
    /// use rdfxml_graph::rdf::{PatternTerm, TriplePattern};
    ///
    /// let pattern = TriplePattern::new("?s", PatternTerm::Any, "?o");
    /// assert_eq!(pattern.subject, PatternTerm::var("s"));
    /// ```
    pub fn new(
        subject: impl Into<PatternTerm<String>>,
        predicate: impl Into<PatternTerm<String>>,
        object: impl Into<PatternTerm<NodeValue>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Subject and predicate substitution uses the bound value's raw string
fn substitute_str(term: &PatternTerm<String>, bindings: &Bindings) -> Option<String> {
    match term {
        PatternTerm::Any => None,
        PatternTerm::Variable(name) => bindings.get(name).map(|b| b.value().to_string()),
        PatternTerm::Bound(value) => Some(value.clone()),
    }
}

fn substitute_node(term: &PatternTerm<NodeValue>, bindings: &Bindings) -> Option<NodeValue> {
    match term {
        PatternTerm::Any => None,
        PatternTerm::Variable(name) => bindings.get(name).cloned(),
        PatternTerm::Bound(value) => Some(value.clone()),
    }
}

impl Graph {
    /// Find all variable bindings satisfying every pattern.
    ///
    /// Subject and predicate variables bind as [`Uri`]; object variables bind
    /// to the object as stored. A variable repeated within one pattern takes
    /// the value of its last position. The result holds no duplicate
    /// binding maps.
    pub fn match_triple_patterns(&self, patterns: &[TriplePattern]) -> Vec<Bindings> {
        let mut results = IndexSet::new();
        self.join(patterns, Bindings::new(), &mut results);
        results.into_iter().collect()
    }

    fn join(&self, patterns: &[TriplePattern], bindings: Bindings, results: &mut IndexSet<Bindings>) {
        let Some((pattern, rest)) = patterns.split_first() else {
            results.insert(bindings);
            return;
        };

        let subject = substitute_str(&pattern.subject, &bindings);
        let predicate = substitute_str(&pattern.predicate, &bindings);
        let object = substitute_node(&pattern.object, &bindings);

        for triple in self.triples(subject.as_deref(), predicate.as_deref(), object.as_ref()) {
            let mut next = bindings.clone();
            if let Some(name) = pattern.subject.variable() {
                next.insert(name.to_string(), Uri::new(triple.subject).into());
            }
            if let Some(name) = pattern.predicate.variable() {
                next.insert(name.to_string(), Uri::new(triple.predicate).into());
            }
            if let Some(name) = pattern.object.variable() {
                next.insert(name.to_string(), triple.object);
            }
            self.join(rest, next, results);
        }
    }
}
