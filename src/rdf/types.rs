//! RDF node values and triples
//!
//! Only the object position of a triple carries a typed node value; subjects
//! and predicates are plain strings. Blank-node subjects are recognized by
//! their `_:` label prefix.

use oxiri::Iri;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use thiserror::Error;

/// Node value errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeValueError {
    /// Input that is not a string
    #[error("Expected a stringlike object, got: {0}")]
    NotStringLike(String),

    /// Input that is already a typed node value
    #[error("Refusing to re-wrap an existing node value: {0}")]
    AlreadyWrapped(String),

    /// Unknown term type in a SPARQL JSON binding
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Required field missing from a SPARQL JSON binding
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

pub type NodeValueResult<T> = Result<T, NodeValueError>;

/// Prefix that marks a blank-node label
pub const BNODE_PREFIX: &str = "_:";

/// Check whether a subject string denotes a blank node
pub fn is_bnode_label(value: &str) -> bool {
    value.starts_with(BNODE_PREFIX)
}

/// Extract the string payload from a dynamic value.
///
/// Strings pass; a term object (`{"type": ..., "value": ...}`) is an already
/// typed node; everything else is not string-like.
fn string_like(value: &Value) -> NodeValueResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Object(map) if map.contains_key("type") && map.contains_key("value") => {
            Err(NodeValueError::AlreadyWrapped(value.to_string()))
        }
        other => Err(NodeValueError::NotStringLike(other.to_string())),
    }
}

/// URI reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri {
    value: String,
}

impl Uri {
    /// Create a new URI reference
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Create a URI from a dynamic value, refusing non-strings and typed terms
    pub fn from_json(value: &Value) -> NodeValueResult<Self> {
        string_like(value).map(Self::new)
    }

    /// Get the URI string
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Check a string against the RFC 3987 IRI grammar
    pub fn matches_iri_syntax(value: &str) -> bool {
        Iri::parse(value).is_ok()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Blank node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BNode {
    value: String,
}

impl BNode {
    /// Create a blank node with the given label
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Create a blank node from a dynamic value, refusing non-strings and typed terms
    pub fn from_json(value: &Value) -> NodeValueResult<Self> {
        string_like(value).map(Self::new)
    }

    /// Get the blank node label
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for BNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Allocator for fresh `_:id<N>` blank-node labels.
///
/// Parsers draw from an allocator instead of a process-wide counter. Share
/// one through an `Arc` when several documents go into the same graph.
#[derive(Debug, Default)]
pub struct BNodeAllocator {
    next: AtomicU64,
}

impl BNodeAllocator {
    /// Create an allocator starting at `_:id0`
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an allocator whose first label is `_:id<first>`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next fresh blank node
    pub fn next_bnode(&self) -> BNode {
        let id = self.next.fetch_add(1, AtomicOrdering::Relaxed);
        BNode::new(format!("{}id{}", BNODE_PREFIX, id))
    }

    /// Number the next blank node will get
    pub fn peek(&self) -> u64 {
        self.next.load(AtomicOrdering::Relaxed)
    }

    /// Restart numbering at `_:id0`
    pub fn reset(&self) {
        self.next.store(0, AtomicOrdering::Relaxed);
    }
}

/// Literal with optional language tag
///
/// Equality compares value and language; the hash covers the value only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    value: String,
    lang: Option<String>,
}

impl Literal {
    /// Create a literal without language
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
        }
    }

    /// Create a language-tagged literal
    pub fn with_lang(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: Some(lang.into()),
        }
    }

    /// Create a literal with an optional language
    pub fn with_optional_lang(value: impl Into<String>, lang: Option<String>) -> Self {
        Self {
            value: value.into(),
            lang,
        }
    }

    /// Create a literal from a dynamic value, refusing non-strings and typed terms
    pub fn from_json(value: &Value, lang: Option<&str>) -> NodeValueResult<Self> {
        string_like(value).map(|v| Self::with_optional_lang(v, lang.map(str::to_string)))
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the language tag if present
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }
}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| self.lang.cmp(&other.lang))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lang {
            Some(lang) => write!(f, "\"{}\"@{}", self.value, lang),
            None => f.write_str(&self.value),
        }
    }
}

/// Any value that can sit in the object position of a triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeValue {
    /// URI reference
    Uri(Uri),
    /// Blank node
    BNode(BNode),
    /// Literal value
    Literal(Literal),
}

impl NodeValue {
    /// Check if this is a URI
    pub fn is_uri(&self) -> bool {
        matches!(self, NodeValue::Uri(_))
    }

    /// Check if this is a blank node
    pub fn is_bnode(&self) -> bool {
        matches!(self, NodeValue::BNode(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, NodeValue::Literal(_))
    }

    /// URIs and blank nodes identify resources; literals do not
    pub fn is_identifier(&self) -> bool {
        !self.is_literal()
    }

    /// The bare string value, whatever the variant
    pub fn value(&self) -> &str {
        match self {
            NodeValue::Uri(u) => u.value(),
            NodeValue::BNode(b) => b.value(),
            NodeValue::Literal(l) => l.value(),
        }
    }

    /// Get the literal, if this is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            NodeValue::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Read a term in the SPARQL 1.1 JSON results shape
    pub fn from_sparql_json(term: &Value) -> NodeValueResult<Self> {
        let kind = term
            .get("type")
            .and_then(Value::as_str)
            .ok_or(NodeValueError::MissingField("type"))?;
        let value = term.get("value").ok_or(NodeValueError::MissingField("value"))?;
        match kind {
            "uri" => Uri::from_json(value).map(NodeValue::Uri),
            "bnode" => BNode::from_json(value).map(NodeValue::BNode),
            "literal" => {
                let lang = term.get("xml:lang").and_then(Value::as_str);
                Literal::from_json(value, lang).map(NodeValue::Literal)
            }
            other => Err(NodeValueError::UnknownNodeType(other.to_string())),
        }
    }

    /// Render as a SPARQL 1.1 JSON results term
    pub fn to_sparql_json(&self) -> Value {
        match self {
            NodeValue::Uri(u) => json!({"type": "uri", "value": u.value()}),
            NodeValue::BNode(b) => json!({"type": "bnode", "value": b.value()}),
            NodeValue::Literal(l) => match l.lang() {
                Some(lang) => json!({"type": "literal", "value": l.value(), "xml:lang": lang}),
                None => json!({"type": "literal", "value": l.value()}),
            },
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            NodeValue::Uri(_) => 0,
            NodeValue::BNode(_) => 1,
            NodeValue::Literal(_) => 2,
        }
    }
}

impl PartialOrd for NodeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Value string first, so mixed objects sort the way their text reads.
impl Ord for NodeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(other.value())
            .then_with(|| self.kind_rank().cmp(&other.kind_rank()))
            .then_with(|| match (self, other) {
                (NodeValue::Literal(a), NodeValue::Literal(b)) => a.lang.cmp(&b.lang),
                _ => Ordering::Equal,
            })
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Uri(u) => write!(f, "{}", u),
            NodeValue::BNode(b) => write!(f, "{}", b),
            NodeValue::Literal(l) => write!(f, "{}", l),
        }
    }
}

impl From<Uri> for NodeValue {
    fn from(uri: Uri) -> Self {
        NodeValue::Uri(uri)
    }
}

impl From<BNode> for NodeValue {
    fn from(bnode: BNode) -> Self {
        NodeValue::BNode(bnode)
    }
}

impl From<Literal> for NodeValue {
    fn from(lit: Literal) -> Self {
        NodeValue::Literal(lit)
    }
}

impl TryFrom<&Value> for NodeValue {
    type Error = NodeValueError;

    fn try_from(term: &Value) -> NodeValueResult<Self> {
        NodeValue::from_sparql_json(term)
    }
}

/// RDF triple (subject-predicate-object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    /// Subject (URI or `_:` blank-node label)
    pub subject: String,
    /// Predicate URI
    pub predicate: String,
    /// Object
    pub object: NodeValue,
}

impl Triple {
    /// Create a new triple
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<NodeValue>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}
