//! RDF graph model with RDF/XML support
//!
//! This module provides:
//! - node values (URI, blank node, literal) and triples
//! - an in-memory graph indexed under every wildcard pattern
//! - conjunctive triple-pattern matching
//! - an RDF/XML parser and serializer working on an XML element tree
//!
//! # Example
//!
//! ```rust
//! use rdfxml_graph::rdf::{Graph, Literal, RdfXmlParser, RdfXmlSerializer, Uri};
//!
//! let mut graph = Graph::new();
//! graph.add_triple(
//!     "http://example.org/alice",
//!     "http://xmlns.com/foaf/0.1/name",
//!     Literal::with_lang("Alice", "en"),
//! );
//! graph.add_triple(
//!     "http://example.org/alice",
//!     "http://xmlns.com/foaf/0.1/knows",
//!     Uri::new("http://example.org/bob"),
//! );
//!
//! let xml = RdfXmlSerializer::new().serialize_to_string(&graph).unwrap();
//! let parsed = RdfXmlParser::new().parse_str(&xml).unwrap();
//! assert_eq!(parsed, graph);
//!
//! assert_eq!(
//!     parsed.find_label("http://example.org/alice"),
//!     Some(Literal::with_lang("Alice", "en"))
//! );
//! ```

mod namespace;
mod pattern;
mod serialization;
mod store;
mod types;
pub mod vocab;

pub use types::{
    is_bnode_label, BNode, BNodeAllocator, Literal, NodeValue, NodeValueError, NodeValueResult,
    Triple, Uri, BNODE_PREFIX,
};

pub use store::{Graph, RdfGraph, TripleSink, TripleSource};

pub use pattern::{Bindings, PatternTerm, TriplePattern};

pub use namespace::{Namespace, NamespaceManager, PrefixError, PrefixResult, QName};

pub use serialization::{
    resolve_uri, ParseError, ParseResult, RdfXmlParser, RdfXmlSerializer, SerializeError,
    SerializeResult, SerializerConfig, XmlAttribute, XmlElement, XmlError, XmlNode, XmlResult,
};
