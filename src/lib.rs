//! RDF/XML Graph
//!
//! An in-memory RDF triple graph with a pragmatic RDF/XML parser and
//! serializer.
//!
//! # Features
//!
//! - Node values: URIs, blank nodes and language-tagged literals
//! - Graph indexed under all eight wildcard patterns of a triple, so every
//!   `(s?, p?, o?)` lookup is a single hash probe
//! - Label lookup with language preference (Dutch, then English, then untagged)
//! - Conjunctive triple-pattern matching with variable bindings
//! - RDF/XML parsing: node and property elements, `xml:base`, `xml:lang`,
//!   `rdf:nodeID`, `rdf:parseType="Resource"`, reification through `rdf:ID`
//! - RDF/XML serialization with stable subject ordering, type promotion,
//!   blank-node nesting and reification anchors
//!
//! Not supported: `rdf:datatype`, `rdf:li`, `rdf:parseType="Literal"` and
//! `"Collection"`, named graphs, persistence.
//!
//! ## Example Usage
//!
//! ```rust
//! use rdfxml_graph::{Graph, NodeValue, RdfXmlParser, Uri};
//!
//! let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
//!                       xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
//!                       xml:base="http://example.org/">
//!     <rdf:Description rdf:about="track">
//!         <rdfs:label xml:lang="en">Track</rdfs:label>
//!         <rdfs:seeAlso rdf:resource="album"/>
//!     </rdf:Description>
//! </rdf:RDF>"#;
//!
//! let graph: Graph = RdfXmlParser::new().parse_str(xml).unwrap();
//! assert_eq!(graph.len(), 2);
//! assert_eq!(
//!     graph.objects_by_curie("http://example.org/track", "rdfs:seeAlso"),
//!     vec![NodeValue::from(Uri::new("http://example.org/album"))]
//! );
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod rdf;

// Re-export main types for convenience
pub use rdf::{
    BNode, BNodeAllocator, Bindings, Graph, Literal, NamespaceManager, NodeValue, ParseError,
    PatternTerm, RdfXmlParser, RdfXmlSerializer, SerializeError, SerializerConfig, Triple,
    TriplePattern, TripleSink, TripleSource, Uri, XmlElement,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
