//! RDF/XML reading and writing
//!
//! - [`xml`]: the element tree both directions work on
//! - [`RdfXmlParser`]: element tree → triples
//! - [`RdfXmlSerializer`]: triples → element tree

pub mod rdfxml_parser;
pub mod rdfxml_serializer;
pub mod xml;

pub use rdfxml_parser::{resolve_uri, RdfXmlParser};
pub use rdfxml_serializer::{RdfXmlSerializer, SerializerConfig};
pub use xml::{XmlAttribute, XmlElement, XmlError, XmlNode, XmlResult};

use thiserror::Error;

/// Parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A predicate or type URI that has no XML qualified name
    #[error("Cannot split URI into namespace and local name: {0}")]
    UnrepresentableUri(String),
}

pub type SerializeResult<T> = Result<T, SerializeError>;
