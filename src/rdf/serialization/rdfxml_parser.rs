//! RDF/XML parser
//!
//! Recursive descent over an [`XmlElement`] tree. Supports node elements,
//! `rdf:about` / `rdf:ID` / `rdf:nodeID`, typed node elements, property
//! attributes, `rdf:resource`, `rdf:parseType="Resource"`, `xml:lang`,
//! `xml:base` and reification through `rdf:ID` on property elements.
//!
//! Input is not validated. Constructs outside this subset (`rdf:datatype`,
//! `rdf:li`, other parse types) produce unspecified but harmless triples.

use super::xml::XmlElement;
use super::ParseResult;
use crate::rdf::namespace::{NamespaceManager, QName};
use crate::rdf::store::{Graph, TripleSink};
use crate::rdf::types::{BNode, BNodeAllocator, Literal, NodeValue, Triple, Uri, BNODE_PREFIX};
use crate::rdf::vocab::{RDF_NS, RDF_OBJECT, RDF_PREDICATE, RDF_STATEMENT, RDF_SUBJECT, RDF_TYPE, XML_NS};
use oxiri::Iri;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// `rdf:` attributes with syntactic meaning; never emitted as property attributes
const RESERVED_RDF_ATTRIBUTES: [&str; 11] = [
    "RDF",
    "ID",
    "about",
    "bagID",
    "parseType",
    "resource",
    "nodeID",
    "datatype",
    "li",
    "aboutEach",
    "aboutEachPrefix",
];

/// Resolve a URI reference against a base.
///
/// An empty base leaves the reference untouched, as does a base or reference
/// that cannot be resolved.
pub fn resolve_uri(base: &str, reference: &str) -> String {
    if base.is_empty() {
        return reference.to_string();
    }
    let resolved = Iri::parse(base).and_then(|base| base.resolve(reference));
    match resolved {
        Ok(iri) => iri.into_inner(),
        Err(e) => {
            warn!(base, reference, error = %e, "cannot resolve reference against base");
            reference.to_string()
        }
    }
}

fn is_rdf(name: &QName, local: &str) -> bool {
    name.local == local && name.in_namespace(RDF_NS)
}

/// Attributes that become property triples
fn is_property_attribute(name: &QName) -> bool {
    if name.in_namespace(XML_NS) {
        return false;
    }
    !(name.in_namespace(RDF_NS) && RESERVED_RDF_ATTRIBUTES.contains(&name.local.as_str()))
}

/// RDF/XML parser
#[derive(Debug, Clone)]
pub struct RdfXmlParser {
    /// Source of fresh blank-node labels
    allocator: Arc<BNodeAllocator>,

    /// Namespace mapping handed to graphs created by [`parse`](Self::parse)
    namespaces: Arc<NamespaceManager>,
}

impl RdfXmlParser {
    /// Create a new parser with its own blank-node allocator
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(BNodeAllocator::new()))
    }

    /// Create a new parser drawing blank nodes from a shared allocator
    pub fn with_allocator(allocator: Arc<BNodeAllocator>) -> Self {
        Self {
            allocator,
            namespaces: NamespaceManager::shared(),
        }
    }

    /// Use another namespace mapping for the graphs this parser creates
    pub fn with_namespaces(mut self, namespaces: Arc<NamespaceManager>) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// The blank-node allocator
    pub fn allocator(&self) -> &Arc<BNodeAllocator> {
        &self.allocator
    }

    /// Parse XML text into a new graph
    pub fn parse_str(&self, input: &str) -> ParseResult<Graph> {
        let root = XmlElement::parse_str(input)?;
        Ok(self.parse(&root))
    }

    /// Parse an element tree into a new graph
    pub fn parse(&self, root: &XmlElement) -> Graph {
        let mut graph = Graph::with_namespaces(Arc::clone(&self.namespaces));
        self.parse_into(root, &mut graph);
        graph
    }

    /// Parse an element tree, sending every triple to `sink`
    pub fn parse_into<S: TripleSink + ?Sized>(&self, root: &XmlElement, sink: &mut S) {
        debug!(root = %root.name, "parsing RDF/XML");
        let mut run = ParseRun {
            allocator: &self.allocator,
            sink,
            emitted: 0,
        };

        let base = element_base(root, "");
        if is_rdf(&root.name, "RDF") {
            for child in root.elements() {
                run.node_element(child, &base);
            }
        } else {
            run.node_element(root, "");
        }
        debug!(triples = run.emitted, "finished parsing RDF/XML");
    }
}

impl Default for RdfXmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The base in effect inside `element`
fn element_base(element: &XmlElement, inherited: &str) -> String {
    match element.attribute(XML_NS, "base") {
        Some(base) => resolve_uri(inherited, base),
        None => inherited.to_string(),
    }
}

fn lang_of(element: &XmlElement) -> Option<String> {
    element.attribute(XML_NS, "lang").map(str::to_string)
}

/// State of a single parse
struct ParseRun<'p, S: ?Sized> {
    allocator: &'p BNodeAllocator,
    sink: &'p mut S,
    emitted: usize,
}

impl<S: TripleSink + ?Sized> ParseRun<'_, S> {
    fn emit(&mut self, subject: &str, predicate: &str, object: impl Into<NodeValue>) {
        let triple = Triple::new(subject, predicate, object);
        trace!(%triple, "emit");
        self.sink.add(triple);
        self.emitted += 1;
    }

    fn bnode(&self, node_id: Option<&str>) -> BNode {
        match node_id {
            Some(id) => {
                let starts_alpha = id.chars().next().is_some_and(char::is_alphabetic);
                if starts_alpha {
                    BNode::new(format!("{}{}", BNODE_PREFIX, id))
                } else {
                    BNode::new(format!("{}b{}", BNODE_PREFIX, id))
                }
            }
            None => self.allocator.next_bnode(),
        }
    }

    fn node_element(&mut self, e: &XmlElement, inherited_base: &str) -> NodeValue {
        let base = element_base(e, inherited_base);
        let subject: NodeValue = if let Some(about) = e.attribute(RDF_NS, "about") {
            Uri::new(resolve_uri(&base, about)).into()
        } else if let Some(id) = e.attribute(RDF_NS, "ID") {
            Uri::new(resolve_uri(&base, &format!("#{}", id))).into()
        } else {
            self.bnode(e.attribute(RDF_NS, "nodeID")).into()
        };
        let s = subject.value().to_string();

        if !is_rdf(&e.name, "Description") {
            self.emit(&s, RDF_TYPE, Uri::new(e.name.to_uri()));
        }
        if let Some(rdf_type) = e.attribute(RDF_NS, "type") {
            self.emit(&s, RDF_TYPE, Uri::new(rdf_type));
        }
        self.property_attributes(&s, e);

        for child in e.elements() {
            self.property_element(&s, child, &base);
        }
        subject
    }

    /// Literal triples for the element's property attributes; `rdf:type` is skipped
    fn property_attributes(&mut self, subject: &str, e: &XmlElement) {
        let lang = lang_of(e);
        for attr in e.attributes.iter().filter(|a| is_property_attribute(&a.name)) {
            if is_rdf(&attr.name, "type") {
                continue;
            }
            let literal = Literal::with_optional_lang(attr.value.as_str(), lang.clone());
            self.emit(subject, &attr.name.to_uri(), literal);
        }
    }

    fn property_element(&mut self, subject: &str, e: &XmlElement, inherited_base: &str) {
        let base = element_base(e, inherited_base);
        let predicate = e.name.to_uri();
        let children: Vec<&XmlElement> = e.elements().collect();
        let text = e.text();
        let parse_type = e.attribute(RDF_NS, "parseType");

        let object: NodeValue = match (children.as_slice(), &text) {
            ([], Some(text)) => Literal::with_optional_lang(text.as_str(), lang_of(e)).into(),
            ([child], _) if parse_type.is_none() => self.node_element(child, &base),
            _ if parse_type == Some("Resource") => {
                let node = self.allocator.next_bnode();
                self.emit(subject, &predicate, node.clone());
                for child in &children {
                    self.property_element(node.value(), child, &base);
                }
                self.reify(subject, &predicate, &node.into(), e, &base);
                return;
            }
            (_, None) => self.empty_property_object(e, &base),
            _ => return,
        };

        self.emit(subject, &predicate, object.clone());
        self.reify(subject, &predicate, &object, e, &base);
    }

    /// Object of a property element without content
    fn empty_property_object(&mut self, e: &XmlElement, base: &str) -> NodeValue {
        let only_id = e
            .attributes
            .iter()
            .filter(|a| !a.name.in_namespace(XML_NS))
            .all(|a| is_rdf(&a.name, "ID"));
        if only_id {
            return Literal::with_optional_lang("", lang_of(e)).into();
        }

        let object: NodeValue = match e.attribute(RDF_NS, "resource") {
            Some(resource) => Uri::new(resolve_uri(base, resource)).into(),
            None => self.bnode(e.attribute(RDF_NS, "nodeID")).into(),
        };
        let o = object.value().to_string();
        if let Some(rdf_type) = e.attribute(RDF_NS, "type") {
            self.emit(&o, RDF_TYPE, Uri::new(rdf_type));
        }
        self.property_attributes(&o, e);
        object
    }

    /// Reification record for a property element carrying `rdf:ID`
    fn reify(&mut self, subject: &str, predicate: &str, object: &NodeValue, e: &XmlElement, base: &str) {
        let Some(id) = e.attribute(RDF_NS, "ID") else {
            return;
        };
        let statement = resolve_uri(base, &format!("#{}", id));
        self.emit(&statement, RDF_SUBJECT, Uri::new(subject));
        self.emit(&statement, RDF_PREDICATE, Uri::new(predicate));
        self.emit(&statement, RDF_OBJECT, object.clone());
        self.emit(&statement, RDF_TYPE, Uri::new(RDF_STATEMENT));
    }
}
