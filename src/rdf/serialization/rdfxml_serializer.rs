//! RDF/XML serializer
//!
//! Produces an `rdf:RDF` element tree from a graph:
//!
//! - top-level subjects ordered by type position, then by how often other
//!   subjects refer to them, then by size, then by URI
//! - promoted types (`rdf:Statement`, `oa:Annotation` by default) become the
//!   element tag instead of an `rdf:type` child
//! - blank nodes with a single incoming reference are nested in place
//! - reified triples carry `rdf:ID` on their property element and the
//!   statement node leaves out what that attribute already implies

use super::rdfxml_parser::resolve_uri;
use super::xml::XmlElement;
use super::{SerializeError, SerializeResult};
use crate::rdf::namespace::{NamespaceManager, QName};
use crate::rdf::pattern::TriplePattern;
use crate::rdf::store::{Graph, TripleSource};
use crate::rdf::types::{is_bnode_label, NodeValue, Triple, Uri, BNODE_PREFIX};
use crate::rdf::vocab::{
    OA_ANNOTATION, RDF_DESCRIPTION, RDF_NS, RDF_OBJECT, RDF_PREDICATE, RDF_STATEMENT, RDF_SUBJECT,
    RDF_TYPE, XML_NS,
};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

fn default_promoted_types() -> BTreeSet<String> {
    [RDF_STATEMENT, OA_ANNOTATION]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_type_positions() -> BTreeMap<String, i64> {
    [(OA_ANNOTATION, -10), (RDF_STATEMENT, 100)]
        .into_iter()
        .map(|(uri, position)| (uri.to_string(), position))
        .collect()
}

fn merge_promoted_types<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
    let mut types = default_promoted_types();
    types.extend(BTreeSet::<String>::deserialize(d)?);
    Ok(types)
}

fn merge_type_positions<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, i64>, D::Error> {
    let mut positions = default_type_positions();
    positions.extend(BTreeMap::<String, i64>::deserialize(d)?);
    Ok(positions)
}

/// Serializer configuration
///
/// Deserialized settings extend the built-in promoted types and positions
/// rather than replacing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Nest the description of a referenced URI instead of writing `rdf:resource`
    pub inline_descriptions: bool,

    /// Types rendered as the element tag
    #[serde(deserialize_with = "merge_promoted_types")]
    pub promoted_types: BTreeSet<String>,

    /// Ordering weight of top-level subjects by type (unlisted types weigh 0)
    #[serde(deserialize_with = "merge_type_positions")]
    pub type_positions: BTreeMap<String, i64>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            inline_descriptions: false,
            promoted_types: default_promoted_types(),
            type_positions: default_type_positions(),
        }
    }
}

impl SerializerConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn inline descriptions on or off
    pub fn with_inline_descriptions(mut self, inline: bool) -> Self {
        self.inline_descriptions = inline;
        self
    }

    /// Promote another type to element tag
    pub fn promote_type(mut self, type_uri: impl Into<String>) -> Self {
        self.promoted_types.insert(type_uri.into());
        self
    }

    /// Set the ordering weight for a type
    pub fn with_type_position(mut self, type_uri: impl Into<String>, position: i64) -> Self {
        self.type_positions.insert(type_uri.into(), position);
        self
    }

    fn position(&self, type_uri: &str) -> i64 {
        self.type_positions.get(type_uri).copied().unwrap_or(0)
    }
}

/// RDF/XML serializer
#[derive(Debug, Clone)]
pub struct RdfXmlSerializer {
    config: SerializerConfig,
    namespaces: Arc<NamespaceManager>,
}

impl RdfXmlSerializer {
    /// Create a new serializer with the default configuration
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    /// Create a new serializer with the given configuration
    pub fn with_config(config: SerializerConfig) -> Self {
        Self {
            config,
            namespaces: NamespaceManager::shared(),
        }
    }

    /// Use another namespace mapping for splitting URIs and choosing prefixes
    pub fn with_namespaces(mut self, namespaces: Arc<NamespaceManager>) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Serialize to an `rdf:RDF` element tree
    pub fn serialize<S: TripleSource + ?Sized>(&self, source: &S) -> SerializeResult<XmlElement> {
        let graph = source.as_graph();
        debug!(triples = graph.len(), "serializing RDF/XML");

        let mut run = SerializeRun::new(&self.config, &self.namespaces, &graph);
        let root = run.render_document()?;

        debug!(
            top_level = root.children.len(),
            inlined = run.inlined,
            anchors = run.anchors.len(),
            "finished serializing RDF/XML"
        );
        Ok(root)
    }

    /// Serialize to RDF/XML text
    pub fn serialize_to_string<S: TripleSource + ?Sized>(&self, source: &S) -> SerializeResult<String> {
        let root = self.serialize(source)?;
        Ok(root.to_xml_string(&self.namespaces)?)
    }
}

impl Default for RdfXmlSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Where an `rdf:ID` attribute resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
struct Anchor {
    base: String,
    fragment: String,
}

impl Anchor {
    /// Split a statement URI into the base and `rdf:ID` that reproduce it
    fn split(statement: &str) -> Option<Self> {
        let (base, fragment) = statement.rsplit_once('#')?;
        if fragment.is_empty() || resolve_uri(base, &format!("#{}", fragment)) != statement {
            return None;
        }
        Some(Self {
            base: base.to_string(),
            fragment: fragment.to_string(),
        })
    }

    /// Check that `xml:base` on the property element leaves the object intact
    fn preserves(&self, object: &NodeValue) -> bool {
        match object {
            NodeValue::Uri(uri) => self.base.is_empty() || resolve_uri(&self.base, uri.value()) == uri.value(),
            _ => true,
        }
    }
}

fn rdf(local: &str) -> QName {
    QName::new(RDF_NS, local)
}

fn node_id(label: &str) -> &str {
    label.strip_prefix(BNODE_PREFIX).unwrap_or(label)
}

type Relations = Vec<(String, NodeValue)>;

/// State of a single serialization
struct SerializeRun<'a> {
    config: &'a SerializerConfig,
    namespaces: &'a NamespaceManager,
    graph: &'a Graph,

    /// Reified triple → anchor written as `rdf:ID`
    anchors: HashMap<Triple, Anchor>,
    /// Statement nodes whose reification triples are implied by an `rdf:ID`
    statements: HashSet<String>,
    /// Triples written implicitly through `rdf:ID`
    implied: HashSet<Triple>,

    /// Subject → relations, minus implied triples
    descriptions: IndexMap<String, Relations>,
    /// Object → distinct other subjects referring to it, reification edges excluded
    referrers: HashMap<String, HashSet<String>>,
    /// Object → number of relations pointing at it, reification edges excluded
    incoming: HashMap<String, usize>,

    rendered: HashSet<String>,
    inlined: usize,
}

impl<'a> SerializeRun<'a> {
    fn new(config: &'a SerializerConfig, namespaces: &'a NamespaceManager, graph: &'a Graph) -> Self {
        let mut run = Self {
            config,
            namespaces,
            graph,
            anchors: HashMap::new(),
            statements: HashSet::new(),
            implied: HashSet::new(),
            descriptions: IndexMap::new(),
            referrers: HashMap::new(),
            incoming: HashMap::new(),
            rendered: HashSet::new(),
            inlined: 0,
        };
        run.find_anchors();
        run.describe();
        run
    }

    /// Match reification records to the triples they describe
    fn find_anchors(&mut self) {
        let patterns = [
            TriplePattern::new("?statement", RDF_TYPE, Uri::new(RDF_STATEMENT)),
            TriplePattern::new("?statement", RDF_SUBJECT, "?s"),
            TriplePattern::new("?statement", RDF_PREDICATE, "?p"),
            TriplePattern::new("?statement", RDF_OBJECT, "?o"),
        ];
        let mut candidates: Vec<(String, Triple)> = self
            .graph
            .match_triple_patterns(&patterns)
            .into_iter()
            .filter_map(|binding| {
                let statement = binding.get("statement")?.value().to_string();
                let (NodeValue::Uri(s), NodeValue::Uri(p)) = (binding.get("s")?, binding.get("p")?) else {
                    return None;
                };
                let triple = Triple::new(s.value(), p.value(), binding.get("o")?.clone());
                Some((statement, triple))
            })
            .collect();
        candidates.sort();

        for (statement, triple) in candidates {
            if self.statements.contains(&statement)
                || self.anchors.contains_key(&triple)
                || is_reification_triple(&triple)
                || !self.graph.contains_triple(&triple)
            {
                continue;
            }
            let Some(anchor) = Anchor::split(&statement).filter(|a| a.preserves(&triple.object)) else {
                continue;
            };
            self.implied.extend([
                Triple::new(&statement, RDF_SUBJECT, Uri::new(&triple.subject)),
                Triple::new(&statement, RDF_PREDICATE, Uri::new(&triple.predicate)),
                Triple::new(&statement, RDF_OBJECT, triple.object.clone()),
                Triple::new(&statement, RDF_TYPE, Uri::new(RDF_STATEMENT)),
            ]);
            self.statements.insert(statement);
            self.anchors.insert(triple, anchor);
        }
    }

    /// Group the remaining triples by subject and count references
    fn describe(&mut self) {
        for triple in self.graph.iter() {
            if self.implied.contains(triple) {
                continue;
            }
            self.descriptions
                .entry(triple.subject.clone())
                .or_default()
                .push((triple.predicate.clone(), triple.object.clone()));

            if triple.object.is_identifier() && !is_reification_triple(triple) {
                let target = triple.object.value().to_string();
                *self.incoming.entry(target.clone()).or_default() += 1;
                if target != triple.subject {
                    self.referrers
                        .entry(target)
                        .or_default()
                        .insert(triple.subject.clone());
                }
            }
        }
        for relations in self.descriptions.values_mut() {
            relations.sort();
        }
    }

    /// Blank nodes that are only ever written nested inside their one referrer
    fn is_inline_only(&self, subject: &str) -> bool {
        is_bnode_label(subject) && self.incoming.get(subject) == Some(&1)
    }

    fn sort_key(&self, subject: &str) -> (i64, usize, Reverse<usize>, String) {
        let relations = &self.descriptions[subject];
        let implied_type = self.statements.contains(subject).then_some(RDF_STATEMENT);
        let position = relations
            .iter()
            .filter(|(p, o)| p == RDF_TYPE && o.is_uri())
            .map(|(_, o)| o.value())
            .chain(implied_type)
            .map(|t| self.config.position(t))
            .min()
            .unwrap_or(0);
        let referrers = self.referrers.get(subject).map_or(0, HashSet::len);
        (position, referrers, Reverse(relations.len()), subject.to_string())
    }

    fn render_document(&mut self) -> SerializeResult<XmlElement> {
        let mut root = XmlElement::new(rdf("RDF"));

        let mut subjects: Vec<String> = self
            .descriptions
            .keys()
            .filter(|s| !self.is_inline_only(s))
            .cloned()
            .collect();
        subjects.sort_by_cached_key(|s| self.sort_key(s));
        for subject in subjects {
            if !self.rendered.contains(&subject) {
                let node = self.render_node(&subject)?;
                root.push_element(node);
            }
        }

        // singly referenced blank nodes that only refer to each other
        let mut stranded: Vec<String> = self
            .descriptions
            .keys()
            .filter(|s| !self.rendered.contains(*s))
            .cloned()
            .collect();
        stranded.sort_by_cached_key(|s| self.sort_key(s));
        for subject in stranded {
            if !self.rendered.contains(&subject) {
                warn!(subject = %subject, "blank node cycle; writing node at top level");
                let node = self.render_node(&subject)?;
                root.push_element(node);
            }
        }

        Ok(root)
    }

    /// Pick the promoted type used as tag, if any
    fn promoted_type(&self, subject: &str, relations: &Relations) -> Option<(String, QName)> {
        if self.statements.contains(subject) {
            return Some((RDF_STATEMENT.to_string(), rdf("Statement")));
        }
        relations
            .iter()
            .filter(|(p, o)| p == RDF_TYPE && o.is_uri())
            .map(|(_, o)| o.value())
            .filter(|t| *t != RDF_DESCRIPTION && self.config.promoted_types.contains(*t))
            .filter(|t| !self.anchors.contains_key(&Triple::new(subject, RDF_TYPE, Uri::new(*t))))
            .filter_map(|t| self.namespaces.uri_to_qname(t).map(|qname| (t.to_string(), qname)))
            .min_by(|(a, _), (b, _)| {
                self.config
                    .position(a)
                    .cmp(&self.config.position(b))
                    .then_with(|| a.cmp(b))
            })
    }

    fn render_node(&mut self, subject: &str) -> SerializeResult<XmlElement> {
        self.rendered.insert(subject.to_string());
        let mut relations = self.descriptions.get(subject).cloned().unwrap_or_default();

        let tag = match self.promoted_type(subject, &relations) {
            Some((type_uri, qname)) => {
                let promoted: NodeValue = Uri::new(type_uri).into();
                if let Some(index) = relations
                    .iter()
                    .position(|(p, o)| p == RDF_TYPE && *o == promoted)
                {
                    relations.remove(index);
                }
                qname
            }
            None => rdf("Description"),
        };

        let mut node = XmlElement::new(tag);
        // nested blank nodes carry their label as well
        if is_bnode_label(subject) {
            node.set_attribute(rdf("nodeID"), node_id(subject));
        } else {
            node.set_attribute(rdf("about"), subject);
        }

        for (predicate, object) in relations {
            let property = self.render_property(subject, predicate, object)?;
            node.push_element(property);
        }
        Ok(node)
    }

    fn render_property(
        &mut self,
        subject: &str,
        predicate: String,
        object: NodeValue,
    ) -> SerializeResult<XmlElement> {
        let qname = self
            .namespaces
            .uri_to_qname(&predicate)
            .ok_or_else(|| SerializeError::UnrepresentableUri(predicate.clone()))?;
        let mut property = XmlElement::new(qname);

        let triple = Triple::new(subject, predicate, object);
        if let Some(anchor) = self.anchors.get(&triple) {
            if !anchor.base.is_empty() {
                property.set_attribute(QName::new(XML_NS, "base"), anchor.base.as_str());
            }
            property.set_attribute(rdf("ID"), anchor.fragment.as_str());
        }

        match triple.object {
            NodeValue::Literal(literal) => {
                if let Some(lang) = literal.lang() {
                    property.set_attribute(QName::new(XML_NS, "lang"), lang);
                }
                property.push_text(literal.value());
            }
            NodeValue::BNode(bnode) => {
                let label = bnode.value();
                if self.is_inline_only(label) && !self.rendered.contains(label) {
                    let nested = self.render_node(label)?;
                    property.push_element(nested);
                    self.inlined += 1;
                } else {
                    property.set_attribute(rdf("nodeID"), node_id(label));
                }
            }
            NodeValue::Uri(uri) => {
                let value = uri.value();
                let nest = self.config.inline_descriptions
                    && !self.rendered.contains(value)
                    && self.descriptions.get(value).is_some_and(|r| !r.is_empty());
                if nest {
                    let nested = self.render_node(value)?;
                    property.push_element(nested);
                    self.inlined += 1;
                } else {
                    property.set_attribute(rdf("resource"), value);
                }
            }
        }
        Ok(property)
    }
}

/// Triples that are part of a reification record themselves
fn is_reification_triple(triple: &Triple) -> bool {
    matches!(triple.predicate.as_str(), RDF_SUBJECT | RDF_PREDICATE | RDF_OBJECT)
        || (triple.predicate == RDF_TYPE && triple.object.value() == RDF_STATEMENT)
}
