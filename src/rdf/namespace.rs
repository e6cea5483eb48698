//! RDF namespace and prefix management
//!
//! This module handles namespace prefixes for compact IRI notation and maps
//! URIs onto XML qualified names (namespace + local part) for RDF/XML.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Prefix errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Not of the form `prefix:local`
    #[error("Invalid CURIE: {0}")]
    InvalidCurie(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// XML qualified name: namespace URI plus local part
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None = no namespace)
    pub namespace: Option<String>,
    /// Local part
    pub local: String,
}

impl QName {
    /// Create a namespaced name
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Create a name without namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// The URI this name stands for in RDF/XML (namespace + local part)
    pub fn to_uri(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}{}", ns, self.local),
            None => self.local.clone(),
        }
    }

    /// Check the namespace
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }
}

/// Clark notation, `{namespace}local`
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Namespace (prefix → IRI mapping)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Prefix
    pub prefix: String,
    /// IRI
    pub iri: String,
}

impl Namespace {
    /// Create a new namespace
    pub fn new(prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            iri: iri.into(),
        }
    }
}

/// Namespace manager with common prefixes
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    /// Prefix → IRI mappings
    prefixes: BTreeMap<String, String>,
}

impl NamespaceManager {
    /// Create a new namespace manager with common prefixes
    pub fn new() -> Self {
        let mut mgr = Self::empty();

        mgr.add_prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
        mgr.add_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        mgr.add_prefix("xsd", "http://www.w3.org/2001/XMLSchema#");
        mgr.add_prefix("owl", "http://www.w3.org/2002/07/owl#");
        mgr.add_prefix("foaf", "http://xmlns.com/foaf/0.1/");
        mgr.add_prefix("dc", "http://purl.org/dc/elements/1.1/");
        mgr.add_prefix("dcterms", "http://purl.org/dc/terms/");
        mgr.add_prefix("skos", "http://www.w3.org/2004/02/skos/core#");
        mgr.add_prefix("oa", "http://www.w3.org/ns/oa#");
        mgr.add_prefix("geo", "http://www.w3.org/2003/01/geo/wgs84_pos#");
        mgr.add_prefix("bibo", "http://purl.org/ontology/bibo/");
        mgr.add_prefix("schema", "http://schema.org/");
        mgr.add_prefix("prov", "http://www.w3.org/ns/prov#");
        mgr.add_prefix("dbpo", "http://dbpedia.org/ontology/");
        mgr.add_prefix("edm", "http://www.europeana.eu/schemas/edm/");
        mgr.add_prefix("ore", "http://www.openarchives.org/ore/terms/");

        mgr
    }

    /// Create a manager without any prefixes
    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// The process-wide default mapping
    pub fn shared() -> Arc<NamespaceManager> {
        static SHARED: OnceLock<Arc<NamespaceManager>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(NamespaceManager::new())).clone()
    }

    /// Add a prefix
    pub fn add_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    /// Builder-style variant of [`add_prefix`](Self::add_prefix)
    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.add_prefix(prefix, iri);
        self
    }

    /// Get IRI for a prefix
    pub fn get_iri(&self, prefix: &str) -> PrefixResult<&str> {
        self.prefixes
            .get(prefix)
            .map(|s| s.as_str())
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))
    }

    /// Get the prefix registered for a namespace IRI
    pub fn prefix_for(&self, iri: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, ns)| ns.as_str() == iri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Expand a compact IRI (prefix:local) to full IRI
    pub fn expand(&self, compact_iri: &str) -> PrefixResult<String> {
        let qname = self.curie_to_qname(compact_iri)?;
        Ok(qname.to_uri())
    }

    /// Compact an IRI using the longest matching namespace
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.longest_namespace(iri)
            .map(|(prefix, ns)| format!("{}:{}", prefix, &iri[ns.len()..]))
    }

    /// Resolve a CURIE to a qualified XML name
    pub fn curie_to_qname(&self, curie: &str) -> PrefixResult<QName> {
        let (prefix, local) = curie
            .split_once(':')
            .ok_or_else(|| PrefixError::InvalidCurie(curie.to_string()))?;
        let iri = self.get_iri(prefix)?;
        Ok(QName::new(iri, local))
    }

    /// Render a qualified name as a CURIE, if its namespace is registered
    pub fn qname_to_curie(&self, qname: &QName) -> Option<String> {
        let namespace = qname.namespace.as_deref()?;
        self.prefix_for(namespace)
            .map(|prefix| format!("{}:{}", prefix, qname.local))
    }

    /// Split a URI into a qualified XML name.
    ///
    /// Registered namespaces win (longest first); otherwise the URI is cut
    /// before its trailing NCName. Returns None when no usable local part
    /// exists.
    pub fn uri_to_qname(&self, uri: &str) -> Option<QName> {
        if let Some((_, ns)) = self.longest_namespace(uri) {
            let local = &uri[ns.len()..];
            if is_ncname(local) {
                return Some(QName::new(ns, local));
            }
        }
        let start = ncname_suffix_start(uri)?;
        if start == 0 {
            return None;
        }
        Some(QName::new(&uri[..start], &uri[start..]))
    }

    /// Get all registered prefixes
    pub fn prefixes(&self) -> Vec<Namespace> {
        self.prefixes
            .iter()
            .map(|(prefix, iri)| Namespace::new(prefix.clone(), iri.clone()))
            .collect()
    }

    fn longest_namespace(&self, iri: &str) -> Option<(&str, &str)> {
        self.prefixes
            .iter()
            .filter(|(_, ns)| !ns.is_empty() && iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| (prefix.as_str(), ns.as_str()))
    }
}

impl Default for NamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}

fn is_ncname_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ncname_char(c: char) -> bool {
    is_ncname_start(c) || c.is_numeric() || c == '-' || c == '.'
}

fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_ncname_start(first) => chars.all(is_ncname_char),
        _ => false,
    }
}

/// Byte offset of the longest NCName that ends the string
fn ncname_suffix_start(s: &str) -> Option<usize> {
    let mut tail_start = s.len();
    for (idx, c) in s.char_indices().rev() {
        if !is_ncname_char(c) {
            break;
        }
        tail_start = idx;
    }
    s[tail_start..]
        .char_indices()
        .find(|(_, c)| is_ncname_start(*c))
        .map(|(offset, _)| tail_start + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefixes() {
        let mgr = NamespaceManager::new();

        assert_eq!(
            mgr.get_iri("rdf").unwrap(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#"
        );
        assert_eq!(mgr.get_iri("oa").unwrap(), "http://www.w3.org/ns/oa#");
        assert!(matches!(mgr.get_iri("nope"), Err(PrefixError::UnknownPrefix(_))));
    }

    #[test]
    fn test_expand() {
        let mgr = NamespaceManager::new();

        assert_eq!(mgr.expand("foaf:name").unwrap(), "http://xmlns.com/foaf/0.1/name");
        assert_eq!(
            mgr.expand("rdf:type").unwrap(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
        assert!(matches!(mgr.expand("title"), Err(PrefixError::InvalidCurie(_))));
    }

    #[test]
    fn test_compact_prefers_longest_namespace() {
        let mgr = NamespaceManager::new()
            .with_prefix("ex", "http://example.org/")
            .with_prefix("exv", "http://example.org/vocab/");

        assert_eq!(mgr.compact("http://example.org/vocab/p"), Some("exv:p".to_string()));
        assert_eq!(mgr.compact("http://example.org/thing"), Some("ex:thing".to_string()));
        assert_eq!(mgr.compact("urn:nothing"), None);
    }

    #[test]
    fn test_curie_and_qname() {
        let mgr = NamespaceManager::new();
        let qname = mgr.curie_to_qname("dcterms:title").unwrap();
        assert_eq!(qname, QName::new("http://purl.org/dc/terms/", "title"));
        assert_eq!(qname.to_string(), "{http://purl.org/dc/terms/}title");
        assert_eq!(mgr.qname_to_curie(&qname), Some("dcterms:title".to_string()));
        assert_eq!(mgr.qname_to_curie(&QName::local("title")), None);
    }

    #[test]
    fn test_uri_to_qname() {
        let mgr = NamespaceManager::new();

        assert_eq!(
            mgr.uri_to_qname("http://www.w3.org/2000/01/rdf-schema#label"),
            Some(QName::new("http://www.w3.org/2000/01/rdf-schema#", "label"))
        );
        // unregistered namespaces are cut before the trailing name
        assert_eq!(
            mgr.uri_to_qname("http://example.com/terms/model"),
            Some(QName::new("http://example.com/terms/", "model"))
        );
        assert_eq!(
            mgr.uri_to_qname("uri:y"),
            Some(QName::new("uri:", "y"))
        );
        assert_eq!(mgr.uri_to_qname("http://example.com/123"), None);
        assert_eq!(mgr.uri_to_qname("title"), None);
    }

    #[test]
    fn test_shared_is_default_mapping() {
        let shared = NamespaceManager::shared();
        assert_eq!(shared.prefix_for("http://purl.org/dc/terms/"), Some("dcterms"));
        assert!(Arc::ptr_eq(&shared, &NamespaceManager::shared()));
    }
}
