//! In-memory RDF graph
//!
//! Every triple is filed under the eight wildcard patterns it matches:
//! `(s|*, p|*, o|*)`. Any `triples()` lookup is then a single hash probe, at
//! the cost of storing each triple eight times. Buckets hold shared
//! `Arc<Triple>` handles and empty buckets are dropped on removal. Removal
//! swaps the last entry of a bucket into the freed slot.

use super::namespace::NamespaceManager;
use super::types::{Literal, NodeValue, Triple};
use super::vocab::LABEL_PREDICATES;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Index key: `None` stands for a wildcard position
type PatternKey = (Option<String>, Option<String>, Option<NodeValue>);

type Bucket = IndexSet<Arc<Triple>, FxBuildHasher>;

/// Anything that accepts triples, e.g. the target of a parse
pub trait TripleSink {
    /// Accept one triple
    fn add(&mut self, triple: Triple);
}

/// Anything that can present its triples as a [`Graph`]
pub trait TripleSource {
    /// Borrow as a graph, materializing one when needed
    fn as_graph(&self) -> Cow<'_, Graph>;
}

/// Indexed triple store
#[derive(Debug, Clone)]
pub struct RdfGraph {
    /// Pattern buckets; the all-wildcard bucket is the triple set itself
    index: FxHashMap<PatternKey, Bucket>,

    /// Prefix resolution for CURIE-based lookups
    namespaces: Arc<NamespaceManager>,
}

/// Short name used throughout the crate
pub type Graph = RdfGraph;

const ALL: PatternKey = (None, None, None);

impl RdfGraph {
    /// Create a new empty graph using the shared namespace mapping
    pub fn new() -> Self {
        Self::with_namespaces(NamespaceManager::shared())
    }

    /// Create a new empty graph with its own namespace mapping
    pub fn with_namespaces(namespaces: Arc<NamespaceManager>) -> Self {
        Self {
            index: FxHashMap::default(),
            namespaces,
        }
    }

    /// Namespace mapping used for CURIE lookups
    pub fn namespaces(&self) -> &Arc<NamespaceManager> {
        &self.namespaces
    }

    /// Add a triple; adding an existing triple changes nothing
    pub fn add_triple(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<NodeValue>,
    ) {
        self.insert(Triple::new(subject, predicate, object));
    }

    /// Add a triple given as a value
    pub fn insert(&mut self, triple: Triple) {
        if self.contains_triple(&triple) {
            return;
        }
        let triple = Arc::new(triple);
        for key in pattern_keys(&triple) {
            self.index.entry(key).or_default().insert(Arc::clone(&triple));
        }
    }

    /// Remove a triple from all of its buckets
    pub fn remove_triple(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<NodeValue>,
    ) {
        self.remove(&Triple::new(subject, predicate, object));
    }

    /// Remove a triple given as a value; absent triples are ignored
    pub fn remove(&mut self, triple: &Triple) {
        for key in pattern_keys(triple) {
            let emptied = match self.index.get_mut(&key) {
                Some(bucket) => {
                    bucket.swap_remove(triple);
                    bucket.is_empty()
                }
                None => continue,
            };
            if emptied {
                self.index.remove(&key);
            }
        }
    }

    /// Exact-pattern lookup; `None` positions are wildcards
    pub fn triples(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&NodeValue>,
    ) -> Vec<Triple> {
        let key = (
            subject.map(str::to_string),
            predicate.map(str::to_string),
            object.cloned(),
        );
        self.index
            .get(&key)
            .map(|bucket| bucket.iter().map(|t| Triple::clone(t)).collect())
            .unwrap_or_default()
    }

    /// Iterate over all triples; insertion order holds until the first removal
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.index
            .get(&ALL)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(|t| t.as_ref()))
    }

    /// Check whether any triple matches the pattern
    pub fn contains(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&NodeValue>,
    ) -> bool {
        let key = (
            subject.map(str::to_string),
            predicate.map(str::to_string),
            object.cloned(),
        );
        self.index.contains_key(&key)
    }

    /// Check whether the exact triple is present
    pub fn contains_triple(&self, triple: &Triple) -> bool {
        self.index
            .get(&ALL)
            .is_some_and(|bucket| bucket.contains(triple))
    }

    /// All objects for (subject, predicate)
    pub fn objects(&self, subject: &str, predicate: &str) -> Vec<NodeValue> {
        self.triples(Some(subject), Some(predicate), None)
            .into_iter()
            .map(|t| t.object)
            .collect()
    }

    /// All objects for (subject, predicate) with the predicate given as a CURIE
    pub fn objects_by_curie(&self, subject: &str, curie: &str) -> Vec<NodeValue> {
        match self.namespaces.expand(curie) {
            Ok(predicate) => self.objects(subject, &predicate),
            Err(e) => {
                warn!(curie, error = %e, "cannot resolve predicate CURIE");
                Vec::new()
            }
        }
    }

    /// Value of the first non-empty literal object of (subject, predicate)
    pub fn literal_value(&self, subject: &str, predicate: &str) -> Option<String> {
        first_literal_value(self.objects(subject, predicate))
    }

    /// Like [`literal_value`](Self::literal_value) with the predicate given as a CURIE
    pub fn literal_value_by_curie(&self, subject: &str, curie: &str) -> Option<String> {
        first_literal_value(self.objects_by_curie(subject, curie))
    }

    /// Find a label using the default label predicates
    pub fn find_label(&self, uri: &str) -> Option<Literal> {
        self.find_label_with(uri, &LABEL_PREDICATES)
    }

    /// Find a label for `uri`.
    ///
    /// A Dutch label under any predicate is returned as soon as it is seen.
    /// Otherwise the first literal per language is kept, and English wins
    /// over untagged.
    pub fn find_label_with<P: AsRef<str>>(
        &self,
        uri: &str,
        label_predicates: &[P],
    ) -> Option<Literal> {
        let mut labels: HashMap<Option<String>, Literal> = HashMap::new();
        for predicate in label_predicates {
            for triple in self.triples(Some(uri), Some(predicate.as_ref()), None) {
                let NodeValue::Literal(literal) = triple.object else {
                    continue;
                };
                if literal.lang() == Some("nl") {
                    return Some(literal);
                }
                labels
                    .entry(literal.lang().map(str::to_string))
                    .or_insert(literal);
            }
        }
        labels
            .remove(&Some("en".to_string()))
            .or_else(|| labels.remove(&None))
    }

    /// Get the total number of triples
    pub fn len(&self) -> usize {
        self.index.get(&ALL).map_or(0, |bucket| bucket.len())
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live index buckets (8 per distinct pattern in use)
    pub fn bucket_count(&self) -> usize {
        self.index.len()
    }

    /// Clear all triples
    pub fn clear(&mut self) {
        self.index.clear();
    }
}

fn first_literal_value(objects: Vec<NodeValue>) -> Option<String> {
    objects.into_iter().find_map(|node| match node {
        NodeValue::Literal(l) if !l.value().is_empty() => Some(l.value().to_string()),
        _ => None,
    })
}

fn pattern_keys(triple: &Triple) -> Vec<PatternKey> {
    let mut keys = Vec::with_capacity(8);
    for s in [None, Some(&triple.subject)] {
        for p in [None, Some(&triple.predicate)] {
            for o in [None, Some(&triple.object)] {
                keys.push((s.cloned(), p.cloned(), o.cloned()));
            }
        }
    }
    keys
}

impl Default for RdfGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TripleSink for RdfGraph {
    fn add(&mut self, triple: Triple) {
        self.insert(triple);
    }
}

/// Collects triples in emission order
impl TripleSink for Vec<Triple> {
    fn add(&mut self, triple: Triple) {
        self.push(triple);
    }
}

impl TripleSource for RdfGraph {
    fn as_graph(&self) -> Cow<'_, Graph> {
        Cow::Borrowed(self)
    }
}

impl TripleSource for [Triple] {
    fn as_graph(&self) -> Cow<'_, Graph> {
        Cow::Owned(self.iter().cloned().collect())
    }
}

impl TripleSource for Vec<Triple> {
    fn as_graph(&self) -> Cow<'_, Graph> {
        self.as_slice().as_graph()
    }
}

impl FromIterator<Triple> for RdfGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = RdfGraph::new();
        graph.extend(iter);
        graph
    }
}

impl Extend<Triple> for RdfGraph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl PartialEq for RdfGraph {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|t| other.contains_triple(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::types::{BNode, Uri};
    use crate::rdf::vocab::{RDFS_LABEL, SKOS_ALT_LABEL, SKOS_PREF_LABEL};

    fn lit(value: &str) -> NodeValue {
        Literal::new(value).into()
    }

    fn sorted(mut triples: Vec<Triple>) -> Vec<Triple> {
        triples.sort();
        triples
    }

    #[test]
    fn test_wildcard_lookups() {
        let mut g = RdfGraph::new();
        g.add_triple("x", "y", lit("z"));
        g.add_triple("a", "b", lit("c"));
        assert_eq!(
            g.triples(None, None, None),
            vec![Triple::new("x", "y", lit("z")), Triple::new("a", "b", lit("c"))]
        );

        g.add_triple("x", "y", lit("3"));
        g.add_triple("x", "2", lit("z"));
        g.add_triple("x", "2", lit("3"));
        g.add_triple("1", "y", lit("z"));
        g.add_triple("1", "y", lit("3"));
        g.add_triple("1", "2", lit("z"));
        g.add_triple("1", "2", lit("3"));

        let z = lit("z");
        assert_eq!(g.triples(Some("x"), Some("y"), Some(&z)), vec![Triple::new("x", "y", lit("z"))]);
        assert_eq!(
            sorted(g.triples(Some("x"), Some("y"), None)),
            vec![Triple::new("x", "y", lit("3")), Triple::new("x", "y", lit("z"))]
        );
        assert_eq!(
            sorted(g.triples(Some("x"), None, Some(&z))),
            vec![Triple::new("x", "2", lit("z")), Triple::new("x", "y", lit("z"))]
        );
        assert_eq!(g.triples(Some("x"), None, None).len(), 4);
        assert_eq!(g.triples(None, Some("y"), Some(&z)).len(), 2);
        assert_eq!(g.triples(None, Some("y"), None).len(), 4);
        assert_eq!(g.triples(None, None, Some(&z)).len(), 4);
        assert_eq!(g.len(), 9);

        let mut objects = g.objects("x", "y");
        objects.sort();
        assert_eq!(objects, vec![lit("3"), lit("z")]);
    }

    #[test]
    fn test_idempotent_insert() {
        let mut g = RdfGraph::new();
        g.add_triple("u:ri", "p:redicate", lit("obj"));
        let buckets = g.bucket_count();
        g.add_triple("u:ri", "p:redicate", lit("obj"));

        assert_eq!(g.len(), 1);
        assert_eq!(g.triples(None, None, None).len(), 1);
        assert_eq!(g.bucket_count(), buckets);
    }

    #[test]
    fn test_remove_does_not_leak_buckets() {
        let mut g = RdfGraph::new();
        g.add_triple("u:ri", "p:redicate", lit("obj"));
        g.add_triple("u:ri", "p:redicate", lit("obj2"));
        assert_eq!(g.len(), 2);
        assert_eq!(g.bucket_count(), 12);

        g.remove_triple("u:ri", "p:redicate", lit("obj2"));
        assert_eq!(g.bucket_count(), 8);
        assert_eq!(g.triples(Some("u:ri"), Some("p:redicate"), None).len(), 1);
        assert_eq!(g.triples(None, None, Some(&lit("obj2"))).len(), 0);

        g.remove_triple("u:ri", "p:redicate", lit("obj"));
        assert_eq!(g.bucket_count(), 0);
        assert!(g.is_empty());
    }

    #[test]
    fn test_remove_from_middle_of_bucket() {
        let mut g = RdfGraph::new();
        for i in 0..5 {
            g.add_triple(format!("urn:s{}", i), "urn:p", lit("v"));
        }
        g.remove_triple("urn:s2", "urn:p", lit("v"));

        assert_eq!(g.len(), 4);
        assert!(!g.contains(Some("urn:s2"), None, None));
        for i in [0, 1, 3, 4] {
            let subject = format!("urn:s{}", i);
            assert!(g.contains_triple(&Triple::new(subject.as_str(), "urn:p", lit("v"))));
            assert_eq!(g.triples(Some(&subject), None, None).len(), 1);
        }
        assert_eq!(g.triples(None, Some("urn:p"), Some(&lit("v"))).len(), 4);
        assert_eq!(g.bucket_count(), 4 * 4 + 4);
    }

    #[test]
    fn test_remove_absent_triple_creates_nothing() {
        let mut g = RdfGraph::new();
        g.remove_triple("u:ri", "p:redicate", lit("obj2"));
        assert_eq!(g.bucket_count(), 0);
    }

    #[test]
    fn test_contains_patterns() {
        let mut g = RdfGraph::new();
        let obj: NodeValue = Literal::with_lang("obj", "en").into();
        g.add_triple("u:ri", "p:redicate", obj.clone());

        assert!(g.contains(Some("u:ri"), Some("p:redicate"), Some(&obj)));
        assert!(g.contains(None, Some("p:redicate"), Some(&obj)));
        assert!(g.contains(Some("u:ri"), None, None));
        assert!(g.contains(None, None, None));
        assert!(!g.contains(Some("U:ri"), None, None));
        assert!(!g.contains(None, None, Some(&Literal::with_lang("obj", "nl").into())));
        assert!(!g.contains(None, None, Some(&lit("obj"))));

        let mut g = RdfGraph::new();
        g.add_triple("u:ri", "p:redicate", BNode::new("_:42"));
        assert!(g.contains(None, Some("p:redicate"), Some(&BNode::new("_:42").into())));
        assert!(!g.contains(None, None, Some(&BNode::new("_:666").into())));
        assert!(!g.contains(None, None, Some(&Uri::new("_:42").into())));
    }

    #[test]
    fn test_objects_by_curie_and_literal_value() {
        let mut g = RdfGraph::new();
        g.add_triple("u:ri", RDFS_LABEL, Uri::new("u:other"));
        g.add_triple("u:ri", RDFS_LABEL, lit(""));
        g.add_triple("u:ri", RDFS_LABEL, lit("label"));

        assert_eq!(g.objects_by_curie("u:ri", "rdfs:label").len(), 3);
        assert!(g.objects_by_curie("u:ri", "unknown:label").is_empty());
        assert_eq!(g.literal_value("u:ri", RDFS_LABEL), Some("label".to_string()));
        assert_eq!(g.literal_value_by_curie("u:ri", "rdfs:label"), Some("label".to_string()));
        assert_eq!(g.literal_value("u:ri", "p:missing"), None);
    }

    #[test]
    fn test_find_label_precedence() {
        let mut g = RdfGraph::new();
        g.add_triple("u:ri", RDFS_LABEL, lit("rdfsLabel"));
        assert_eq!(g.find_label("u:ri"), Some(Literal::new("rdfsLabel")));

        g.add_triple("u:ri", RDFS_LABEL, Literal::with_lang("rdfsLabelEN", "en"));
        assert_eq!(g.find_label("u:ri"), Some(Literal::with_lang("rdfsLabelEN", "en")));

        g.add_triple("u:ri", SKOS_PREF_LABEL, lit("skosPrefLabel"));
        assert_eq!(g.find_label("u:ri"), Some(Literal::with_lang("rdfsLabelEN", "en")));

        g.add_triple("u:ri", SKOS_PREF_LABEL, Literal::with_lang("skosPrefLabelNL", "nl"));
        assert_eq!(g.find_label("u:ri"), Some(Literal::with_lang("skosPrefLabelNL", "nl")));

        g.add_triple("u:ri", RDFS_LABEL, Literal::with_lang("rdfsLabelNL", "nl"));
        assert_eq!(g.find_label("u:ri"), Some(Literal::with_lang("rdfsLabelNL", "nl")));

        g.add_triple("u:ri", crate::rdf::vocab::FOAF_NAME, Literal::with_lang("foafNameNL", "nl"));
        assert_eq!(g.find_label("u:ri"), Some(Literal::with_lang("foafNameNL", "nl")));
    }

    #[test]
    fn test_find_label_with_explicit_predicates() {
        let mut g = RdfGraph::new();
        g.add_triple("u:ri", RDFS_LABEL, lit("rdfsLabel"));
        let none: [&str; 0] = [];
        assert_eq!(g.find_label_with("u:ri", &none), None);
        assert_eq!(g.find_label_with("u:ri", &[RDFS_LABEL]), Some(Literal::new("rdfsLabel")));

        g.add_triple("u:ri2", SKOS_ALT_LABEL, lit("altLabel"));
        assert_eq!(g.find_label_with("u:ri2", &[RDFS_LABEL]), None);
        assert_eq!(
            g.find_label_with("u:ri2", &[RDFS_LABEL, SKOS_ALT_LABEL]),
            Some(Literal::new("altLabel"))
        );
    }

    #[test]
    fn test_sources_materialize_graph() {
        let triples = vec![
            Triple::new("s", "p", lit("o")),
            Triple::new("s", "p", lit("o")),
        ];
        let graph = triples.as_graph();
        assert_eq!(graph.len(), 1);

        let mut sink: Vec<Triple> = Vec::new();
        sink.add(Triple::new("s", "p", lit("o")));
        assert_eq!(sink.len(), 1);
    }
}
