use anyhow::Result;
use rdfxml_graph::rdf::vocab::{RDFS_LABEL, RDF_TYPE, SKOS_PREF_LABEL};
use rdfxml_graph::{
    BNode, Bindings, Graph, Literal, NodeValue, RdfXmlParser, Triple, TriplePattern, Uri,
};
use serde_json::json;

const CATALOGUE: &str = include_str!("data/catalogue.rdf");
const RECORD: &str = "urn:GGC:oclc-ggc:780950577";
const FOAF_KNOWS: &str = "http://xmlns.com/foaf/0.1/knows";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn people() -> Vec<Triple> {
    vec![
        Triple::new("urn:alice", FOAF_KNOWS, Uri::new("urn:bob")),
        Triple::new("urn:bob", FOAF_KNOWS, Uri::new("urn:carol")),
        Triple::new("urn:carol", FOAF_KNOWS, Uri::new("urn:alice")),
        Triple::new("urn:alice", RDFS_LABEL, Literal::new("Alice")),
    ]
}

#[test]
fn test_collect_and_extend() {
    init_tracing();
    let mut graph: Graph = people().into_iter().collect();
    assert_eq!(graph.len(), 4);

    graph.extend(people());
    assert_eq!(graph.len(), 4);

    graph.extend([Triple::new("urn:dave", FOAF_KNOWS, Uri::new("urn:alice"))]);
    assert_eq!(graph.len(), 5);
    assert_eq!(graph.triples(None, Some(FOAF_KNOWS), Some(&Uri::new("urn:alice").into())).len(), 2);
}

#[test]
fn test_iteration_keeps_insertion_order_without_removals() {
    let graph: Graph = people().into_iter().collect();
    let subjects: Vec<&str> = graph.iter().map(|t| t.subject.as_str()).collect();
    assert_eq!(subjects, vec!["urn:alice", "urn:bob", "urn:carol", "urn:alice"]);
}

#[test]
fn test_bulk_removal_keeps_remaining_triples() {
    let mut graph = Graph::new();
    for i in 0..2_000 {
        graph.add_triple(format!("urn:s{}", i), "urn:p", Literal::new("v"));
    }
    for i in (0..2_000).step_by(2) {
        graph.remove_triple(format!("urn:s{}", i), "urn:p", Literal::new("v"));
    }

    assert_eq!(graph.len(), 1_000);
    assert!(graph.iter().all(|t| {
        let n: usize = t.subject["urn:s".len()..].parse().unwrap();
        n % 2 == 1
    }));
    assert_eq!(graph.triples(None, Some("urn:p"), None).len(), 1_000);

    for i in (1..2_000).step_by(2) {
        graph.remove_triple(format!("urn:s{}", i), "urn:p", Literal::new("v"));
    }
    assert!(graph.is_empty());
    assert_eq!(graph.bucket_count(), 0);
}

#[test]
fn test_clone_is_independent() {
    let graph: Graph = people().into_iter().collect();
    let mut copy = graph.clone();
    copy.remove_triple("urn:alice", RDFS_LABEL, Literal::new("Alice"));

    assert_eq!(graph.len(), 4);
    assert_eq!(copy.len(), 3);
    assert_ne!(graph, copy);
    assert!(graph.contains(Some("urn:alice"), Some(RDFS_LABEL), None));
    assert!(!copy.contains(Some("urn:alice"), Some(RDFS_LABEL), None));
}

#[test]
fn test_graph_equality_ignores_order() {
    let forward: Graph = people().into_iter().collect();
    let backward: Graph = people().into_iter().rev().collect();
    assert_eq!(forward, backward);
}

#[test]
fn test_literal_equality_includes_language() {
    let mut graph = Graph::new();
    graph.add_triple("urn:x", RDFS_LABEL, Literal::new("same"));
    graph.add_triple("urn:x", RDFS_LABEL, Literal::with_lang("same", "en"));
    graph.add_triple("urn:x", RDFS_LABEL, Uri::new("same"));
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_sparql_json_terms() -> Result<()> {
    let uri = NodeValue::from_sparql_json(&json!({"type": "uri", "value": "urn:x"}))?;
    assert_eq!(uri, Uri::new("urn:x").into());

    let bnode = NodeValue::try_from(&json!({"type": "bnode", "value": "_:b0"}))?;
    assert_eq!(bnode, BNode::new("_:b0").into());

    let literal = NodeValue::from_sparql_json(&json!({"type": "literal", "value": "Titel", "xml:lang": "nl"}))?;
    assert_eq!(literal, Literal::with_lang("Titel", "nl").into());
    assert_eq!(
        literal.to_sparql_json(),
        json!({"type": "literal", "value": "Titel", "xml:lang": "nl"})
    );

    assert!(NodeValue::from_sparql_json(&json!({"type": "typed-literal", "value": "1"})).is_err());
    assert!(NodeValue::from_sparql_json(&json!({"value": "1"})).is_err());
    Ok(())
}

#[test]
fn test_find_label_on_parsed_record() -> Result<()> {
    let graph = RdfXmlParser::new().parse_str(CATALOGUE)?;

    assert_eq!(graph.find_label(RECORD), Some(Literal::new("")));
    assert_eq!(
        graph.find_label_with("_:id1", &[RDFS_LABEL]),
        Some(Literal::with_lang("Anonymous", "en"))
    );
    assert_eq!(graph.find_label("urn:unknown"), None);
    assert_eq!(
        graph.literal_value_by_curie(RECORD, "dcterms:extent"),
        Some("192 p".to_string())
    );
    // empty literals are skipped
    assert_eq!(graph.literal_value_by_curie(RECORD, "rdfs:label"), None);
    Ok(())
}

#[test]
fn test_find_label_prefers_dutch() {
    let mut graph = Graph::new();
    graph.add_triple("urn:x", RDFS_LABEL, Literal::with_lang("Label", "en"));
    graph.add_triple("urn:x", SKOS_PREF_LABEL, Literal::with_lang("Etiket", "nl"));
    assert_eq!(graph.find_label("urn:x"), Some(Literal::with_lang("Etiket", "nl")));
}

#[test]
fn test_join_over_parsed_record() -> Result<()> {
    let graph = RdfXmlParser::new().parse_str(CATALOGUE)?;
    let patterns = [
        TriplePattern::new(RECORD, "http://purl.org/dc/terms/creator", "?creator"),
        TriplePattern::new("?creator", RDF_TYPE, "?type"),
        TriplePattern::new("?creator", RDFS_LABEL, "?name"),
    ];

    let bindings = graph.match_triple_patterns(&patterns);
    assert_eq!(bindings.len(), 1);
    let binding = &bindings[0];
    // a variable last bound in subject position holds a Uri
    assert_eq!(binding["creator"].value(), "_:id0");
    assert_eq!(binding["type"], Uri::new("http://dbpedia.org/ontology/Person").into());
    assert_eq!(binding["name"], Literal::new("Franklin, John Hope\u{a0}").into());
    Ok(())
}

#[test]
fn test_join_follows_cycle() {
    let graph: Graph = people().into_iter().collect();
    let patterns = [
        TriplePattern::new("?a", FOAF_KNOWS, "?b"),
        TriplePattern::new("?b", FOAF_KNOWS, "?c"),
        TriplePattern::new("?c", FOAF_KNOWS, "?a"),
    ];

    let bindings = graph.match_triple_patterns(&patterns);
    assert_eq!(bindings.len(), 3);
    let starts: Vec<&str> = bindings.iter().map(|b: &Bindings| b["a"].value()).collect();
    assert_eq!(starts, vec!["urn:alice", "urn:bob", "urn:carol"]);
}

#[test]
fn test_join_without_matches() {
    let graph: Graph = people().into_iter().collect();
    let patterns = [
        TriplePattern::new("?a", FOAF_KNOWS, "?b"),
        TriplePattern::new("?b", RDF_TYPE, "?t"),
    ];
    assert!(graph.match_triple_patterns(&patterns).is_empty());
}
