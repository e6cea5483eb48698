//! Constant URIs for the RDF, RDFS, SKOS, FOAF and Web Annotation terms
//! the parser and serializer rely on.

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_STATEMENT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Statement";
pub const RDF_DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";
// reification
pub const RDF_SUBJECT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#subject";
pub const RDF_PREDICATE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#predicate";
pub const RDF_OBJECT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#object";

pub const OA_ANNOTATION: &str = "http://www.w3.org/ns/oa#Annotation";

// labels
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const SKOS_ALT_LABEL: &str = "http://www.w3.org/2004/02/skos/core#altLabel";
pub const FOAF_NAME: &str = "http://xmlns.com/foaf/0.1/name";

/// Predicates consulted by `Graph::find_label`, in order
pub const LABEL_PREDICATES: [&str; 4] = [FOAF_NAME, RDFS_LABEL, SKOS_PREF_LABEL, SKOS_ALT_LABEL];

/// Predicates that belong to a reification record
pub const REIFICATION_PREDICATES: [&str; 3] = [RDF_SUBJECT, RDF_PREDICATE, RDF_OBJECT];
