//! Minimal RDF graph model
//!
//! Triples keep insertion order and blank nodes get sequential labels, so a
//! graph built by the same code from the same input always serializes to the
//! same bytes.

use std::collections::{HashMap, HashSet};

pub mod ns {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const ORE: &str = "http://www.openarchives.org/ore/terms/";
    pub const DCTERMS: &str = "http://purl.org/dc/terms/";
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    pub const CIT: &str = "https://dataverse.org/schema/citation/";
    pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
    pub const SCHEMA: &str = "http://schema.org/";
    pub const DATACITE: &str = "http://purl.org/spar/datacite/";
    pub const DVCORE: &str = "https://dataverse.org/schema/core#";
    pub const DANS_DV_METADATA: &str = "https://dar.dans.knaw.nl/schema/dansDVMetadata#";
    pub const DANS_TEMPORAL_SPATIAL: &str = "https://dar.dans.knaw.nl/schema/dansTemporalSpatial#";
}

/// Prefix bindings used by both serializations, in output order
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", ns::RDF),
    ("ore", ns::ORE),
    ("dcterms", ns::DCTERMS),
    ("dc", ns::DC),
    ("cit", ns::CIT),
    ("foaf", ns::FOAF),
    ("schema", ns::SCHEMA),
    ("datacite", ns::DATACITE),
    ("dvcore", ns::DVCORE),
    ("dansDVMetadata", ns::DANS_DV_METADATA),
    ("dansTemporalSpatial", ns::DANS_TEMPORAL_SPATIAL),
    ("xsd", ns::XSD),
];

pub fn rdf_type() -> String {
    format!("{}type", ns::RDF)
}

/// Split an IRI into a known prefix and a local name
pub fn compact(iri: &str) -> Option<(&'static str, &str)> {
    PREFIXES
        .iter()
        .filter_map(|(prefix, namespace)| iri.strip_prefix(namespace).map(|local| (*prefix, local)))
        .filter(|(_, local)| is_local_name(local))
        .max_by_key(|(prefix, _)| {
            PREFIXES
                .iter()
                .find(|(p, _)| p == prefix)
                .map(|(_, n)| n.len())
                .unwrap_or(0)
        })
}

fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: None,
        })
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
        })
    }

    pub fn is_resource(&self) -> bool {
        !matches!(self, Term::Literal(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    /// Positions in `triples` per subject
    by_subject: HashMap<Term, Vec<usize>>,
    /// Subjects in order of first appearance
    subjects: Vec<Term>,
    /// Number of triples per object term
    object_counts: HashMap<Term, usize>,
    blank_nodes: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh blank node, labelled `b0`, `b1`, ... in creation order
    pub fn new_blank(&mut self) -> Term {
        let label = format!("b{}", self.blank_nodes);
        self.blank_nodes += 1;
        Term::Blank(label)
    }

    /// Add a triple unless it is already present
    pub fn add(&mut self, subject: &Term, predicate: impl Into<String>, object: Term) {
        let triple = Triple {
            subject: subject.clone(),
            predicate: predicate.into(),
            object,
        };
        if self.seen.contains(&triple) {
            return;
        }

        let position = self.triples.len();
        match self.by_subject.get_mut(subject) {
            Some(positions) => positions.push(position),
            None => {
                self.by_subject.insert(subject.clone(), vec![position]);
                self.subjects.push(subject.clone());
            },
        }
        *self.object_counts.entry(triple.object.clone()).or_insert(0) += 1;
        self.seen.insert(triple.clone());
        self.triples.push(triple);
    }

    pub fn add_type(&mut self, subject: &Term, class: &str) {
        self.add(subject, rdf_type(), Term::iri(class));
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Distinct subjects in order of first appearance
    pub fn subjects(&self) -> Vec<&Term> {
        self.subjects.iter().collect()
    }

    /// Triples about `subject`, in insertion order
    pub fn statements_about<'a>(&'a self, subject: &Term) -> impl Iterator<Item = &'a Triple> + 'a {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .map(move |&position| &self.triples[position])
    }

    pub fn types_of<'a>(&'a self, subject: &Term) -> Vec<&'a str> {
        let rdf_type = rdf_type();
        self.statements_about(subject)
            .filter(|t| t.predicate == rdf_type)
            .filter_map(|t| match &t.object {
                Term::Iri(iri) => Some(iri.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of triples that have `term` as object
    pub fn references_to(&self, term: &Term) -> usize {
        self.object_counts.get(term).copied().unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_prefers_longest_namespace() {
        assert_eq!(compact("http://purl.org/dc/terms/title"), Some(("dcterms", "title")));
        assert_eq!(compact("http://purl.org/dc/elements/1.1/source"), Some(("dc", "source")));
        assert_eq!(compact("https://dataverse.org/schema/core#restricted"), Some(("dvcore", "restricted")));
        assert_eq!(compact("http://example.org/x"), None);
        assert_eq!(compact("http://purl.org/dc/terms/1bad"), None);
    }

    #[test]
    fn test_graph_deduplicates_and_orders() {
        let mut graph = Graph::new();
        let s = Term::iri("urn:s");
        let b = graph.new_blank();
        graph.add(&s, format!("{}creator", ns::DCTERMS), b.clone());
        graph.add(&b, format!("{}name", ns::FOAF), Term::literal("x"));
        graph.add(&s, format!("{}creator", ns::DCTERMS), b.clone());
        graph.add_type(&s, &format!("{}Aggregation", ns::ORE));

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.subjects(), vec![&s, &b]);
        assert_eq!(graph.references_to(&b), 1);
        assert_eq!(graph.types_of(&s), vec!["http://www.openarchives.org/ore/terms/Aggregation"]);
        assert_eq!(b, Term::Blank("b0".to_string()));
    }

    #[test]
    fn test_large_graph_lookups() {
        let mut graph = Graph::new();
        let aggregation = Term::iri("urn:uuid:aggregation");
        let count = 20_000;
        let start = std::time::Instant::now();
        for i in 0..count {
            let file = Term::iri(format!("urn:uuid:file-{}", i));
            graph.add(&aggregation, format!("{}aggregates", ns::ORE), file.clone());
            graph.add_type(&file, &format!("{}AggregatedResource", ns::ORE));
            graph.add(&file, format!("{}name", ns::SCHEMA), Term::literal(format!("file-{}.txt", i)));
            graph.add(&file, format!("{}name", ns::SCHEMA), Term::literal(format!("file-{}.txt", i)));
        }
        let subjects = graph.subjects();
        let mut statements = 0;
        for subject in &subjects {
            statements += graph.statements_about(subject).count();
            assert!(graph.references_to(subject) <= 1);
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(10));

        assert_eq!(graph.len(), 3 * count);
        assert_eq!(statements, graph.len());
        assert_eq!(subjects.len(), count + 1);
        assert_eq!(subjects[0], &aggregation);
        assert_eq!(graph.references_to(&Term::iri("urn:uuid:file-7")), 1);
        assert_eq!(graph.types_of(&Term::iri("urn:uuid:file-7")).len(), 1);
        assert_eq!(graph.statements_about(&Term::iri("urn:uuid:absent")).count(), 0);
    }
}
