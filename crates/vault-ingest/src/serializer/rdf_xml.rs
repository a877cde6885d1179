//! Pretty-printed RDF/XML for the OAI-ORE resource map
//!
//! A subject whose types include one of [`PRETTY_TYPES`] is written as a typed
//! node element, the first matching type in list order winning. Blank nodes
//! referenced exactly once are nested inside the property that refers to them.

use crate::error::{IngestError, Result};
use crate::mapping::OreGraph;
use crate::rdf::{compact, rdf_type, Graph, Term};
use crate::serializer::XmlOutput;

const ARTIFACT: &str = "oai-ore.rdf";

pub const PRETTY_TYPES: &[&str] = &[
    "http://www.openarchives.org/ore/terms/AggregatedResource",
    "http://www.openarchives.org/ore/terms/Aggregation",
    "http://www.openarchives.org/ore/terms/ResourceMap",
];

pub fn to_rdf_xml(ore: &OreGraph) -> Result<Vec<u8>> {
    let graph = &ore.graph;
    let mut out = XmlOutput::new(ARTIFACT)?;

    let declarations: Vec<(String, &str)> = crate::rdf::PREFIXES
        .iter()
        .map(|(prefix, namespace)| (format!("xmlns:{}", prefix), *namespace))
        .collect();
    let attributes: Vec<(&str, &str)> = declarations.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    out.start("rdf:RDF", &attributes)?;

    for subject in graph.subjects() {
        if !is_nested(graph, subject) {
            write_node(&mut out, graph, subject)?;
        }
    }

    out.end("rdf:RDF")?;
    Ok(out.finish())
}

fn is_nested(graph: &Graph, term: &Term) -> bool {
    matches!(term, Term::Blank(_)) && graph.references_to(term) == 1
}

fn qualified_name(iri: &str) -> Result<String> {
    compact(iri)
        .map(|(prefix, local)| format!("{}:{}", prefix, local))
        .ok_or_else(|| IngestError::serialization(ARTIFACT, format!("no prefix for <{}>", iri)))
}

fn write_node(out: &mut XmlOutput, graph: &Graph, subject: &Term) -> Result<()> {
    let types = graph.types_of(subject);
    let pretty_type = PRETTY_TYPES.iter().copied().find(|t| types.contains(t));
    let element = match pretty_type {
        Some(t) => qualified_name(t)?,
        None => "rdf:Description".to_string(),
    };

    let mut attributes: Vec<(&str, &str)> = Vec::new();
    match subject {
        Term::Iri(iri) => attributes.push(("rdf:about", iri.as_str())),
        Term::Blank(label) if !is_nested(graph, subject) => attributes.push(("rdf:nodeID", label.as_str())),
        _ => {},
    }

    let rdf_type = rdf_type();
    let properties: Vec<_> = graph
        .statements_about(subject)
        .filter(|t| !(t.predicate == rdf_type && matches!(&t.object, Term::Iri(o) if Some(o.as_str()) == pretty_type)))
        .collect();

    if properties.is_empty() {
        return out.empty(&element, &attributes);
    }

    out.start(&element, &attributes)?;
    for triple in properties {
        let property = qualified_name(&triple.predicate)?;
        match &triple.object {
            Term::Iri(iri) => out.empty(&property, &[("rdf:resource", iri.as_str())])?,
            Term::Blank(_) if is_nested(graph, &triple.object) => {
                out.start(&property, &[])?;
                write_node(out, graph, &triple.object)?;
                out.end(&property)?;
            },
            Term::Blank(label) => out.empty(&property, &[("rdf:nodeID", label.as_str())])?,
            Term::Literal(literal) => match &literal.datatype {
                Some(datatype) => out.text_element(&property, &[("rdf:datatype", datatype.as_str())], &literal.value)?,
                None => out.text_element(&property, &[], &literal.value)?,
            },
        }
    }
    out.end(&element)
}
