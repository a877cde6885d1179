//! Framed JSON-LD for the OAI-ORE resource map
//!
//! The resource map is the top-level node. Every other node is embedded the
//! first time it is reached and referenced by `@id` after that, and a node is
//! never embedded inside itself.

use crate::error::{IngestError, Result};
use crate::mapping::OreGraph;
use crate::rdf::{compact, ns, rdf_type, Graph, Term, PREFIXES};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

const ARTIFACT: &str = "oai-ore.jsonld";

pub const ORE_CONTEXT: &str = "https://w3id.org/ore/context";

/// ORE terms defined by the remote context, usable without a prefix
const ORE_TERMS: &[&str] = &["describes", "aggregates", "ResourceMap", "Aggregation", "AggregatedResource"];

pub fn to_json_ld(ore: &OreGraph) -> Result<Vec<u8>> {
    let prefixes: Map<String, Value> = PREFIXES
        .iter()
        .map(|(prefix, namespace)| (prefix.to_string(), Value::String(namespace.to_string())))
        .collect();

    let mut framer = Framer {
        graph: &ore.graph,
        embedded: HashSet::new(),
    };
    let Value::Object(body) = framer.node(&ore.resource_map)? else {
        return Err(IngestError::serialization(ARTIFACT, "resource map is not a node"));
    };

    let mut document = Map::new();
    document.insert("@context".to_string(), json!([ORE_CONTEXT, prefixes]));
    document.extend(body);

    let mut bytes = serde_json::to_vec_pretty(&Value::Object(document))
        .map_err(|e| IngestError::serialization(ARTIFACT, e))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn term_name(iri: &str) -> Result<String> {
    if let Some(local) = iri.strip_prefix(ns::ORE) {
        if ORE_TERMS.contains(&local) {
            return Ok(local.to_string());
        }
    }
    compact(iri)
        .map(|(prefix, local)| format!("{}:{}", prefix, local))
        .ok_or_else(|| IngestError::serialization(ARTIFACT, format!("no prefix for <{}>", iri)))
}

struct Framer<'a> {
    graph: &'a Graph,
    embedded: HashSet<&'a Term>,
}

impl<'a> Framer<'a> {
    fn node(&mut self, subject: &'a Term) -> Result<Value> {
        let graph = self.graph;
        self.embedded.insert(subject);
        let mut node = Map::new();
        if let Term::Iri(iri) = subject {
            node.insert("@id".to_string(), Value::String(iri.clone()));
        }

        let rdf_type = rdf_type();
        let types: Vec<Value> = graph
            .types_of(subject)
            .into_iter()
            .map(|t| term_name(t).map(Value::String))
            .collect::<Result<_>>()?;
        match types.len() {
            0 => {},
            1 => {
                node.insert("@type".to_string(), types[0].clone());
            },
            _ => {
                node.insert("@type".to_string(), Value::Array(types));
            },
        }

        let mut properties: Vec<(String, Vec<Value>)> = Vec::new();
        for triple in graph.statements_about(subject) {
            if triple.predicate == rdf_type {
                continue;
            }
            let value = self.object(&triple.object)?;
            let name = term_name(&triple.predicate)?;
            match properties.iter_mut().find(|(n, _)| *n == name) {
                Some((_, values)) => values.push(value),
                None => properties.push((name, vec![value])),
            }
        }
        for (name, mut values) in properties {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            node.insert(name, value);
        }

        Ok(Value::Object(node))
    }

    fn object(&mut self, object: &'a Term) -> Result<Value> {
        match object {
            Term::Literal(literal) => match &literal.datatype {
                Some(datatype) => {
                    let datatype = term_name(datatype)?;
                    Ok(json!({ "@value": literal.value, "@type": datatype }))
                },
                None => Ok(Value::String(literal.value.clone())),
            },
            Term::Iri(iri) if self.embedded.contains(object) || self.graph.statements_about(object).next().is_none() => {
                Ok(json!({ "@id": iri }))
            },
            Term::Blank(label) if self.embedded.contains(object) => Ok(json!({ "@id": format!("_:{}", label) })),
            _ => self.node(object),
        }
    }
}
