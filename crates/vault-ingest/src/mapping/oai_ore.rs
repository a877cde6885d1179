//! OAI-ORE resource map describing the dataset version and its files

use crate::deposit::{Deposit, PayloadFile};
use crate::mapping::author::Author;
use crate::mapping::citation::{CitationFields, SpatialCoverage};
use crate::rdf::{ns, Graph, Term};
use tracing::warn;

pub const VAULT_SERVICE_NAME: &str = "DANS Vault Service";

/// The resource map graph plus the two nodes serializers anchor on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OreGraph {
    pub graph: Graph,
    pub resource_map: Term,
    pub aggregation: Term,
}

fn iri(namespace: &str, local: &str) -> String {
    format!("{}{}", namespace, local)
}

pub fn build(deposit: &Deposit, fields: &CitationFields) -> OreGraph {
    let mut graph = Graph::new();
    let resource_map = Term::iri(format!("urn:uuid:{}", deposit.id));
    let aggregation = Term::iri(deposit.nbn.clone());

    graph.add_type(&resource_map, &iri(ns::ORE, "ResourceMap"));
    graph.add(
        &resource_map,
        iri(ns::DCTERMS, "modified"),
        Term::literal(deposit.creation_timestamp.to_rfc3339()),
    );
    let creator = graph.new_blank();
    graph.add(&resource_map, iri(ns::DCTERMS, "creator"), creator.clone());
    graph.add(&creator, iri(ns::FOAF, "name"), Term::literal(VAULT_SERVICE_NAME));
    graph.add(&resource_map, iri(ns::ORE, "describes"), aggregation.clone());

    graph.add_type(&aggregation, &iri(ns::ORE, "Aggregation"));
    add_citation(&mut graph, &aggregation, fields);
    add_vault_metadata(&mut graph, &aggregation, deposit);

    for file in &deposit.payload_files {
        let resource = Term::iri(format!("urn:uuid:{}", file.id));
        graph.add(&aggregation, iri(ns::ORE, "aggregates"), resource.clone());
        add_file(&mut graph, &resource, file);
    }

    OreGraph {
        graph,
        resource_map,
        aggregation,
    }
}

fn add_citation(graph: &mut Graph, aggregation: &Term, fields: &CitationFields) {
    let literal = |graph: &mut Graph, predicate: String, value: &str| {
        graph.add(aggregation, predicate, Term::literal(value));
    };

    literal(graph, iri(ns::DCTERMS, "title"), &fields.title);
    for title in &fields.alternative_titles {
        literal(graph, iri(ns::CIT, "alternativeTitle"), title);
    }
    for other_id in &fields.other_ids {
        compound(
            graph,
            aggregation,
            "otherId",
            &[
                ("otherIdAgency", other_id.agency.as_ref()),
                ("otherIdValue", Some(&other_id.value)),
            ],
        );
    }
    for author in &fields.creators {
        add_author(graph, aggregation, author);
    }
    for description in &fields.descriptions {
        compound(graph, aggregation, "dsDescription", &[("dsDescriptionValue", Some(description))]);
    }
    for subject in &fields.subjects {
        literal(graph, iri(ns::CIT, "subject"), subject);
    }
    for keyword in &fields.keywords {
        compound(graph, aggregation, "keyword", &[("keywordValue", Some(keyword))]);
    }
    for publication in &fields.publications {
        compound(
            graph,
            aggregation,
            "publication",
            &[
                ("publicationIDType", Some(&publication.id_type)),
                ("publicationIDNumber", Some(&publication.id_number)),
            ],
        );
    }
    for language in &fields.languages {
        literal(graph, iri(ns::DCTERMS, "language"), language);
    }
    if let Some(date) = &fields.production_date {
        literal(graph, iri(ns::CIT, "productionDate"), date);
    }
    if let Some(date) = &fields.distribution_date {
        literal(graph, iri(ns::CIT, "distributionDate"), date);
    }
    for contributor in &fields.contributors {
        compound(
            graph,
            aggregation,
            "contributor",
            &[
                ("contributorName", Some(&contributor.name)),
                ("contributorType", contributor.role.as_ref()),
            ],
        );
    }
    for information in &fields.series {
        compound(graph, aggregation, "series", &[("seriesInformation", Some(information))]);
    }
    for holder in &fields.rights_holders {
        literal(graph, iri(ns::DCTERMS, "rightsHolder"), holder);
    }
    if let Some(license) = &fields.license {
        let object = if license.starts_with("http://") || license.starts_with("https://") {
            Term::iri(license.clone())
        } else {
            Term::literal(license.clone())
        };
        graph.add(aggregation, iri(ns::DCTERMS, "license"), object);
    }
    for source in &fields.sources {
        literal(graph, iri(ns::DC, "source"), source);
    }
    for coverage in &fields.spatial_coverage {
        match coverage {
            SpatialCoverage::Controlled(term) => {
                literal(graph, iri(ns::DANS_TEMPORAL_SPATIAL, "dansSpatialCoverageControlled"), term)
            },
            SpatialCoverage::Uncontrolled(text) => {
                literal(graph, iri(ns::DANS_TEMPORAL_SPATIAL, "dansSpatialCoverageText"), text)
            },
        }
    }
}

fn add_author(graph: &mut Graph, aggregation: &Term, author: &Author) {
    compound(
        graph,
        aggregation,
        "author",
        &[
            ("authorName", Some(&author.name)),
            ("authorAffiliation", author.affiliation.as_ref()),
            (
                "authorIdentifierScheme",
                author.identifier_scheme.map(str::to_string).as_ref(),
            ),
            ("authorIdentifier", author.identifier.as_ref()),
        ],
    );
}

/// A citation compound field: a blank node holding the non-empty parts
fn compound(graph: &mut Graph, subject: &Term, field: &str, parts: &[(&str, Option<&String>)]) {
    let node = graph.new_blank();
    graph.add(subject, iri(ns::CIT, field), node.clone());
    for (name, value) in parts {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            graph.add(&node, iri(ns::CIT, name), Term::literal(value.clone()));
        }
    }
}

fn add_vault_metadata(graph: &mut Graph, aggregation: &Term, deposit: &Deposit) {
    let mut vault_field = |name: &str, value: &str| {
        graph.add(aggregation, iri(ns::DANS_DV_METADATA, name), Term::literal(value));
    };

    if let Some(bag_id) = deposit.bag_id() {
        vault_field("dansBagId", bag_id);
    }
    vault_field("dansNbn", &deposit.nbn);
    if let Some(doi) = deposit.doi() {
        vault_field("dansOtherId", &doi);
    }
    if let Some(token) = deposit.sword_token() {
        vault_field("dansSwordToken", token);
    }
    if deposit.data_supplier.is_empty() {
        warn!(deposit_id = %deposit.id, "No data supplier for deposit; dansDataSupplier left out");
    } else {
        vault_field("dansDataSupplier", &deposit.data_supplier);
    }
}

fn add_file(graph: &mut Graph, resource: &Term, file: &PayloadFile) {
    graph.add_type(resource, &iri(ns::ORE, "AggregatedResource"));
    graph.add(resource, iri(ns::SCHEMA, "name"), Term::literal(file.file_name()));
    if let Some(label) = file.directory_label() {
        graph.add(resource, iri(ns::DVCORE, "directoryLabel"), Term::literal(label));
    }
    if let Some(description) = &file.description {
        graph.add(resource, iri(ns::SCHEMA, "description"), Term::literal(description.clone()));
    }
    graph.add(
        resource,
        iri(ns::DVCORE, "restricted"),
        Term::typed_literal(file.restricted.to_string(), iri(ns::XSD, "boolean")),
    );
}
