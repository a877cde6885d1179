//! DataCite kernel-4 resource for a deposit

use crate::deposit::Deposit;
use crate::mapping::author::Author;
use crate::mapping::citation::CitationFields;
use chrono::Datelike;

pub const RESOURCE_TYPE_GENERAL: &str = "Dataset";

const CONTRIBUTOR_TYPES: &[&str] = &[
    "ContactPerson",
    "DataCollector",
    "DataCurator",
    "DataManager",
    "Distributor",
    "Editor",
    "HostingInstitution",
    "Producer",
    "ProjectLeader",
    "ProjectManager",
    "ProjectMember",
    "RegistrationAgency",
    "RegistrationAuthority",
    "RelatedPerson",
    "Researcher",
    "ResearchGroup",
    "RightsHolder",
    "Sponsor",
    "Supervisor",
    "WorkPackageLeader",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub value: String,
    /// `DOI` or `URN`
    pub identifier_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIdentifier {
    pub scheme: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub name: String,
    pub is_organization: bool,
    pub name_identifier: Option<NameIdentifier>,
    pub affiliation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub name: String,
    pub contributor_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub value: String,
    pub title_type: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Date {
    pub value: String,
    pub date_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateIdentifier {
    pub value: String,
    pub identifier_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataciteResource {
    pub identifier: Identifier,
    pub creators: Vec<Creator>,
    pub titles: Vec<Title>,
    pub publisher: String,
    pub publication_year: String,
    pub resource_type: String,
    pub subjects: Vec<String>,
    pub contributors: Vec<Contributor>,
    pub dates: Vec<Date>,
    pub language: Option<String>,
    pub alternate_identifiers: Vec<AlternateIdentifier>,
    pub rights: Vec<String>,
    pub descriptions: Vec<String>,
}

impl DataciteResource {
    pub fn build(deposit: &Deposit, fields: &CitationFields, datastation: &str) -> Self {
        let doi = deposit.doi();

        let identifier = match &doi {
            Some(doi) => Identifier {
                value: doi.clone(),
                identifier_type: "DOI",
            },
            None => Identifier {
                value: deposit.nbn.clone(),
                identifier_type: "URN",
            },
        };

        let mut titles = vec![Title {
            value: fields.title.clone(),
            title_type: None,
        }];
        titles.extend(fields.alternative_titles.iter().map(|t| Title {
            value: t.clone(),
            title_type: Some("AlternativeTitle"),
        }));

        let publisher = fields
            .publisher
            .clone()
            .or_else(|| (!deposit.data_supplier.is_empty()).then(|| deposit.data_supplier.clone()))
            .unwrap_or_else(|| datastation.to_string());

        let publication_year = fields
            .distribution_date
            .as_deref()
            .and_then(year_of)
            .unwrap_or_else(|| deposit.creation_timestamp.year().to_string());

        let mut dates = Vec::new();
        if let Some(created) = &fields.production_date {
            dates.push(Date {
                value: created.clone(),
                date_type: "Created",
            });
        }
        if let Some(available) = &fields.distribution_date {
            dates.push(Date {
                value: available.clone(),
                date_type: "Available",
            });
        }

        let mut alternate_identifiers = Vec::new();
        if doi.is_some() && !deposit.nbn.is_empty() {
            alternate_identifiers.push(AlternateIdentifier {
                value: deposit.nbn.clone(),
                identifier_type: "URN",
            });
        }
        if let Some(bag_id) = deposit.bag_id() {
            alternate_identifiers.push(AlternateIdentifier {
                value: bag_id.to_string(),
                identifier_type: "URN",
            });
        }

        Self {
            identifier,
            creators: fields.creators.iter().map(creator).collect(),
            titles,
            publisher,
            publication_year,
            resource_type: RESOURCE_TYPE_GENERAL.to_string(),
            subjects: fields.keywords.clone(),
            contributors: fields.contributors.iter().map(contributor).collect(),
            dates,
            language: fields.languages.first().cloned(),
            alternate_identifiers,
            rights: fields.license.iter().cloned().collect(),
            descriptions: fields.descriptions.clone(),
        }
    }
}

fn creator(author: &Author) -> Creator {
    Creator {
        name: author.name.clone(),
        is_organization: author.is_organization,
        name_identifier: author
            .identifier_scheme
            .zip(author.identifier.clone())
            .map(|(scheme, value)| NameIdentifier { scheme, value }),
        affiliation: author.affiliation.clone(),
    }
}

fn contributor(author: &Author) -> Contributor {
    let contributor_type = author
        .role
        .as_deref()
        .and_then(|role| CONTRIBUTOR_TYPES.iter().find(|t| **t == role))
        .copied()
        .unwrap_or("Other");
    Contributor {
        name: author.name.clone(),
        contributor_type,
    }
}

fn year_of(date: &str) -> Option<String> {
    let year: String = date.trim().chars().take(4).collect();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn author(name: &str, role: Option<&str>) -> Author {
        Author {
            name: name.to_string(),
            affiliation: None,
            identifier_scheme: Some("ORCID"),
            identifier: Some("0000-0001".to_string()),
            role: role.map(str::to_string),
            is_organization: false,
        }
    }

    #[test]
    fn test_contributor_type_falls_back_to_other() {
        assert_eq!(contributor(&author("A", Some("DataCurator"))).contributor_type, "DataCurator");
        assert_eq!(contributor(&author("B", Some("Excavator"))).contributor_type, "Other");
        assert_eq!(contributor(&author("C", None)).contributor_type, "Other");
    }

    #[test]
    fn test_creator_name_identifier() {
        let c = creator(&author("A", None));
        assert_eq!(
            c.name_identifier,
            Some(NameIdentifier {
                scheme: "ORCID",
                value: "0000-0001".to_string()
            })
        );
    }

    #[test]
    fn test_year_of() {
        assert_eq!(year_of("2020-01-15").as_deref(), Some("2020"));
        assert_eq!(year_of("2020"), Some("2020".to_string()));
        assert_eq!(year_of("jan 2020"), None);
    }
}
