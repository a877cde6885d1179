//! Citation metadata extracted from dataset.xml
//!
//! Both the DataCite record and the OAI-ORE aggregation are built from the
//! same [`CitationFields`], so the two never disagree on a value.

use crate::mapping::author::Author;
use crate::mapping::rules::{Field, Ruleset};
use crate::vocabulary::{CountryTerms, LanguageResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpatialCoverage {
    /// A term from the country list
    Controlled(String),
    Uncontrolled(String),
}

/// Bag-info key holding `<agency>:<value>` identifiers of the depositing organization
pub const HAS_ORGANIZATIONAL_IDENTIFIER: &str = "Has-Organizational-Identifier";

/// NARCIS classification prefixes and the citation subject they fall under, longest first
const NARCIS_SUBJECTS: &[(&str, &str)] = &[
    ("D11", "Mathematical Sciences"),
    ("D12", "Physics"),
    ("D13", "Chemistry"),
    ("D14", "Engineering"),
    ("D16", "Computer and Information Science"),
    ("D17", "Astronomy and Astrophysics"),
    ("D18", "Agricultural Sciences"),
    ("D2", "Medicine, Health and Life Sciences"),
    ("D3", "Arts and Humanities"),
    ("D4", "Law"),
    ("D6", "Social Sciences"),
    ("D7", "Business and Management"),
    ("E15", "Earth and Environmental Sciences"),
];

const OTHER_SUBJECT: &str = "Other";

/// Citation subject for a `ddm:audience` code
pub fn audience_subject(code: &str) -> &'static str {
    NARCIS_SUBJECTS
        .iter()
        .find(|(prefix, _)| code.starts_with(prefix))
        .map(|(_, subject)| *subject)
        .unwrap_or(OTHER_SUBJECT)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherId {
    pub agency: Option<String>,
    pub value: String,
}

impl OtherId {
    /// The first well-formed `<agency>:<value>` among the bag-info values
    pub fn from_organizational_identifiers<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        values.into_iter().find_map(|value| {
            let (agency, id) = value.split_once(':')?;
            let (agency, id) = (agency.trim(), id.trim());
            (!agency.is_empty() && !id.is_empty()).then(|| Self {
                agency: Some(agency.to_string()),
                value: id.to_string(),
            })
        })
    }
}

/// A related publication known by its ISBN or ISSN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub id_type: String,
    pub id_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationFields {
    pub title: String,
    pub alternative_titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub creators: Vec<Author>,
    pub contributors: Vec<Author>,
    pub keywords: Vec<String>,
    /// Resolved language names; codes that do not resolve are dropped
    pub languages: Vec<String>,
    pub production_date: Option<String>,
    pub distribution_date: Option<String>,
    pub publisher: Option<String>,
    pub rights_holders: Vec<String>,
    pub license: Option<String>,
    pub sources: Vec<String>,
    pub spatial_coverage: Vec<SpatialCoverage>,
    /// Subjects derived from the audience codes, without duplicates
    pub subjects: Vec<String>,
    pub other_ids: Vec<OtherId>,
    pub publications: Vec<Publication>,
    /// Series information texts
    pub series: Vec<String>,
}

impl CitationFields {
    pub fn extract(rules: &Ruleset<'_>, languages: &LanguageResolver, countries: &CountryTerms) -> Self {
        let mut creators: Vec<Author> = rules
            .nodes(Field::Creator)
            .into_iter()
            .filter_map(Author::from_dai_author)
            .collect();
        creators.extend(
            rules
                .nodes(Field::CreatorOrganization)
                .into_iter()
                .filter_map(Author::from_dai_organization),
        );
        creators.extend(rules.texts(Field::CreatorName).iter().filter_map(|n| Author::from_name(n)));

        let contributors = rules
            .nodes(Field::Contributor)
            .into_iter()
            .filter_map(Author::from_dai_author)
            .collect();

        let mut resolved_languages: Vec<String> = Vec::new();
        for code in rules.texts(Field::Language) {
            let name = languages.resolve(&code);
            if !name.is_empty() && !resolved_languages.contains(&name) {
                resolved_languages.push(name);
            }
        }

        let spatial_coverage = rules
            .texts(Field::SpatialCoverage)
            .into_iter()
            .map(|value| {
                let term = countries.resolve(&value);
                if term.is_empty() {
                    SpatialCoverage::Uncontrolled(value)
                } else {
                    SpatialCoverage::Controlled(term)
                }
            })
            .collect();

        let mut subjects: Vec<String> = Vec::new();
        for code in rules.texts(Field::Audience) {
            let subject = audience_subject(&code).to_string();
            if !subjects.contains(&subject) {
                subjects.push(subject);
            }
        }

        let mut other_ids = Vec::new();
        let mut publications = Vec::new();
        for node in rules.nodes(Field::Identifier) {
            let value = node.trimmed_text();
            if value.is_empty() {
                continue;
            }
            match node.xsi_type().and_then(|t| t.rsplit(':').next()) {
                None => other_ids.push(OtherId {
                    agency: None,
                    value: value.to_string(),
                }),
                Some(kind @ ("ISBN" | "ISSN")) => publications.push(Publication {
                    id_type: kind.to_lowercase(),
                    id_number: value.to_string(),
                }),
                Some(_) => {},
            }
        }

        let series = rules
            .nodes(Field::TypedDescription)
            .into_iter()
            .filter(|node| node.attribute(None, "descriptionType") == Some("SeriesInformation"))
            .map(|node| node.trimmed_text().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        Self {
            title: rules.first_text(Field::Title).unwrap_or_default(),
            alternative_titles: rules.texts(Field::AlternativeTitle),
            descriptions: rules.texts(Field::Description),
            creators,
            contributors,
            keywords: rules.texts(Field::Keyword),
            languages: resolved_languages,
            production_date: rules.first_text(Field::ProductionDate),
            distribution_date: rules.first_text(Field::DistributionDate),
            publisher: rules.first_text(Field::Publisher),
            rights_holders: rules.texts(Field::RightsHolder),
            license: rules.first_text(Field::License),
            sources: rules.texts(Field::Source),
            spatial_coverage,
            subjects,
            other_ids,
            publications,
            series,
        }
    }

    /// Put the organizational identifier from bag-info ahead of the dataset.xml ones
    pub fn add_organizational_identifier<'a>(&mut self, values: impl IntoIterator<Item = &'a str>) {
        if let Some(id) = OtherId::from_organizational_identifiers(values) {
            self.other_ids.insert(0, id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mapping::rules::DDM_RULES;
    use crate::test_support::DATASET_XML;
    use crate::vocabulary::Vocabulary;
    use crate::xml::XmlDocument;

    #[test]
    fn test_extract_from_dataset_xml() {
        let doc = XmlDocument::parse(DATASET_XML).unwrap();
        let languages = LanguageResolver::new(Vocabulary::from_pairs([("nl", "Dutch")]), Vocabulary::default());
        let countries = CountryTerms::new(["Netherlands".to_string()]);

        let fields = CitationFields::extract(&Ruleset::new(DDM_RULES, &doc), &languages, &countries);

        assert_eq!(fields.title, "Excavation at Het Hout");
        assert_eq!(fields.creators.len(), 1);
        assert_eq!(fields.creators[0].name, "J.A. van Dam");
        assert_eq!(fields.creators[0].identifier_scheme, Some("ORCID"));
        assert_eq!(fields.creators[0].affiliation.as_deref(), Some("Leiden University"));
        assert_eq!(fields.languages, vec!["Dutch"]);
        assert_eq!(fields.production_date.as_deref(), Some("2019-06-01"));
        assert_eq!(fields.spatial_coverage, vec![SpatialCoverage::Controlled("Netherlands".to_string())]);
    }

    #[test]
    fn test_audience_codes_become_subjects() {
        assert_eq!(audience_subject("D37000"), "Arts and Humanities");
        assert_eq!(audience_subject("D16200"), "Computer and Information Science");
        assert_eq!(audience_subject("D10000"), "Other");
        assert_eq!(audience_subject("E15000"), "Earth and Environmental Sciences");

        let doc = XmlDocument::parse(DATASET_XML).unwrap();
        let fields = CitationFields::extract(
            &Ruleset::new(DDM_RULES, &doc),
            &LanguageResolver::default(),
            &CountryTerms::default(),
        );
        assert_eq!(fields.subjects, vec!["Arts and Humanities"]);
    }

    #[test]
    fn test_identifiers_split_into_other_ids_and_publications() {
        let doc = XmlDocument::parse(DATASET_XML).unwrap();
        let mut fields = CitationFields::extract(
            &Ruleset::new(DDM_RULES, &doc),
            &LanguageResolver::default(),
            &CountryTerms::default(),
        );

        assert_eq!(
            fields.publications,
            vec![Publication {
                id_type: "isbn".to_string(),
                id_number: "978-90-6984-123-4".to_string(),
            }]
        );
        assert_eq!(
            fields.other_ids,
            vec![OtherId {
                agency: None,
                value: "LEI-2019-HH".to_string(),
            }]
        );
        assert_eq!(fields.series, vec!["Leiden Archaeological Reports 12"]);

        fields.add_organizational_identifier([":no-agency", "Leiden:HH-2019", "Other:later"]);
        assert_eq!(fields.other_ids.len(), 2);
        assert_eq!(fields.other_ids[0].agency.as_deref(), Some("Leiden"));
        assert_eq!(fields.other_ids[0].value, "HH-2019");
    }

    #[test]
    fn test_malformed_organizational_identifiers_are_ignored() {
        assert_eq!(OtherId::from_organizational_identifiers(["no-colon", "agency:", " : "]), None);
    }

    #[test]
    fn test_unknown_terms() {
        let doc = XmlDocument::parse(DATASET_XML).unwrap();
        let fields = CitationFields::extract(
            &Ruleset::new(DDM_RULES, &doc),
            &LanguageResolver::default(),
            &CountryTerms::default(),
        );

        assert!(fields.languages.is_empty());
        assert_eq!(fields.spatial_coverage, vec![SpatialCoverage::Uncontrolled("Netherlands".to_string())]);
    }
}
