//! Metadata derived from a deposit
//!
//! [`MetadataMapper::map`] is a pure function of the deposit and the loaded
//! vocabularies: the same deposit always maps to the same DataCite resource,
//! ORE graph and PID mapping.

pub mod author;
pub mod citation;
pub mod datacite;
pub mod oai_ore;
pub mod pid_mapping;
pub mod rules;

pub use citation::CitationFields;
pub use datacite::DataciteResource;
pub use oai_ore::OreGraph;
pub use pid_mapping::PidMapping;

use crate::deposit::Deposit;
use crate::vocabulary::{CountryTerms, LanguageResolver};
use rules::{Ruleset, DDM_RULES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedMetadata {
    pub datacite: DataciteResource,
    pub ore: OreGraph,
    pub pid_mapping: PidMapping,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataMapper {
    languages: LanguageResolver,
    countries: CountryTerms,
    datastation: String,
}

impl MetadataMapper {
    pub fn new(languages: LanguageResolver, countries: CountryTerms, datastation: impl Into<String>) -> Self {
        Self {
            languages,
            countries,
            datastation: datastation.into(),
        }
    }

    pub fn citation_fields(&self, deposit: &Deposit) -> CitationFields {
        let rules = Ruleset::new(DDM_RULES, &deposit.dataset_xml);
        let mut fields = CitationFields::extract(&rules, &self.languages, &self.countries);
        fields.add_organizational_identifier(deposit.bag.info_values(citation::HAS_ORGANIZATIONAL_IDENTIFIER));
        fields
    }

    pub fn map(&self, deposit: &Deposit) -> MappedMetadata {
        let fields = self.citation_fields(deposit);
        MappedMetadata {
            datacite: DataciteResource::build(deposit, &fields, &self.datastation),
            ore: oai_ore::build(deposit, &fields),
            pid_mapping: PidMapping::for_deposit(deposit),
        }
    }
}
