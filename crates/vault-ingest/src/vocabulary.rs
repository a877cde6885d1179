//! Controlled vocabulary lookups backed by CSV tables
//!
//! Lookups are total: a term that is not in the table resolves to the empty
//! string, and the mapping leaves the corresponding field out.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

pub const ISO639_1_COLUMN: &str = "ISO639-1";
pub const ISO639_2_COLUMN: &str = "ISO639-2";
pub const LANGUAGE_COLUMN: &str = "Dataverse-language";
pub const COUNTRY_COLUMN: &str = "Dataverse-country";

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    entries: HashMap<String, String>,
}

impl Vocabulary {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Load `key_column -> value_column` from a CSV file with a header row
    pub fn from_csv(path: &Path, key_column: &str, value_column: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open vocabulary {}", path.display()))?;
        Self::from_reader(file, key_column, value_column)
            .with_context(|| format!("Failed to read vocabulary {}", path.display()))
    }

    pub fn from_reader<R: std::io::Read>(reader: R, key_column: &str, value_column: &str) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .with_context(|| format!("Missing column '{}'", name))
        };
        let key_index = column(key_column)?;
        let value_index = column(value_column)?;

        let mut entries = HashMap::new();
        for record in csv.records() {
            let record = record?;
            let key = record.get(key_index).unwrap_or_default().trim();
            let value = record.get(value_index).unwrap_or_default().trim();
            if !key.is_empty() {
                entries.insert(key.to_string(), value.to_string());
            }
        }
        Ok(Self { entries })
    }

    /// Value for `key`, empty when unknown
    pub fn resolve(&self, key: &str) -> String {
        self.entries.get(key.trim()).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Language names for ISO 639-1 and ISO 639-2 codes
#[derive(Debug, Clone, Default)]
pub struct LanguageResolver {
    iso639_1: Vocabulary,
    iso639_2: Vocabulary,
}

impl LanguageResolver {
    pub fn new(iso639_1: Vocabulary, iso639_2: Vocabulary) -> Self {
        Self { iso639_1, iso639_2 }
    }

    pub fn load(iso639_1: Option<&Path>, iso639_2: Option<&Path>) -> Result<Self> {
        let load = |path: Option<&Path>, key: &str| -> Result<Vocabulary> {
            match path {
                Some(path) => Vocabulary::from_csv(path, key, LANGUAGE_COLUMN),
                None => Ok(Vocabulary::default()),
            }
        };
        Ok(Self::new(load(iso639_1, ISO639_1_COLUMN)?, load(iso639_2, ISO639_2_COLUMN)?))
    }

    pub fn resolve(&self, code: &str) -> String {
        let name = self.iso639_1.resolve(code);
        if name.is_empty() {
            self.iso639_2.resolve(code)
        } else {
            name
        }
    }
}

/// Country names accepted as controlled spatial coverage terms
#[derive(Debug, Clone, Default)]
pub struct CountryTerms {
    terms: Vocabulary,
}

impl CountryTerms {
    pub fn new(terms: impl IntoIterator<Item = String>) -> Self {
        Self {
            terms: Vocabulary::from_pairs(terms.into_iter().map(|t| (t.clone(), t))),
        }
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self {
                terms: Vocabulary::from_csv(path, COUNTRY_COLUMN, COUNTRY_COLUMN)?,
            }),
            None => Ok(Self::default()),
        }
    }

    /// The controlled term, or empty when `value` is not a known country
    pub fn resolve(&self, value: &str) -> String {
        self.terms.resolve(value)
    }
}
