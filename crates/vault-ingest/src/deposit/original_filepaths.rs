//! `original-filepaths.txt`: maps sanitized on-disk paths back to the paths
//! the depositor used.

use crate::error::Result;
use std::path::Path;

pub const ORIGINAL_FILEPATHS_FILE: &str = "original-filepaths.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalFilepaths {
    /// (physical, logical) pairs in file order
    entries: Vec<(String, String)>,
}

impl OriginalFilepaths {
    /// Read the mapping from a bag directory; a missing file yields the identity mapping
    pub fn load(bag_dir: &Path) -> Result<Self> {
        let file = bag_dir.join(ORIGINAL_FILEPATHS_FILE);
        if !file.is_file() {
            return Ok(Self::default());
        }
        Ok(Self::parse(&std::fs::read_to_string(file)?))
    }

    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                line.split_once(char::is_whitespace)
                    .map(|(physical, logical)| (physical.to_string(), logical.trim().to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn physical_path<'a>(&'a self, logical: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(_, l)| l == logical)
            .map(|(p, _)| p.as_str())
            .unwrap_or(logical)
    }

    pub fn logical_path<'a>(&'a self, physical: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(p, _)| p == physical)
            .map(|(_, l)| l.as_str())
            .unwrap_or(physical)
    }
}
