//! `deposit.properties` reader/writer
//!
//! The file uses Java properties syntax. Lines are kept as read, so a rewrite
//! only changes the entries that were set and leaves comments, unknown keys
//! and their order alone.

use crate::error::{IngestError, Result};
use chrono::{DateTime, FixedOffset};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PROPERTIES_FILE: &str = "deposit.properties";

pub const STATE_LABEL: &str = "state.label";
pub const STATE_DESCRIPTION: &str = "state.description";
pub const IDENTIFIER_URN: &str = "identifier.urn";
pub const IDENTIFIER_DOI: &str = "identifier.doi";
pub const BAG_ID: &str = "dataverse.bag-id";
pub const DATAVERSE_NBN: &str = "dataverse.nbn";
pub const SWORD_TOKEN: &str = "dataverse.sword-token";
pub const DEPOSITOR_USER_ID: &str = "depositor.userId";
pub const CREATION_TIMESTAMP: &str = "creation.timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositState {
    Published,
    Accepted,
    Rejected,
    Failed,
    Draft,
    Finalizing,
    Invalid,
    Submitted,
    Uploaded,
}

impl std::str::FromStr for DepositState {
    type Err = IngestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PUBLISHED" => Ok(DepositState::Published),
            "ACCEPTED" => Ok(DepositState::Accepted),
            "REJECTED" => Ok(DepositState::Rejected),
            "FAILED" => Ok(DepositState::Failed),
            "DRAFT" => Ok(DepositState::Draft),
            "FINALIZING" => Ok(DepositState::Finalizing),
            "INVALID" => Ok(DepositState::Invalid),
            "SUBMITTED" => Ok(DepositState::Submitted),
            "UPLOADED" => Ok(DepositState::Uploaded),
            other => Err(IngestError::invalid_deposit(format!(
                "Unknown deposit state '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DepositState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DepositState::Published => "PUBLISHED",
            DepositState::Accepted => "ACCEPTED",
            DepositState::Rejected => "REJECTED",
            DepositState::Failed => "FAILED",
            DepositState::Draft => "DRAFT",
            DepositState::Finalizing => "FINALIZING",
            DepositState::Invalid => "INVALID",
            DepositState::Submitted => "SUBMITTED",
            DepositState::Uploaded => "UPLOADED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String },
    /// Comment or blank line, kept verbatim
    Verbatim(String),
}

#[derive(Debug, Clone)]
pub struct DepositProperties {
    path: PathBuf,
    lines: Vec<Line>,
}

impl DepositProperties {
    /// Read `deposit.properties` from a deposit directory
    pub fn load(deposit_dir: &Path) -> Result<Self> {
        let path = deposit_dir.join(PROPERTIES_FILE);
        if !path.is_file() {
            return Err(IngestError::invalid_deposit(format!(
                "No {} found in deposit {}",
                PROPERTIES_FILE,
                deposit_dir.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Self::parse(path, &content))
    }

    pub fn parse(path: PathBuf, content: &str) -> Self {
        let mut lines = Vec::new();
        let mut physical = content.lines().map(|l| l.trim_end_matches('\r'));

        while let Some(first) = physical.next() {
            let trimmed = first.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                lines.push(Line::Verbatim(first.to_string()));
                continue;
            }

            let mut logical = trimmed.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match physical.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            lines.push(Line::Entry { key, value });
        }

        Self { path, lines }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Non-blank value for `key`
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let existing = self.lines.iter_mut().rev().find_map(|line| match line {
            Line::Entry { key: k, value: v } if k == key => Some(v),
            _ => None,
        });
        match existing {
            Some(v) => *v = value,
            None => self.lines.push(Line::Entry {
                key: key.to_string(),
                value,
            }),
        }
    }

    pub fn state(&self) -> Option<DepositState> {
        self.get(STATE_LABEL).and_then(|s| s.parse().ok())
    }

    pub fn set_state(&mut self, state: DepositState, description: impl Into<String>) {
        self.set(STATE_LABEL, state.to_string());
        self.set(STATE_DESCRIPTION, description);
    }

    pub fn state_description(&self) -> Option<&str> {
        self.get(STATE_DESCRIPTION)
    }

    pub fn bag_id(&self) -> Option<&str> {
        self.get_non_blank(BAG_ID)
    }

    pub fn depositor_id(&self) -> Option<&str> {
        self.get_non_blank(DEPOSITOR_USER_ID)
    }

    pub fn sword_token(&self) -> Option<&str> {
        self.get_non_blank(SWORD_TOKEN)
    }

    pub fn doi(&self) -> Option<&str> {
        self.get_non_blank(IDENTIFIER_DOI)
    }

    pub fn urn(&self) -> Option<&str> {
        self.get_non_blank(IDENTIFIER_URN)
    }

    pub fn creation_timestamp(&self) -> Result<DateTime<FixedOffset>> {
        let raw = self.get_non_blank(CREATION_TIMESTAMP).ok_or_else(|| {
            IngestError::invalid_deposit(format!("Missing {} in {}", CREATION_TIMESTAMP, PROPERTIES_FILE))
        })?;
        DateTime::parse_from_rfc3339(raw).map_err(|e| {
            IngestError::invalid_deposit(format!(
                "Invalid {} '{}' in {}: {}",
                CREATION_TIMESTAMP, raw, PROPERTIES_FILE, e
            ))
        })
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { key, value } => {
                    out.push_str(&escape(key, true));
                    out.push('=');
                    out.push_str(&escape(value, false));
                },
                Line::Verbatim(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }

    /// Write the properties back through a temporary file in the same directory
    pub fn save(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(self.to_text().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| IngestError::Io(e.error))?;
        Ok(())
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' => {
                key_end = i;
                break;
            },
            _ => {},
        }
    }

    let key = unescape(&line[..key_end]);
    let mut rest = line[key_end..].trim_start_matches([' ', '\t']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t']);
    }
    (key, unescape(rest))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            },
            Some(other) => out.push(other),
            None => {},
        }
    }
    out
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            },
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '#' | '!' if i == 0 => {
                out.push('\\');
                out.push(c);
            },
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# written by the deposit service\r\n\
state.label = SUBMITTED\r\n\
depositor.userId: user001\n\
creation.timestamp=2023-08-16T10:40:31.000+02:00\n\
custom.key=first \\\n    second\n";

    #[test]
    fn test_parse_java_properties_syntax() {
        let props = DepositProperties::parse(PathBuf::from("/d/deposit.properties"), SAMPLE);
        assert_eq!(props.state(), Some(DepositState::Submitted));
        assert_eq!(props.depositor_id(), Some("user001"));
        assert_eq!(props.get("custom.key"), Some("first second"));
        assert_eq!(
            props.creation_timestamp().unwrap().to_rfc3339(),
            "2023-08-16T10:40:31+02:00"
        );
    }

    #[test]
    fn test_rewrite_keeps_comments_and_order() {
        let mut props = DepositProperties::parse(PathBuf::from("/d/deposit.properties"), SAMPLE);
        props.set_state(DepositState::Rejected, "Bag was not valid.\n- [1.2.3] missing file");
        props.set(IDENTIFIER_URN, "urn:nbn:nl:ui:13-x");

        let text = props.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# written by the deposit service");
        assert_eq!(lines[1], "state.label=REJECTED");
        assert_eq!(lines[2], "depositor.userId=user001");
        assert_eq!(lines[5], "state.description=Bag was not valid.\\n- [1.2.3] missing file");
        assert_eq!(lines[6], "identifier.urn=urn:nbn:nl:ui:13-x");

        let reparsed = DepositProperties::parse(PathBuf::from("/d/deposit.properties"), &text);
        assert_eq!(
            reparsed.state_description(),
            Some("Bag was not valid.\n- [1.2.3] missing file")
        );
    }

    #[test]
    fn test_save_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROPERTIES_FILE), "state.label=SUBMITTED\n").unwrap();

        let mut props = DepositProperties::load(dir.path()).unwrap();
        props.set_state(DepositState::Accepted, "Deposit accepted");
        props.save().unwrap();

        let reloaded = DepositProperties::load(dir.path()).unwrap();
        assert_eq!(reloaded.state(), Some(DepositState::Accepted));
        assert_eq!(reloaded.state_description(), Some("Deposit accepted"));
    }

    #[test]
    fn test_missing_or_invalid_timestamp_rejects() {
        let props = DepositProperties::parse(PathBuf::from("p"), "creation.timestamp=yesterday\n");
        assert!(props.creation_timestamp().unwrap_err().is_rejection());
        let props = DepositProperties::parse(PathBuf::from("p"), "");
        assert!(props.creation_timestamp().unwrap_err().is_rejection());
    }

    #[test]
    fn test_missing_properties_file_rejects() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DepositProperties::load(dir.path()).unwrap_err().is_rejection());
    }
}
