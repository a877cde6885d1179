//! Persistent identifiers of the dataset and its files
//!
//! The first entry maps the deposit to the payload root; every payload file
//! follows in files.xml order.

use crate::deposit::Deposit;
use crate::deposit::PayloadFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidMapping {
    entries: Vec<(String, String)>,
}

impl PidMapping {
    pub fn for_deposit(deposit: &Deposit) -> Self {
        Self::new(&deposit.id, &deposit.payload_files)
    }

    pub fn new(deposit_id: &str, files: &[PayloadFile]) -> Self {
        let mut entries = vec![(deposit_id.to_string(), "data/".to_string())];
        entries.extend(
            files
                .iter()
                .map(|f| (format!("file:///{}", f.id), f.logical_path.clone())),
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|(pid, path)| format!("{} {}\n", pid, path))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::deposit::files::file_id;
    use std::path::PathBuf;

    fn file(path: &str) -> PayloadFile {
        PayloadFile {
            id: file_id("dep-1", path),
            logical_path: path.to_string(),
            physical_path: PathBuf::from(path),
            description: None,
            restricted: false,
        }
    }

    #[test]
    fn test_first_line_maps_deposit_to_data() {
        let mapping = PidMapping::new("dep-1", &[file("data/a.txt"), file("data/sub/b c.txt")]);
        assert_eq!(mapping.len(), 3);

        let text = mapping.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "dep-1 data/");
        assert_eq!(lines[1], format!("file:///{} data/a.txt", file_id("dep-1", "data/a.txt")));
        assert!(lines[2].ends_with(" data/sub/b c.txt"));
        assert!(text.ends_with('\n'));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(PidMapping::new("dep-1", &[]).to_text(), "dep-1 data/\n");
    }
}
