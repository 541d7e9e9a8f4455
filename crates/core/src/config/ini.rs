//! Reader for INI style configuration files
//!
//! Supports `[section]` headers (dots in a header form sub-sections),
//! `key = value` and `key: value` lines, full-line `#` and `;` comments,
//! and indented continuation lines. Keys are lower-cased. Reading more
//! files into the same document overrides earlier values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole document
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let mut document = Self::new();
        document.read_str(contents, origin)?;
        Ok(document)
    }

    /// Read `path` into this document.
    ///
    /// Returns `false` when the file does not exist or cannot be opened.
    pub fn read_file(&mut self, path: &Path) -> Result<bool> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!("Skipping config file {:?}: {}", path, e);
                return Ok(false);
            }
        };
        self.read_str(&contents, path)?;
        Ok(true)
    }

    /// Read every path in order, returning the ones actually read
    pub fn read_files(&mut self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut read = Vec::new();
        for path in paths {
            if self.read_file(path)? {
                read.push(path.clone());
            }
        }
        Ok(read)
    }

    fn read_str(&mut self, contents: &str, origin: &Path) -> Result<()> {
        let mut section: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (index, raw_line) in contents.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw_line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = raw_line.starts_with(' ') || raw_line.starts_with('\t');
            if indented {
                if let (Some(section), Some(key)) = (&section, &last_key) {
                    if let Some(value) = self
                        .sections
                        .get_mut(section)
                        .and_then(|entries| entries.get_mut(key))
                    {
                        if !value.is_empty() {
                            value.push('\n');
                        }
                        value.push_str(trimmed);
                        continue;
                    }
                }
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| Error::ParseError {
                    path: origin.to_path_buf(),
                    line: line_no,
                    message: format!("unterminated section header: {trimmed}"),
                })?;
                let name = name.trim().to_string();
                self.sections.entry(name.clone()).or_default();
                section = Some(name);
                last_key = None;
                continue;
            }

            let Some(current) = &section else {
                return Err(Error::ParseError {
                    path: origin.to_path_buf(),
                    line: line_no,
                    message: "key found before any section header".to_string(),
                });
            };

            let split_at = trimmed.find(['=', ':']).ok_or_else(|| Error::ParseError {
                path: origin.to_path_buf(),
                line: line_no,
                message: format!("expected `key = value`, found: {trimmed}"),
            })?;
            let key = trimmed[..split_at].trim().to_lowercase();
            let value = trimmed[split_at + 1..].trim().to_string();

            self.sections
                .entry(current.clone())
                .or_default()
                .insert(key.clone(), value);
            last_key = Some(key);
        }

        Ok(())
    }

    /// Section names in sorted order
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Key/value pairs of `section`
    pub fn items(&self, section: &str) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> IniDocument {
        IniDocument::parse(contents, Path::new("test.conf")).unwrap()
    }

    #[test]
    fn test_sections_and_keys() {
        let doc = parse(
            "# leading comment\n[run.output.json]\nEnabled = on\n; other\n[filter.by_tags]\ntags: fast,arch:x86_64\n",
        );
        assert_eq!(doc.get("run.output.json", "enabled"), Some("on"));
        assert_eq!(doc.get("filter.by_tags", "tags"), Some("fast,arch:x86_64"));
        assert_eq!(doc.sections().collect::<Vec<_>>(), vec!["filter.by_tags", "run.output.json"]);
    }

    #[test]
    fn test_continuation_lines() {
        let doc = parse("[kinds]\ntap = a.t,\n    b.t\n");
        assert_eq!(doc.get("kinds", "tap"), Some("a.t,\nb.t"));
    }

    #[test]
    fn test_value_may_contain_separators() {
        let doc = parse("[hint]\nuri = file:$testpath=1\n");
        assert_eq!(doc.get("hint", "uri"), Some("file:$testpath=1"));
    }

    #[test]
    fn test_later_files_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("a.conf");
        let second = dir.path().join("b.conf");
        std::fs::write(&first, "[s]\nk = 1\nonly = first\n").unwrap();
        std::fs::write(&second, "[s]\nk = 2\n").unwrap();

        let mut doc = IniDocument::new();
        let read = doc
            .read_files(&[first.clone(), dir.path().join("missing.conf"), second.clone()])
            .unwrap();
        assert_eq!(read, vec![first, second]);
        assert_eq!(doc.get("s", "k"), Some("2"));
        assert_eq!(doc.get("s", "only"), Some("first"));
    }

    #[test]
    fn test_key_without_section_is_an_error() {
        let err = IniDocument::parse("k = v\n", Path::new("x.conf")).unwrap_err();
        assert!(matches!(err, Error::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_line_without_separator_is_an_error() {
        let err = IniDocument::parse("[s]\nnot a pair\n", Path::new("x.conf")).unwrap_err();
        assert!(matches!(err, Error::ParseError { line: 2, .. }));
    }
}
