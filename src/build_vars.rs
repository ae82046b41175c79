//! Build-time variable table.
//!
//! Image builds bake a `KEY=VALUE` file next to the binary. It is parsed once
//! at startup and served read-only for the lifetime of the process.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Default location, relative to the working directory.
pub const DEFAULT_PATH: &str = "./build-time-envs";

#[derive(Debug, Error)]
pub enum BuildVarsError {
    #[error("failed to open build vars file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read build vars file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable name -> value mapping loaded from the build vars file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildVariableTable {
    vars: HashMap<String, String>,
}

impl BuildVariableTable {
    /// An empty table, used when the file is missing and the policy allows it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from `path`.
    pub fn load(path: &Path) -> Result<Self, BuildVarsError> {
        let file = File::open(path).map_err(|source| BuildVarsError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_reader(BufReader::new(file)).map_err(|source| {
            BuildVarsError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        debug!(path = %path.display(), count = table.len(), "loaded build vars");
        Ok(table)
    }

    /// Parse `KEY=VALUE` lines. The first `=` splits; lines without one are
    /// skipped. Bytes that are not UTF-8 are replaced rather than rejected.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut vars = HashMap::new();

        for line in reader.split(b'\n') {
            let line = line?;
            let line = line.strip_suffix(b"\r").unwrap_or(&line);

            if let Some(eq) = line.iter().position(|&b| b == b'=') {
                let key = String::from_utf8_lossy(&line[..eq]).into_owned();
                let value = String::from_utf8_lossy(&line[eq + 1..]).into_owned();
                vars.insert(key, value);
            }
        }

        Ok(Self { vars })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Entries sorted by key.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_parse_skips_malformed_lines() {
        let table = BuildVariableTable::from_reader(Cursor::new("A=1\nB=2=3\nMALFORMED\n")).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A"), Some("1"));
        assert_eq!(table.get("B"), Some("2=3"));
        assert_eq!(table.get("MALFORMED"), None);
    }

    #[test]
    fn test_parse_keeps_empty_values_and_strips_crlf() {
        let table = BuildVariableTable::from_reader(Cursor::new("EMPTY=\r\nGIT_SHA=abc123\r\n")).unwrap();

        assert_eq!(table.get("EMPTY"), Some(""));
        assert_eq!(table.get("GIT_SHA"), Some("abc123"));
    }

    #[test]
    fn test_non_utf8_line_does_not_drop_the_table() {
        let table =
            BuildVariableTable::from_reader(Cursor::new(&b"A=1\nB=caf\xe9\nC=3\n"[..])).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("A"), Some("1"));
        assert_eq!(table.get("B"), Some("caf\u{FFFD}"));
        assert_eq!(table.get("C"), Some("3"));
    }

    #[test]
    fn test_last_assignment_wins() {
        let table = BuildVariableTable::from_reader(Cursor::new("A=1\nA=2\n")).unwrap();
        assert_eq!(table.get("A"), Some("2"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "VERSION=1.2.3").unwrap();
        writeln!(file, "# comment without assignment").unwrap();

        let table = BuildVariableTable::load(file.path()).unwrap();
        assert_eq!(table.sorted(), vec![("VERSION", "1.2.3")]);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build-time-envs");

        let err = BuildVariableTable::load(&path).unwrap_err();
        assert!(matches!(err, BuildVarsError::Open { .. }));
        assert!(err.to_string().contains("build-time-envs"));
    }
}
