//! Reference Table: the authoritative set of O*NET occupations.
//!
//! Loaded once at startup from the JSONL file produced by the data-prep
//! pipeline, then shared read-only (behind `Arc`) for the life of the process.
//! Every lookup the reconciler needs is a single `HashMap` lookup.

pub mod descriptions;
pub mod handlers;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::classification::code::OccupationCode;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One taxonomy occupation with its career cluster/pathway labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub occupation_code: OccupationCode,
    pub occupation_title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub career_cluster: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub career_pathway: Vec<String>,
}

/// The pipeline writes `null` for occupations without a cluster/pathway.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Indexed, immutable lookup over `ReferenceEntry` rows.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
    by_code: HashMap<OccupationCode, usize>,
    by_title: HashMap<String, usize>,
}

impl ReferenceTable {
    /// Builds the indexes. When a code or title repeats, the first row wins.
    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Self {
        let mut table = ReferenceTable {
            entries: Vec::with_capacity(entries.len()),
            by_code: HashMap::with_capacity(entries.len()),
            by_title: HashMap::with_capacity(entries.len()),
        };

        for entry in entries {
            if table.by_code.contains_key(&entry.occupation_code) {
                warn!(
                    code = %entry.occupation_code,
                    "Duplicate occupation code in reference table; keeping first row"
                );
                continue;
            }

            let idx = table.entries.len();
            table.by_code.insert(entry.occupation_code.clone(), idx);
            if table.by_title.contains_key(&entry.occupation_title) {
                warn!(
                    title = %entry.occupation_title,
                    code = %entry.occupation_code,
                    "Duplicate occupation title in reference table; title lookups resolve to first row"
                );
            } else {
                table.by_title.insert(entry.occupation_title.clone(), idx);
            }
            table.entries.push(entry);
        }

        table
    }

    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = read_jsonl::<ReferenceEntry, _>(BufReader::new(file))?;
        let table = Self::from_entries(entries);
        info!(
            path = %path.display(),
            entries = table.len(),
            "Reference table loaded"
        );
        Ok(table)
    }

    pub fn by_code(&self, code: &OccupationCode) -> Option<&ReferenceEntry> {
        self.by_code.get(code).map(|&i| &self.entries[i])
    }

    pub fn by_title(&self, title: &str) -> Option<&ReferenceEntry> {
        self.by_title.get(title).map(|&i| &self.entries[i])
    }

    /// True when `code` exists and its entry carries exactly `title`.
    pub fn contains_pair(&self, code: &OccupationCode, title: &str) -> bool {
        self.by_code(code)
            .is_some_and(|entry| entry.occupation_title == title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads one JSON record per line, skipping blank lines. Line numbers in
/// errors are 1-based.
pub fn read_jsonl<T, R>(reader: R) -> Result<Vec<T>, ReferenceError>
where
    T: serde::de::DeserializeOwned,
    R: BufRead,
{
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| ReferenceError::Read {
            line: line_no,
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| ReferenceError::Record {
            line: line_no,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
