//! Occupation descriptions: optional second reference file, keyed by occupation code.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::classification::code::OccupationCode;
use crate::reference::{read_jsonl, ReferenceError};

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionRecord {
    pub occupation_code: OccupationCode,
    pub occupation_description: String,
}

#[derive(Debug, Default)]
pub struct DescriptionTable {
    by_code: HashMap<OccupationCode, String>,
}

impl DescriptionTable {
    pub fn from_records(records: Vec<DescriptionRecord>) -> Self {
        let mut by_code = HashMap::with_capacity(records.len());
        for record in records {
            by_code
                .entry(record.occupation_code)
                .or_insert(record.occupation_description);
        }
        Self { by_code }
    }

    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let records = read_jsonl::<DescriptionRecord, _>(BufReader::new(file))?;
        let table = Self::from_records(records);
        info!(path = %path.display(), entries = table.len(), "Occupation descriptions loaded");
        Ok(table)
    }

    /// Loads the file if it exists. A missing file disables descriptions
    /// rather than failing startup; a malformed one is still an error.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, ReferenceError> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Occupation descriptions file not found; descriptions disabled"
            );
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn get(&self, code: &OccupationCode) -> Option<&str> {
        self.by_code.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }
}
