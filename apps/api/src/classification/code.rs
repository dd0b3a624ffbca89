//! O*NET-SOC occupation code: `NN-NNNN.NN`, validated once at construction.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const OCCUPATION_LINK_BASE: &str = "https://www.onetonline.org/link/summary/";

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}-\d{4}\.\d{2}$").expect("occupation code pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid O*NET-SOC code (expected NN-NNNN.NN)")]
pub struct InvalidOccupationCode(pub String);

/// A validated occupation code. Can only be built through `parse`/`FromStr`,
/// so holding one means the pattern has already been checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OccupationCode(String);

impl OccupationCode {
    pub fn parse(raw: &str) -> Result<Self, InvalidOccupationCode> {
        // `\d` is Unicode-aware in `regex`; restrict to ASCII digits explicitly.
        if CODE_PATTERN.is_match(raw) && raw.is_ascii() {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidOccupationCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public O*NET OnLine summary page for this occupation. Pure string
    /// substitution; the link is not checked for existence.
    pub fn link(&self) -> String {
        format!("{OCCUPATION_LINK_BASE}{}", self.0)
    }
}

impl FromStr for OccupationCode {
    type Err = InvalidOccupationCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OccupationCode {
    type Error = InvalidOccupationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OccupationCode> for String {
    fn from(code: OccupationCode) -> Self {
        code.0
    }
}

impl fmt::Display for OccupationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
