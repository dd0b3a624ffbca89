use serde::{Deserialize, Serialize};

use crate::classification::code::OccupationCode;

/// Upper bound on candidates per result set. An occupation classification
/// yields at most a few strong matches; more means low-precision output.
pub const MAX_CANDIDATES: usize = 3;
pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_EXPLANATION_CHARS: usize = 1000;

/// One proposed classification emitted by the agent, after shape validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCandidate {
    pub occupation_code: OccupationCode,
    pub occupation_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ClassificationCandidate {
    pub fn occupation_link(&self) -> String {
        self.occupation_code.link()
    }
}

/// Ordered candidates (0..=MAX_CANDIDATES) plus the agent's overall rationale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResultSet {
    pub job_classifications: Vec<ClassificationCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_explanation: Option<String>,
}

impl ClassificationResultSet {
    pub fn is_empty(&self) -> bool {
        self.job_classifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.job_classifications.len()
    }
}
