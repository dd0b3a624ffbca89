//! Presentation Adapter: turns reconciled candidates into display records.

use serde::Serialize;

use crate::classification::code::OccupationCode;
use crate::classification::models::ClassificationCandidate;
use crate::reference::descriptions::DescriptionTable;
use crate::reference::ReferenceTable;

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationView {
    pub occupation_code: OccupationCode,
    pub occupation_title: String,
    pub occupation_link: String,
    pub career_clusters: Vec<String>,
    pub career_pathways: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

pub fn present(
    candidates: &[ClassificationCandidate],
    reference: &ReferenceTable,
    descriptions: Option<&DescriptionTable>,
    include_explanation: bool,
) -> Vec<ClassificationView> {
    candidates
        .iter()
        .map(|candidate| {
            let entry = reference.by_code(&candidate.occupation_code);
            ClassificationView {
                occupation_code: candidate.occupation_code.clone(),
                occupation_title: candidate.occupation_title.clone(),
                occupation_link: candidate.occupation_link(),
                career_clusters: entry.map(|e| e.career_cluster.clone()).unwrap_or_default(),
                career_pathways: entry.map(|e| e.career_pathway.clone()).unwrap_or_default(),
                occupation_description: descriptions
                    .and_then(|d| d.get(&candidate.occupation_code))
                    .map(String::from),
                explanation: candidate
                    .explanation
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| include_explanation && !e.is_empty())
                    .map(String::from),
            }
        })
        .collect()
}
