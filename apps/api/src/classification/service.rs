//! Classification pipeline for one submission.
//!
//! Flow: build prompt → agent (bounded wait) → schema validation →
//!       reconciliation → presentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::classification::presentation::{present, ClassificationView};
use crate::classification::prompts::{build_classify_prompt, PromptArgs};
use crate::classification::reconcile::{reconcile, CandidateOutcome};
use crate::classification::schema::parse_result_set;
use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::state::AppState;

fn default_include_explanation() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub job_post_title: String,
    #[serde(default)]
    pub job_post_description: String,
    #[serde(default = "default_include_explanation")]
    pub include_explanation: bool,
    /// Free-text steering added on resubmission ("it's a management role").
    #[serde(default)]
    pub hints: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStatus {
    Classified,
    /// Nothing survived reconciliation, or the agent found nothing. Informational.
    NoClassificationFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyOutcome {
    pub submission_id: Uuid,
    pub status: ClassificationStatus,
    pub classifications: Vec<ClassificationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_explanation: Option<String>,
    pub reconciliation: Vec<CandidateOutcome>,
    pub classified_at: DateTime<Utc>,
}

pub async fn classify_job_post(
    state: &AppState,
    submission_id: Uuid,
    request: &ClassifyRequest,
) -> Result<ClassifyOutcome, AppError> {
    if request.job_post_title.trim().is_empty() && request.job_post_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_post_title and job_post_description cannot both be empty".to_string(),
        ));
    }

    let prompt = build_classify_prompt(&PromptArgs {
        job_post_title: &request.job_post_title,
        job_post_description: &request.job_post_description,
        include_explanation: request.include_explanation,
        hints: request.hints.as_deref(),
    });

    let timeout = state.config.agent_timeout;
    let raw = tokio::time::timeout(timeout, state.agent.complete(&prompt))
        .await
        .map_err(|_| LlmError::Timeout {
            secs: timeout.as_secs(),
        })??;

    let candidates = parse_result_set(&raw)?;
    let proposed = candidates.len();

    let reconciliation = reconcile(candidates, &state.reference);
    info!(
        submission_id = %submission_id,
        proposed,
        kept = reconciliation.result_set.len(),
        repaired = reconciliation.repaired_count(),
        dropped = reconciliation.dropped_count(),
        "Classification reconciled"
    );

    let status = if reconciliation.result_set.is_empty() {
        ClassificationStatus::NoClassificationFound
    } else {
        ClassificationStatus::Classified
    };

    let classifications = present(
        &reconciliation.result_set.job_classifications,
        &state.reference,
        state.descriptions.as_deref(),
        request.include_explanation,
    );

    Ok(ClassifyOutcome {
        submission_id,
        status,
        classifications,
        overall_explanation: reconciliation.result_set.overall_explanation,
        reconciliation: reconciliation.outcomes,
        classified_at: Utc::now(),
    })
}
