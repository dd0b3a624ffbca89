//! Axum route handlers for the Classification API.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::classification::service::{classify_job_post, ClassifyOutcome, ClassifyRequest};
use crate::classification::timer::SubmissionTimer;
use crate::state::AppState;

/// Present on every classify response, success or error.
pub const ELAPSED_HEADER: &str = "x-elapsed-ms";

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub outcome: ClassifyOutcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct AssistantInfoResponse {
    pub assistant_id: String,
    pub agent_timeout_secs: u64,
    pub reference_entries: usize,
    pub descriptions_loaded: bool,
}

/// POST /api/v1/classify
///
/// Classifies a job post. Fatal agent-output errors come back as 422 with the
/// parse or schema detail; an empty verified set is a 200 with
/// `status: "no_classification_found"`.
pub async fn handle_classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> impl IntoResponse {
    let submission_id = Uuid::new_v4();
    let timer = SubmissionTimer::start(submission_id);

    let result = classify_job_post(&state, submission_id, &request).await;

    let elapsed_ms = timer.elapsed_ms();
    let body = result.map(|outcome| Json(ClassifyResponse {
        outcome,
        elapsed_ms,
    }));

    ([(ELAPSED_HEADER, elapsed_ms.to_string())], body)
}

/// GET /api/v1/assistant
pub async fn handle_assistant_info(State(state): State<AppState>) -> Json<AssistantInfoResponse> {
    Json(AssistantInfoResponse {
        assistant_id: state.config.assistant_id.clone(),
        agent_timeout_secs: state.config.agent_timeout.as_secs(),
        reference_entries: state.reference.len(),
        descriptions_loaded: state.descriptions.is_some(),
    })
}
