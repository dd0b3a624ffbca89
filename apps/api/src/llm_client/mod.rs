//! Agent Gateway: the single point of entry for all hosted-assistant calls.
//!
//! ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
//! Everything else sees only the `AgentGateway` trait: text prompt in, raw
//! text out. Output is NOT parsed here; that is the Schema Validator's job.
//!
//! No retries. A failed call is surfaced to the caller, who may resubmit.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");
/// Per-request HTTP timeout. The overall wait is bounded separately by the caller.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Assistant run ended with status '{status}': {message}")]
    RunFailed { status: String, message: String },

    #[error("Assistant returned no text content")]
    EmptyContent,

    #[error("Assistant did not answer within {secs}s")]
    Timeout { secs: u64 },
}

/// Opaque text-in/text-out classification agent.
///
/// Carried in `AppState` as `Arc<dyn AgentGateway>`; tests swap in a scripted fake.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI Assistants v2 wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateThreadAndRun<'a> {
    assistant_id: &'a str,
    thread: NewThread<'a>,
}

#[derive(Debug, Serialize)]
struct NewThread<'a> {
    messages: Vec<NewMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct Run {
    id: String,
    thread_id: String,
    status: String,
    #[serde(default)]
    last_error: Option<RunError>,
}

#[derive(Debug, Deserialize)]
struct RunError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: String,
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

enum RunState {
    Pending,
    Completed,
    Failed(String),
}

fn run_state(run: &Run) -> RunState {
    match run.status.as_str() {
        "queued" | "in_progress" | "cancelling" => RunState::Pending,
        "completed" => RunState::Completed,
        // requires_action means the assistant wants a function tool we don't provide.
        other => RunState::Failed(
            run.last_error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| format!("run {} ended as {other}", run.id)),
        ),
    }
}

/// Joins the text blocks of the newest assistant message.
fn assistant_text(messages: MessageList) -> Option<String> {
    let message = messages.data.into_iter().find(|m| m.role == "assistant")?;
    let parts: Vec<String> = message
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .filter_map(|c| c.text.map(|t| t.value))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AssistantClient
// ────────────────────────────────────────────────────────────────────────────

/// Hosted assistant with a file-search knowledge base over the O*NET data.
/// One thread per submission: create thread + run, poll, read the reply.
#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    api_key: String,
    api_base: String,
    assistant_id: String,
    poll_interval: Duration,
}

impl AssistantClient {
    pub fn new(
        api_key: String,
        api_base: String,
        assistant_id: String,
        poll_interval: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(HTTP_TIMEOUT).build()?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            assistant_id,
            poll_interval,
        })
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    async fn start_run(&self, prompt: &str) -> Result<Run, LlmError> {
        let body = CreateThreadAndRun {
            assistant_id: &self.assistant_id,
            thread: NewThread {
                messages: vec![NewMessage {
                    role: "user",
                    content: prompt,
                }],
            },
        };

        let response = self
            .client
            .post(format!("{}/threads/runs", self.api_base))
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
            .json(&body)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn fetch_run(&self, thread_id: &str, run_id: &str) -> Result<Run, LlmError> {
        let response = self
            .client
            .get(format!("{}/threads/{thread_id}/runs/{run_id}", self.api_base))
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn fetch_reply(&self, thread_id: &str, run_id: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .get(format!("{}/threads/{thread_id}/messages", self.api_base))
            .query(&[("run_id", run_id), ("order", "desc"), ("limit", "10")])
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
            .send()
            .await?;

        let messages: MessageList = check_status(response).await?.json().await?;
        assistant_text(messages).ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl AgentGateway for AssistantClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut run = self.start_run(prompt).await?;
        debug!(run_id = %run.id, thread_id = %run.thread_id, "Assistant run started");

        loop {
            match run_state(&run) {
                RunState::Completed => break,
                RunState::Failed(message) => {
                    warn!(run_id = %run.id, status = %run.status, "Assistant run failed");
                    return Err(LlmError::RunFailed {
                        status: run.status,
                        message,
                    });
                }
                RunState::Pending => {
                    tokio::time::sleep(self.poll_interval).await;
                    run = self.fetch_run(&run.thread_id, &run.id).await?;
                }
            }
        }

        let text = self.fetch_reply(&run.thread_id, &run.id).await?;
        debug!(run_id = %run.id, chars = text.len(), "Assistant run completed");
        Ok(text)
    }
}

/// Maps non-2xx responses to `LlmError::Api`, pulling the message out of the
/// standard `{"error": {"message": ...}}` body when present.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OpenAiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    warn!("Assistant API returned {}: {}", status, message);
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}
