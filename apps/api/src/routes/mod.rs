pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::classification::handlers as classification;
use crate::reference::handlers as reference;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Classification API
        .route("/api/v1/classify", post(classification::handle_classify))
        .route(
            "/api/v1/assistant",
            get(classification::handle_assistant_info),
        )
        // Reference API
        .route(
            "/api/v1/occupations/:code",
            get(reference::handle_get_occupation),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::classification::handlers::ELAPSED_HEADER;
    use crate::config::Config;
    use crate::llm_client::{AgentGateway, LlmError};
    use crate::reference::test_support::sample_table;

    /// Replies with a fixed script and records the prompts it was sent.
    struct ScriptedAgent {
        reply: Result<String, fn() -> LlmError>,
        delay: Duration,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedAgent {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: fn() -> LlmError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn stalling(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok("{\"job_classifications\": []}".to_string()),
                delay,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AgentGateway for ScriptedAgent {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn test_config() -> Config {
        Config {
            openai_api_key: "sk-test".to_string(),
            assistant_id: "asst_test".to_string(),
            openai_base_url: "http://localhost:0/v1".to_string(),
            reference_table_path: PathBuf::from("unused"),
            descriptions_path: PathBuf::from("unused"),
            agent_timeout: Duration::from_secs(5),
            agent_poll_interval: Duration::from_millis(10),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn app(agent: Arc<ScriptedAgent>) -> Router {
        build_router(AppState {
            reference: Arc::new(sample_table()),
            descriptions: None,
            agent,
            config: test_config(),
        })
    }

    fn classify_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/classify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn job_post() -> Value {
        json!({
            "job_post_title": "Backend Engineer",
            "job_post_description": "Design and build web services in Rust."
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(ScriptedAgent::replying("")).oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_classify_reconciles_fenced_agent_output() {
        let agent = ScriptedAgent::replying(
            "```json\n{\"job_classifications\": [\
                {\"occupation_code\": \"15-1251.00\", \"occupation_title\": \"Software Developers\", \"explanation\": \"Builds services.\"},\
                {\"occupation_code\": \"99-9999.99\", \"occupation_title\": \"Not A Real Job\"},\
                {\"occupation_code\": \"15-1253.00\", \"occupation_title\": \"QA\"}\
            ], \"overall_explanation\": \"Engineering role.\"}\n```",
        );
        let response = app(agent.clone())
            .oneshot(classify_request(job_post()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(ELAPSED_HEADER));

        let body = body_json(response).await;
        assert_eq!(body["status"], "classified");
        assert_eq!(body["overall_explanation"], "Engineering role.");
        assert!(body["elapsed_ms"].is_u64());
        assert!(body["classified_at"].is_string());

        let classifications = body["classifications"].as_array().unwrap();
        assert_eq!(classifications.len(), 2);
        assert_eq!(classifications[0]["occupation_code"], "15-1252.00");
        assert_eq!(classifications[0]["occupation_title"], "Software Developers");
        assert_eq!(
            classifications[0]["occupation_link"],
            "https://www.onetonline.org/link/summary/15-1252.00"
        );
        assert_eq!(
            classifications[0]["career_clusters"],
            json!(["Information Technology"])
        );
        assert_eq!(classifications[0]["explanation"], "Builds services.");
        assert_eq!(
            classifications[1]["occupation_title"],
            "Software Quality Assurance Analysts and Testers"
        );

        let actions: Vec<_> = body["reconciliation"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["action"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(actions, vec!["code_repaired", "discarded", "title_repaired"]);

        let prompts = agent.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("job post title: Backend Engineer"));
    }

    #[tokio::test]
    async fn test_classify_all_discarded_is_informational() {
        let agent = ScriptedAgent::replying(
            r#"{"job_classifications": [{"occupation_code": "99-9999.99", "occupation_title": "Not A Real Job"}]}"#,
        );
        let response = app(agent).oneshot(classify_request(job_post())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "no_classification_found");
        assert_eq!(body["classifications"], json!([]));
    }

    #[tokio::test]
    async fn test_classify_hides_explanations_when_not_requested() {
        let agent = ScriptedAgent::replying(
            r#"{"job_classifications": [{"occupation_code": "29-1141.00", "occupation_title": "Registered Nurses", "explanation": "Patient care."}]}"#,
        );
        let mut request = job_post();
        request["include_explanation"] = json!(false);
        request["hints"] = json!("Clinical setting");

        let response = app(agent.clone())
            .oneshot(classify_request(request))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["classifications"][0].get("explanation").is_none());

        let prompts = agent.prompts.lock().unwrap();
        assert!(prompts[0].contains("agent should include explanation: false"));
        assert!(prompts[0].contains("additional hints: Clinical setting"));
    }

    #[tokio::test]
    async fn test_classify_schema_violation_is_422_with_elapsed_header() {
        let title = "T".repeat(81);
        let agent = ScriptedAgent::replying(&format!(
            r#"{{"job_classifications": [{{"occupation_code": "15-1252.00", "occupation_title": "{title}"}}]}}"#
        ));
        let response = app(agent).oneshot(classify_request(job_post())).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().contains_key(ELAPSED_HEADER));

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "SCHEMA_VIOLATION");
        assert_eq!(
            body["error"]["details"]["field"],
            "job_classifications[0].occupation_title"
        );
        assert_eq!(body["error"]["details"]["rule"], "max_length");
    }

    #[tokio::test]
    async fn test_classify_unparseable_output_is_parse_error() {
        let agent = ScriptedAgent::replying("I think this is a software developer.");
        let response = app(agent).oneshot(classify_request(job_post())).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["code"], "PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_classify_agent_failure_is_not_retried() {
        let agent = ScriptedAgent::failing(|| LlmError::RunFailed {
            status: "failed".to_string(),
            message: "server_error".to_string(),
        });
        let response = app(agent.clone())
            .oneshot(classify_request(job_post()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.headers().contains_key(ELAPSED_HEADER));
        assert_eq!(agent.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classify_agent_wait_is_bounded() {
        let agent = ScriptedAgent::stalling(Duration::from_secs(3600));
        let response = app(agent).oneshot(classify_request(job_post())).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_json(response).await["error"]["code"], "AGENT_TIMEOUT");
    }

    #[tokio::test]
    async fn test_classify_rejects_empty_job_post() {
        let agent = ScriptedAgent::replying("{}");
        let response = app(agent.clone())
            .oneshot(classify_request(json!({"job_post_title": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(agent.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_occupation() {
        let router = app(ScriptedAgent::replying(""));

        let response = router
            .clone()
            .oneshot(get_request("/api/v1/occupations/11-1021.00"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["occupation_title"], "General and Operations Managers");
        assert_eq!(body["career_pathway"], json!(["General Management"]));
        assert_eq!(
            body["occupation_link"],
            "https://www.onetonline.org/link/summary/11-1021.00"
        );

        let response = router
            .clone()
            .oneshot(get_request("/api/v1/occupations/99-9999.99"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .oneshot(get_request("/api/v1/occupations/not-a-code"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_assistant_info() {
        let response = app(ScriptedAgent::replying(""))
            .oneshot(get_request("/api/v1/assistant"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["assistant_id"], "asst_test");
        assert_eq!(body["reference_entries"], 4);
        assert_eq!(body["descriptions_loaded"], false);
    }
}
