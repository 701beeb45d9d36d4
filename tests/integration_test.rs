use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use flashgen::generation::{GenerationService, JsonFileStore};
use flashgen::provider::{ChatClient, ClientConfig, ErrorCode, RetryPolicy};
use flashgen::utils::{content_hash, validate_source_text};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test setup with a mock provider and a file-backed store in a temp dir.
struct TestEnv {
    _temp_dir: TempDir,
    server: MockServer,
    store: Arc<JsonFileStore>,
}

impl TestEnv {
    async fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let store = Arc::new(JsonFileStore::open(temp_dir.path().join("data"))?);
        Ok(TestEnv {
            _temp_dir: temp_dir,
            server: MockServer::start().await,
            store,
        })
    }

    fn service(&self, max_retries: u32) -> Result<GenerationService> {
        let config = ClientConfig::new("sk-integration")
            .with_base_url(self.server.uri())
            .with_max_retries(max_retries)
            .with_timeout(Duration::from_secs(5))
            .with_retry_policy(RetryPolicy {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(4),
            });
        let client = ChatClient::new(config)?;
        Ok(GenerationService::new(Arc::new(client), self.store.clone()))
    }
}

fn source_text() -> String {
    "The water cycle describes how water evaporates from the surface, condenses into clouds, \
     and returns as precipitation. "
        .repeat(12)
}

fn flashcard_completion(count: usize) -> ResponseTemplate {
    let cards: Vec<_> = (0..count)
        .map(|i| json!({ "front": format!("Step {i}?"), "back": format!("Explanation {i}") }))
        .collect();
    let content = json!({ "flashcards": cards }).to_string();
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "gen-xyz",
        "model": "openai/gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 300, "completion_tokens": 120, "total_tokens": 420 }
    }))
}

#[tokio::test]
async fn generation_survives_transient_outage() -> Result<()> {
    let env = TestEnv::new().await?;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(flashcard_completion(5))
        .mount(&env.server)
        .await;

    let text = source_text();
    validate_source_text(&text)?;

    let result = env.service(3)?.create_generation("user-42", &text).await?;
    assert_eq!(result.generated_count, 5);
    assert_eq!(result.generation_id, 1);

    let generations = env.store.generations().await?;
    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0].generated_count, 5);
    assert_eq!(generations[0].source_text, text);
    assert!(env.store.error_logs().await?.is_empty());
    assert_eq!(env.server.received_requests().await.unwrap_or_default().len(), 2);
    Ok(())
}

#[tokio::test]
async fn exhausted_retries_leave_one_error_log() -> Result<()> {
    let env = TestEnv::new().await?;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&env.server)
        .await;

    let text = source_text();
    let err = env
        .service(3)?
        .create_generation("user-42", &text)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ServerError.as_str());

    assert!(env.store.generations().await?.is_empty());
    let logs = env.store.error_logs().await?;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].error_code, "SERVER_ERROR");
    assert_eq!(logs[0].source_text_hash, content_hash(&text));
    assert_eq!(logs[0].source_text_length as usize, text.chars().count());
    assert_eq!(env.server.received_requests().await.unwrap_or_default().len(), 3);
    Ok(())
}

#[tokio::test]
async fn rate_limit_is_reported_with_code() -> Result<()> {
    let env = TestEnv::new().await?;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "120"))
        .mount(&env.server)
        .await;

    let err = env
        .service(1)?
        .create_generation("user-42", &source_text())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RATE_LIMITED");
    assert_eq!(env.store.error_logs().await?[0].error_code, "RATE_LIMITED");
    Ok(())
}

#[test]
fn empty_api_key_fails_before_any_request() {
    let err = ChatClient::new(ClientConfig::new("")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigError);
}
