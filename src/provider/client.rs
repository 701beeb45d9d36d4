//! Chat-completion client with retry, backoff and structured output.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use super::config::ClientConfig;
use super::error::ProviderError;
use super::schema::StructuredOutput;
use super::types::{
    ChatCompletionBody, ChatCompletionResponse, ChatMessage, CompletionRequest, ErrorEnvelope,
    JsonSchemaFormat, ResponseFormat,
};

/// Client for an OpenRouter-compatible `/chat/completions` endpoint.
///
/// Each call to [`chat_completion`](Self::chat_completion) is one logical
/// request: attempts run sequentially, retryable failures are re-attempted
/// with jittered exponential backoff, and the final failure is returned as
/// a typed [`ProviderError`]. The client holds no mutable state and can be
/// shared across tasks.
#[derive(Debug)]
pub struct ChatClient {
    /// HTTP client for API requests.
    http: Client,
    /// Immutable configuration.
    config: ClientConfig,
}

impl ChatClient {
    /// Creates a client, rejecting invalid configuration before any
    /// network activity.
    pub fn new(config: ClientConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        let http = Client::builder()
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Model used when a request does not override it.
    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Sends a structured-completion request and returns the validated result.
    pub async fn chat_completion<T: StructuredOutput>(
        &self,
        request: CompletionRequest<T>,
    ) -> Result<T, ProviderError> {
        let body = self.build_body(&request);
        let url = self.completions_url();

        debug!(
            url = %url,
            model = %body.model,
            schema = request.response_schema.name(),
            system_message_len = request.system_message.len(),
            user_message_len = request.user_message.len(),
            "Prepared chat completion request"
        );

        let mut attempt: u32 = 1;
        loop {
            match self.send_attempt(&url, &body, attempt).await {
                Ok(response) => {
                    let result = self.extract(response, &request);
                    if let Err(ref err) = result {
                        error!(attempt, code = %err.code(), "Unusable chat completion: {err}");
                    }
                    return result;
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    // retry-after is reported but the exponential schedule still decides the wait
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        code = %err.code(),
                        retry_after = ?err.retry_after(),
                        delay_ms = delay.as_millis() as u64,
                        "Retryable provider failure: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        attempt,
                        code = %err.code(),
                        "Chat completion failed: {err}"
                    );
                    return Err(err);
                }
            }
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body<T: StructuredOutput>(&self, request: &CompletionRequest<T>) -> ChatCompletionBody {
        ChatCompletionBody {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages: vec![
                ChatMessage::system(request.system_message.clone()),
                ChatMessage::user(request.user_message.clone()),
            ],
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.response_schema.name().to_string(),
                    strict: true,
                    schema: request.response_schema.wire_schema(),
                },
            },
            temperature: request
                .temperature
                .unwrap_or(self.config.default_temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.default_max_tokens),
        }
    }

    /// Performs one HTTP attempt under the per-attempt deadline.
    async fn send_attempt(
        &self,
        url: &str,
        body: &ChatCompletionBody,
        attempt: u32,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let timeout = self.config.timeout;
        debug!(attempt, timeout_ms = timeout.as_millis() as u64, "Sending chat completion attempt");

        match tokio::time::timeout(timeout, self.post(url, body)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout)),
        }
    }

    async fn post(
        &self,
        url: &str,
        body: &ChatCompletionBody,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let timeout = self.config.timeout;
        let mut builder = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.config.api_key)
            .header("X-Title", &self.config.app_name);
        if let Some(ref app_url) = self.config.app_url {
            builder = builder.header("HTTP-Referer", app_url);
        }
        let response = builder
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let error_text = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read error response body: {e}");
                String::new()
            });
            let message = error_message(status.as_u16(), &error_text);
            return Err(ProviderError::from_status(status.as_u16(), message, retry_after));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(e, timeout))?;

        serde_json::from_str(&text).map_err(|e| ProviderError::InvalidJson {
            message: "Malformed chat completion response".to_string(),
            source: e,
        })
    }

    fn extract<T: StructuredOutput>(
        &self,
        response: ChatCompletionResponse,
        request: &CompletionRequest<T>,
    ) -> Result<T, ProviderError> {
        debug!(
            id = ?response.id,
            choice_count = response.choices.len(),
            finish_reason = ?response.choices.first().and_then(|c| c.finish_reason.as_deref()),
            "Received chat completion response"
        );

        let content = response.first_content().ok_or_else(|| {
            ProviderError::EmptyResponse("No message content in first choice".to_string())
        })?;

        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ProviderError::InvalidJson {
                message: "Message content is not valid JSON".to_string(),
                source: e,
            })?;

        let parsed = request.response_schema.parse(value)?;

        let usage = response.usage.unwrap_or_default();
        info!(
            model = ?response.model,
            prompt_tokens = ?usage.prompt_tokens,
            completion_tokens = ?usage.completion_tokens,
            total_tokens = ?usage.total_tokens,
            "Chat completion succeeded"
        );

        Ok(parsed)
    }
}

/// Reads `retry-after` as whole seconds.
///
/// HTTP-date values are not supported and read as absent.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Best-effort message extraction from an error body.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Provider returned HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

/// Upper bound on the time a single logical request may take.
#[must_use]
pub fn worst_case_duration(config: &ClientConfig) -> Duration {
    let attempts = config.max_retries;
    config.timeout.saturating_mul(attempts).saturating_add(
        config
            .retry
            .max_jittered_delay()
            .saturating_mul(attempts.saturating_sub(1)),
    )
}
