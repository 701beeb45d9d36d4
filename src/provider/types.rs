//! Request and response shapes for the chat-completion API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{ResponseSchema, StructuredOutput};

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One structured-completion request.
///
/// Unset `model`, `temperature` and `max_tokens` fall back to the client
/// configuration.
pub struct CompletionRequest<T> {
    /// Instructions sent as the system message.
    pub system_message: String,
    /// Content sent as the user message.
    pub user_message: String,
    /// Shape the response must match.
    pub response_schema: ResponseSchema<T>,
    /// Model override.
    pub model: Option<String>,
    /// Temperature override.
    pub temperature: Option<f32>,
    /// Token limit override.
    pub max_tokens: Option<u32>,
}

impl<T: StructuredOutput> CompletionRequest<T> {
    /// Creates a request using the client's default model settings.
    pub fn new(
        system_message: impl Into<String>,
        user_message: impl Into<String>,
        response_schema: ResponseSchema<T>,
    ) -> Self {
        Self {
            system_message: system_message.into(),
            user_message: user_message.into(),
            response_schema,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Overrides the model for this request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the temperature for this request.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Overrides the token limit for this request.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// `json_schema` member of the response format.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct JsonSchemaFormat {
    pub(crate) name: String,
    pub(crate) strict: bool,
    pub(crate) schema: Value,
}

/// `response_format` member of the request body.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub(crate) format_type: &'static str,
    pub(crate) json_schema: JsonSchemaFormat,
}

/// Request body for `POST /chat/completions`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct ChatCompletionBody {
    pub(crate) model: String,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) response_format: ResponseFormat,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: u32,
}

/// Response message.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ResponseMessage {
    #[allow(dead_code)]
    #[serde(default)]
    pub(crate) role: Option<String>,
    #[serde(default)]
    pub(crate) content: Option<String>,
}

/// Response choice.
#[derive(Deserialize, Debug)]
pub(crate) struct Choice {
    #[allow(dead_code)]
    #[serde(default)]
    pub(crate) index: u32,
    #[serde(default)]
    pub(crate) message: ResponseMessage,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub(crate) struct Usage {
    #[serde(default)]
    pub(crate) prompt_tokens: Option<u32>,
    #[serde(default)]
    pub(crate) completion_tokens: Option<u32>,
    #[serde(default)]
    pub(crate) total_tokens: Option<u32>,
}

/// Raw provider response.
#[derive(Deserialize, Debug)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) model: Option<String>,
    #[serde(default)]
    pub(crate) choices: Vec<Choice>,
    #[serde(default)]
    pub(crate) usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if it is non-blank.
    pub(crate) fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .filter(|content| !content.trim().is_empty())
    }
}

/// Error envelope returned with non-success statuses.
#[derive(Deserialize, Debug)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: ErrorDetail,
}

/// Error detail.
#[derive(Deserialize, Debug)]
pub(crate) struct ErrorDetail {
    pub(crate) message: String,
}
