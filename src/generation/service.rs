//! Flashcard generation use case.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::error::GenerationServiceError;
use super::flashcards::{flashcard_schema, FlashcardProposal};
use super::prompts::{generate_user_prompt, FLASHCARD_SYSTEM_PROMPT};
use super::store::{char_len, GenerationId, GenerationStore, NewGeneration, NewGenerationErrorLog};
use crate::provider::client::ChatClient;
use crate::provider::types::CompletionRequest;
use crate::utils::general::{content_hash, truncate_with_ellipsis};

/// Maximum length of a persisted error message, in characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Outcome of a successful generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    /// Id of the stored generation record.
    pub generation_id: GenerationId,
    /// Cards proposed to the user.
    pub proposals: Vec<FlashcardProposal>,
    /// Number of proposals.
    pub generated_count: u32,
}

/// Turns source text into stored flashcard proposals.
///
/// Every call writes exactly one row: a generation record on success or an
/// error log on failure. Failures are logged and then returned, never
/// downgraded to a partial success.
pub struct GenerationService {
    client: Arc<ChatClient>,
    store: Arc<dyn GenerationStore>,
    model: Option<String>,
}

impl GenerationService {
    /// Creates a service using the client's default model.
    pub fn new(client: Arc<ChatClient>, store: Arc<dyn GenerationStore>) -> Self {
        Self {
            client,
            store,
            model: None,
        }
    }

    /// Uses `model` instead of the client's default.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Model sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.client.default_model())
    }

    /// Generates flashcard proposals for `source_text` and stores the outcome.
    ///
    /// Source text length is expected to have been checked by the caller
    /// (see [`validate_source_text`](crate::utils::general::validate_source_text)).
    pub async fn create_generation(
        &self,
        user_id: &str,
        source_text: &str,
    ) -> Result<GenerationResult, GenerationServiceError> {
        let model = self.model().to_string();
        debug!(
            user_id,
            model = %model,
            source_text_len = source_text.len(),
            "Starting flashcard generation"
        );

        let mut request = CompletionRequest::new(
            FLASHCARD_SYSTEM_PROMPT,
            generate_user_prompt(source_text),
            flashcard_schema(),
        );
        if let Some(ref model) = self.model {
            request = request.with_model(model.clone());
        }

        let started = Instant::now();
        let drafts = match self.client.chat_completion(request).await {
            Ok(drafts) => drafts,
            Err(err) => {
                let err = GenerationServiceError::from(err);
                self.log_failure(user_id, &model, source_text, &err).await;
                return Err(err);
            }
        };
        let generation_duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let proposals: Vec<FlashcardProposal> =
            drafts.flashcards.into_iter().map(FlashcardProposal::from).collect();
        let generated_count = u32::try_from(proposals.len()).unwrap_or(u32::MAX);

        let new_generation = NewGeneration {
            user_id: user_id.to_string(),
            model: model.clone(),
            source_text: source_text.to_string(),
            generated_count,
            generation_duration_ms,
        };
        let generation_id = match self.store.insert_generation(new_generation).await {
            Ok(id) => id,
            Err(source) => {
                let err = GenerationServiceError::Persistence { source };
                self.log_failure(user_id, &model, source_text, &err).await;
                return Err(err);
            }
        };

        info!(
            user_id,
            generation_id,
            generated_count,
            duration_ms = generation_duration_ms,
            "Flashcard generation stored"
        );

        Ok(GenerationResult {
            generation_id,
            proposals,
            generated_count,
        })
    }

    /// Writes the error log row for a failed generation.
    ///
    /// A failure here is reported to the operator only; the caller still
    /// receives the original error.
    async fn log_failure(
        &self,
        user_id: &str,
        model: &str,
        source_text: &str,
        err: &GenerationServiceError,
    ) {
        warn!(user_id, code = err.code(), "Flashcard generation failed: {err}");

        let log = NewGenerationErrorLog {
            user_id: user_id.to_string(),
            error_code: err.code().to_string(),
            error_message: truncate_with_ellipsis(&err.log_message(), MAX_ERROR_MESSAGE_CHARS),
            model: model.to_string(),
            source_text_hash: content_hash(source_text),
            source_text_length: char_len(source_text),
        };

        if let Err(log_err) = self.store.insert_error_log(log).await {
            error!(
                user_id,
                code = err.code(),
                "Failed to record generation error log: {log_err:#}"
            );
        }
    }
}
