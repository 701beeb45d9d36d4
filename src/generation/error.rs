//! Errors surfaced by the generation service.

use thiserror::Error;

use crate::provider::error::ProviderError;

/// Code recorded when persisting a successful generation fails.
pub const GENERATION_PERSISTENCE_FAILED: &str = "GENERATION_PERSISTENCE_FAILED";

/// Failure of [`create_generation`](super::service::GenerationService::create_generation).
///
/// Every variant carries the code that was written to the error log, so
/// callers can return it to clients unchanged.
#[derive(Error, Debug)]
pub enum GenerationServiceError {
    /// The chat client failed.
    #[error("Flashcard generation failed: {source}")]
    Provider {
        /// Underlying client error.
        #[from]
        source: ProviderError,
    },

    /// The proposals were generated but could not be stored.
    #[error("Failed to save generation: {source}")]
    Persistence {
        /// Underlying storage error.
        source: anyhow::Error,
    },
}

impl GenerationServiceError {
    /// Code persisted in the error log and returned to callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Provider { source } => source.code().as_str(),
            Self::Persistence { .. } => GENERATION_PERSISTENCE_FAILED,
        }
    }

    /// Message persisted in the error log, before truncation.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self {
            Self::Provider { source } => source.to_string(),
            Self::Persistence { source } => format!("{source:#}"),
        }
    }

    /// HTTP status a route handler should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        500
    }
}
