//! AI flashcard generation.

pub mod error;
pub mod flashcards;
pub mod prompts;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::GenerationServiceError;
pub use flashcards::{FlashcardDraft, FlashcardDrafts, FlashcardProposal, ProposalSource};
pub use service::{GenerationResult, GenerationService};
pub use store::{
    GenerationErrorLog, GenerationId, GenerationRecord, GenerationStore, JsonFileStore,
    MemoryStore, NewGeneration, NewGenerationErrorLog,
};
