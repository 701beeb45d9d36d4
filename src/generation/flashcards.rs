//! Flashcard output schema and proposal types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::provider::schema::{ResponseSchema, StructuredOutput};

/// Maximum characters on the front of a card.
pub const MAX_FRONT_CHARS: usize = 200;

/// Maximum characters on the back of a card.
pub const MAX_BACK_CHARS: usize = 500;

/// Minimum cards in one response.
pub const MIN_CARDS: usize = 1;

/// Maximum cards in one response.
pub const MAX_CARDS: usize = 10;

/// Schema name sent to the provider.
pub const SCHEMA_NAME: &str = "flashcards";

/// A single card as produced by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FlashcardDraft {
    /// Question or prompt side.
    #[schemars(length(min = 1, max = 200))]
    pub front: String,
    /// Answer side.
    #[schemars(length(min = 1, max = 500))]
    pub back: String,
}

/// Structured output requested from the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FlashcardDrafts {
    /// Generated cards.
    #[schemars(length(min = 1, max = 10))]
    pub flashcards: Vec<FlashcardDraft>,
}

impl StructuredOutput for FlashcardDrafts {
    fn validate(&self) -> Result<(), String> {
        let count = self.flashcards.len();
        if !(MIN_CARDS..=MAX_CARDS).contains(&count) {
            return Err(format!(
                "expected {MIN_CARDS}-{MAX_CARDS} flashcards, got {count}"
            ));
        }
        for (i, card) in self.flashcards.iter().enumerate() {
            check_side(i, "front", &card.front, MAX_FRONT_CHARS)?;
            check_side(i, "back", &card.back, MAX_BACK_CHARS)?;
        }
        Ok(())
    }
}

fn check_side(index: usize, side: &str, text: &str, max: usize) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(format!("flashcards[{index}].{side} must not be empty"));
    }
    let chars = text.chars().count();
    if chars > max {
        return Err(format!(
            "flashcards[{index}].{side} has {chars} characters (max {max})"
        ));
    }
    Ok(())
}

/// Returns the schema handed to the chat client.
#[must_use]
pub fn flashcard_schema() -> ResponseSchema<FlashcardDrafts> {
    ResponseSchema::new(SCHEMA_NAME)
}

/// How a proposal was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalSource {
    /// Generated by the model and not yet edited.
    #[serde(rename = "ai-full")]
    AiFull,
}

/// A card proposed to the user for review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardProposal {
    /// Question side.
    pub front: String,
    /// Answer side.
    pub back: String,
    /// Always [`ProposalSource::AiFull`] for fresh generations.
    pub source: ProposalSource,
}

impl From<FlashcardDraft> for FlashcardProposal {
    fn from(draft: FlashcardDraft) -> Self {
        Self {
            front: draft.front,
            back: draft.back,
            source: ProposalSource::AiFull,
        }
    }
}
