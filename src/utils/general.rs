//! Text helpers shared by the generation flow.

use std::fmt;

use sha2::{Digest, Sha256};

/// Minimum source text length, in characters.
pub const MIN_SOURCE_TEXT_CHARS: usize = 1000;

/// Maximum source text length, in characters.
pub const MAX_SOURCE_TEXT_CHARS: usize = 10_000;

/// Error type for utility functions.
#[derive(Debug, PartialEq, Eq)]
pub enum UtilError {
    /// Invalid input error.
    InvalidInput(String),
}

impl fmt::Display for UtilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for UtilError {}

/// Checks that source text is within the accepted length bounds.
///
/// Callers apply this before starting a generation; the orchestrator
/// trusts its input.
pub fn validate_source_text(text: &str) -> Result<(), UtilError> {
    let chars = text.chars().count();
    if chars < MIN_SOURCE_TEXT_CHARS {
        return Err(UtilError::InvalidInput(format!(
            "Source text must be at least {MIN_SOURCE_TEXT_CHARS} characters (got {chars})"
        )));
    }
    if chars > MAX_SOURCE_TEXT_CHARS {
        return Err(UtilError::InvalidInput(format!(
            "Source text must be at most {MAX_SOURCE_TEXT_CHARS} characters (got {chars})"
        )));
    }
    Ok(())
}

/// Truncates `text` to at most `max_chars` characters, ending with `...`
/// when anything was cut and the limit leaves room for it.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";

    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Hex-encoded SHA-256 of the text.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
