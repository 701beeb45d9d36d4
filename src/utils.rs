//! Utility functions and helpers.

pub mod general;
pub mod settings;

pub use general::{content_hash, truncate_with_ellipsis, validate_source_text, UtilError};
pub use settings::{get_env_var, Settings};
