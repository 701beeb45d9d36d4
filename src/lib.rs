//! # flashgen
//!
//! AI-assisted flashcard generation.
//!
//! The crate has two layers:
//!
//! - [`provider`]: a chat-completion client for OpenRouter-compatible APIs
//!   with bounded retries, jittered exponential backoff, per-attempt
//!   timeouts, a typed error taxonomy and schema-validated structured output.
//! - [`generation`]: the flashcard generation use case, which drives the
//!   client and stores either a generation record or a diagnostic error log.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flashgen::generation::{GenerationService, MemoryStore};
//! use flashgen::provider::{ChatClient, ClientConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = ChatClient::new(ClientConfig::from_env()?)?;
//! let service = GenerationService::new(Arc::new(client), Arc::new(MemoryStore::new()));
//! let result = service.create_generation("user-1", "Long source text...").await?;
//! println!("{} proposals", result.generated_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod generation;
pub mod provider;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of flashgen.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
