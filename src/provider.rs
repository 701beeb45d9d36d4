//! Chat-completion provider integration.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod schema;
pub mod types;

pub use client::ChatClient;
pub use config::ClientConfig;
pub use error::{ErrorCategory, ErrorCode, ProviderError};
pub use retry::RetryPolicy;
pub use schema::{ResponseSchema, StructuredOutput};
pub use types::{ChatMessage, CompletionRequest, Role};
