//! Flashcard generation command.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::generation::service::{GenerationResult, GenerationService};
use crate::generation::store::{GenerationStore, JsonFileStore};
use crate::provider::client::ChatClient;
use crate::provider::config::ClientConfig;
use crate::utils::general::validate_source_text;

/// Output format for generated proposals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML document.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Generates flashcard proposals from source text.
#[derive(Parser)]
pub struct GenerateCommand {
    /// File containing the source text (reads stdin when omitted).
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// User id recorded with the generation.
    #[arg(long, default_value = "local")]
    pub user: String,

    /// AI model to use (overrides environment configuration).
    #[arg(long)]
    pub model: Option<String>,

    /// Directory for generation records and error logs.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

impl GenerateCommand {
    /// Executes the generate command.
    pub async fn execute(self) -> Result<()> {
        let source_text = self.read_source_text()?;
        validate_source_text(&source_text)?;

        let client = ChatClient::new(ClientConfig::from_env()?)?;
        let store = match self.data_dir {
            Some(ref dir) => JsonFileStore::open(dir)?,
            None => JsonFileStore::open_default()?,
        };
        let data_dir = store.dir().to_path_buf();
        let store: Arc<dyn GenerationStore> = Arc::new(store);

        let mut service = GenerationService::new(Arc::new(client), store);
        if let Some(model) = self.model {
            service = service.with_model(model);
        }

        eprintln!(
            "Generating flashcards with {} (recording to {})...",
            service.model(),
            data_dir.display()
        );

        let result = service
            .create_generation(&self.user, &source_text)
            .await
            .map_err(|e| {
                let code = e.code();
                anyhow::Error::new(e).context(format!("Generation failed ({code})"))
            })?;

        println!("{}", render_result(&result, self.format)?);
        Ok(())
    }

    fn read_source_text(&self) -> Result<String> {
        match self.file {
            Some(ref path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read source text: {}", path.display())),
            None => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read source text from stdin")?;
                Ok(buffer)
            }
        }
    }
}

fn render_result(result: &GenerationResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(result).context("Failed to render YAML"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).context("Failed to render JSON")
        }
    }
}
