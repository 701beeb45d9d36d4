//! CLI interface for flashgen.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod config;
pub mod generate;

/// flashgen: AI flashcard generation.
#[derive(Parser)]
#[command(name = "flashgen")]
#[command(about = "Generates study flashcards from source text with an AI model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories.
#[derive(Subcommand)]
pub enum Commands {
    /// Generates flashcard proposals from source text.
    Generate(generate::GenerateCommand),
    /// Configuration information.
    Config(config::ConfigCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate(generate_cmd) => generate_cmd.execute().await,
            Commands::Config(config_cmd) => config_cmd.execute(),
        }
    }
}
