//! Configuration-related CLI commands.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::provider::client::{worst_case_duration, ChatClient};
use crate::provider::config::ClientConfig;

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the resolved client configuration.
    Show(ShowCommand),
}

/// Show command options.
#[derive(Parser)]
pub struct ShowCommand {}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            ConfigSubcommands::Show(show_cmd) => show_cmd.execute(),
        }
    }
}

impl ShowCommand {
    /// Executes the show command.
    pub fn execute(self) -> Result<()> {
        let client = ChatClient::new(ClientConfig::from_env()?)?;
        print!("{}", render_config(client.config()));
        Ok(())
    }
}

fn render_config(config: &ClientConfig) -> String {
    format!(
        "api_key: {}\nbase_url: {}\ndefault_model: {}\ndefault_temperature: {}\ndefault_max_tokens: {}\ntimeout_ms: {}\nmax_retries: {}\nworst_case_ms: {}\napp_name: {}\napp_url: {}\n",
        config.masked_api_key(),
        config.base_url,
        config.default_model,
        config.default_temperature,
        config.default_max_tokens,
        config.timeout.as_millis(),
        config.max_retries,
        worst_case_duration(config).as_millis(),
        config.app_name,
        config.app_url.as_deref().unwrap_or("(not set)"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn render_masks_api_key() {
        let rendered = render_config(&ClientConfig::new("sk-or-secret-1234"));
        assert!(rendered.contains("api_key: *************1234"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("max_retries: 3"));
        assert!(rendered.contains("timeout_ms: 60000"));
        assert!(rendered.contains("app_url: (not set)"));
    }

    #[test]
    fn render_uses_client_configuration() {
        let client = ChatClient::new(
            ClientConfig::new("sk-or-secret-1234")
                .with_model("anthropic/claude-3.5-haiku")
                .with_app_url("https://cards.example.org"),
        )
        .unwrap();
        let rendered = render_config(client.config());
        assert!(rendered.contains("default_model: anthropic/claude-3.5-haiku"));
        assert!(rendered.contains("app_url: https://cards.example.org"));
    }
}
