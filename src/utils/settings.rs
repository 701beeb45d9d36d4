//! Settings file support.
//!
//! Values are read from the process environment first and fall back to
//! the `env` map in `$HOME/.flashgen/settings.json`:
//!
//! ```json
//! { "env": { "OPENROUTER_API_KEY": "sk-or-..." } }
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings loaded from `$HOME/.flashgen/settings.json`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable fallbacks.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path(flashgen_home()?.join("settings.json"))
    }

    /// Loads settings from a specific path; a missing file yields empty settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Settings>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns a variable from the environment, falling back to these settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key).ok().or_else(|| self.env.get(key).cloned())
    }
}

/// Returns `$HOME/.flashgen`.
pub fn flashgen_home() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home_dir.join(".flashgen"))
}

/// Returns an environment variable with fallback to the settings file.
pub fn get_env_var(key: &str) -> Result<String> {
    if let Ok(value) = env::var(key) {
        return Ok(value);
    }
    Settings::load()
        .with_context(|| format!("Environment variable not found: {key}"))?
        .get_env_var(key)
        .ok_or_else(|| anyhow::anyhow!("Environment variable not found: {key}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_empty_settings() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(temp_dir.path().join("absent.json")).unwrap();
        assert!(settings.env.is_empty());
    }

    #[test]
    fn settings_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(
            &settings_path,
            r#"{ "env": { "OPENROUTER_MODEL": "openai/gpt-4o", "FLASHGEN_TEST_ONLY": "file" } }"#,
        )
        .unwrap();

        let settings = Settings::load_from_path(&settings_path).unwrap();
        assert_eq!(settings.env.get("OPENROUTER_MODEL").unwrap(), "openai/gpt-4o");
        assert_eq!(
            settings.get_env_var("FLASHGEN_TEST_ONLY").as_deref(),
            Some("file")
        );
        assert_eq!(settings.get_env_var("FLASHGEN_TEST_MISSING"), None);
    }

    #[test]
    fn environment_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(
            &settings_path,
            r#"{ "env": { "FLASHGEN_TEST_PRECEDENCE": "file" } }"#,
        )
        .unwrap();
        let settings = Settings::load_from_path(&settings_path).unwrap();

        env::set_var("FLASHGEN_TEST_PRECEDENCE", "env");
        assert_eq!(
            settings.get_env_var("FLASHGEN_TEST_PRECEDENCE").as_deref(),
            Some("env")
        );
        env::remove_var("FLASHGEN_TEST_PRECEDENCE");
    }

    #[test]
    fn free_lookup_prefers_environment() {
        env::set_var("FLASHGEN_TEST_FREE_LOOKUP", "from-env");
        assert_eq!(get_env_var("FLASHGEN_TEST_FREE_LOOKUP").unwrap(), "from-env");
        env::remove_var("FLASHGEN_TEST_FREE_LOOKUP");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(&settings_path, "{ not json").unwrap();
        assert!(Settings::load_from_path(&settings_path).is_err());
    }
}
