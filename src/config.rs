//! Configuration loaded from `config.toml`.
//!
//! Resolution per field (highest first):
//!   1. command-line flag
//!   2. environment (`LEHRER_ASSISTENT_HOME` for the data directory)
//!   3. config file, by default `{config_dir}/lehrer-assistent/config.toml`
//!   4. built-in default

use crate::{AppError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

const APP_DIR: &str = "lehrer-assistent";
const DATA_DIR_ENV: &str = "LEHRER_ASSISTENT_HOME";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_AI_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_AI_KEY_ENV: &str = "API_KEY";

/// On-disk shape of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub api: ApiSection,
    pub ai: AiSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
}

/// Settings for the AI mail writer.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Resolved configuration for Lehrer-Assistent
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the slot files and the log
    pub data_dir: PathBuf,

    /// Base URL of the school API (`/api/klassen`, `/api/mails`, `/api/schueler`)
    pub api_base_url: String,

    pub ai: AiConfig,

    /// Debug-level logging
    pub verbose: bool,
}

impl AppConfig {
    /// Build a config from a parsed file, applying env and defaults.
    pub fn from_file(file: ConfigFile) -> Self {
        let data_dir = std::env::var(DATA_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or(file.data_dir)
            .unwrap_or_else(default_data_dir);

        let key_env = file
            .ai
            .api_key_env
            .unwrap_or_else(|| DEFAULT_AI_KEY_ENV.to_string());
        let api_key = std::env::var(&key_env).ok().filter(|k| !k.trim().is_empty());

        Self {
            data_dir,
            api_base_url: trim_base(
                file.api
                    .base_url
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            ),
            ai: AiConfig {
                base_url: trim_base(
                    file.ai
                        .base_url
                        .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
                ),
                model: file.ai.model.unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
                api_key,
            },
            verbose: false,
        }
    }

    /// Load the config file at `path` (or the default location).
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::from_file(ConfigFile::default())),
            },
        };

        if !path.exists() {
            return Ok(Self::from_file(ConfigFile::default()));
        }

        let content = std::fs::read_to_string(&path)?;
        let file = parse_config(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(Self::from_file(file))
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = dir;
        self
    }

    pub fn with_api_base_url(mut self, url: String) -> Self {
        self.api_base_url = trim_base(url);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("lehrer-assistent.log")
    }
}

pub fn parse_config(content: &str) -> std::result::Result<ConfigFile, toml::de::Error> {
    toml::from_str(content)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let file = parse_config(
            r#"
data_dir = "/tmp/noten"

[api]
base_url = "http://schule.local:8080/"

[ai]
base_url = "http://localhost:11434/v1"
model = "llama3"
api_key_env = "LEHRER_TEST_KEY_UNSET"
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(file);
        assert_eq!(config.api_base_url, "http://schule.local:8080");
        assert_eq!(config.ai.base_url, "http://localhost:11434/v1");
        assert_eq!(config.ai.model, "llama3");
        assert!(config.ai.api_key.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_file(parse_config("").unwrap());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.ai.model, DEFAULT_AI_MODEL);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AppConfig::from_file(ConfigFile::default())
            .with_data_dir(PathBuf::from("/srv/noten"))
            .with_api_base_url("http://api/".to_string())
            .with_verbose(true);
        assert_eq!(config.data_dir, PathBuf::from("/srv/noten"));
        assert_eq!(config.api_base_url, "http://api");
        assert_eq!(config.log_file(), PathBuf::from("/srv/noten/lehrer-assistent.log"));
        assert!(config.verbose);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
