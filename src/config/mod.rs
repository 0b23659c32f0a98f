use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extractors::DEFAULT_MAX_CHARS;
use crate::llm::GeminiClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generative model settings
    pub llm: LlmConfig,

    /// Caption retrieval settings
    pub transcript: TranscriptConfig,

    /// Backoff applied to rate limited model calls
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name, e.g. `gemma-3-12b-it`
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Generative Language API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Caption languages in priority order
    pub languages: Vec<String>,

    /// Transcript cap in characters
    pub max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per model call
    pub max_attempts: u32,

    /// Base of the exponential backoff, in seconds
    pub multiplier_secs: u64,

    /// Shortest wait between attempts, in seconds
    pub min_wait_secs: u64,

    /// Longest wait between attempts, in seconds
    pub max_wait_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                model: GeminiClient::DEFAULT_MODEL.to_string(),
                temperature: 0.7,
                api_key_env: "GOOGLE_API_KEY".to_string(),
                base_url: GeminiClient::DEFAULT_BASE_URL.to_string(),
                timeout_secs: 120,
            },
            transcript: TranscriptConfig {
                languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
                max_chars: DEFAULT_MAX_CHARS,
            },
            retry: RetryConfig {
                max_attempts: 5,
                multiplier_secs: 2,
                min_wait_secs: 4,
                max_wait_secs: 60,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path).await?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("video-gist").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must be configured");
        }

        if self.llm.api_key_env.trim().is_empty() {
            anyhow::bail!("llm.api_key_env must name an environment variable");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be between 0.0 and 2.0");
        }

        if self.transcript.languages.is_empty() {
            anyhow::bail!("transcript.languages must list at least one language");
        }

        if self.transcript.max_chars == 0 {
            anyhow::bail!("transcript.max_chars must be greater than zero");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.retry.min_wait_secs > self.retry.max_wait_secs {
            anyhow::bail!("retry.min_wait_secs must not exceed retry.max_wait_secs");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Model: {}", self.llm.model);
        println!("  Temperature: {}", self.llm.temperature);
        println!("  API Key Variable: {}", self.llm.api_key_env);
        println!("  API Base URL: {}", self.llm.base_url);
        println!("  Caption Languages: {}", self.transcript.languages.join(", "));
        println!("  Transcript Cap: {} characters", self.transcript.max_chars);
        println!(
            "  Retry: {} attempts, waits {}s..{}s",
            self.retry.max_attempts, self.retry.min_wait_secs, self.retry.max_wait_secs
        );
    }
}
