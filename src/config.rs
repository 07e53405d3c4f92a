//! # Configuration Module
//!
//! Loads the agent configuration from environment variables (and a `.env`
//! file when present). Command-line flags override these values in `main`.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rig_hitl::pregel::PregelConfig;

// =============================================================================
// MODEL PROVIDER
// =============================================================================
/// Where analyst replies come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelProvider {
    /// Local models served by Ollama
    Ollama,
    /// OpenAI API (reads OPENAI_API_KEY)
    #[value(name = "openai")]
    OpenAi,
    /// Canned recommendations, no model endpoint needed
    Offline,
}

impl ModelProvider {
    /// Model used when MODEL_NAME is not set
    pub fn default_model(&self) -> &'static str {
        match self {
            ModelProvider::Ollama => "llama3.2",
            ModelProvider::OpenAi => "gpt-4o-mini",
            ModelProvider::Offline => "offline",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelProvider::Ollama => "ollama",
            ModelProvider::OpenAi => "openai",
            ModelProvider::Offline => "offline",
        };
        f.write_str(name)
    }
}

impl FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ModelProvider::Ollama),
            "openai" => Ok(ModelProvider::OpenAi),
            "offline" => Ok(ModelProvider::Offline),
            other => anyhow::bail!(
                "MODEL_PROVIDER must be one of ollama, openai, offline; got '{}'",
                other
            ),
        }
    }
}

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for the investment agent.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model backend
    pub provider: ModelProvider,

    /// Model name passed to the provider
    pub model: String,

    /// Ollama server URL (default: http://localhost:11434)
    pub ollama_host: String,

    /// Superstep limit per start/resume invocation
    pub max_supersteps: usize,

    /// Timeout for one vertex handler, in seconds
    ///
    /// Covers a single model call, so keep it generous for local models.
    pub vertex_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Ollama,
            model: ModelProvider::Ollama.default_model().to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            max_supersteps: 100,
            vertex_timeout_secs: 300,
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if it exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup.
    ///
    /// # Rust Concept: Generic Closures
    ///
    /// `F: Fn(&str) -> Option<String>` accepts any closure with that shape,
    /// so tests can pass a `HashMap` lookup instead of touching the real
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(val) = lookup("MODEL_PROVIDER") {
            config.provider = val.parse()?;
        }

        config.model = match lookup("MODEL_NAME") {
            Some(val) => val,
            None => config.provider.default_model().to_string(),
        };

        if let Some(val) = lookup("OLLAMA_HOST").or_else(|| lookup("OLLAMA_API_BASE_URL")) {
            config.ollama_host = val;
        }

        if let Some(val) = lookup("MAX_SUPERSTEPS") {
            config.max_supersteps = val
                .parse()
                .context("MAX_SUPERSTEPS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("VERTEX_TIMEOUT_SECS") {
            config.vertex_timeout_secs = val
                .parse()
                .context("VERTEX_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        Ok(config)
    }

    /// Validate the configuration before the agent starts.
    pub fn validate(&self) -> Result<()> {
        if self.max_supersteps == 0 {
            anyhow::bail!("MAX_SUPERSTEPS must be at least 1");
        }

        if self.vertex_timeout_secs == 0 {
            anyhow::bail!("VERTEX_TIMEOUT_SECS must be at least 1");
        }

        if self.model.trim().is_empty() {
            anyhow::bail!("MODEL_NAME cannot be empty");
        }

        if self.provider == ModelProvider::Ollama
            && !(self.ollama_host.starts_with("http://") || self.ollama_host.starts_with("https://"))
        {
            anyhow::bail!(
                "OLLAMA_HOST must be an http(s) URL, got: {}",
                self.ollama_host
            );
        }

        Ok(())
    }

    /// Runtime limits derived from this configuration
    pub fn pregel_config(&self) -> PregelConfig {
        PregelConfig::default()
            .with_max_supersteps(self.max_supersteps)
            .with_vertex_timeout(Duration::from_secs(self.vertex_timeout_secs))
    }
}
