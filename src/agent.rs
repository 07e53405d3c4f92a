//! # Agent Module
//!
//! Builds the model client behind the analyst vertex. Ollama and OpenAI go
//! through Rig agents wrapped in `RigModelClient`; offline mode uses a
//! scripted client that generates canned recommendations.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use rig::client::{CompletionClient, Nothing, ProviderClient};
use rig::providers::{ollama, openai};
use rig_hitl::compat::RigModelClient;
use rig_hitl::invest::offline_reply;
use rig_hitl::llm::{ModelClient, ScriptedModelClient};
use tracing::{debug, info};

use crate::config::{Config, ModelProvider};

/// Create the model client for the configured provider.
///
/// The analyst sends its instructions as a system turn, which
/// `RigModelClient` merges into the agent preamble, so the Rig agent itself
/// is built without one.
pub fn build_model_client(config: &Config) -> Result<Arc<dyn ModelClient>> {
    match config.provider {
        ModelProvider::Ollama => {
            let client: ollama::Client = ollama::Client::builder()
                .api_key(Nothing)
                .base_url(&config.ollama_host)
                .build()
                .context("Failed to create Ollama client")?;
            let agent = client.agent(&config.model).build();

            debug!(host = %config.ollama_host, model = %config.model, "Connected to Ollama");
            Ok(Arc::new(RigModelClient::with_name(
                agent,
                format!("ollama/{}", config.model),
            )))
        }
        ModelProvider::OpenAi => {
            if env::var("OPENAI_API_KEY").is_err() {
                anyhow::bail!("OPENAI_API_KEY must be set to use the openai provider");
            }
            let client = openai::Client::from_env();
            let agent = client.agent(&config.model).build();

            debug!(model = %config.model, "Using OpenAI");
            Ok(Arc::new(RigModelClient::with_name(
                agent,
                format!("openai/{}", config.model),
            )))
        }
        ModelProvider::Offline => {
            info!("Offline mode: recommendations are generated locally");
            Ok(Arc::new(
                ScriptedModelClient::new(Vec::<String>::new()).with_fallback(offline_reply),
            ))
        }
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use rig_hitl::invest::{InvestPrompts, InvestmentRecommendation};
    use rig_hitl::state::ChatMessage;

    #[tokio::test]
    async fn test_offline_client() {
        let config = Config {
            provider: ModelProvider::Offline,
            ..Config::default()
        };
        let client = build_model_client(&config).unwrap();
        assert_eq!(client.name(), "scripted");

        let reply = client
            .generate(&[ChatMessage::user(InvestPrompts::analysis_request("AAPL"))])
            .await
            .unwrap();
        let rec = InvestmentRecommendation::parse(&reply).unwrap();
        assert_eq!(rec.ticker, "AAPL");
    }

    // Building a Rig agent spawns its tool server, so this needs a runtime
    #[tokio::test]
    async fn test_ollama_client_named_after_model() {
        let config = Config {
            ollama_host: "http://gpu-box:11434".to_string(),
            ..Config::default()
        };
        let client = build_model_client(&config).unwrap();
        assert_eq!(client.name(), "ollama/llama3.2");
    }
}
