//! Structured investment recommendation and its validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::ModelError;

/// Structured output expected from the analyst
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentRecommendation {
    pub ticker: String,
    /// BUY, SELL or HOLD
    pub action: String,
    pub rationale: String,
    /// HIGH, MEDIUM or LOW
    pub confidence: String,
}

/// Why an analyst reply could not be used as a recommendation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecommendationError {
    #[error("model call failed: {0}")]
    Provider(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("response does not match the recommendation schema: {0}")]
    Schema(String),
}

impl From<ModelError> for RecommendationError {
    fn from(error: ModelError) -> Self {
        RecommendationError::Provider(error.to_string())
    }
}

impl InvestmentRecommendation {
    /// Validate model output against the recommendation schema
    ///
    /// A surrounding Markdown code fence is tolerated; anything else must be
    /// a JSON object with all four string fields.
    pub fn parse(text: &str) -> Result<Self, RecommendationError> {
        let body = strip_code_fence(text.trim());
        if body.is_empty() {
            return Err(RecommendationError::EmptyResponse);
        }
        serde_json::from_str(body).map_err(|e| RecommendationError::Schema(e.to_string()))
    }

    /// Serialize as compact JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
