//! Investment workflow prompt templates
//!
//! Texts sent to the analyst and shown to the human reviewer:
//! - Analyst instructions demanding a bare JSON recommendation
//! - Analysis, refinement and re-prompt requests
//! - Approval prompts, full or degraded when the reply is unusable

use super::recommendation::{InvestmentRecommendation, RecommendationError};

const RULE_WIDTH: usize = 60;

/// Prompt templates for the investment approval workflow
pub struct InvestPrompts;

impl InvestPrompts {
    /// System instructions for the analyst
    pub fn analyst_instructions() -> &'static str {
        concat!(
            "You are a quantitative investment analyst. ",
            "Analyze stocks and provide structured investment recommendations. ",
            "Consider: financial metrics, market trends, risk factors, and growth potential. ",
            r#"Return ONLY a JSON object matching: {"ticker": str, "action": "BUY/SELL/HOLD", "rationale": str, "confidence": "HIGH/MEDIUM/LOW"}. "#,
            "No additional text or explanations outside the JSON."
        )
    }

    /// First request of a run
    pub fn analysis_request(ticker: &str) -> String {
        format!(
            "Analyze {} and provide an investment recommendation with rationale.",
            ticker
        )
    }

    /// Extract the ticker from a text built by [`Self::analysis_request`]
    pub fn ticker_from_analysis_request(text: &str) -> Option<&str> {
        text.strip_prefix("Analyze ")?.split_whitespace().next()
    }

    /// Request for a revised recommendation
    pub fn refinement_request(feedback: &str) -> String {
        format!(
            "Please refine your recommendation based on this feedback: {}. \
             Return a JSON object matching the schema: \
             {{\"ticker\": str, \"action\": str, \"rationale\": str, \"confidence\": str}}",
            feedback
        )
    }

    /// Extract the feedback from a text built by [`Self::refinement_request`]
    pub fn feedback_from_refinement_request(text: &str) -> Option<&str> {
        let rest = text.strip_prefix("Please refine your recommendation based on this feedback: ")?;
        rest.split_once(". Return a JSON object").map(|(feedback, _)| feedback)
    }

    /// Request sent to the analyst after an unrecognised reply
    pub fn invalid_input_request() -> &'static str {
        "Please provide a valid investment recommendation in JSON format."
    }

    /// Approval prompt for a parsed recommendation
    pub fn recommendation_prompt(rec: &InvestmentRecommendation) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "\n{rule}\n\
             INVESTMENT RECOMMENDATION\n\
             {rule}\n\
             Ticker: {ticker}\n\
             Action: {action}\n\
             Confidence: {confidence}\n\
             Rationale: {rationale}\n\
             {rule}\n\n\
             Type one of:\n  \
             approve - Execute this recommendation\n  \
             refine <feedback> - Request modifications (e.g., 'refine focus on risk factors')\n  \
             exit - Cancel and exit\n",
            rule = rule,
            ticker = rec.ticker,
            action = rec.action,
            confidence = rec.confidence,
            rationale = rec.rationale,
        )
    }

    /// Approval prompt when the reply could not be parsed
    ///
    /// Shows the raw text as-is together with the failure class.
    pub fn degraded_prompt(raw: &str, error: &RecommendationError) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "\n{rule}\n\
             INVESTMENT ANALYSIS\n\
             {rule}\n\
             {raw}\n\
             {rule}\n\
             (Structured recommendation unavailable: {error})\n\n\
             Type one of: approve, refine <feedback>, or exit\n",
            rule = rule,
            raw = raw,
            error = error,
        )
    }

    /// Terminal output of an approved run
    pub fn approval_output(ticker: &str) -> String {
        format!(
            "Investment recommendation for {} approved and ready for execution.",
            ticker
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InvestmentRecommendation {
        InvestmentRecommendation {
            ticker: "MSFT".into(),
            action: "BUY".into(),
            rationale: "Azure growth".into(),
            confidence: "MEDIUM".into(),
        }
    }

    #[test]
    fn test_analysis_request_roundtrip() {
        let text = InvestPrompts::analysis_request("AAPL");
        assert_eq!(
            text,
            "Analyze AAPL and provide an investment recommendation with rationale."
        );
        assert_eq!(InvestPrompts::ticker_from_analysis_request(&text), Some("AAPL"));
        assert_eq!(InvestPrompts::ticker_from_analysis_request("hello"), None);
    }

    #[test]
    fn test_refinement_request_carries_feedback_and_schema() {
        let text = InvestPrompts::refinement_request("focus on risk");
        assert!(text.contains("focus on risk"));
        assert!(text.contains(r#""confidence": str"#));
        assert_eq!(
            InvestPrompts::feedback_from_refinement_request(&text),
            Some("focus on risk")
        );
    }

    #[test]
    fn test_recommendation_prompt_layout() {
        let prompt = InvestPrompts::recommendation_prompt(&sample());
        let rule = "=".repeat(60);

        assert!(prompt.starts_with(&format!("\n{}\nINVESTMENT RECOMMENDATION\n", rule)));
        assert!(prompt.contains("Ticker: MSFT\n"));
        assert!(prompt.contains("Action: BUY\n"));
        assert!(prompt.contains("Confidence: MEDIUM\n"));
        assert!(prompt.contains("Rationale: Azure growth\n"));
        assert!(prompt.contains("  approve - Execute this recommendation\n"));
        assert!(prompt.contains("  refine <feedback> - Request modifications"));
        assert!(prompt.ends_with("  exit - Cancel and exit\n"));
    }

    #[test]
    fn test_degraded_prompt_shows_raw_text_and_error() {
        let prompt = InvestPrompts::degraded_prompt(
            "Buy it, trust me",
            &RecommendationError::Schema("expected value".into()),
        );

        assert!(prompt.contains("INVESTMENT ANALYSIS\n"));
        assert!(prompt.contains("\nBuy it, trust me\n"));
        assert!(prompt.contains("does not match the recommendation schema"));
        assert!(prompt.ends_with("Type one of: approve, refine <feedback>, or exit\n"));
    }

    #[test]
    fn test_approval_output() {
        assert_eq!(
            InvestPrompts::approval_output("AAPL"),
            "Investment recommendation for AAPL approved and ready for execution."
        );
    }

    #[test]
    fn test_instructions_demand_json() {
        let instructions = InvestPrompts::analyst_instructions();
        assert!(instructions.contains("Return ONLY a JSON object"));
        assert!(instructions.contains("BUY/SELL/HOLD"));
    }
}
