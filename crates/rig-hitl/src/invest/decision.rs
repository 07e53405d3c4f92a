//! Human reply protocol

/// Feedback used when `refine` comes without any text
pub const DEFAULT_REFINEMENT: &str = "provide more details";

/// A parsed reviewer reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Accept the recommendation
    Approve,
    /// Ask the analyst for changes
    Refine(String),
    /// Abandon the run
    Exit,
    /// Anything else, kept verbatim
    Invalid(String),
}

impl Decision {
    /// Parse a reply; keywords are case-insensitive and surrounding
    /// whitespace is ignored. Refinement text keeps its original casing.
    pub fn parse(reply: &str) -> Self {
        let trimmed = reply.trim();
        let lowered = trimmed.to_lowercase();

        match lowered.as_str() {
            "approve" => return Decision::Approve,
            "exit" => return Decision::Exit,
            _ => {}
        }

        if let Some(rest) = lowered.strip_prefix("refine") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                // "refine" is ASCII, so its byte length is the same in both strings
                let feedback = trimmed["refine".len()..].trim();
                return if feedback.is_empty() {
                    Decision::Refine(DEFAULT_REFINEMENT.to_string())
                } else {
                    Decision::Refine(feedback.to_string())
                };
            }
        }

        Decision::Invalid(trimmed.to_string())
    }

    /// Check if the reply ends the caller loop
    pub fn is_exit(&self) -> bool {
        matches!(self, Decision::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(Decision::parse("approve"), Decision::Approve);
        assert_eq!(Decision::parse("  APPROVE \n"), Decision::Approve);
        assert_eq!(Decision::parse("Exit"), Decision::Exit);
        assert!(Decision::parse("EXIT").is_exit());
    }

    #[test]
    fn test_refine_with_feedback() {
        assert_eq!(
            Decision::parse("refine focus on risk"),
            Decision::Refine("focus on risk".into())
        );
        assert_eq!(
            Decision::parse("REFINE   Compare with GOOGL  "),
            Decision::Refine("Compare with GOOGL".into())
        );
    }

    #[test]
    fn test_refine_without_feedback_uses_default() {
        assert_eq!(
            Decision::parse("refine"),
            Decision::Refine(DEFAULT_REFINEMENT.into())
        );
        assert_eq!(
            Decision::parse("refine   "),
            Decision::Refine(DEFAULT_REFINEMENT.into())
        );
    }

    #[test]
    fn test_invalid_replies() {
        assert_eq!(Decision::parse("maybe"), Decision::Invalid("maybe".into()));
        assert_eq!(Decision::parse(""), Decision::Invalid(String::new()));
        assert_eq!(
            Decision::parse("refinery"),
            Decision::Invalid("refinery".into())
        );
        assert_eq!(
            Decision::parse("approve it"),
            Decision::Invalid("approve it".into())
        );
    }
}
