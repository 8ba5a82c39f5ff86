//! Prompt templates for the chat assistant.
//!
//! Templates use `format!()` interpolation so a missing variable is a
//! compile-time error rather than a runtime surprise.

/// System role for chat completions.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful product management assistant with access \
     to customer feedback and development ticket data.";

/// Generate the analysis prompt for a chat question.
///
/// `context` is the pre-formatted block of related feedback and ticket lines;
/// the caller decides how much evidence to include.
///
/// # Example
/// ```
/// use vox::llm::prompts::chat_analysis_prompt;
///
/// let prompt = chat_analysis_prompt("Why are logins failing?", "1. [rec1] Login broken");
/// assert!(prompt.contains("Why are logins failing?"));
/// assert!(prompt.contains("[rec1]"));
/// ```
pub fn chat_analysis_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are an AI assistant helping a Product Manager analyze customer feedback and development tickets.

Question: "{question}"

{context}

Based on the related feedback and tickets above, provide a helpful analysis that:
1. Directly answers the question
2. References specific feedback IDs or tickets when relevant
3. Identifies patterns or trends if applicable
4. Suggests actionable insights for the PM

Keep your response concise but informative (2-3 paragraphs max)."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_prompt_embeds_question_and_context() {
        let prompt = chat_analysis_prompt(
            "What do customers say about billing?",
            "Related Customer Feedback:\n1. [rec42] Invoice totals wrong (Team: Billing Team, Priority: High)",
        );

        assert!(prompt.contains("What do customers say about billing?"));
        assert!(prompt.contains("[rec42]"));
        assert!(prompt.contains("actionable insights"));
    }
}
