//! Fixed replies used when a turn cannot produce a model answer.

/// Returned when a turn ends without any assistant message.
pub const NO_RESPONSE: &str = "I apologize, but I couldn't generate a response. Please try again.";

/// Returned when the turn fails, and appended when the model call fails.
pub const TECHNICAL_DIFFICULTIES: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again.";

/// Leading marker of every reply produced without a live model.
pub const FALLBACK_MARKER: &str = "[fallback]";

/// Deterministic reply for a turn handled without a live model.
pub fn disabled_reply(user_type: &str) -> String {
    format!(
        "{FALLBACK_MARKER} Hello! I'm a mock chatbot response to your message. \
         (User type: {user_type}) Your message was processed successfully, but no \
         live language model is configured. Set a provider and its API key to \
         enable real responses."
    )
}

/// True if `reply` came from [`disabled_reply`].
pub fn is_fallback(reply: &str) -> bool {
    reply.starts_with(FALLBACK_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_reply_mentions_user_type() {
        let reply = disabled_reply("support_agent");
        assert!(is_fallback(&reply));
        assert!(reply.contains("(User type: support_agent)"));
    }

    #[test]
    fn test_fixed_strings_are_not_fallback_marked() {
        assert!(!is_fallback(NO_RESPONSE));
        assert!(!is_fallback(TECHNICAL_DIFFICULTIES));
        assert_ne!(NO_RESPONSE, TECHNICAL_DIFFICULTIES);
    }
}
