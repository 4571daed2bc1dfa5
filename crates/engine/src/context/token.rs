//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. Good enough
//! for reporting prompt size; the hard cap is enforced by record counts.

use finpilot_core::message::AssistantMessage;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate tokens for one rendered history turn (`"<Role>: <content>"`).
pub fn estimate_message_tokens(message: &AssistantMessage) -> usize {
    estimate_tokens(message.role.label()) + 1 + estimate_tokens(&message.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(estimate_tokens("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn message_counts_role_label() {
        // "User" → 1, separator → 1, "test" → 1
        assert_eq!(estimate_message_tokens(&AssistantMessage::user("test")), 3);
    }
}
