//! Token estimation heuristic.
//!
//! No tokenizer dependency: 4 characters per token is close enough for
//! reporting and cost sanity checks, which is all the estimate feeds.

/// Estimated token count for a text (1 token ≈ 4 chars).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_chars_per_token() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("12345678901234567890"), 5);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 8 two-byte chars = 2 estimated tokens, not 4
        assert_eq!(estimate_tokens("ääääääää"), 2);
    }
}
