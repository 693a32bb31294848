//! Prompt size estimation.
//!
//! The generation endpoint bills and limits by tokens, but the real tokenizer
//! lives on the remote side. These heuristics are only used for reporting
//! and for warning about unusually large prompts.

const CHARS_PER_TOKEN: usize = 4;
const WORD_WEIGHT: f64 = 1.3;
const SPECIAL_CHARS_PER_TOKEN: usize = 10;

/// Heuristic used to estimate prompt tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    /// Character-based estimate (~4 chars per token)
    #[default]
    Simple,
    /// Blend of word count, character count and punctuation density
    Enhanced,
}

impl TokenizerKind {
    /// Estimates the number of tokens in `text`.
    ///
    /// Returns 0 only for empty input.
    #[must_use]
    pub fn estimate(self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        match self {
            Self::Simple => char_estimate(text).max(1),
            Self::Enhanced => enhanced_estimate(text).max(1),
        }
    }
}

fn char_estimate(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Averages a word-based and a character-based estimate, then adds a
/// penalty for punctuation, which source code is dense in.
fn enhanced_estimate(text: &str) -> usize {
    let words = text.split_whitespace().count();
    let chars = text.chars().count();
    let special = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let by_words = (words as f64 * WORD_WEIGHT) as usize;
    let by_chars = chars / CHARS_PER_TOKEN;

    (by_words + by_chars) / 2 + special / SPECIAL_CHARS_PER_TOKEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prompt() {
        assert_eq!(TokenizerKind::Simple.estimate(""), 0);
        assert_eq!(TokenizerKind::Enhanced.estimate(""), 0);
    }

    #[test]
    fn test_simple_rounds_up() {
        assert_eq!(TokenizerKind::Simple.estimate("test"), 1);
        assert_eq!(TokenizerKind::Simple.estimate("hello world"), 3);
        assert_eq!(TokenizerKind::Simple.estimate(&"a".repeat(1000)), 250);
    }

    #[test]
    fn test_simple_counts_chars_not_bytes() {
        // 6 chars, 12 bytes
        assert_eq!(TokenizerKind::Simple.estimate("привет"), 2);
    }

    #[test]
    fn test_enhanced_on_code() {
        let code = r#"
            fn main() {
                println!("Hello, world!");
            }
        "#;
        let result = TokenizerKind::Enhanced.estimate(code);
        assert!(result > 5);
        assert!(result < 30);
    }

    #[test]
    fn test_enhanced_never_zero_for_text() {
        assert_eq!(TokenizerKind::Enhanced.estimate("a"), 1);
    }
}
