//! Token cost estimation.

/// Average characters per language-model token for English prose.
const CHARS_PER_TOKEN: usize = 4;

/// Rough token estimate for a piece of text (~4 characters per token, rounded up).
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    chars.div_ceil(CHARS_PER_TOKEN)
}
