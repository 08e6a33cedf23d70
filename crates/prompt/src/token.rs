//! Prompt size estimates, ~4 characters per token.

/// Wire overhead of one chat message (role name and delimiters).
const MESSAGE_OVERHEAD: usize = 4;

/// Estimate the token count for a string. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate a system + user prompt pair as sent to the provider.
pub fn estimate_prompt(system: &str, user: &str) -> usize {
    [system, user]
        .iter()
        .map(|text| MESSAGE_OVERHEAD + estimate_tokens(text))
        .sum()
}
