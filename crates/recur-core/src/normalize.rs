//! Merchant-name normalization
//!
//! Bank feeds describe the same merchant many ways ("Netflix.com",
//! "NETFLIX INC", "NETFLIX COM *1234"). Normalization collapses the
//! variants onto one comparable key so their charges group together.

/// Trailing tokens that carry no merchant identity: corporate suffixes and
/// domain leftovers that survive punctuation stripping.
const NOISE_SUFFIXES: &[&str] = &[
    "INC", "LLC", "LTD", "CORP", "CO", "COM", "NET", "ORG", "WWW", "US", "USA",
];

/// Normalize a raw merchant or description string into a grouping key.
///
/// Uppercases, replaces every character outside `[A-Z0-9]` and whitespace
/// with a space, collapses whitespace runs, trims, then drops trailing
/// noise tokens (corporate suffixes, domain leftovers, store numbers) as
/// long as at least one token remains. Total and idempotent.
pub fn normalize_merchant(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let spaced: String = upper
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens: Vec<&str> = spaced.split_whitespace().collect();
    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1];
        let is_noise =
            NOISE_SUFFIXES.contains(&last) || last.chars().all(|c| c.is_ascii_digit());
        if !is_noise {
            break;
        }
        tokens.pop();
    }

    tokens.join(" ")
}
