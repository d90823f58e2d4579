//! Seed derivation from content titles.
//!
//! The seed is the decimal concatenation of one mapped digit group per
//! title, taken in sorted key-token order, so input order never matters.

use log::debug;

/// Seed used whenever the digit string is empty, overflows `u64` or is zero.
///
/// A zero state would pin xorshift at zero forever.
pub const FALLBACK_SEED: u64 = 0xdead_beef;

const NON_LETTER_DIGITS: &str = "26";

/// Returns the token a title contributes to the seed.
///
/// Second whitespace-separated token when there are at least two, otherwise
/// the first, otherwise the empty string.
pub fn key_token(title: &str) -> &str {
    let mut tokens = title.split_whitespace();
    let first = tokens.next().unwrap_or("");
    tokens.next().unwrap_or(first)
}

/// Derives the shuffle seed for a list of titles.
pub fn compute_seed<I, S>(titles: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = titles
        .into_iter()
        .map(|title| key_token(title.as_ref()).to_lowercase())
        .collect::<Vec<_>>();
    // Stable sort.
    tokens.sort();

    let digits = tokens
        .iter()
        .map(|token| map_last_char(token))
        .collect::<String>();

    match digits.parse::<u64>() {
        Ok(seed) if seed != 0 => seed,
        Ok(_) => {
            debug!("event=seed_fallback module=shuffle reason=zero tokens={}", tokens.len());
            FALLBACK_SEED
        }
        Err(_) => {
            debug!(
                "event=seed_fallback module=shuffle reason=unparsable tokens={} digits_len={}",
                tokens.len(),
                digits.len()
            );
            FALLBACK_SEED
        }
    }
}

fn map_last_char(token: &str) -> String {
    match token.chars().last() {
        Some(ch @ 'a'..='z') => (ch as u32 - 'a' as u32).to_string(),
        _ => NON_LETTER_DIGITS.to_string(),
    }
}
