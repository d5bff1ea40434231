use std::sync::LazyLock;

use regex::Regex;

use crate::error::PostcodeError;

/// Upper bound on raw input length. Real postcodes are at most eight
/// characters; this only guards against pasted paragraphs.
const MAX_POSTCODE_INPUT_LEN: usize = 64;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid separator regex"));

/// Normalise free-text postcode input before it is sent anywhere.
///
/// Punctuation and whitespace runs become a single space, the result is
/// trimmed and upper-cased, so `"ln1-1aa."` becomes `"LN1 1AA"`. Partial
/// postcodes such as an outward code alone (`"LN1"`) are accepted; the
/// geocoder decides whether they resolve.
///
/// # Errors
///
/// Returns [`PostcodeError`] for blank input, input longer than
/// [`MAX_POSTCODE_INPUT_LEN`] characters, or input with no letters or digits.
pub fn normalize_postcode(raw: &str) -> Result<String, PostcodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PostcodeError::Empty);
    }
    if trimmed.chars().count() > MAX_POSTCODE_INPUT_LEN {
        return Err(PostcodeError::TooLong {
            max: MAX_POSTCODE_INPUT_LEN,
        });
    }

    let normalised = SEPARATORS
        .replace_all(trimmed, " ")
        .trim()
        .to_ascii_uppercase();
    if normalised.is_empty() {
        return Err(PostcodeError::InvalidCharacters);
    }
    Ok(normalised)
}
