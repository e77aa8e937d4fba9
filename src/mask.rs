//! Verbatim ignore-phrase masking.
//!
//! Callers supply literal phrases that must not contribute to scoring.
//! Each phrase is deleted from the text before matching: case-insensitive,
//! metacharacters escaped, every occurrence removed. Phrases apply in the
//! order given; a deletion can create or destroy a later phrase's match and
//! the masker does not re-scan for it. Masking happens once, before
//! matching — masked spans are never restored.

use regex::RegexBuilder;

/// Split a newline-delimited ignore block into phrases.
///
/// Lines are trimmed; empty lines are dropped.
pub fn parse_ignore_phrases(block: &str) -> Vec<String> {
    block
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

/// Delete every occurrence of each phrase from `text`.
///
/// Pure function; an empty phrase list returns the input unchanged.
pub fn mask(text: &str, phrases: &[String]) -> String {
    let mut cleaned = text.to_string();
    for phrase in phrases {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            continue;
        }
        let pattern = match RegexBuilder::new(&regex::escape(phrase))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re,
            // escape() guarantees a valid pattern; skip the phrase if not.
            Err(_) => continue,
        };
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}
