//! Multi-pattern keyword matcher.
//!
//! Matching is case-insensitive substring containment: a glossary term is
//! present if it appears anywhere in the lower-cased text, including inside
//! larger words. This is deliberate — upgrading to token-boundary matching
//! silently changes which texts are flagged, so the boundary-aware variant
//! is a separate, opt-in [`MatchMode`].
//!
//! Presence, not frequency, drives scoring: each term contributes at most
//! once per text, and results follow glossary order rather than text order.
//!
//! The scan is a single Aho-Corasick pass over the lower-cased text, which
//! preserves the presence/weight contract of the naive per-term
//! `contains` loop at O(text + matches) instead of O(text × glossary).

use aho_corasick::AhoCorasick;
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::glossary::{Glossary, KeywordEntry};

/// How term occurrences are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Raw substring containment (default; matches inside larger words).
    #[default]
    Substring,
    /// Occurrences must not be flanked by word characters.
    WordBoundary,
}

/// A glossary term found in a text, with its weight.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedTerm {
    pub term: String,
    pub weight: f64,
}

/// Compiled matcher over one glossary.
///
/// Built once and shared; queries are read-only.
#[derive(Debug)]
pub struct KeywordMatcher {
    automaton: AhoCorasick,
    entries: Vec<KeywordEntry>,
    mode: MatchMode,
}

impl KeywordMatcher {
    /// Compile the glossary into a matcher.
    pub fn new(glossary: &Glossary, mode: MatchMode) -> Result<Self> {
        let entries: Vec<KeywordEntry> = glossary.entries().to_vec();
        let patterns: Vec<String> = entries.iter().map(|e| e.term.to_lowercase()).collect();
        let automaton = AhoCorasick::new(&patterns)
            .with_context(|| "Failed to compile glossary automaton")?;
        Ok(Self {
            automaton,
            entries,
            mode,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Find glossary terms present in `text`.
    ///
    /// Returns one entry per matched term, in glossary order, regardless of
    /// how often the term occurs.
    pub fn find(&self, text: &str) -> Vec<MatchedTerm> {
        if self.entries.is_empty() || text.is_empty() {
            return Vec::new();
        }

        let haystack = text.to_lowercase();
        let mut present = vec![false; self.entries.len()];

        for hit in self.automaton.find_overlapping_iter(&haystack) {
            let idx = hit.pattern().as_usize();
            if present[idx] {
                continue;
            }
            if self.mode == MatchMode::WordBoundary
                && !on_word_boundary(&haystack, hit.start(), hit.end())
            {
                continue;
            }
            present[idx] = true;
        }

        self.entries
            .iter()
            .zip(present)
            .filter(|(_, p)| *p)
            .map(|(e, _)| MatchedTerm {
                term: e.term.clone(),
                weight: e.weight,
            })
            .collect()
    }
}

/// True when the span `[start, end)` is not flanked by word characters.
fn on_word_boundary(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary(entries: &[(&str, f64)]) -> Glossary {
        Glossary::from_entries(
            entries
                .iter()
                .map(|(t, w)| KeywordEntry {
                    term: t.to_string(),
                    weight: *w,
                })
                .collect(),
        )
        .unwrap()
    }

    fn matcher(entries: &[(&str, f64)], mode: MatchMode) -> KeywordMatcher {
        KeywordMatcher::new(&glossary(entries), mode).unwrap()
    }

    #[test]
    fn case_insensitive_match_carries_weight() {
        let m = matcher(&[("this", 3.0)], MatchMode::Substring);
        let found = m.find("Remove THIS term");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].term, "this");
        assert_eq!(found[0].weight, 3.0);
    }

    #[test]
    fn substring_matches_inside_larger_words() {
        let m = matcher(&[("equity", 2.0)], MatchMode::Substring);
        assert_eq!(m.find("inequity is mentioned").len(), 1);
    }

    #[test]
    fn word_boundary_rejects_embedded_occurrence() {
        let m = matcher(&[("equity", 2.0)], MatchMode::WordBoundary);
        assert!(m.find("inequity is mentioned").is_empty());
        assert_eq!(m.find("equity is mentioned").len(), 1);
        assert_eq!(m.find("(equity)").len(), 1);
    }

    #[test]
    fn repeated_term_counted_once() {
        let m = matcher(&[("alpha", 5.0)], MatchMode::Substring);
        let found = m.find("alpha alpha ALPHA");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn results_follow_glossary_order() {
        let m = matcher(&[("zeta", 1.0), ("alpha", 1.0)], MatchMode::Substring);
        let found = m.find("alpha then zeta");
        let terms: Vec<&str> = found.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["zeta", "alpha"]);
    }

    #[test]
    fn empty_glossary_matches_nothing() {
        let m = matcher(&[], MatchMode::Substring);
        assert!(m.find("anything at all").is_empty());
    }

    #[test]
    fn overlapping_terms_all_reported() {
        let m = matcher(&[("diverse", 1.0), ("diversity", 2.0)], MatchMode::Substring);
        let found = m.find("diversity statement");
        assert_eq!(found.len(), 2);
    }
}
