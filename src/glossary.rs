//! Weighted keyword glossary.
//!
//! The glossary is loaded once at startup from a JSON file and never mutated
//! afterwards. Two file shapes are accepted: a flat array of bare terms
//! (each weighted 1.0) and an array of `{term, weight}` objects. The two may
//! be mixed in one file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One glossary term with its sensitivity weight.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordEntry {
    pub term: String,
    pub weight: f64,
}

/// A glossary file entry: either a bare term or a weighted object.
///
/// The object form also accepts `keyword`/`score` as field names, the
/// spelling used by older glossary exports.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Bare(String),
    Weighted {
        #[serde(alias = "keyword")]
        term: String,
        #[serde(default = "default_weight", alias = "score")]
        weight: f64,
    },
}

fn default_weight() -> f64 {
    1.0
}

/// The immutable, process-wide keyword set.
///
/// Entries preserve file order; matching results are reported in this order.
#[derive(Debug, Clone, Default)]
pub struct Glossary {
    entries: Vec<KeywordEntry>,
}

impl Glossary {
    /// Load and normalize a glossary from a JSON file.
    ///
    /// Normalization: terms are trimmed, empty terms dropped, duplicates
    /// (case-insensitive) collapsed to the first occurrence. A negative
    /// weight is a load error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read glossary file: {}", path.display()))?;
        let raw: Vec<FileEntry> =
            serde_json::from_str(&content).with_context(|| "Failed to parse glossary file")?;
        Self::from_file_entries(raw)
    }

    /// Build a glossary from already-weighted entries (tests, embedding callers).
    pub fn from_entries(entries: Vec<KeywordEntry>) -> Result<Self> {
        Self::from_file_entries(
            entries
                .into_iter()
                .map(|e| FileEntry::Weighted {
                    term: e.term,
                    weight: e.weight,
                })
                .collect(),
        )
    }

    fn from_file_entries(raw: Vec<FileEntry>) -> Result<Self> {
        let mut entries: Vec<KeywordEntry> = Vec::with_capacity(raw.len());
        for entry in raw {
            let (term, weight) = match entry {
                FileEntry::Bare(term) => (term, 1.0),
                FileEntry::Weighted { term, weight } => (term, weight),
            };
            let term = term.trim().to_string();
            if term.is_empty() {
                continue;
            }
            if weight < 0.0 {
                anyhow::bail!("glossary term '{}' has negative weight {}", term, weight);
            }
            let lower = term.to_lowercase();
            if entries.iter().any(|e| e.term.to_lowercase() == lower) {
                continue;
            }
            entries.push(KeywordEntry { term, weight });
        }
        Ok(Self { entries })
    }

    /// All entries in glossary (file) order.
    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
