//! Word catalog: categories of secret words with their impostor hints.
//!
//! The dataset is a JSON object mapping a category name to a list of
//! entries. An entry is either a bare word or `{ "word": ..., "hint": ... }`.

use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::types::{WordPair, ALL_CATEGORIES};

/// Hint used when an entry does not define one
pub const DEFAULT_HINT: &str = "general";
/// Word used when the requested pool is empty
pub const FALLBACK_WORD: &str = "pizza";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Word(String),
    Pair { word: String, hint: Option<String> },
}

impl From<RawEntry> for WordPair {
    fn from(entry: RawEntry) -> Self {
        match entry {
            RawEntry::Word(word) => WordPair {
                word,
                hint: DEFAULT_HINT.to_string(),
            },
            RawEntry::Pair { word, hint } => WordPair {
                word,
                hint: hint
                    .filter(|h| !h.is_empty())
                    .unwrap_or_else(|| DEFAULT_HINT.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: BTreeMap<String, Vec<WordPair>>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, Option<Vec<RawEntry>>> = serde_json::from_str(json)?;
        let categories = raw
            .into_iter()
            .map(|(name, entries)| {
                let pairs = entries
                    .unwrap_or_default()
                    .into_iter()
                    .map(WordPair::from)
                    .collect();
                (name, pairs)
            })
            .collect();
        Ok(Self { categories })
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load the catalog, falling back to an empty one if the file is unusable
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    categories = catalog.categories.len(),
                    "Word catalog loaded"
                );
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "Failed to load word catalog: {}. Every game will use the fallback word.",
                    e
                );
                Self::default()
            }
        }
    }

    /// Category names, sorted
    pub fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    /// Pick a word pair uniformly from the category's pool.
    ///
    /// `"All"` pools every category. An unknown category or an empty pool
    /// yields the fallback pair instead of failing.
    pub fn pick_word_pair(&self, category: &str) -> WordPair {
        let pool: Vec<&WordPair> = if category == ALL_CATEGORIES {
            self.categories.values().flatten().collect()
        } else {
            self.categories
                .get(category)
                .map(|list| list.iter().collect())
                .unwrap_or_default()
        };

        match pool.choose(&mut rand::rng()) {
            Some(pair) => (*pair).clone(),
            None => WordPair {
                word: FALLBACK_WORD.to_string(),
                hint: DEFAULT_HINT.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "Animals": ["elephant", {"word": "giraffe", "hint": "tall"}],
        "Food": [{"word": "pasta"}],
        "Empty": null
    }"#;

    #[test]
    fn test_entries_are_normalized() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(
            catalog.category_names(),
            vec!["Animals".to_string(), "Empty".to_string(), "Food".to_string()]
        );

        let animals = &catalog.categories["Animals"];
        assert_eq!(animals[0].word, "elephant");
        assert_eq!(animals[0].hint, DEFAULT_HINT);
        assert_eq!(animals[1].hint, "tall");
        assert_eq!(catalog.categories["Food"][0].hint, DEFAULT_HINT);
        assert!(catalog.categories["Empty"].is_empty());
    }

    #[test]
    fn test_pick_from_category() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        for _ in 0..20 {
            let pair = catalog.pick_word_pair("Food");
            assert_eq!(pair.word, "pasta");
        }
    }

    #[test]
    fn test_pick_from_all_pools_every_category() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        for _ in 0..50 {
            let pair = catalog.pick_word_pair(ALL_CATEGORIES);
            assert!(["elephant", "giraffe", "pasta"].contains(&pair.word.as_str()));
        }
    }

    #[test]
    fn test_empty_pool_falls_back() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let pair = catalog.pick_word_pair("Empty");
        assert_eq!(pair.word, FALLBACK_WORD);
        assert_eq!(pair.hint, DEFAULT_HINT);

        let pair = catalog.pick_word_pair("Nope");
        assert_eq!(pair.word, FALLBACK_WORD);

        let pair = Catalog::default().pick_word_pair(ALL_CATEGORIES);
        assert_eq!(pair.word, FALLBACK_WORD);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.category_names().len(), 3);
    }

    #[test]
    fn test_missing_file_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load_or_empty(&dir.path().join("missing.json"));
        assert!(catalog.category_names().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            Catalog::from_json("[1, 2]"),
            Err(CatalogError::Parse(_))
        ));
    }
}
