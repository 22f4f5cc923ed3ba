//! Last-known state per product URL, persisted as one JSON document.
//!
//! The file is read once before a run and written once after it, whole:
//!
//! ```json
//! {
//!   "https://www.bestbuy.ca/en-ca/product/19177947": {
//!     "price": 3899.99,
//!     "availability": "In Stock"
//!   }
//! }
//! ```
use pricewatch_common::HistoryEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("history {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write history {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),
}

/// URL → last observation. At most one entry per URL; the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: BTreeMap<String, HistoryEntry>,
}

impl History {
    /// Read the history file. A missing or blank file is an empty history.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path=%path.display(), "history.load.absent");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(HistoryError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let history: Self = serde_json::from_str(&text).map_err(|source| HistoryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path=%path.display(), entries = history.len(), "history.load");
        Ok(history)
    }

    /// Overwrite the history file with the whole mapping, 2-space indented.
    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        let mut text = serde_json::to_string_pretty(self).map_err(HistoryError::Encode)?;
        text.push('\n');

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| HistoryError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(path, text).map_err(|source| HistoryError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path=%path.display(), entries = self.len(), "history.save");
        Ok(())
    }

    pub fn get(&self, url: &str) -> Option<&HistoryEntry> {
        self.entries.get(url)
    }

    pub fn upsert(&mut self, url: &str, entry: HistoryEntry) {
        self.entries.insert(url.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_common::Availability;
    use rust_decimal::Decimal;

    fn entry(price: Option<i64>, availability: Availability) -> HistoryEntry {
        HistoryEntry {
            price: price.map(Decimal::from),
            availability,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("history.json");

        let mut history = History::default();
        history.upsert("https://example.com/a", entry(Some(999), Availability::InStock));
        history.upsert("https://example.com/b", entry(None, Availability::OutOfStock));
        history.upsert(
            "https://example.com/c",
            HistoryEntry {
                price: Some(Decimal::new(12995, 1)),
                availability: Availability::InStock,
            },
        );
        history.save(&path).unwrap();

        let loaded = History::load(&path).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn saved_file_uses_two_space_indent_and_display_labels() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        let mut history = History::default();
        history.upsert("u", entry(None, Availability::OutOfStock));
        history.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "{\n  \"u\": {\n    \"price\": null,\n    \"availability\": \"Out of Stock\"\n  }\n}\n"
        );
    }

    #[test]
    fn absent_file_is_empty_history() {
        let tmp = tempfile::tempdir().unwrap();
        let history = History::load(&tmp.path().join("missing.json")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            History::load(&path),
            Err(HistoryError::Parse { .. })
        ));
    }

    #[test]
    fn upsert_replaces_previous_entry() {
        let mut history = History::default();
        history.upsert("u", entry(Some(100), Availability::InStock));
        history.upsert("u", entry(Some(90), Availability::OutOfStock));
        assert_eq!(history.len(), 1);
        assert_eq!(
            history.get("u"),
            Some(&entry(Some(90), Availability::OutOfStock))
        );
    }
}
