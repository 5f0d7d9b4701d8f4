// src/search.rs

use crate::{ingest::RawRow, predict::PredictionRecord};

/// Most hits a search ever materializes.
pub const SEARCH_RESULT_LIMIT: usize = 100;

/// Anything that can appear in the batch list.
pub trait BatchLabel {
    /// Identifier carried by the item itself, if any.
    fn explicit_batch_id(&self) -> Option<&str>;
}

impl BatchLabel for RawRow {
    fn explicit_batch_id(&self) -> Option<&str> {
        self.batch_id()
    }
}

impl BatchLabel for PredictionRecord {
    fn explicit_batch_id(&self) -> Option<&str> {
        Some(self.batch_id.as_str()).filter(|id| !id.is_empty())
    }
}

/// `BATCH_00001`-style label for a zero-based position.
pub fn positional_batch_id(index: usize) -> String {
    format!("BATCH_{:05}", index + 1)
}

/// Label shown for the item at `index`.
pub fn display_label<T: BatchLabel>(item: &T, index: usize) -> String {
    item.explicit_batch_id()
        .map(str::to_string)
        .unwrap_or_else(|| positional_batch_id(index))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// First matches, in storage order, at most `SEARCH_RESULT_LIMIT`.
    pub hits: Vec<SearchHit>,
    /// Matches beyond the visible ones.
    pub remaining: usize,
}

impl SearchResults {
    pub fn is_truncated(&self) -> bool {
        self.remaining > 0
    }
}

/// Case-insensitive substring filter over batch labels. An empty term matches everything.
pub fn search<T: BatchLabel>(items: &[T], term: &str) -> SearchResults {
    let needle = term.to_lowercase();
    let mut results = SearchResults::default();

    for (index, item) in items.iter().enumerate() {
        let label = display_label(item, index);
        if !label.to_lowercase().contains(&needle) {
            continue;
        }
        if results.hits.len() < SEARCH_RESULT_LIMIT {
            results.hits.push(SearchHit { index, label });
        } else {
            results.remaining += 1;
        }
    }

    results
}

/// Index of the batch currently on display.
///
/// Every operation takes the length of the sequence it points into and
/// keeps the index inside `[0, len - 1]`; with an empty sequence the
/// cursor is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCursor {
    index: Option<usize>,
}

impl BatchCursor {
    pub fn get(&self) -> Option<usize> {
        self.index
    }

    /// Cursor at the first item, or absent when there is none.
    pub fn reset(&mut self, len: usize) {
        self.index = if len == 0 { None } else { Some(0) };
    }

    pub fn clear(&mut self) {
        self.index = None;
    }

    pub fn select(&mut self, index: usize, len: usize) -> Option<usize> {
        self.index = if len == 0 {
            None
        } else {
            Some(index.min(len - 1))
        };
        self.index
    }

    pub fn next(&mut self, len: usize) -> Option<usize> {
        let target = self.index.map(|i| i.saturating_add(1)).unwrap_or(0);
        self.select(target, len)
    }

    pub fn previous(&mut self, len: usize) -> Option<usize> {
        let target = self.index.map(|i| i.saturating_sub(1)).unwrap_or(0);
        self.select(target, len)
    }
}
