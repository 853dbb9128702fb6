//! FILENAME: persistence/src/dataset.rs
//! PURPOSE: Bounded reads over the active generation of a cache group.
//!
//! Clients page through a cache group by passing back the `next` position of
//! the previous slice. Pages are never split: a slice holds whole pages and
//! stops before the page that would push it over the row limit.

use serde::{Deserialize, Serialize};
use pivot_data::{EntityIndex, FlatRow, PageKey, PIVOT_COUNT_KEY};
use crate::error::PersistenceError;
use crate::generation::GenerationReader;

/// Default number of rows per slice.
pub const DEFAULT_RETURN_ROWS: usize = 10_000;

/// Inclusive bounds on the entity index. An open side is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub from: Option<EntityIndex>,
    pub to: Option<EntityIndex>,
}

impl IndexRange {
    pub fn between(from: EntityIndex, to: EntityIndex) -> Self {
        IndexRange {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, index: &EntityIndex) -> bool {
        self.from.as_ref().map_or(true, |from| index >= from)
            && self.to.as_ref().map_or(true, |to| index <= to)
    }

    fn is_past(&self, index: &EntityIndex) -> bool {
        self.to.as_ref().map_or(false, |to| index > to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequest {
    /// First page to read; `None` starts at the beginning.
    pub start: Option<PageKey>,
    #[serde(default)]
    pub range: IndexRange,
    pub return_rows: usize,
}

impl Default for DataRequest {
    fn default() -> Self {
        DataRequest {
            start: None,
            range: IndexRange::default(),
            return_rows: DEFAULT_RETURN_ROWS,
        }
    }
}

impl DataRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(mut self, key: PageKey) -> Self {
        self.start = Some(key);
        self
    }

    pub fn within(mut self, range: IndexRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_return_rows(mut self, rows: usize) -> Self {
        self.return_rows = rows;
        self
    }
}

/// Result of one read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSlice {
    pub header: Vec<String>,
    pub rows: Vec<FlatRow>,
    /// First unread page, `None` once the range is exhausted.
    pub next: Option<PageKey>,
    pub pivot_count: Option<u64>,
}

impl DataSlice {
    pub fn next_index(&self) -> Option<&EntityIndex> {
        self.next.as_ref().map(|key| &key.index)
    }

    pub fn next_page(&self) -> Option<usize> {
        self.next.as_ref().map(|key| key.page)
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

pub struct DataSet;

impl DataSet {
    pub fn read<R: GenerationReader + ?Sized>(
        reader: &R,
        request: &DataRequest,
    ) -> Result<DataSlice, PersistenceError> {
        let header = reader.active_header()?.unwrap_or_default();
        let pivot_count = reader.active_value(PIVOT_COUNT_KEY)?;

        let keys: Vec<PageKey> = reader
            .active_page_keys()?
            .into_iter()
            .filter(|key| request.start.as_ref().map_or(true, |start| key >= start))
            .filter(|key| request.range.from.as_ref().map_or(true, |from| &key.index >= from))
            .take_while(|key| !request.range.is_past(&key.index))
            .collect();

        let mut rows: Vec<FlatRow> = Vec::new();
        let mut next = None;

        for key in keys {
            let page = reader.active_page(&key)?;
            if !rows.is_empty() && rows.len() + page.len() > request.return_rows {
                next = Some(key);
                break;
            }
            rows.extend(page);
        }

        Ok(DataSlice {
            header,
            rows,
            next,
            pivot_count,
        })
    }
}
