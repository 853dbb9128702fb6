//! FILENAME: persistence/src/generation.rs
//! PURPOSE: One complete build of a cache group and the read contract over
//! the serving generation.

use std::collections::BTreeMap;
use pivot_data::{FlatRow, Page, PageKey};
use crate::error::PersistenceError;

/// Header, pages and scalar metadata of one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub header: Option<Vec<String>>,
    pub pages: BTreeMap<PageKey, Vec<FlatRow>>,
    pub values: BTreeMap<String, u64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the page, replacing one with the same key.
    pub fn put_page(&mut self, page: &Page) -> usize {
        self.pages.insert(page.key(), page.rows.clone());
        page.rows.len()
    }

    pub fn row_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }
}

/// Read access to the active generation of a cache group.
pub trait GenerationReader {
    fn active_header(&self) -> Result<Option<Vec<String>>, PersistenceError>;

    /// Keys of every cached page, ascending.
    fn active_page_keys(&self) -> Result<Vec<PageKey>, PersistenceError>;

    fn active_page(&self, key: &PageKey) -> Result<Vec<FlatRow>, PersistenceError>;

    fn active_value(&self, name: &str) -> Result<Option<u64>, PersistenceError>;
}
