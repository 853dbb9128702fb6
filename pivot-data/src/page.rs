//! FILENAME: pivot-data/src/page.rs
//! PURPOSE: Cache pages and the keys they are stored under.
//!
//! A page key looks like `data_2017-08-30_000001`:
//! - `data` is the constant prefix for pivot data entries,
//! - `2017-08-30` is the entity index,
//! - `000001` is the zero-padded page number within that index.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{PivotError, Result};
use crate::row::EntityIndex;

/// Separates the parts of a cache key.
pub const CACHE_KEY_DELIMITER: char = '_';

/// Prefix of every data page key.
pub const DATA_KEY_PREFIX: &str = "data";

/// One flat (fully expanded) row of display values, in header order.
pub type FlatRow = Vec<String>;

/// A bounded run of flat rows belonging to a single entity index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub rows: Vec<FlatRow>,
    pub index: EntityIndex,
    /// 0-based page number within `index`.
    pub page: usize,
    /// Entity offset to fetch from when resuming after this page.
    pub next_entity_offset: usize,
    /// Combination offset within the entity at `next_entity_offset`.
    pub next_combination_offset: usize,
}

impl Page {
    pub fn key(&self) -> PageKey {
        PageKey::new(self.index.clone(), self.page)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// PAGE KEY
// ============================================================================

/// Position of a page in the cache; orders by index, then page number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageKey {
    pub index: EntityIndex,
    pub page: usize,
}

impl PageKey {
    pub fn new(index: EntityIndex, page: usize) -> Self {
        PageKey { index, page }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{:06}",
            DATA_KEY_PREFIX, CACHE_KEY_DELIMITER, self.index, CACHE_KEY_DELIMITER, self.page
        )
    }
}

impl FromStr for PageKey {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PivotError::Cache(format!("Malformed page key: {}", s));

        let rest = s
            .strip_prefix(DATA_KEY_PREFIX)
            .and_then(|rest| rest.strip_prefix(CACHE_KEY_DELIMITER))
            .ok_or_else(invalid)?;
        let (index, page) = rest.rsplit_once(CACHE_KEY_DELIMITER).ok_or_else(invalid)?;
        let page = page.parse::<usize>().map_err(|_| invalid())?;

        Ok(PageKey::new(EntityIndex::new(index)?, page))
    }
}
