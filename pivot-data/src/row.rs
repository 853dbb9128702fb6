//! FILENAME: pivot-data/src/row.rs
//! PURPOSE: Formatted rows and the entity index that partitions the cache.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::{PivotError, Result};
use crate::page::CACHE_KEY_DELIMITER;

// ============================================================================
// ENTITY INDEX
// ============================================================================

/// Cache partition key derived from one field of a row (an ID, a date, ...).
/// Never contains the cache key delimiter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityIndex(String);

impl EntityIndex {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.contains(CACHE_KEY_DELIMITER) {
            return Err(PivotError::InvalidEntityIndex(value));
        }
        Ok(EntityIndex(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityIndex {
    type Error = PivotError;

    fn try_from(value: String) -> Result<Self> {
        EntityIndex::new(value)
    }
}

impl From<EntityIndex> for String {
    fn from(index: EntityIndex) -> Self {
        index.0
    }
}

impl AsRef<str> for EntityIndex {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// FORMATTED ROW
// ============================================================================

/// A formatted cell: one display string, or the ordered values of a
/// multi-valued field awaiting combinatorial expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormattedValue {
    Single(String),
    Multi(Vec<String>),
}

impl FormattedValue {
    pub fn empty() -> Self {
        FormattedValue::Single(String::new())
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FormattedValue::Multi(_))
    }
}

/// Display label -> formatted value, sorted by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedRow {
    pub index: EntityIndex,
    values: BTreeMap<String, FormattedValue>,
    /// Labels holding multi-valued data, in label order.
    multi_valued: Vec<String>,
}

impl FormattedRow {
    pub fn new(index: EntityIndex, values: BTreeMap<String, FormattedValue>) -> Self {
        let multi_valued = values
            .iter()
            .filter(|(_, value)| value.is_multi())
            .map(|(label, _)| label.clone())
            .collect();
        FormattedRow {
            index,
            values,
            multi_valued,
        }
    }

    pub fn values(&self) -> &BTreeMap<String, FormattedValue> {
        &self.values
    }

    pub fn get(&self, label: &str) -> Option<&FormattedValue> {
        self.values.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn multi_valued(&self) -> &[String] {
        &self.multi_valued
    }

    /// Value counts of the multi-valued fields, in label order.
    pub fn multi_value_sizes(&self) -> Vec<usize> {
        self.values
            .values()
            .filter_map(|value| match value {
                FormattedValue::Multi(items) => Some(items.len()),
                FormattedValue::Single(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
