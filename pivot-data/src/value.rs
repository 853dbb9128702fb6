//! FILENAME: pivot-data/src/value.rs
//! PURPOSE: Raw entity values as produced by the data source.
//! CONTEXT: A field holds either a scalar or an ordered list of scalars
//! (multi-select attributes). Maps appear for structured leaves such as file
//! attachments and for nested relations.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// A single raw value read from the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    /// Whole numbers (IDs, counts) kept exact. Listed before `Number` so
    /// untagged JSON integers land here.
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    /// Builds a multi-valued field from anything that yields text items.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawValue::List(items.into_iter().map(|s| RawValue::Text(s.into())).collect())
    }

    /// True when the value carries no displayable content.
    /// Lists and maps are blank when every member is blank.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Bool(_) | RawValue::Integer(_) | RawValue::Number(_) => false,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::List(items) => items.iter().all(RawValue::is_blank),
            RawValue::Map(map) => map.values().all(RawValue::is_blank),
        }
    }

    /// Plain text form of the value, used for lookups and memoization keys.
    pub fn to_text(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            RawValue::Integer(n) => n.to_string(),
            RawValue::Number(n) => format_number(*n),
            RawValue::Text(s) => s.clone(),
            RawValue::List(items) => items
                .iter()
                .map(RawValue::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            RawValue::Map(map) => map
                .values()
                .map(RawValue::to_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// RAW ROW
// ============================================================================

/// One logical entity instance: source field key -> raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(BTreeMap<String, RawValue>);

impl RawRow {
    pub fn new() -> Self {
        RawRow(BTreeMap::new())
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) -> Option<RawValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (String, RawValue)>>(iter: T) -> Self {
        RawRow(iter.into_iter().collect())
    }
}
