//! FILENAME: pivot-data/src/params.rs
//! PURPOSE: Filter parameters a rebuild is run with.
//! CONTEXT: The same params must be passed to every chunk of a partial
//! rebuild. Cursors remember a fingerprint of the params that produced them.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RebuildParams {
    #[serde(default)]
    pub start_date: Option<String>,

    #[serde(default)]
    pub end_date: Option<String>,

    /// Additional source-specific filters.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

/// Date restriction derived from the params' start and end dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFilter {
    Between(String, String),
    From(String),
    Until(String),
}

impl RebuildParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, start_date: Option<&str>, end_date: Option<&str>) -> Self {
        self.start_date = start_date.map(str::to_string);
        self.end_date = end_date.map(str::to_string);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Blank dates count as absent.
    pub fn date_filter(&self) -> Option<DateFilter> {
        let start = self.start_date.as_deref().filter(|s| !s.trim().is_empty());
        let end = self.end_date.as_deref().filter(|s| !s.trim().is_empty());

        match (start, end) {
            (Some(start), Some(end)) => Some(DateFilter::Between(start.to_string(), end.to_string())),
            (Some(start), None) => Some(DateFilter::From(start.to_string())),
            (None, Some(end)) => Some(DateFilter::Until(end.to_string())),
            (None, None) => None,
        }
    }

    /// Stable hash of the params. FxHasher is unseeded, so the value is
    /// the same across processes on the same platform.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl DateFilter {
    /// Inclusive bound check on `YYYY-MM-DD`-style text, which orders lexically.
    pub fn contains(&self, date: &str) -> bool {
        match self {
            DateFilter::Between(start, end) => date >= start.as_str() && date <= end.as_str(),
            DateFilter::From(start) => date >= start.as_str(),
            DateFilter::Until(end) => date <= end.as_str(),
        }
    }
}
