//! FILENAME: pivot-engine/src/definition.rs
//! Rebuild Definition - limits, data set configuration and cursor state.
//!
//! These structures are designed to be:
//! - Serializable (limits come from JSON config, cursors are persisted by the
//!   caller between chunks)
//! - Independent of any storage backend

use std::time::Duration;
use serde::{Deserialize, Serialize};
use persistence::DataRequest;
use pivot_data::{EntityIndex, PivotError, RawRow, RebuildParams, Result};

/// Suffix of the derived per-month header column of a date field.
pub const MONTH_COLUMN_SUFFIX: &str = " (per month)";

// ============================================================================
// LIMITS
// ============================================================================

/// Numeric bounds of a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildLimits {
    /// Entities fetched from the data source per call.
    pub api_page_size: usize,

    /// Flat rows one page-building pass may produce.
    pub paginated_rows: usize,

    /// Flat rows a single expansion call may emit.
    pub multi_value_rows: usize,

    /// Flat rows returned by one data set read.
    pub return_rows: usize,
}

impl Default for RebuildLimits {
    fn default() -> Self {
        RebuildLimits {
            api_page_size: 1000,
            paginated_rows: 10000,
            multi_value_rows: 1000,
            return_rows: 10000,
        }
    }
}

impl RebuildLimits {
    /// Parses limits from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let limits: RebuildLimits =
            serde_json::from_str(json).map_err(|e| PivotError::InvalidLimits(e.to_string()))?;
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<()> {
        let named = [
            ("api_page_size", self.api_page_size),
            ("paginated_rows", self.paginated_rows),
            ("multi_value_rows", self.multi_value_rows),
            ("return_rows", self.return_rows),
        ];
        if let Some((name, _)) = named.iter().find(|(_, value)| *value == 0) {
            return Err(PivotError::InvalidLimits(format!("{} must be at least 1", name)));
        }
        // A single expansion must always fit into a pass, or a pass could make no progress.
        if self.multi_value_rows > self.paginated_rows {
            return Err(PivotError::InvalidLimits(format!(
                "multi_value_rows ({}) exceeds paginated_rows ({})",
                self.multi_value_rows, self.paginated_rows
            )));
        }
        Ok(())
    }

    /// A read from the start of the active generation, bounded by `return_rows`.
    pub fn data_request(&self) -> DataRequest {
        DataRequest::new().with_return_rows(self.return_rows)
    }
}

// ============================================================================
// DATA SET CONFIGURATION
// ============================================================================

/// How the entity index is derived from a raw row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexStrategy {
    /// The raw value of a field, as text.
    Field { key: String },
    /// The `YYYY-MM-DD` part of a date or date/time field.
    DatePart { key: String },
}

impl IndexStrategy {
    pub fn entity_index(&self, row: &RawRow) -> Result<EntityIndex> {
        match self {
            IndexStrategy::Field { key } => {
                EntityIndex::new(row.get(key).map(|v| v.to_text()).unwrap_or_default())
            }
            IndexStrategy::DatePart { key } => {
                let text = row.get(key).map(|v| v.to_text()).unwrap_or_default();
                EntityIndex::new(date_part(&text))
            }
        }
    }
}

fn date_part(text: &str) -> String {
    let trimmed = text.trim();
    let date = trimmed
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    date.to_string()
}

/// One configurable pipeline for both entity data set flavours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSetConfig {
    /// Cache group name.
    pub name: String,

    pub index: IndexStrategy,

    /// Adds a "<title> (per month)" column for every date field.
    #[serde(default)]
    pub derive_month_columns: bool,
}

impl DataSetConfig {
    /// Report flavour: pages partitioned by entity ID, no derived columns.
    pub fn report(name: impl Into<String>) -> Self {
        DataSetConfig {
            name: name.into(),
            index: IndexStrategy::Field { key: "id".to_string() },
            derive_month_columns: false,
        }
    }

    /// Data flavour: explicit index, per-month columns for date fields.
    pub fn data(name: impl Into<String>, index: IndexStrategy) -> Self {
        DataSetConfig {
            name: name.into(),
            index,
            derive_month_columns: true,
        }
    }
}

// ============================================================================
// CURSOR
// ============================================================================

/// The complete resumable state of an in-progress rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildCursor {
    /// Next entity to fetch.
    pub entity_offset: usize,

    /// Next combination within the entity at `entity_offset`.
    pub combination_offset: usize,

    /// Next page number within `index`.
    pub page: usize,

    /// Entity index of the last page written.
    pub index: Option<EntityIndex>,

    /// Flat rows written so far.
    pub rows_written: u64,

    /// Fingerprint of the params this cursor belongs to.
    pub params_fingerprint: u64,
}

impl RebuildCursor {
    /// A zeroed cursor for a rebuild with `params`.
    pub fn start(params: &RebuildParams) -> Self {
        RebuildCursor {
            entity_offset: 0,
            combination_offset: 0,
            page: 0,
            index: None,
            rows_written: 0,
            params_fingerprint: params.fingerprint(),
        }
    }

    /// True before the first chunk has produced anything.
    pub fn is_initial(&self) -> bool {
        self.entity_offset == 0 && self.combination_offset == 0
    }

    pub fn matches(&self, params: &RebuildParams) -> bool {
        self.params_fingerprint == params.fingerprint()
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of a full rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildSummary {
    pub rows: u64,
    pub elapsed: Duration,
}

/// Result of one chunk of a partial rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutcome {
    pub cursor: RebuildCursor,
    /// Flat rows written by this chunk.
    pub rows: usize,
    /// Set once the generation has been finalized and activated.
    pub completed: bool,
}
