//! FILENAME: pivot-engine/src/lib.rs
//! Pivot report cache rebuild pipeline.
//!
//! Materializes a denormalized, paginated, flattened cache of entity data for
//! interactive pivot-table exploration.
//!
//! Layers:
//! - `definition`: Serializable configuration and resumable cursor state
//! - `format`: Raw nested rows -> sorted label/value rows (RowFormatter)
//! - `expand`: Multi-valued rows -> combinatorial flat rows (CombinationExpander)
//! - `page`: Flat rows -> bounded pages with continuation cursors (PageBuilder)
//! - `rebuild`: The fetch -> format -> expand -> page -> cache loop (RebuildOrchestrator)
//! - `render`: Standard display rules for typed values

pub mod definition;
pub mod expand;
pub mod format;
pub mod page;
pub mod rebuild;
pub mod render;

pub use definition::{
    ChunkOutcome, DataSetConfig, IndexStrategy, RebuildCursor, RebuildLimits, RebuildSummary,
    MONTH_COLUMN_SUFFIX,
};
pub use expand::{expand_row, CombinationExpander, Expansion, ExpansionCounter, RowExpansion};
pub use format::{FormatCache, RowFormatter};
pub use page::{PageBuilder, PagePosition};
pub use rebuild::RebuildOrchestrator;
pub use render::StandardRenderer;
