//! FILENAME: pivot-data/src/lib.rs
//! PURPOSE: Shared data model for the pivot report cache rebuild pipeline.
//! CONTEXT: Everything that crosses a crate boundary lives here: field
//! descriptors, raw and formatted rows, cache pages, rebuild params and the
//! narrow contracts the pipeline consumes (catalog, data source, cache target,
//! value renderer).
//!
//! PIPELINE: DataSource --> RawRow --> FormattedRow --> flat rows --> Page --> CacheTarget

pub mod contract;
pub mod error;
pub mod field;
pub mod handler;
pub mod page;
pub mod params;
pub mod row;
pub mod value;

// Re-export commonly used types at the crate root
pub use contract::{
    CacheTarget, DataSource, FieldCatalog, ValueRenderer, ENTITY_COUNT_KEY, PIVOT_COUNT_KEY,
};
pub use error::{PivotError, Result};
pub use field::{CustomDataType, CustomField, FieldDescriptor, FieldMap, FieldType};
pub use handler::{FieldHandler, HandlerRegistry};
pub use page::{FlatRow, Page, PageKey, CACHE_KEY_DELIMITER, DATA_KEY_PREFIX};
pub use params::{DateFilter, RebuildParams};
pub use row::{EntityIndex, FormattedRow, FormattedValue};
pub use value::{RawRow, RawValue};
