//! FILENAME: pivot-data/src/contract.rs
//! PURPOSE: Narrow contracts for the collaborators the rebuild pipeline uses.
//! CONTEXT: The pipeline owns none of these. The field catalog and data source
//! sit on top of the entity storage layer, the cache target persists
//! generations, and the value renderer knows display rules for special types.

use crate::error::Result;
use crate::field::{CustomField, FieldDescriptor, FieldMap};
use crate::page::Page;
use crate::params::RebuildParams;
use crate::value::{RawRow, RawValue};

/// Metadata key holding the entity count of the generation being built.
pub const ENTITY_COUNT_KEY: &str = "entityCount";

/// Metadata key holding the number of flat rows cached.
pub const PIVOT_COUNT_KEY: &str = "pivotCount";

// ============================================================================
// FIELD CATALOG
// ============================================================================

pub trait FieldCatalog {
    /// Every field exposed to the cache, keyed by source field key.
    fn fields(&self) -> &FieldMap;

    /// Titles of date fields; each gets a derived per-month header column.
    fn date_field_titles(&self) -> Vec<String> {
        self.fields()
            .values()
            .filter(|field| field.is_date())
            .map(|field| field.label().to_string())
            .collect()
    }

    /// Replaces a raw value before markup stripping (an ID with a title, ...).
    fn customize(&self, _key: &str, _value: &str) -> Option<String> {
        None
    }
}

// ============================================================================
// DATA SOURCE
// ============================================================================

pub trait DataSource {
    /// Number of entities matching `params`.
    fn count(&self, params: &RebuildParams) -> Result<usize>;

    /// At most `limit` rows starting at entity `offset`, in a stable order
    /// grouped by entity index.
    fn fetch_page(&self, params: &RebuildParams, offset: usize, limit: usize) -> Result<Vec<RawRow>>;
}

// ============================================================================
// CACHE TARGET
// ============================================================================

/// A cache group with a serving (active) generation and a staging generation.
///
/// Every write goes to staging. Readers keep seeing the active generation
/// until `activate_generation` is called, which is the only commit point.
pub trait CacheTarget {
    fn name(&self) -> &str;

    /// Empties the staging generation. The active generation is untouched.
    fn clear(&mut self) -> Result<()>;

    fn cache_header(&mut self, header: &[String]) -> Result<()>;

    /// Stores a page under its key, replacing any page already there.
    /// Returns the number of rows written.
    fn cache_page(&mut self, page: &Page) -> Result<usize>;

    fn set_value(&mut self, name: &str, value: u64) -> Result<()>;

    fn get_value(&self, name: &str) -> Result<Option<u64>>;

    fn delete_active_generation(&mut self) -> Result<()>;

    /// Promotes staging to the active slot.
    fn activate_generation(&mut self) -> Result<()>;
}

impl<T: CacheTarget + ?Sized> CacheTarget for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn cache_header(&mut self, header: &[String]) -> Result<()> {
        (**self).cache_header(header)
    }

    fn cache_page(&mut self, page: &Page) -> Result<usize> {
        (**self).cache_page(page)
    }

    fn set_value(&mut self, name: &str, value: u64) -> Result<()> {
        (**self).set_value(name, value)
    }

    fn get_value(&self, name: &str) -> Result<Option<u64>> {
        (**self).get_value(name)
    }

    fn delete_active_generation(&mut self) -> Result<()> {
        (**self).delete_active_generation()
    }

    fn activate_generation(&mut self) -> Result<()> {
        (**self).activate_generation()
    }
}

// ============================================================================
// VALUE RENDERER
// ============================================================================

/// Display rules for typed custom fields and free markup.
pub trait ValueRenderer {
    /// Renders a file/date/boolean/link/geographic custom field value.
    fn render(&self, field: &FieldDescriptor, custom: &CustomField, value: &RawValue) -> String;

    /// Removes markup from text.
    fn strip_markup(&self, text: &str) -> String;
}
