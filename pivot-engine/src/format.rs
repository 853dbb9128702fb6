//! FILENAME: pivot-engine/src/format.rs
//! Row Formatter - flattens raw nested entity rows into sorted label/value rows.
//!
//! Structure:
//! - depth 0: the entity row
//! - depth 1: its fields
//! - depth 2: subfields of a nested relation (`relation.subfield` keys)
//!
//! Anything below that is a leaf. Leaf formatting order:
//! 1. a registered handler for the field
//! 2. the option-value dictionary (unmapped values become "")
//! 3. line-break flattening for free text
//! 4. the value renderer for file/date/boolean/link/geographic custom fields
//! 5. customization + markup stripping

use std::collections::BTreeMap;
use rustc_hash::FxHashMap;
use pivot_data::{
    FieldCatalog, FieldDescriptor, FieldHandler, FormattedRow, FormattedValue, HandlerRegistry,
    PivotError, RawRow, RawValue, Result, ValueRenderer,
};
use crate::definition::{DataSetConfig, IndexStrategy, MONTH_COLUMN_SUFFIX};

/// Deepest structural level; values below it are formatted as leaves.
const MAX_FORMAT_DEPTH: usize = 2;

// ============================================================================
// MEMOIZATION
// ============================================================================

/// Per-rebuild memo of formatted and customized values, keyed by
/// (field key, raw value text).
#[derive(Debug, Default)]
pub struct FormatCache {
    formatted: FxHashMap<(String, String), String>,
    customized: FxHashMap<(String, String), String>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn formatted_len(&self) -> usize {
        self.formatted.len()
    }

    pub fn customized_len(&self) -> usize {
        self.customized.len()
    }
}

// ============================================================================
// ROW FORMATTER
// ============================================================================

pub struct RowFormatter<'a> {
    catalog: &'a dyn FieldCatalog,
    renderer: &'a dyn ValueRenderer,
    index: IndexStrategy,

    /// Handlers resolved by field key.
    handlers: FxHashMap<String, FieldHandler>,

    /// Every known label mapped to "", sorted. Merged under each row.
    empty_row: BTreeMap<String, String>,

    cache: FormatCache,
}

impl<'a> RowFormatter<'a> {
    /// Resolves handler names and builds the empty-row template.
    pub fn new(
        catalog: &'a dyn FieldCatalog,
        renderer: &'a dyn ValueRenderer,
        registry: &HandlerRegistry,
        config: &DataSetConfig,
    ) -> Result<Self> {
        let mut handlers = FxHashMap::default();
        for field in catalog.fields().values() {
            if let Some(name) = &field.handler {
                let handler = registry.get(name).ok_or_else(|| PivotError::UnknownHandler {
                    field: field.key.clone(),
                    handler: name.clone(),
                })?;
                handlers.insert(field.key.clone(), handler.clone());
            }
        }

        let mut empty_row: BTreeMap<String, String> = catalog
            .fields()
            .values()
            .map(|field| (field.label().to_string(), String::new()))
            .collect();

        if config.derive_month_columns {
            for title in catalog.date_field_titles() {
                empty_row.insert(format!("{}{}", title, MONTH_COLUMN_SUFFIX), String::new());
            }
        }

        Ok(RowFormatter {
            catalog,
            renderer,
            index: config.index.clone(),
            handlers,
            empty_row,
            cache: FormatCache::new(),
        })
    }

    pub fn empty_row(&self) -> &BTreeMap<String, String> {
        &self.empty_row
    }

    /// Header labels in column order.
    pub fn header(&self) -> Vec<String> {
        self.empty_row.keys().cloned().collect()
    }

    pub fn cache(&self) -> &FormatCache {
        &self.cache
    }

    pub fn format_batch(&mut self, rows: &[RawRow]) -> Result<Vec<FormattedRow>> {
        rows.iter().map(|row| self.format_row(row)).collect()
    }

    pub fn format_row(&mut self, row: &RawRow) -> Result<FormattedRow> {
        let index = self.index.entity_index(row)?;

        let mut values: BTreeMap<String, FormattedValue> = self
            .empty_row
            .keys()
            .map(|label| (label.clone(), FormattedValue::empty()))
            .collect();

        for (key, value) in row.iter() {
            self.format_field(key, value, row, 1, &mut values);
        }

        Ok(FormattedRow::new(index, values))
    }

    fn format_field(
        &mut self,
        key: &str,
        value: &RawValue,
        row: &RawRow,
        depth: usize,
        out: &mut BTreeMap<String, FormattedValue>,
    ) {
        let catalog = self.catalog;
        let descriptor = catalog.fields().get(key);

        match (descriptor, value) {
            (descriptor, RawValue::Map(subfields))
                if depth < MAX_FORMAT_DEPTH && !descriptor.map_or(false, |d| d.is_file()) =>
            {
                for (subkey, subvalue) in subfields {
                    let nested_key = format!("{}.{}", key, subkey);
                    self.format_field(&nested_key, subvalue, row, depth + 1, out);
                }
            }
            (Some(descriptor), _) => {
                let formatted = self.format_value(descriptor, value, row);
                out.insert(descriptor.label().to_string(), formatted);
            }
            // Unknown fields never reach the cache.
            (None, _) => {}
        }
    }

    fn format_value(&mut self, descriptor: &FieldDescriptor, value: &RawValue, row: &RawRow) -> FormattedValue {
        if value.is_blank() {
            return FormattedValue::empty();
        }

        match value {
            RawValue::List(items) if !descriptor.is_file() => FormattedValue::Multi(
                items
                    .iter()
                    .map(|item| self.format_leaf(descriptor, item, row))
                    .collect(),
            ),
            _ => FormattedValue::Single(self.format_leaf(descriptor, value, row)),
        }
    }

    fn format_leaf(&mut self, descriptor: &FieldDescriptor, value: &RawValue, row: &RawRow) -> String {
        if value.is_blank() {
            return String::new();
        }

        if let Some(handler) = self.handlers.get(&descriptor.key) {
            return handler(value, row);
        }

        let raw = value.to_text();
        let memo_key = (descriptor.key.clone(), raw);
        if let Some(hit) = self.cache.formatted.get(&memo_key) {
            return hit.clone();
        }
        let raw = &memo_key.1;

        let result = if let Some(options) = &descriptor.option_values {
            options.get(raw).cloned().unwrap_or_default()
        } else if descriptor.is_free_text() {
            flatten_line_breaks(raw)
        } else if let Some(custom) = descriptor
            .custom_field
            .as_ref()
            .filter(|custom| custom.data_type.is_rendered())
        {
            self.renderer.render(descriptor, custom, value)
        } else {
            let customized = self.customize(&descriptor.key, raw);
            self.renderer.strip_markup(&customized)
        };

        self.cache.formatted.insert(memo_key, result.clone());
        result
    }

    fn customize(&mut self, key: &str, raw: &str) -> String {
        let catalog = self.catalog;
        self.cache
            .customized
            .entry((key.to_string(), raw.to_string()))
            .or_insert_with(|| catalog.customize(key, raw).unwrap_or_else(|| raw.to_string()))
            .clone()
    }
}

fn flatten_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(|c: char| c == '\n' || c == '\r', " ")
}
