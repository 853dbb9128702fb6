//! FILENAME: pivot-data/src/field.rs
//! PURPOSE: Field metadata supplied by the external field catalog.
//! CONTEXT: Descriptors are loaded once per rebuild and never change while
//! it runs. The formatter picks a formatting path from the declared type,
//! the option-value dictionary and the custom field description.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// All fields exposed to the cache, keyed by source field key.
pub type FieldMap = BTreeMap<String, FieldDescriptor>;

// ============================================================================
// TYPE TAGS
// ============================================================================

/// Declared type of a core entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    Float,
    Money,
    String,
    Text,
    LongText,
    Date,
    DateTime,
    Time,
    Boolean,
    Other,
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Other
    }
}

impl FieldType {
    /// Free text types get their line breaks flattened.
    pub fn is_free_text(self) -> bool {
        matches!(self, FieldType::String | FieldType::Text | FieldType::LongText)
    }

    pub fn is_date(self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateTime)
    }
}

/// Data type of a custom (user-defined) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomDataType {
    String,
    Memo,
    Int,
    Float,
    Money,
    Date,
    Boolean,
    Link,
    File,
    StateProvince,
    Country,
    ContactReference,
}

impl CustomDataType {
    /// Types handed to the type-specific value renderer.
    pub fn is_rendered(self) -> bool {
        matches!(
            self,
            CustomDataType::File
                | CustomDataType::Date
                | CustomDataType::Boolean
                | CustomDataType::Link
                | CustomDataType::StateProvince
                | CustomDataType::Country
        )
    }
}

/// Extra description carried by custom fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub data_type: CustomDataType,

    /// Widget used to edit the field ("Text", "TextArea", "CheckBox", ...).
    #[serde(default)]
    pub html_type: Option<String>,

    /// strftime-style pattern for date rendering.
    #[serde(default)]
    pub date_format: Option<String>,
}

impl CustomField {
    pub fn new(data_type: CustomDataType) -> Self {
        CustomField {
            data_type,
            html_type: None,
            date_format: None,
        }
    }

    pub fn with_html_type(mut self, html_type: impl Into<String>) -> Self {
        self.html_type = Some(html_type.into());
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }
}

// ============================================================================
// FIELD DESCRIPTOR
// ============================================================================

/// Metadata for one cacheable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Source field key (relation subfields use "relation.subfield").
    pub key: String,

    /// Display title; the key is used when empty.
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub field_type: FieldType,

    /// Encoded value -> display label.
    #[serde(default)]
    pub option_values: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub custom_field: Option<CustomField>,

    /// Name of a formatting handler registered in the HandlerRegistry.
    #[serde(default)]
    pub handler: Option<String>,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, title: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            key: key.into(),
            title: title.into(),
            field_type,
            option_values: None,
            custom_field: None,
            handler: None,
        }
    }

    pub fn with_options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.option_values = Some(
            options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_custom_field(mut self, custom_field: CustomField) -> Self {
        self.custom_field = Some(custom_field);
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Column label used in formatted rows and the cached header.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.key
        } else {
            &self.title
        }
    }

    pub fn custom_data_type(&self) -> Option<CustomDataType> {
        self.custom_field.as_ref().map(|c| c.data_type)
    }

    pub fn is_file(&self) -> bool {
        self.custom_data_type() == Some(CustomDataType::File)
    }

    pub fn is_date(&self) -> bool {
        self.field_type.is_date() || self.custom_data_type() == Some(CustomDataType::Date)
    }

    /// Free text by core type, custom data type or editing widget.
    pub fn is_free_text(&self) -> bool {
        if self.field_type.is_free_text() {
            return true;
        }
        match &self.custom_field {
            Some(custom) => {
                matches!(custom.data_type, CustomDataType::String | CustomDataType::Memo)
                    || matches!(custom.html_type.as_deref(), Some("Text") | Some("TextArea"))
            }
            None => false,
        }
    }
}
