//! FILENAME: pivot-engine/src/render.rs
//! Standard display rules for typed custom field values.

use std::fmt::Write;
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use pivot_data::{CustomDataType, CustomField, FieldDescriptor, RawValue, ValueRenderer};

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // Tags and comments, including ones spanning lines.
    Regex::new(r"(?s)<!--.*?-->|<[^>]*>").unwrap()
});

/// Layouts accepted for raw date values.
const DATE_TIME_LAYOUTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y%m%d%H%M%S"];
const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default)]
pub struct StandardRenderer;

impl StandardRenderer {
    pub fn new() -> Self {
        StandardRenderer
    }

    fn render_date(&self, custom: &CustomField, raw: &str) -> String {
        let format = custom.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
        let raw = raw.trim();

        let parsed = DATE_TIME_LAYOUTS
            .iter()
            .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
            .or_else(|| {
                DATE_LAYOUTS
                    .iter()
                    .find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            });

        let Some(parsed) = parsed else {
            return raw.to_string();
        };

        format_date(&parsed, format)
            .or_else(|| {
                warn!("Unusable date format {:?}, using {:?}", format, DEFAULT_DATE_FORMAT);
                format_date(&parsed, DEFAULT_DATE_FORMAT)
            })
            .unwrap_or_else(|| raw.to_string())
    }

    fn render_file(&self, value: &RawValue) -> String {
        match value {
            RawValue::Map(parts) => {
                let url = parts.get("fileURL").map(RawValue::to_text);
                let name = parts.get("fileName").map(RawValue::to_text);
                match (url, name) {
                    (Some(url), Some(name)) => wiki_link(&format!("{} {}", url, name)),
                    _ => wiki_link(
                        &parts
                            .values()
                            .map(RawValue::to_text)
                            .collect::<Vec<_>>()
                            .join(" "),
                    ),
                }
            }
            other => other.to_text(),
        }
    }
}

impl ValueRenderer for StandardRenderer {
    fn render(&self, _field: &FieldDescriptor, custom: &CustomField, value: &RawValue) -> String {
        match custom.data_type {
            CustomDataType::File => self.render_file(value),
            CustomDataType::Date => self.render_date(custom, &value.to_text()),
            CustomDataType::Boolean => {
                if is_truthy(value) { "Yes".to_string() } else { "No".to_string() }
            }
            CustomDataType::Link | CustomDataType::StateProvince | CustomDataType::Country => {
                value.to_text().trim().to_string()
            }
            _ => self.strip_markup(&value.to_text()),
        }
    }

    fn strip_markup(&self, text: &str) -> String {
        let stripped = TAG_PATTERN.replace_all(text, "");
        decode_entities(&stripped)
    }
}

/// None when the pattern is malformed or needs fields a naive date lacks.
fn format_date(parsed: &NaiveDateTime, format: &str) -> Option<String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", parsed.format(format)).ok()?;
    Some(out)
}

fn wiki_link(inner: &str) -> String {
    format!("[{}]", inner)
}

fn is_truthy(value: &RawValue) -> bool {
    match value {
        RawValue::Bool(b) => *b,
        RawValue::Integer(n) => *n != 0,
        RawValue::Number(n) => *n != 0.0,
        other => matches!(
            other.to_text().trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        ),
    }
}

/// `&amp;` goes last so already-escaped entities stay literal.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use pivot_data::FieldType;

    fn field(data_type: CustomDataType) -> (FieldDescriptor, CustomField) {
        let custom = CustomField::new(data_type);
        let descriptor = FieldDescriptor::new("custom_1", "Custom", FieldType::Other)
            .with_custom_field(custom.clone());
        (descriptor, custom)
    }

    #[test]
    fn test_strip_markup() {
        let renderer = StandardRenderer::new();
        assert_eq!(renderer.strip_markup("<b>Bold</b> &amp; <i>plain</i>"), "Bold & plain");
        assert_eq!(renderer.strip_markup("a<!-- note\nhere -->b"), "ab");
        assert_eq!(renderer.strip_markup("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_render_dates() {
        let renderer = StandardRenderer::new();
        let (descriptor, custom) = field(CustomDataType::Date);
        assert_eq!(
            renderer.render(&descriptor, &custom, &RawValue::text("2017-08-30 10:00:00")),
            "2017-08-30"
        );
        assert_eq!(
            renderer.render(&descriptor, &custom, &RawValue::text("20170830000000")),
            "2017-08-30"
        );

        let custom = custom.with_date_format("%d/%m/%Y");
        assert_eq!(
            renderer.render(&descriptor, &custom, &RawValue::text("2017-08-30")),
            "30/08/2017"
        );
        assert_eq!(renderer.render(&descriptor, &custom, &RawValue::text("soon")), "soon");
    }

    #[test]
    fn test_bad_date_format_falls_back() {
        let renderer = StandardRenderer::new();
        let (descriptor, custom) = field(CustomDataType::Date);

        let unknown = custom.clone().with_date_format("%d/%m/%Y %Q");
        assert_eq!(
            renderer.render(&descriptor, &unknown, &RawValue::text("2017-08-30")),
            "2017-08-30"
        );

        // Naive values carry no offset to print.
        let offset = custom.with_date_format("%Y %z");
        assert_eq!(
            renderer.render(&descriptor, &offset, &RawValue::text("2017-08-30 10:00:00")),
            "2017-08-30"
        );
    }

    #[test]
    fn test_render_boolean() {
        let renderer = StandardRenderer::new();
        let (descriptor, custom) = field(CustomDataType::Boolean);
        assert_eq!(renderer.render(&descriptor, &custom, &RawValue::text("1")), "Yes");
        assert_eq!(renderer.render(&descriptor, &custom, &RawValue::Bool(false)), "No");
        assert_eq!(renderer.render(&descriptor, &custom, &RawValue::Number(0.0)), "No");
        assert_eq!(renderer.render(&descriptor, &custom, &RawValue::Integer(3)), "Yes");
    }

    #[test]
    fn test_render_file() {
        let renderer = StandardRenderer::new();
        let (descriptor, custom) = field(CustomDataType::File);

        let mut parts = BTreeMap::new();
        parts.insert("fileURL".to_string(), RawValue::text("https://example.org/f"));
        parts.insert("fileName".to_string(), RawValue::text("a.txt"));
        assert_eq!(
            renderer.render(&descriptor, &custom, &RawValue::Map(parts)),
            "[https://example.org/f a.txt]"
        );

        let mut other = BTreeMap::new();
        other.insert("path".to_string(), RawValue::text("/tmp/a"));
        assert_eq!(renderer.render(&descriptor, &custom, &RawValue::Map(other)), "[/tmp/a]");
    }
}
