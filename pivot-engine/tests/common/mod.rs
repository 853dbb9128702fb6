//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for pivot rebuild integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use persistence::{DataRequest, DataSet, GenerationReader, MemoryCacheGroup};
use pivot_data::{
    CustomDataType, CustomField, DataSource, FieldCatalog, FieldDescriptor, FieldMap, FieldType,
    FlatRow, PivotError, RawRow, RawValue, RebuildParams, Result,
};
use pivot_engine::{DataSetConfig, IndexStrategy, RebuildLimits};

// ============================================================================
// FIELD CATALOG
// ============================================================================

/// Activity fields: scalars, option values, multi-valued contacts and a
/// nested case relation.
pub struct ActivityCatalog {
    fields: FieldMap,
}

impl ActivityCatalog {
    pub fn new() -> Self {
        let descriptors = vec![
            FieldDescriptor::new("id", "Activity ID", FieldType::Integer),
            FieldDescriptor::new("activity_date_time", "Activity Date", FieldType::DateTime),
            FieldDescriptor::new("subject", "Subject", FieldType::String),
            FieldDescriptor::new("status_id", "Status", FieldType::Integer)
                .with_options([("1", "Scheduled"), ("2", "Completed")]),
            FieldDescriptor::new("target_contact", "With Contact", FieldType::String),
            FieldDescriptor::new("assignee_contact", "Assigned To", FieldType::String),
            FieldDescriptor::new("case.subject", "Case Subject", FieldType::String),
            FieldDescriptor::new("custom_5", "Follow Up", FieldType::Other)
                .with_custom_field(CustomField::new(CustomDataType::Boolean)),
        ];

        ActivityCatalog {
            fields: descriptors
                .into_iter()
                .map(|field| (field.key.clone(), field))
                .collect(),
        }
    }
}

impl FieldCatalog for ActivityCatalog {
    fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

// ============================================================================
// DATA SOURCE
// ============================================================================

/// Serves a fixed list of activity rows, filtered by the params' dates.
///
/// `fail_on_fetch` makes the n-th `fetch_page` call (0-based) fail once.
pub struct FixtureSource {
    rows: Vec<RawRow>,
    fetches: Cell<usize>,
    fail_on_fetch: Cell<Option<usize>>,
}

impl FixtureSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        FixtureSource {
            rows,
            fetches: Cell::new(0),
            fail_on_fetch: Cell::new(None),
        }
    }

    pub fn fail_on_fetch(&self, call: usize) {
        self.fail_on_fetch.set(Some(call));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }

    fn matching(&self, params: &RebuildParams) -> Vec<&RawRow> {
        let filter = params.date_filter();
        self.rows
            .iter()
            .filter(|row| match &filter {
                Some(filter) => {
                    let date = row
                        .get("activity_date_time")
                        .map(RawValue::to_text)
                        .unwrap_or_default();
                    filter.contains(date.get(..10).unwrap_or(&date))
                }
                None => true,
            })
            .collect()
    }
}

impl DataSource for FixtureSource {
    fn count(&self, params: &RebuildParams) -> Result<usize> {
        Ok(self.matching(params).len())
    }

    fn fetch_page(&self, params: &RebuildParams, offset: usize, limit: usize) -> Result<Vec<RawRow>> {
        let call = self.fetches.get();
        self.fetches.set(call + 1);
        if self.fail_on_fetch.get() == Some(call) {
            self.fail_on_fetch.set(None);
            return Err(PivotError::DataSource(format!("injected failure on fetch {}", call)));
        }

        Ok(self
            .matching(params)
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub struct ActivityFixture;

impl ActivityFixture {
    /// Twelve activities over four days, ordered by date. Some have several
    /// target and assignee contacts.
    pub fn rows() -> Vec<RawRow> {
        let data: &[(i64, &str, &str, &str, &[&str], &[&str])] = &[
            (1, "2017-08-28 09:00:00", "Call", "1", &["Ann"], &["Zoe"]),
            (2, "2017-08-28 10:30:00", "Meeting\nnotes", "2", &["Ann", "Bob"], &["Yan", "Zoe"]),
            (3, "2017-08-28 16:00:00", "Email", "2", &[], &["Zoe"]),
            (4, "2017-08-29 08:15:00", "Call", "1", &["Cal", "Dee", "Eve"], &["Yan"]),
            (5, "2017-08-29 11:00:00", "Visit", "3", &["Ann"], &[]),
            (6, "2017-08-30 09:45:00", "Call", "1", &["Bob", "Cal"], &["Xia", "Yan", "Zoe"]),
            (7, "2017-08-30 13:00:00", "Meeting", "2", &["Dee"], &["Zoe"]),
            (8, "2017-08-30 14:00:00", "Email", "2", &["Ann", "Eve"], &["Xia"]),
            (9, "2017-08-30 17:30:00", "Call", "1", &["Bob"], &["Yan"]),
            (10, "2017-08-31 09:00:00", "Visit", "2", &["Cal", "Dee"], &["Xia", "Zoe"]),
            (11, "2017-08-31 12:00:00", "Call", "1", &["Eve"], &["Yan"]),
            (12, "2017-08-31 15:00:00", "Email", "2", &["Ann", "Bob", "Cal"], &["Zoe"]),
        ];

        data.iter()
            .map(|&(id, date, subject, status, targets, assignees)| {
                let case = RawValue::Map(
                    [("subject".to_string(), RawValue::text(format!("Case {}", id % 3)))]
                        .into_iter()
                        .collect(),
                );
                RawRow::new()
                    .with("id", id)
                    .with("activity_date_time", date)
                    .with("subject", subject)
                    .with("status_id", status)
                    .with("target_contact", RawValue::list(targets.iter().copied()))
                    .with("assignee_contact", RawValue::list(assignees.iter().copied()))
                    .with("case", case)
                    .with("custom_5", id % 2 == 0)
            })
            .collect()
    }

    /// Flat rows the fixture expands to: product of both contact list sizes,
    /// with empty lists counting as one row.
    pub fn expected_row_count() -> usize {
        Self::rows()
            .iter()
            .map(|row| {
                ["target_contact", "assignee_contact"]
                    .iter()
                    .map(|key| match row.get(key) {
                        Some(RawValue::List(items)) if !items.is_empty() => items.len(),
                        _ => 1,
                    })
                    .product::<usize>()
            })
            .sum()
    }

    /// Data flavour indexed by activity day.
    pub fn data_config() -> DataSetConfig {
        DataSetConfig::data(
            "activity",
            IndexStrategy::DatePart {
                key: "activity_date_time".to_string(),
            },
        )
    }

    /// Small limits so every fixture rebuild spans many chunks and pages.
    pub fn small_limits() -> RebuildLimits {
        RebuildLimits {
            api_page_size: 3,
            paginated_rows: 5,
            multi_value_rows: 2,
            return_rows: 4,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Every active row in key order.
pub fn read_all<R: GenerationReader + ?Sized>(reader: &R) -> Vec<FlatRow> {
    DataSet::read(reader, &DataRequest::new().with_return_rows(usize::MAX))
        .unwrap()
        .rows
}

pub fn column(header: &[String], label: &str) -> usize {
    header
        .iter()
        .position(|h| h == label)
        .unwrap_or_else(|| panic!("no column {:?} in {:?}", label, header))
}

pub fn memory_group() -> MemoryCacheGroup {
    MemoryCacheGroup::new("activity")
}
