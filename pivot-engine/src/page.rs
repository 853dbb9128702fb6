//! FILENAME: pivot-engine/src/page.rs
//! Page Builder - packs expanded rows into cache pages.
//!
//! One expansion call becomes one page. A pass over a fetched batch stops when
//! the batch is used up or when the next expansion would push the pass over
//! the paginated row limit; that expansion is discarded and picked up again
//! from the last page's continuation cursor.

use log::debug;
use pivot_data::{EntityIndex, FormattedRow, Page};
use crate::definition::RebuildCursor;
use crate::expand::CombinationExpander;

/// Where a page-building pass starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PagePosition {
    pub entity_offset: usize,
    pub combination_offset: usize,
    /// Page number the next page takes if its index equals `index`.
    pub page: usize,
    /// Index of the previous page, if any.
    pub index: Option<EntityIndex>,
}

impl From<&RebuildCursor> for PagePosition {
    fn from(cursor: &RebuildCursor) -> Self {
        PagePosition {
            entity_offset: cursor.entity_offset,
            combination_offset: cursor.combination_offset,
            page: cursor.page,
            index: cursor.index.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageBuilder {
    expander: CombinationExpander,
    paginated_limit: usize,
}

impl PageBuilder {
    pub fn new(expander: CombinationExpander, paginated_limit: usize) -> Self {
        PageBuilder {
            expander,
            paginated_limit,
        }
    }

    /// Builds pages from `batch`, whose first row sits at `position.entity_offset`.
    pub fn build(&self, batch: &[FormattedRow], position: &PagePosition) -> Vec<Page> {
        let mut pages = Vec::new();
        let mut remaining = batch;
        let mut entity_offset = position.entity_offset;
        let mut combination_offset = position.combination_offset;
        let mut page = position.page;
        let mut index = position.index.clone();
        let mut rows_count = 0usize;

        while let Some(expansion) =
            self.expander
                .expand(remaining, entity_offset, combination_offset, self.expander.limit())
        {
            rows_count += expansion.rows.len();
            if rows_count > self.paginated_limit {
                debug!(
                    "page pass full at {} rows, deferring entity offset {}",
                    rows_count - expansion.rows.len(),
                    entity_offset
                );
                break;
            }

            if index.as_ref() != Some(&expansion.index) {
                page = 0;
                index = Some(expansion.index.clone());
            }

            let consumed = expansion.consumed(entity_offset);
            remaining = &remaining[consumed..];
            entity_offset = expansion.next_entity_offset;
            combination_offset = expansion.next_combination_offset;

            pages.push(Page {
                rows: expansion.rows,
                index: expansion.index,
                page,
                next_entity_offset: entity_offset,
                next_combination_offset: combination_offset,
            });
            page += 1;
        }

        pages
    }
}
