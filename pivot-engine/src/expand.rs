//! FILENAME: pivot-engine/src/expand.rs
//! Combination Expander - turns multi-valued rows into flat rows.
//!
//! A row whose multi-valued fields hold (n1, n2, ..., nk) values expands into
//! n1 * n2 * ... * nk flat rows. Combinations are enumerated in mixed-radix
//! odometer order: the first multi-valued field (label order) is the least
//! significant digit. Fields A (2 values) and B (3 values) enumerate as
//! (A0,B0) (A1,B0) (A0,B1) (A1,B1) (A0,B2) (A1,B2).
//!
//! Every combination is a pure function of its linear index, so expansion can
//! resume at any offset without regenerating earlier combinations.

use smallvec::SmallVec;
use pivot_data::{EntityIndex, FlatRow, FormattedRow, FormattedValue};

// ============================================================================
// ODOMETER
// ============================================================================

/// Mixed-radix counter over the value indexes of a row's multi-valued fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionCounter {
    radices: SmallVec<[usize; 8]>,
    digits: SmallVec<[usize; 8]>,
}

impl ExpansionCounter {
    /// Every radix must be at least 1.
    pub fn new(radices: &[usize]) -> Self {
        ExpansionCounter {
            radices: radices.iter().copied().collect(),
            digits: SmallVec::from_elem(0, radices.len()),
        }
    }

    /// Number of combinations, saturating at `usize::MAX`.
    pub fn total(&self) -> usize {
        self.radices
            .iter()
            .fold(1usize, |acc, radix| acc.saturating_mul(*radix))
    }

    /// Positions the counter at combination `linear`.
    pub fn seek(&mut self, linear: usize) {
        let mut rest = linear;
        for (digit, radix) in self.digits.iter_mut().zip(self.radices.iter()) {
            *digit = rest % radix;
            rest /= radix;
        }
    }

    /// Moves to the next combination. Returns false after the last one,
    /// leaving the counter wrapped back to all zeros.
    pub fn advance(&mut self) -> bool {
        for (digit, radix) in self.digits.iter_mut().zip(self.radices.iter()) {
            if *digit + 1 < *radix {
                *digit += 1;
                return true;
            }
            *digit = 0;
        }
        false
    }

    pub fn digits(&self) -> &[usize] {
        &self.digits
    }
}

// ============================================================================
// SINGLE ROW
// ============================================================================

/// Flat rows produced from one formatted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowExpansion {
    pub rows: Vec<FlatRow>,
    /// Combination count of the row.
    pub total: usize,
    /// Where to resume if the row was cut short by the limit.
    pub resume_at: Option<usize>,
}

/// Expands `row` starting at combination `offset`, emitting at most `limit` rows.
pub fn expand_row(row: &FormattedRow, offset: usize, limit: usize) -> RowExpansion {
    let mut counter = ExpansionCounter::new(&row.multi_value_sizes());
    let total = counter.total();
    let mut rows = Vec::new();

    if offset >= total || limit == 0 {
        let resume_at = (offset < total).then_some(offset);
        return RowExpansion { rows, total, resume_at };
    }

    counter.seek(offset);
    loop {
        rows.push(materialize(row, counter.digits()));
        let more = counter.advance();
        if !more {
            return RowExpansion { rows, total, resume_at: None };
        }
        if rows.len() == limit {
            return RowExpansion {
                resume_at: Some(offset + rows.len()),
                rows,
                total,
            };
        }
    }
}

/// Values in label order; the n-th multi-valued field takes digit n.
fn materialize(row: &FormattedRow, digits: &[usize]) -> FlatRow {
    let mut digit = digits.iter();
    row.values()
        .values()
        .map(|value| match value {
            FormattedValue::Single(s) => s.clone(),
            FormattedValue::Multi(items) => digit
                .next()
                .and_then(|d| items.get(*d))
                .cloned()
                .unwrap_or_default(),
        })
        .collect()
}

// ============================================================================
// BATCH
// ============================================================================

/// Result of one expansion call over a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub rows: Vec<FlatRow>,
    /// Entity index shared by every row processed.
    pub index: EntityIndex,
    /// Entity offset to resume from. Points at a partially expanded row
    /// when `next_combination_offset` is non-zero.
    pub next_entity_offset: usize,
    pub next_combination_offset: usize,
    /// Combination count of the last row processed.
    pub combination_total: usize,
}

impl Expansion {
    /// Entity rows fully expanded by this call.
    pub fn consumed(&self, entity_offset: usize) -> usize {
        self.next_entity_offset - entity_offset
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CombinationExpander {
    limit: usize,
}

impl CombinationExpander {
    /// `limit` caps the rows of a single call; it is raised to 1 if zero.
    pub fn new(limit: usize) -> Self {
        CombinationExpander { limit: limit.max(1) }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Expands rows from the front of `batch` (whose first row sits at
    /// `entity_offset`) until the entity index changes, the batch ends, or
    /// `budget` rows (capped by the limit) have been emitted. The first row
    /// resumes at `combination_offset`. Returns None for an empty batch.
    pub fn expand(
        &self,
        batch: &[FormattedRow],
        entity_offset: usize,
        combination_offset: usize,
        budget: usize,
    ) -> Option<Expansion> {
        let budget = budget.clamp(1, self.limit);
        let index = batch.first()?.index.clone();

        let mut rows: Vec<FlatRow> = Vec::new();
        let mut next_entity_offset = entity_offset;
        let mut next_combination_offset = 0;
        let mut combination_total = 0;
        let mut offset = combination_offset;

        for row in batch {
            if row.index != index || rows.len() >= budget {
                break;
            }

            let part = expand_row(row, offset, budget - rows.len());
            combination_total = part.total;
            rows.extend(part.rows);

            if let Some(resume_at) = part.resume_at {
                next_combination_offset = resume_at;
                break;
            }
            next_entity_offset += 1;
            offset = 0;
        }

        Some(Expansion {
            rows,
            index,
            next_entity_offset,
            next_combination_offset,
            combination_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    fn row(index: &str, fields: &[(&str, &[&str])]) -> FormattedRow {
        let values: BTreeMap<String, FormattedValue> = fields
            .iter()
            .map(|(label, items)| {
                let value = if items.len() == 1 {
                    FormattedValue::Single(items[0].to_string())
                } else {
                    FormattedValue::Multi(items.iter().map(|s| s.to_string()).collect())
                };
                (label.to_string(), value)
            })
            .collect();
        FormattedRow::new(EntityIndex::new(index).unwrap(), values)
    }

    fn flat(values: &[&str]) -> FlatRow {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counter_odometer_order() {
        let mut counter = ExpansionCounter::new(&[2, 3]);
        let mut seen = vec![counter.digits().to_vec()];
        while counter.advance() {
            seen.push(counter.digits().to_vec());
        }
        assert_eq!(
            seen,
            vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1], vec![0, 2], vec![1, 2]]
        );
        assert_eq!(counter.digits(), &[0, 0]);
    }

    #[test]
    fn test_counter_seek_matches_advance() {
        let mut walked = ExpansionCounter::new(&[3, 2, 4]);
        let mut sought = ExpansionCounter::new(&[3, 2, 4]);
        for linear in 0..walked.total() {
            sought.seek(linear);
            assert_eq!(sought.digits(), walked.digits(), "linear index {}", linear);
            walked.advance();
        }
    }

    #[test]
    fn test_counter_total_saturates() {
        let counter = ExpansionCounter::new(&[usize::MAX, 2]);
        assert_eq!(counter.total(), usize::MAX);
        assert_eq!(ExpansionCounter::new(&[]).total(), 1);
    }

    #[test]
    fn test_full_expansion_is_distinct_and_complete() {
        let r = row("E1", &[("A", &["1", "2"]), ("B", &["x", "y", "z"]), ("C", &["p", "q"])]);
        let full = expand_row(&r, 0, usize::MAX);

        assert_eq!(full.total, 12);
        assert_eq!(full.rows.len(), 12);
        assert_eq!(full.resume_at, None);
        let distinct: HashSet<&FlatRow> = full.rows.iter().collect();
        assert_eq!(distinct.len(), 12);
    }

    #[test]
    fn test_two_by_two_example() {
        let r = row("E1", &[("A", &["1", "2"]), ("B", &["x", "y"])]);

        let first = expand_row(&r, 0, 2);
        assert_eq!(first.rows, vec![flat(&["1", "x"]), flat(&["2", "x"])]);
        assert_eq!(first.resume_at, Some(2));

        let second = expand_row(&r, 2, 2);
        assert_eq!(second.rows, vec![flat(&["1", "y"]), flat(&["2", "y"])]);
        assert_eq!(second.resume_at, None);
    }

    #[test]
    fn test_resumability_equivalence() {
        let r = row("E1", &[("A", &["1", "2", "3"]), ("B", &["x", "y"]), ("C", &["k"]), ("D", &["m", "n"])]);
        let whole = expand_row(&r, 0, usize::MAX).rows;

        for budgets in [vec![1; 12], vec![5, 7], vec![2, 3, 4, 3], vec![11, 1]] {
            let mut pieces = Vec::new();
            let mut offset = 0;
            for budget in budgets {
                let part = expand_row(&r, offset, budget);
                pieces.extend(part.rows);
                match part.resume_at {
                    Some(next) => offset = next,
                    None => break,
                }
            }
            assert_eq!(pieces, whole);
        }
    }

    #[test]
    fn test_row_without_multi_values() {
        let r = row("E1", &[("A", &["1"]), ("B", &["x"])]);
        let result = expand_row(&r, 0, 10);
        assert_eq!(result.rows, vec![flat(&["1", "x"])]);
        assert_eq!(result.total, 1);
        assert_eq!(result.resume_at, None);
    }

    #[test]
    fn test_expander_stops_at_index_change() {
        let batch = vec![
            row("E1", &[("A", &["1"])]),
            row("E1", &[("A", &["2"])]),
            row("E2", &[("A", &["3"])]),
        ];
        let expander = CombinationExpander::new(1000);

        let first = expander.expand(&batch, 10, 0, 1000).unwrap();
        assert_eq!(first.index.as_str(), "E1");
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.next_entity_offset, 12);
        assert_eq!(first.next_combination_offset, 0);
        assert_eq!(first.consumed(10), 2);

        let second = expander.expand(&batch[2..], 12, 0, 1000).unwrap();
        assert_eq!(second.index.as_str(), "E2");
        assert_eq!(second.next_entity_offset, 13);
    }

    #[test]
    fn test_expander_cap_resumes_mid_row() {
        let batch = vec![
            row("E1", &[("A", &["0"])]),
            row("E1", &[("A", &["1", "2"]), ("B", &["x", "y"])]),
        ];
        let expander = CombinationExpander::new(3);

        let first = expander.expand(&batch, 0, 0, usize::MAX).unwrap();
        assert_eq!(first.rows.len(), 3);
        assert_eq!(first.next_entity_offset, 1);
        assert_eq!(first.next_combination_offset, 2);
        assert_eq!(first.combination_total, 4);

        let second = expander.expand(&batch[1..], 1, 2, usize::MAX).unwrap();
        assert_eq!(second.rows, vec![flat(&["1", "y"]), flat(&["2", "y"])]);
        assert_eq!(second.next_entity_offset, 2);
        assert_eq!(second.next_combination_offset, 0);
    }

    #[test]
    fn test_cap_on_row_boundary_consumes_row() {
        let batch = vec![
            row("E1", &[("A", &["1", "2"])]),
            row("E1", &[("A", &["3"])]),
        ];
        let expander = CombinationExpander::new(2);

        let result = expander.expand(&batch, 0, 0, 2).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.next_entity_offset, 1);
        assert_eq!(result.next_combination_offset, 0);
    }

    #[test]
    fn test_empty_batch() {
        assert!(CombinationExpander::new(10).expand(&[], 0, 0, 10).is_none());
    }
}
