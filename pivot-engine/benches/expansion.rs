//! Benchmarks for combinatorial expansion of multi-valued rows.
//!
//! Run with: cargo bench -p pivot-engine --bench expansion

use std::collections::BTreeMap;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pivot_data::{EntityIndex, FormattedRow, FormattedValue};
use pivot_engine::{expand_row, CombinationExpander};

// =============================================================================
// Helpers
// =============================================================================

/// A row with `fields` multi-valued fields of `width` values each, plus a few
/// single-valued ones.
fn wide_row(index: &str, fields: usize, width: usize) -> FormattedRow {
    let mut values = BTreeMap::new();
    for f in 0..fields {
        let items = (0..width).map(|i| format!("value {} of field {}", i, f)).collect();
        values.insert(format!("Multi {}", f), FormattedValue::Multi(items));
    }
    for s in 0..8 {
        values.insert(format!("Single {}", s), FormattedValue::Single(format!("scalar {}", s)));
    }
    FormattedRow::new(EntityIndex::new(index).unwrap(), values)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_expand_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_row");

    for &(fields, width) in &[(1usize, 100usize), (2, 30), (3, 10)] {
        let row = wide_row("E1", fields, width);
        let total = width.pow(fields as u32);
        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", fields, width)),
            &row,
            |b, row| b.iter(|| expand_row(black_box(row), 0, total)),
        );
    }

    group.finish();
}

fn bench_resume_mid_row(c: &mut Criterion) {
    let row = wide_row("E1", 3, 20);
    c.bench_function("expand_row_resume_at_half", |b| {
        b.iter(|| expand_row(black_box(&row), black_box(4000), 1000))
    });
}

fn bench_expander_batch(c: &mut Criterion) {
    let batch: Vec<FormattedRow> = (0..1000)
        .map(|i| wide_row(&format!("2017-08-{:02}", 1 + i / 40), 2, 3))
        .collect();
    let expander = CombinationExpander::new(1000);

    c.bench_function("expander_batch_1000_entities", |b| {
        b.iter(|| {
            let mut remaining = batch.as_slice();
            let mut entity_offset = 0;
            let mut combination_offset = 0;
            let mut rows = 0;
            while let Some(expansion) =
                expander.expand(remaining, entity_offset, combination_offset, expander.limit())
            {
                rows += expansion.rows.len();
                let consumed = expansion.consumed(entity_offset);
                remaining = &remaining[consumed..];
                entity_offset = expansion.next_entity_offset;
                combination_offset = expansion.next_combination_offset;
            }
            black_box(rows)
        })
    });
}

criterion_group!(benches, bench_expand_row, bench_resume_mid_row, bench_expander_batch);
criterion_main!(benches);
