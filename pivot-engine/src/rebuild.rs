//! FILENAME: pivot-engine/src/rebuild.rs
//! Rebuild Orchestrator - drives fetch -> format -> expand -> page -> cache.
//!
//! Two execution modes share one step function, so their output is identical:
//! - `rebuild_full` loops steps until the entity count is reached.
//! - `rebuild_chunk` runs exactly one step and hands back the cursor. The call
//!   that writes nothing finalizes the generation.
//!
//! Finalizing writes the header and row count into staging, then deletes the
//! active generation and activates staging. Until then readers keep seeing
//! the previous generation.

use std::time::Instant;
use log::{debug, info, warn};
use pivot_data::{
    CacheTarget, DataSource, FieldCatalog, HandlerRegistry, PivotError, RebuildParams, Result,
    ValueRenderer, ENTITY_COUNT_KEY, PIVOT_COUNT_KEY,
};
use crate::definition::{ChunkOutcome, DataSetConfig, RebuildCursor, RebuildLimits, RebuildSummary};
use crate::expand::CombinationExpander;
use crate::format::RowFormatter;
use crate::page::{PageBuilder, PagePosition};

/// State scoped to one invocation: memo caches live and die with it.
struct RebuildRun<'a> {
    formatter: RowFormatter<'a>,
    builder: PageBuilder,
}

pub struct RebuildOrchestrator<'a> {
    catalog: &'a dyn FieldCatalog,
    source: &'a dyn DataSource,
    renderer: &'a dyn ValueRenderer,
    handlers: HandlerRegistry,
    config: DataSetConfig,
    limits: RebuildLimits,
}

impl<'a> RebuildOrchestrator<'a> {
    pub fn new(
        catalog: &'a dyn FieldCatalog,
        source: &'a dyn DataSource,
        renderer: &'a dyn ValueRenderer,
        config: DataSetConfig,
    ) -> Self {
        RebuildOrchestrator {
            catalog,
            source,
            renderer,
            handlers: HandlerRegistry::new(),
            config,
            limits: RebuildLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: RebuildLimits) -> Result<Self> {
        limits.validate()?;
        self.limits = limits;
        Ok(self)
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn config(&self) -> &DataSetConfig {
        &self.config
    }

    pub fn limits(&self) -> &RebuildLimits {
        &self.limits
    }

    // ========================================================================
    // ENTRY POINTS
    // ========================================================================

    /// Rebuilds the whole generation and activates it.
    pub fn rebuild_full<C: CacheTarget + ?Sized>(
        &self,
        target: &mut C,
        params: &RebuildParams,
    ) -> Result<RebuildSummary> {
        let started = Instant::now();
        info!("Rebuilding pivot cache '{}'", target.name());

        let mut run = self.start_run()?;
        let total = self.initialize(target, params)?;
        let mut cursor = RebuildCursor::start(params);

        while cursor.entity_offset < total {
            if self.step(&mut run, target, params, &mut cursor)? == 0 {
                break;
            }
        }

        self.finalize(&run, target, cursor.rows_written)?;

        let summary = RebuildSummary {
            rows: cursor.rows_written,
            elapsed: started.elapsed(),
        };
        info!(
            "Rebuilt pivot cache '{}': {} rows from {} entities in {:?}",
            target.name(),
            summary.rows,
            total,
            summary.elapsed
        );
        Ok(summary)
    }

    /// Runs one bounded step of a partial rebuild starting at `cursor`.
    ///
    /// A zeroed cursor clears staging and caches the entity count first. On
    /// error the caller's cursor is still valid and the chunk can be retried.
    pub fn rebuild_chunk<C: CacheTarget + ?Sized>(
        &self,
        target: &mut C,
        params: &RebuildParams,
        cursor: &RebuildCursor,
    ) -> Result<ChunkOutcome> {
        if !cursor.matches(params) {
            return Err(PivotError::StaleCursor);
        }

        let mut run = self.start_run()?;
        let mut next = cursor.clone();

        let total = if next.is_initial() {
            info!("Rebuilding pivot cache '{}' in chunks", target.name());
            self.initialize(target, params)?
        } else {
            self.entity_count(target, params)?
        };

        let rows = if next.entity_offset < total {
            self.step(&mut run, target, params, &mut next)?
        } else {
            0
        };

        let completed = rows == 0;
        if completed {
            self.finalize(&run, target, next.rows_written)?;
        } else {
            debug!(
                "Chunk of '{}' wrote {} rows, next entity offset {}/{}",
                target.name(),
                rows,
                next.entity_offset,
                total
            );
        }

        Ok(ChunkOutcome {
            cursor: next,
            rows,
            completed,
        })
    }

    // ========================================================================
    // STEPS
    // ========================================================================

    fn start_run(&self) -> Result<RebuildRun<'a>> {
        let formatter = RowFormatter::new(self.catalog, self.renderer, &self.handlers, &self.config)?;
        let expander = CombinationExpander::new(self.limits.multi_value_rows);
        Ok(RebuildRun {
            formatter,
            builder: PageBuilder::new(expander, self.limits.paginated_rows),
        })
    }

    fn initialize<C: CacheTarget + ?Sized>(&self, target: &mut C, params: &RebuildParams) -> Result<usize> {
        target.clear()?;
        let total = self.source.count(params)?;
        target.set_value(ENTITY_COUNT_KEY, total as u64)?;
        debug!("Pivot cache '{}' staging cleared, {} entities to process", target.name(), total);
        Ok(total)
    }

    fn entity_count<C: CacheTarget + ?Sized>(&self, target: &C, params: &RebuildParams) -> Result<usize> {
        match target.get_value(ENTITY_COUNT_KEY)? {
            Some(count) => Ok(count as usize),
            None => self.source.count(params),
        }
    }

    /// Fetches one API page and caches the pages built from it.
    /// The cursor only moves once every page has been written.
    fn step<C: CacheTarget + ?Sized>(
        &self,
        run: &mut RebuildRun<'a>,
        target: &mut C,
        params: &RebuildParams,
        cursor: &mut RebuildCursor,
    ) -> Result<usize> {
        let raw = self
            .source
            .fetch_page(params, cursor.entity_offset, self.limits.api_page_size)?;
        if raw.is_empty() {
            warn!(
                "Data source for '{}' returned no rows at entity offset {}",
                target.name(),
                cursor.entity_offset
            );
            return Ok(0);
        }

        let formatted = run.formatter.format_batch(&raw)?;
        drop(raw);

        let pages = run.builder.build(&formatted, &PagePosition::from(&*cursor));

        let mut written = 0;
        for page in &pages {
            written += target.cache_page(page)?;
            debug!("Cached {} ({} rows)", page.key(), page.len());
        }

        if let Some(last) = pages.last() {
            cursor.entity_offset = last.next_entity_offset;
            cursor.combination_offset = last.next_combination_offset;
            cursor.page = last.page + 1;
            cursor.index = Some(last.index.clone());
        }
        cursor.rows_written += written as u64;

        Ok(written)
    }

    fn finalize<C: CacheTarget + ?Sized>(&self, run: &RebuildRun<'a>, target: &mut C, rows: u64) -> Result<()> {
        target.cache_header(&run.formatter.header())?;
        target.set_value(PIVOT_COUNT_KEY, rows)?;
        target.delete_active_generation()?;
        target.activate_generation()?;
        info!("Activated pivot cache '{}' with {} rows", target.name(), rows);
        Ok(())
    }
}
