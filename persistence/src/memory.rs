//! FILENAME: persistence/src/memory.rs
//! PURPOSE: Cache group kept entirely in memory.

use log::debug;
use pivot_data::{CacheTarget, FlatRow, Page, PageKey, Result};
use crate::error::PersistenceError;
use crate::generation::{Generation, GenerationReader};

#[derive(Debug, Clone, Default)]
pub struct MemoryCacheGroup {
    name: String,
    staging: Generation,
    active: Option<Generation>,
}

impl MemoryCacheGroup {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryCacheGroup {
            name: name.into(),
            staging: Generation::new(),
            active: None,
        }
    }

    pub fn staging(&self) -> &Generation {
        &self.staging
    }

    pub fn active(&self) -> Option<&Generation> {
        self.active.as_ref()
    }

    fn active_generation(&self) -> std::result::Result<&Generation, PersistenceError> {
        self.active
            .as_ref()
            .ok_or(PersistenceError::MissingGeneration("active"))
    }
}

impl CacheTarget for MemoryCacheGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&mut self) -> Result<()> {
        self.staging = Generation::new();
        Ok(())
    }

    fn cache_header(&mut self, header: &[String]) -> Result<()> {
        self.staging.header = Some(header.to_vec());
        Ok(())
    }

    fn cache_page(&mut self, page: &Page) -> Result<usize> {
        Ok(self.staging.put_page(page))
    }

    fn set_value(&mut self, name: &str, value: u64) -> Result<()> {
        self.staging.values.insert(name.to_string(), value);
        Ok(())
    }

    fn get_value(&self, name: &str) -> Result<Option<u64>> {
        Ok(self.staging.values.get(name).copied())
    }

    fn delete_active_generation(&mut self) -> Result<()> {
        self.active = None;
        Ok(())
    }

    fn activate_generation(&mut self) -> Result<()> {
        let built = std::mem::take(&mut self.staging);
        debug!("Activating '{}' with {} pages", self.name, built.pages.len());
        self.active = Some(built);
        Ok(())
    }
}

impl GenerationReader for MemoryCacheGroup {
    fn active_header(&self) -> std::result::Result<Option<Vec<String>>, PersistenceError> {
        Ok(self.active_generation()?.header.clone())
    }

    fn active_page_keys(&self) -> std::result::Result<Vec<PageKey>, PersistenceError> {
        Ok(self.active_generation()?.pages.keys().cloned().collect())
    }

    fn active_page(&self, key: &PageKey) -> std::result::Result<Vec<FlatRow>, PersistenceError> {
        self.active_generation()?
            .pages
            .get(key)
            .cloned()
            .ok_or_else(|| PersistenceError::PageNotFound(key.to_string()))
    }

    fn active_value(&self, name: &str) -> std::result::Result<Option<u64>, PersistenceError> {
        Ok(self.active_generation()?.values.get(name).copied())
    }
}
