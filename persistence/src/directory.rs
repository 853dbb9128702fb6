//! FILENAME: persistence/src/directory.rs
//! PURPOSE: Cache group stored as JSON files on disk.
//!
//! Layout under `<root>/<name>/`:
//! - `staging/` and `active/`, each holding
//!   - `header.json`: header labels
//!   - `values.json`: scalar metadata (entityCount, pivotCount)
//!   - `pages/data_<index>_<page>.json`: one file per page
//!
//! Activation removes `active/` and renames `staging/` into its place.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use pivot_data::{CacheTarget, FlatRow, Page, PageKey, Result};
use crate::error::PersistenceError;
use crate::generation::GenerationReader;

const STAGING_DIR: &str = "staging";
const ACTIVE_DIR: &str = "active";
const PAGES_DIR: &str = "pages";
const HEADER_FILE: &str = "header.json";
const VALUES_FILE: &str = "values.json";
const PAGE_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct DirectoryCacheGroup {
    name: String,
    dir: PathBuf,
}

impl DirectoryCacheGroup {
    /// Opens (creating if needed) the group directory `<root>/<name>`.
    pub fn open(root: impl AsRef<Path>, name: impl Into<String>) -> std::result::Result<Self, PersistenceError> {
        let name = name.into();
        if name.is_empty() || !is_safe_component(&name) {
            return Err(PersistenceError::InvalidPageKey(format!("cache group name {:?}", name)));
        }
        let dir = root.as_ref().join(&name);
        fs::create_dir_all(&dir)?;
        Ok(DirectoryCacheGroup { name, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn staging_dir(&self) -> PathBuf {
        self.dir.join(STAGING_DIR)
    }

    fn active_dir(&self) -> PathBuf {
        self.dir.join(ACTIVE_DIR)
    }

    fn page_path(generation: &Path, key: &PageKey) -> std::result::Result<PathBuf, PersistenceError> {
        if !is_safe_component(key.index.as_str()) {
            return Err(PersistenceError::InvalidPageKey(key.to_string()));
        }
        Ok(generation
            .join(PAGES_DIR)
            .join(format!("{}.{}", key, PAGE_EXTENSION)))
    }

    fn read_values(generation: &Path) -> std::result::Result<BTreeMap<String, u64>, PersistenceError> {
        Ok(read_json(&generation.join(VALUES_FILE))?.unwrap_or_default())
    }

    fn existing_active(&self) -> std::result::Result<PathBuf, PersistenceError> {
        let active = self.active_dir();
        if active.is_dir() {
            Ok(active)
        } else {
            Err(PersistenceError::MissingGeneration("active"))
        }
    }
}

/// Usable as (part of) a single path component.
fn is_safe_component(value: &str) -> bool {
    !value.contains(|c: char| c == '/' || c == '\\') && value != "." && value != ".."
}

fn read_json<T: DeserializeOwned>(path: &Path) -> std::result::Result<Option<T>, PersistenceError> {
    match File::open(path) {
        Ok(file) => Ok(Some(serde_json::from_reader(BufReader::new(file))?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::result::Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn remove_dir_if_exists(path: &Path) -> std::result::Result<(), PersistenceError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl CacheTarget for DirectoryCacheGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&mut self) -> Result<()> {
        let staging = self.staging_dir();
        remove_dir_if_exists(&staging)?;
        fs::create_dir_all(staging.join(PAGES_DIR))?;
        Ok(())
    }

    fn cache_header(&mut self, header: &[String]) -> Result<()> {
        write_json(&self.staging_dir().join(HEADER_FILE), header)?;
        Ok(())
    }

    fn cache_page(&mut self, page: &Page) -> Result<usize> {
        let path = Self::page_path(&self.staging_dir(), &page.key())?;
        write_json(&path, &page.rows)?;
        Ok(page.rows.len())
    }

    fn set_value(&mut self, name: &str, value: u64) -> Result<()> {
        let staging = self.staging_dir();
        let mut values = Self::read_values(&staging)?;
        values.insert(name.to_string(), value);
        write_json(&staging.join(VALUES_FILE), &values)?;
        Ok(())
    }

    fn get_value(&self, name: &str) -> Result<Option<u64>> {
        Ok(Self::read_values(&self.staging_dir())?.get(name).copied())
    }

    fn delete_active_generation(&mut self) -> Result<()> {
        remove_dir_if_exists(&self.active_dir())?;
        Ok(())
    }

    fn activate_generation(&mut self) -> Result<()> {
        let staging = self.staging_dir();
        if !staging.is_dir() {
            return Err(PersistenceError::MissingGeneration("staging").into());
        }
        let active = self.active_dir();
        remove_dir_if_exists(&active)?;
        fs::rename(&staging, &active)?;
        debug!("Activated '{}' at {:?}", self.name, active);
        Ok(())
    }
}

impl GenerationReader for DirectoryCacheGroup {
    fn active_header(&self) -> std::result::Result<Option<Vec<String>>, PersistenceError> {
        read_json(&self.existing_active()?.join(HEADER_FILE))
    }

    fn active_page_keys(&self) -> std::result::Result<Vec<PageKey>, PersistenceError> {
        let pages_dir = self.existing_active()?.join(PAGES_DIR);
        let mut keys = Vec::new();

        let entries = match fs::read_dir(&pages_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| PersistenceError::InvalidPageKey(path.display().to_string()))?;
            let key: PageKey = stem
                .parse()
                .map_err(|_| PersistenceError::InvalidPageKey(stem.to_string()))?;
            keys.push(key);
        }

        keys.sort();
        Ok(keys)
    }

    fn active_page(&self, key: &PageKey) -> std::result::Result<Vec<FlatRow>, PersistenceError> {
        let path = Self::page_path(&self.existing_active()?, key)?;
        read_json(&path)?.ok_or_else(|| PersistenceError::PageNotFound(key.to_string()))
    }

    fn active_value(&self, name: &str) -> std::result::Result<Option<u64>, PersistenceError> {
        Ok(Self::read_values(&self.existing_active()?)?.get(name).copied())
    }
}
