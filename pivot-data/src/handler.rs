//! FILENAME: pivot-data/src/handler.rs
//! PURPOSE: Named formatting strategies for individual fields.
//! CONTEXT: A descriptor may name a handler; the formatter resolves the name
//! against this registry once, when it is built, and keeps the closure keyed
//! by field key from then on.

use std::fmt;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::value::{RawRow, RawValue};

/// Formats one raw value. Receives the whole raw row for cross-field lookups.
pub type FieldHandler = Arc<dyn Fn(&RawValue, &RawRow) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<String, FieldHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&RawValue, &RawRow) -> String + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&FieldHandler> {
        self.handlers.get(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &names).finish()
    }
}
