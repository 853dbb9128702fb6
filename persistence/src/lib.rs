//! FILENAME: persistence/src/lib.rs
//! Pivot Cache Persistence Module
//!
//! Stores cache generations built by the rebuild pipeline and serves them
//! back in bounded slices. Each cache group has a staging generation (written
//! during a rebuild) and an active generation (read by clients); activation
//! swaps one for the other.

mod dataset;
mod directory;
mod error;
mod generation;
mod memory;

pub use dataset::{DataRequest, DataSet, DataSlice, IndexRange, DEFAULT_RETURN_ROWS};
pub use directory::DirectoryCacheGroup;
pub use error::PersistenceError;
pub use generation::{Generation, GenerationReader};
pub use memory::MemoryCacheGroup;
