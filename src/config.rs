//! Configuration structures for the store and its dictionary stack

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::layout::Layout;

/// Capacity used when a term→id cache size is not positive
pub const DEFAULT_TERM_CACHE_SIZE: usize = 100_000;
/// Capacity used when an id→term cache size is not positive
pub const DEFAULT_ID_CACHE_SIZE: usize = 100_000;

/// Eviction behaviour of a dictionary cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Least-recently-used by access order; evicts only when full
    #[default]
    Cumulative,
    /// Small write-through tier bounded by insertion order, placed in front
    /// of a cumulative cache
    FirstLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum term→id entries; non-positive means the default
    pub term_cache_size: i64,
    /// Maximum id→term entries; non-positive means the default
    pub id_cache_size: i64,
    pub mode: CacheMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { term_cache_size: 0, id_cache_size: 0, mode: CacheMode::Cumulative }
    }
}

impl CacheConfig {
    pub fn first_level(size: i64) -> Self {
        Self { term_cache_size: size, id_cache_size: size, mode: CacheMode::FirstLevel }
    }

    pub fn term_capacity(&self) -> NonZeroUsize {
        resolve_size(self.term_cache_size, DEFAULT_TERM_CACHE_SIZE)
    }

    pub fn id_capacity(&self) -> NonZeroUsize {
        resolve_size(self.id_cache_size, DEFAULT_ID_CACHE_SIZE)
    }
}

fn resolve_size(configured: i64, default: usize) -> NonZeroUsize {
    usize::try_from(configured)
        .ok()
        .and_then(NonZeroUsize::new)
        .or_else(|| NonZeroUsize::new(default))
        .unwrap_or(NonZeroUsize::MIN)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Give well-known vocabulary terms reserved identifiers
    pub known_terms: bool,
    pub cumulative_cache: CacheConfig,
    /// Optional fast tier in front of the cumulative cache
    pub first_level_cache: Option<CacheConfig>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self { known_terms: true, cumulative_cache: CacheConfig::default(), first_level_cache: None }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub layout: Layout,
    pub dictionary: DictionaryConfig,
    /// Where the dictionary is snapshotted on close and restored on open
    pub dictionary_snapshot_path: Option<PathBuf>,
    /// Where counter values are snapshotted on close and restored on open
    pub counter_snapshot_path: Option<PathBuf>,
    /// Where permutation index rows are snapshotted on close and restored on open
    pub statement_snapshot_path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
