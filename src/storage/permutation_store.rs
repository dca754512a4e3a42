//! Permutation-index backend
//!
//! [`StatementIndex`] is the row store the layout writes into: one ordered
//! key space per named permutation index. [`MemoryStatementIndex`] keeps
//! each key space in a `BTreeSet`, which gives ordered prefix scans.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Bound;
use std::path::Path;

use log::debug;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::storage::layout::{Layout, PermutationIndex};

pub trait StatementIndex: Send + Sync {
    /// Create the key space of every index in the layout's catalog
    fn create_indexes(&self, layout: Layout) -> Result<()>;

    /// Insert a row key, returning whether it was not present before
    fn insert(&self, index: &PermutationIndex, key: Vec<u8>) -> Result<bool>;

    /// Remove a row key, returning whether it was present
    fn remove(&self, index: &PermutationIndex, key: &[u8]) -> Result<bool>;

    /// All row keys starting with `prefix`, in key order
    fn scan_prefix(&self, index: &PermutationIndex, prefix: &[u8]) -> Result<Vec<Vec<u8>>>;

    fn len(&self, index: &PermutationIndex) -> Result<usize>;
}

#[derive(Default)]
pub struct MemoryStatementIndex {
    rows: RwLock<HashMap<&'static str, BTreeSet<Vec<u8>>>>,
}

impl MemoryStatementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every key space to `path` with bincode
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let rows = self.rows.read();
        let snapshot: BTreeMap<&str, &BTreeSet<Vec<u8>>> =
            rows.iter().map(|(name, keys)| (*name, keys)).collect();
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &snapshot)?;
        writer.flush()?;
        debug!("Saved {} permutation indexes to {}", snapshot.len(), path.display());
        Ok(())
    }

    /// Restore a snapshot written by [`save_to_file`](Self::save_to_file)
    ///
    /// Every index in the snapshot must belong to `layout`'s catalog.
    pub fn load_from_file(path: &Path, layout: Layout) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: BTreeMap<String, BTreeSet<Vec<u8>>> = bincode::deserialize_from(reader)?;
        let mut rows = HashMap::with_capacity(snapshot.len());
        for (name, keys) in snapshot {
            let index = layout.index_by_name(&name).ok_or_else(|| {
                Error::Config(format!("snapshot index {} is not part of the {:?} layout", name, layout))
            })?;
            rows.insert(index.name(), keys);
        }
        debug!("Loaded {} permutation indexes from {}", rows.len(), path.display());
        Ok(Self { rows: RwLock::new(rows) })
    }

    fn missing(index: &PermutationIndex) -> Error {
        Error::Backend(format!("index {} has not been created", index.name()))
    }
}

impl StatementIndex for MemoryStatementIndex {
    fn create_indexes(&self, layout: Layout) -> Result<()> {
        let mut rows = self.rows.write();
        for index in layout.indexes() {
            rows.entry(index.name()).or_default();
        }
        debug!("Created {} permutation indexes for {:?}", layout.indexes().len(), layout);
        Ok(())
    }

    fn insert(&self, index: &PermutationIndex, key: Vec<u8>) -> Result<bool> {
        let mut rows = self.rows.write();
        let set = rows.get_mut(index.name()).ok_or_else(|| Self::missing(index))?;
        Ok(set.insert(key))
    }

    fn remove(&self, index: &PermutationIndex, key: &[u8]) -> Result<bool> {
        let mut rows = self.rows.write();
        let set = rows.get_mut(index.name()).ok_or_else(|| Self::missing(index))?;
        Ok(set.remove(key))
    }

    fn scan_prefix(&self, index: &PermutationIndex, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let rows = self.rows.read();
        let set = rows.get(index.name()).ok_or_else(|| Self::missing(index))?;
        Ok(set
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn len(&self, index: &PermutationIndex) -> Result<usize> {
        let rows = self.rows.read();
        rows.get(index.name()).map(BTreeSet::len).ok_or_else(|| Self::missing(index))
    }
}
