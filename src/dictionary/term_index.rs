//! Backing index consumed by the persistent dictionary
//!
//! The storage backend supplies the real implementation; `MemoryTermIndex`
//! keeps both directions in memory and can be snapshotted to disk.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::{Id, Term};
use crate::error::Result;

pub trait TermIndex: Send + Sync {
    /// One-time setup of the underlying tables
    fn initialise(&self) -> Result<()> {
        Ok(())
    }

    fn contains_term(&self, term: &Term) -> Result<bool>;

    fn get_id(&self, term: &Term) -> Result<Option<Id>>;

    fn get_term(&self, id: &Id) -> Result<Option<Term>>;

    /// Store both the forward and the reverse mapping
    fn put(&self, term: &Term, id: Id) -> Result<()>;

    /// Remove both mappings of a term, returning its id if it was present
    fn remove(&self, term: &Term) -> Result<Option<Id>>;

    /// Identifiers that were removed and must not be minted again
    fn retired_ids(&self) -> Result<Vec<Id>> {
        Ok(Vec::new())
    }

    fn retire(&self, _id: Id) -> Result<()> {
        Ok(())
    }

    /// Whether ids in this index were assigned with reserved ids for the
    /// well-known vocabulary; `None` until a store records it
    fn known_terms(&self) -> Result<Option<bool>> {
        Ok(None)
    }

    fn record_known_terms(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TermTable {
    term_to_id: HashMap<Term, Id>,
    id_to_term: HashMap<Id, Term>,
    retired: Vec<Id>,
    known_terms: Option<bool>,
}

#[derive(Debug, Default)]
pub struct MemoryTermIndex {
    table: RwLock<TermTable>,
}

impl MemoryTermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.read().term_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().term_to_id.is_empty()
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let encoded = bincode::serialize(&*self.table.read())?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        file.sync_all()?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let table: TermTable = bincode::deserialize(&buffer)?;
        Ok(Self { table: RwLock::new(table) })
    }
}

impl TermIndex for MemoryTermIndex {
    fn contains_term(&self, term: &Term) -> Result<bool> {
        Ok(self.table.read().term_to_id.contains_key(term))
    }

    fn get_id(&self, term: &Term) -> Result<Option<Id>> {
        Ok(self.table.read().term_to_id.get(term).copied())
    }

    fn get_term(&self, id: &Id) -> Result<Option<Term>> {
        Ok(self.table.read().id_to_term.get(id).cloned())
    }

    fn put(&self, term: &Term, id: Id) -> Result<()> {
        let mut table = self.table.write();
        table.term_to_id.insert(term.clone(), id);
        table.id_to_term.insert(id, term.clone());
        Ok(())
    }

    fn remove(&self, term: &Term) -> Result<Option<Id>> {
        let mut table = self.table.write();
        let id = table.term_to_id.remove(term);
        if let Some(id) = id {
            table.id_to_term.remove(&id);
        }
        Ok(id)
    }

    fn retired_ids(&self) -> Result<Vec<Id>> {
        Ok(self.table.read().retired.clone())
    }

    fn retire(&self, id: Id) -> Result<()> {
        let mut table = self.table.write();
        if !table.retired.contains(&id) {
            table.retired.push(id);
        }
        Ok(())
    }

    fn known_terms(&self) -> Result<Option<bool>> {
        Ok(self.table.read().known_terms)
    }

    fn record_known_terms(&self, enabled: bool) -> Result<()> {
        self.table.write().known_terms = Some(enabled);
        Ok(())
    }
}
