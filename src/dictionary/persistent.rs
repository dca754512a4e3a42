//! Dictionary backed by a persistent term index
//!
//! New identifiers are minted from a SHA-256 digest of the term's canonical
//! N-Triples encoding, salted until the candidate is free. Terms that
//! oxigraph rejects as malformed are never minted.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::core::id::{bound, ID_LENGTH};
use crate::core::{Id, Term};
use crate::dictionary::context::{LookupContext, ResolvedBy};
use crate::dictionary::term_index::TermIndex;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};

pub struct PersistentDictionary {
    index: Arc<dyn TermIndex>,
    /// Retired identifiers; holding this lock also serializes minting so one
    /// term never receives two identifiers
    retired: Mutex<HashSet<Id>>,
    closed: AtomicBool,
}

impl PersistentDictionary {
    pub fn new(index: Arc<dyn TermIndex>) -> Self {
        Self { index, retired: Mutex::new(HashSet::new()), closed: AtomicBool::new(false) }
    }

    fn lookup_or_mint(&self, term: &Term, create_if_missing: bool) -> Result<Option<Id>> {
        if let Some(id) = self.index.get_id(term)? {
            return Ok(Some(id));
        }
        if !create_if_missing {
            return Ok(None);
        }

        let retired = self.retired.lock();
        // Another thread may have minted while we waited for the lock
        if let Some(id) = self.index.get_id(term)? {
            return Ok(Some(id));
        }
        let id = self.mint(term, &retired)?;
        self.index.put(term, id)?;
        debug!("Minted identifier {} for {}", id, term);
        Ok(Some(id))
    }

    fn mint(&self, term: &Term, retired: &HashSet<Id>) -> Result<Id> {
        let encoded = term.to_oxigraph()?.to_string();
        let mut salt: u32 = 0;
        loop {
            let mut hasher = Sha256::new();
            hasher.update(encoded.as_bytes());
            if salt > 0 {
                hasher.update(salt.to_be_bytes());
            }
            let digest = hasher.finalize();
            let candidate = Id::from_slice(&digest[..ID_LENGTH])
                .ok_or_else(|| Error::Backend("digest shorter than identifier".to_string()))?;

            let usable = candidate.is_set()
                && !candidate.is_reserved()
                && !retired.contains(&candidate)
                && self.index.get_term(&candidate)?.is_none();
            if usable {
                return Ok(candidate);
            }
            salt = salt.wrapping_add(1);
        }
    }
}

impl Dictionary for PersistentDictionary {
    fn initialise(&self) -> Result<()> {
        self.index
            .initialise()
            .and_then(|()| self.index.retired_ids())
            .map(|ids| self.retired.lock().extend(ids))
            .map_err(|e| Error::Initialization(format!("term index unavailable: {}", e)))?;
        debug!("Persistent dictionary initialised");
        Ok(())
    }

    fn get_id(
        &self,
        ctx: &mut LookupContext,
        term: Option<&Term>,
        create_if_missing: bool,
    ) -> Option<Id> {
        let term = term?;
        ctx.record_backend_lookup();
        match self.lookup_or_mint(term, create_if_missing) {
            Ok(Some(id)) => {
                ctx.record(ResolvedBy::Backend);
                Some(id)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Identifier lookup for {} failed: {}", term, e);
                None
            }
        }
    }

    fn get_value(
        &self,
        ctx: &mut LookupContext,
        id: Option<&Id>,
        _create_if_missing: bool,
    ) -> Option<Term> {
        let id = bound(id)?;
        ctx.record_backend_lookup();
        match self.index.get_term(id) {
            Ok(Some(term)) => {
                ctx.record(ResolvedBy::Backend);
                Some(term)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Term lookup for {} failed: {}", id, e);
                None
            }
        }
    }

    fn remove_value(&self, _ctx: &mut LookupContext, term: &Term) {
        let mut retired = self.retired.lock();
        let removed = self.index.remove(term).and_then(|id| {
            if let Some(id) = id {
                self.index.retire(id)?;
                retired.insert(id);
            }
            Ok(id)
        });
        match removed {
            Ok(Some(id)) => debug!("Removed {} (identifier {})", term, id),
            Ok(None) => {}
            Err(e) => warn!("Removing {} failed: {}", term, e),
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Persistent dictionary closed");
        }
    }
}
