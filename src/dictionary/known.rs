//! Reserved identifiers for well-known vocabulary terms
//!
//! rdf:type and the RDFS/OWL schema predicates appear in a large share of all
//! statements; resolving them here keeps them out of the caches and backend.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::core::id::bound;
use crate::core::vocab::WELL_KNOWN_IRIS;
use crate::core::{Id, Term};
use crate::dictionary::context::{LookupContext, ResolvedBy};
use crate::dictionary::Dictionary;
use crate::error::Result;

pub struct KnownTermsDictionary {
    decoratee: Arc<dyn Dictionary>,
    ids: HashMap<Term, Id>,
    values: HashMap<Id, Term>,
}

impl KnownTermsDictionary {
    pub fn new(decoratee: Arc<dyn Dictionary>) -> Self {
        let mut ids = HashMap::with_capacity(WELL_KNOWN_IRIS.len());
        let mut values = HashMap::with_capacity(WELL_KNOWN_IRIS.len());
        for (sequence, iri) in (1u32..).zip(WELL_KNOWN_IRIS) {
            let term = Term::iri(iri);
            let id = Id::reserved(sequence);
            ids.insert(term.clone(), id);
            values.insert(id, term);
        }
        Self { decoratee, ids, values }
    }

    pub fn is_known(&self, term: &Term) -> bool {
        self.ids.contains_key(term)
    }
}

impl Dictionary for KnownTermsDictionary {
    fn initialise(&self) -> Result<()> {
        self.decoratee.initialise()
    }

    fn get_id(
        &self,
        ctx: &mut LookupContext,
        term: Option<&Term>,
        create_if_missing: bool,
    ) -> Option<Id> {
        let term = term?;
        if let Some(id) = self.ids.get(term) {
            ctx.record(ResolvedBy::KnownTerms);
            return Some(*id);
        }
        self.decoratee.get_id(ctx, Some(term), create_if_missing)
    }

    fn get_value(
        &self,
        ctx: &mut LookupContext,
        id: Option<&Id>,
        create_if_missing: bool,
    ) -> Option<Term> {
        let id = bound(id)?;
        if id.is_reserved() {
            let term = self.values.get(id).cloned();
            if term.is_some() {
                ctx.record(ResolvedBy::KnownTerms);
            }
            return term;
        }
        self.decoratee.get_value(ctx, Some(id), create_if_missing)
    }

    fn remove_value(&self, ctx: &mut LookupContext, term: &Term) {
        if self.is_known(term) {
            debug!("Ignoring removal of well-known term {}", term);
            return;
        }
        self.decoratee.remove_value(ctx, term);
    }

    fn close(&self) {
        self.decoratee.close();
    }
}
