//! Store facade
//!
//! Wires the dictionary stack, permutation indexes, counters and the
//! notification bus together. Writers go terms → ids → one row per
//! permutation index → change event; readers go pattern → selected index →
//! prefix scan → canonical ids → terms.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::config::{DictionaryConfig, StoreConfig};
use crate::core::{Id, Statement, Term};
use crate::dictionary::{
    CacheDictionary, Dictionary, KnownTermsDictionary, LookupContext, MemoryTermIndex,
    PersistentDictionary, TermIndex,
};
use crate::error::{Error, Result};
use crate::metrics::MetricsRegistry;
use crate::notification::NotificationBus;
use crate::statistics::{HeuristicSelectivityEstimator, SelectivityEstimator};
use crate::storage::counter::{CounterFactory, MemoryCounterFactory};
use crate::storage::layout::Layout;
use crate::storage::permutation_store::{MemoryStatementIndex, StatementIndex};

/// In-memory backends written to disk on close
#[derive(Default)]
struct Snapshots {
    terms: Option<(Arc<MemoryTermIndex>, PathBuf)>,
    counters: Option<(Arc<MemoryCounterFactory>, PathBuf)>,
    rows: Option<(Arc<MemoryStatementIndex>, PathBuf)>,
}

impl Snapshots {
    fn save(&self) -> Result<()> {
        if let Some((terms, path)) = &self.terms {
            terms.save_to_file(path)?;
        }
        if let Some((counters, path)) = &self.counters {
            counters.save_to_file(path)?;
        }
        if let Some((rows, path)) = &self.rows {
            rows.save_to_file(path)?;
        }
        Ok(())
    }
}

pub struct Store {
    layout: Layout,
    dictionary: Arc<dyn Dictionary>,
    rows: Arc<dyn StatementIndex>,
    estimator: Arc<HeuristicSelectivityEstimator>,
    bus: Arc<NotificationBus>,
    metrics: MetricsRegistry,
    snapshots: Snapshots,
    sessions: AtomicU64,
    closed: AtomicBool,
}

impl Store {
    /// Open an in-memory store, restoring any snapshot files that exist
    pub fn open(config: StoreConfig) -> Result<Self> {
        let terms = Arc::new(match existing(&config.dictionary_snapshot_path) {
            Some(path) => MemoryTermIndex::load_from_file(path)?,
            None => MemoryTermIndex::new(),
        });
        let counters = Arc::new(match existing(&config.counter_snapshot_path) {
            Some(path) => MemoryCounterFactory::load_from_file(path)?,
            None => MemoryCounterFactory::new(),
        });
        let rows = Arc::new(match existing(&config.statement_snapshot_path) {
            Some(path) => MemoryStatementIndex::load_from_file(path, config.layout)?,
            None => MemoryStatementIndex::new(),
        });

        let snapshots = Snapshots {
            terms: config.dictionary_snapshot_path.clone().map(|path| (terms.clone(), path)),
            counters: config.counter_snapshot_path.clone().map(|path| (counters.clone(), path)),
            rows: config.statement_snapshot_path.clone().map(|path| (rows.clone(), path)),
        };
        let mut store = Self::with_backends(&config, terms, rows, counters.as_ref())?;
        store.snapshots = snapshots;
        Ok(store)
    }

    /// Build a store over caller-supplied backends
    pub fn with_backends(
        config: &StoreConfig,
        terms: Arc<dyn TermIndex>,
        rows: Arc<dyn StatementIndex>,
        counters: &dyn CounterFactory,
    ) -> Result<Self> {
        check_known_terms(&config.dictionary, terms.as_ref())?;
        let metrics = MetricsRegistry::new();
        let dictionary = build_dictionary(&config.dictionary, terms, &metrics)?;
        dictionary.initialise()?;

        rows.create_indexes(config.layout)
            .map_err(|e| Error::Initialization(format!("cannot create permutation indexes: {}", e)))?;

        let estimator = Arc::new(HeuristicSelectivityEstimator::new(counters)?);
        let bus = Arc::new(NotificationBus::new());
        bus.register(estimator.clone());
        metrics.register("notifications", bus.clone());

        info!(
            "Opened {:?} store with {} permutation indexes",
            config.layout,
            config.layout.indexes().len()
        );
        Ok(Self {
            layout: config.layout,
            dictionary,
            rows,
            estimator,
            bus,
            metrics,
            snapshots: Snapshots::default(),
            sessions: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Fresh lookup context for one operation
    pub fn context(&self) -> LookupContext {
        LookupContext::new(self.sessions.fetch_add(1, Ordering::Relaxed))
    }

    /// Insert statements, returning how many were not already present
    ///
    /// Every statement must have the layout's arity and only well-formed
    /// terms, otherwise nothing is written. The change is published
    /// between `BatchStarted` and `BatchFinished` events from `source`.
    pub fn add_statements(&self, source: &str, statements: &[Vec<Term>]) -> Result<usize> {
        self.check_open()?;
        self.check_arity(statements)?;
        for term in statements.iter().flatten() {
            term.to_oxigraph()?;
        }
        let mut ctx = self.context();
        let _batch = self.bus.begin_batch(source);

        let mut added = Vec::new();
        let result = statements.iter().try_for_each(|terms| -> Result<()> {
            let ids = self.resolve(&mut ctx, terms, true).ok_or_else(|| {
                Error::Backend(format!("no identifier could be assigned for {:?}", terms))
            })?;
            if self.write_rows(&ids)? {
                added.push(Statement::from_ids(&ids)?);
            }
            Ok(())
        });

        let count = added.len();
        if count > 0 {
            self.bus.statements_added(source, added);
        }
        result.map(|()| count)
    }

    /// Delete statements, returning how many were present
    pub fn remove_statements(&self, source: &str, statements: &[Vec<Term>]) -> Result<usize> {
        self.check_open()?;
        self.check_arity(statements)?;
        let mut ctx = self.context();
        let _batch = self.bus.begin_batch(source);

        let mut removed = Vec::new();
        let result = statements.iter().try_for_each(|terms| -> Result<()> {
            // A statement with an unknown term was never stored
            if let Some(ids) = self.resolve(&mut ctx, terms, false) {
                if self.delete_rows(&ids)? {
                    removed.push(Statement::from_ids(&ids)?);
                }
            }
            Ok(())
        });

        let count = removed.len();
        if count > 0 {
            self.bus.statements_removed(source, removed);
        }
        result.map(|()| count)
    }

    /// Statements matching `pattern`, in the selected index's key order
    pub fn match_pattern(&self, pattern: &[Option<Term>]) -> Result<Vec<Vec<Term>>> {
        self.check_open()?;
        let index = self.layout.select_index(pattern)?;
        let mut ctx = self.context();

        let mut ids: Vec<Option<Id>> = Vec::with_capacity(pattern.len());
        for slot in pattern {
            match slot {
                Some(term) => match self.dictionary.get_id(&mut ctx, Some(term), false) {
                    Some(id) => ids.push(Some(id)),
                    // Unknown terms cannot match anything
                    None => return Ok(Vec::new()),
                },
                None => ids.push(None),
            }
        }

        let prefix = index.scan_prefix(&ids)?;
        let mut matches = Vec::new();
        for key in self.rows.scan_prefix(index, &prefix)? {
            let terms = index
                .decode_key(&key)?
                .iter()
                .map(|id| self.term_of(&mut ctx, id))
                .collect::<Result<Vec<Term>>>()?;
            matches.push(terms);
        }
        Ok(matches)
    }

    pub fn count(&self) -> Result<usize> {
        self.rows.len(self.layout.default_index())
    }

    pub fn estimator(&self) -> Arc<dyn SelectivityEstimator> {
        self.estimator.clone()
    }

    pub fn dictionary(&self) -> Arc<dyn Dictionary> {
        self.dictionary.clone()
    }

    pub fn bus(&self) -> Arc<NotificationBus> {
        self.bus.clone()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Close the dictionary stack and write configured snapshots; idempotent
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.dictionary.close();
        self.snapshots.save()?;
        info!("Store closed");
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Backend("store is closed".to_string()));
        }
        Ok(())
    }

    fn check_arity(&self, statements: &[Vec<Term>]) -> Result<()> {
        match statements.iter().find(|terms| terms.len() != self.layout.arity()) {
            Some(terms) => Err(Error::InvalidPattern(format!(
                "{:?} layout stores {} terms per statement, got {}",
                self.layout,
                self.layout.arity(),
                terms.len()
            ))),
            None => Ok(()),
        }
    }

    /// Ids of every term, or `None` when any term has none
    fn resolve(
        &self,
        ctx: &mut LookupContext,
        terms: &[Term],
        create_if_missing: bool,
    ) -> Option<Vec<Id>> {
        terms.iter().map(|term| self.dictionary.get_id(ctx, Some(term), create_if_missing)).collect()
    }

    fn term_of(&self, ctx: &mut LookupContext, id: &Id) -> Result<Term> {
        self.dictionary
            .get_value(ctx, Some(id), false)
            .ok_or_else(|| Error::Backend(format!("identifier {} has no term", id)))
    }

    /// Write the statement into every index; true when it was new
    fn write_rows(&self, ids: &[Id]) -> Result<bool> {
        let mut fresh = false;
        for (position, index) in self.layout.indexes().iter().enumerate() {
            let inserted = self.rows.insert(index, index.encode_key(ids)?)?;
            if position == 0 {
                fresh = inserted;
            }
        }
        Ok(fresh)
    }

    /// Delete the statement from every index; true when it was present
    fn delete_rows(&self, ids: &[Id]) -> Result<bool> {
        let mut present = false;
        for (position, index) in self.layout.indexes().iter().enumerate() {
            let removed = self.rows.remove(index, &index.encode_key(ids)?)?;
            if position == 0 {
                present = removed;
            }
        }
        Ok(present)
    }
}

fn existing(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|path| path.exists())
}

/// Reserved ids for well-known terms cannot be toggled over an existing
/// term index; the first store to open it records the setting
fn check_known_terms(config: &DictionaryConfig, terms: &dyn TermIndex) -> Result<()> {
    let recorded = terms
        .known_terms()
        .map_err(|e| Error::Initialization(format!("term index unavailable: {}", e)))?;
    match recorded {
        Some(recorded) if recorded != config.known_terms => Err(Error::Initialization(format!(
            "term index was built with known_terms = {}, but the store is configured with {}",
            recorded, config.known_terms
        ))),
        Some(_) => Ok(()),
        None => terms
            .record_known_terms(config.known_terms)
            .map_err(|e| Error::Initialization(format!("term index unavailable: {}", e))),
    }
}

/// Stack the dictionary decorators over the term index, outermost last
fn build_dictionary(
    config: &DictionaryConfig,
    terms: Arc<dyn TermIndex>,
    metrics: &MetricsRegistry,
) -> Result<Arc<dyn Dictionary>> {
    let mut dictionary: Arc<dyn Dictionary> = Arc::new(PersistentDictionary::new(terms));

    let tiers = std::iter::once(config.cumulative_cache.clone()).chain(config.first_level_cache.clone());
    for tier in tiers {
        let cache = Arc::new(CacheDictionary::builder().decoratee(dictionary).config(tier).build()?);
        metrics.register(format!("dictionary.{}", cache.name()), cache.clone());
        debug!("Stacked {:?} dictionary cache", cache.mode());
        dictionary = cache;
    }

    if config.known_terms {
        dictionary = Arc::new(KnownTermsDictionary::new(dictionary));
    }
    Ok(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn triple(s: &str, p: &str, o: &str) -> Vec<Term> {
        vec![Term::iri(s), Term::iri(p), Term::literal(o)]
    }

    #[test]
    fn test_duplicates_are_not_counted() {
        let store = Store::open(StoreConfig::default()).unwrap();
        let row = triple("http://example.org/a", "http://example.org/p", "1");

        assert_eq!(store.add_statements("test", &[row.clone(), row.clone()]).unwrap(), 1);
        assert_eq!(store.add_statements("test", &[row.clone()]).unwrap(), 0);
        assert_eq!(store.estimator().triples_count(), 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_arity_is_checked_before_writing() {
        let store = Store::open(StoreConfig::default()).unwrap();
        let good = triple("http://example.org/a", "http://example.org/p", "1");
        let bad = vec![Term::iri("http://example.org/a")];

        let result = store.add_statements("test", &[good, bad]);
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_malformed_terms_are_rejected_before_writing() {
        let store = Store::open(StoreConfig::default()).unwrap();
        let good = triple("http://example.org/a", "http://example.org/p", "1");
        let bad = triple("http://example.org/a b", "http://example.org/p", "1");

        let result = store.add_statements("test", &[good, bad]);
        assert!(matches!(result, Err(Error::InvalidTerm(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_known_terms_setting_is_recorded_in_term_index() {
        let terms = Arc::new(MemoryTermIndex::new());
        let mut config = StoreConfig::default();
        config.dictionary.known_terms = false;
        let counters = MemoryCounterFactory::new();

        Store::with_backends(&config, terms.clone(), Arc::new(MemoryStatementIndex::new()), &counters)
            .unwrap();
        assert_eq!(terms.known_terms().unwrap(), Some(false));

        config.dictionary.known_terms = true;
        let result =
            Store::with_backends(&config, terms, Arc::new(MemoryStatementIndex::new()), &counters);
        assert!(matches!(result, Err(Error::Initialization(_))));
    }

    #[test]
    fn test_removing_unknown_statement() {
        let store = Store::open(StoreConfig::default()).unwrap();
        let row = triple("http://example.org/nobody", "http://example.org/p", "1");
        assert_eq!(store.remove_statements("test", &[row]).unwrap(), 0);
        assert_eq!(store.estimator().triples_count(), 0);
    }

    #[test]
    fn test_cache_metrics_are_registered() {
        let mut config = StoreConfig::default();
        config.dictionary.first_level_cache = Some(CacheConfig::first_level(16));
        let store = Store::open(config).unwrap();
        store
            .add_statements("test", &[triple("http://example.org/a", "http://example.org/p", "1")])
            .unwrap();

        let names: Vec<String> = store.metrics().snapshot().into_iter().map(|m| m.name).collect();
        assert!(names.contains(&"dictionary.cumulative.term_to_id.lookups".to_string()));
        assert!(names.contains(&"dictionary.first_level.term_to_id.hit_ratio".to_string()));
        assert!(names.contains(&"notifications.events_published".to_string()));
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let store = Store::open(StoreConfig::default()).unwrap();
        store.close().unwrap();
        store.close().unwrap();
        assert!(store.match_pattern(&[None, None, None]).is_err());
    }
}
