//! Caching decorator for any dictionary
//!
//! Holds two independent LRU caches (term→id and id→term). A resolution in
//! either direction populates both, so the caches stay mutually consistent.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use lru::LruCache;
use parking_lot::Mutex;

use crate::config::{CacheConfig, CacheMode};
use crate::core::id::bound;
use crate::core::{Id, Term};
use crate::dictionary::context::{LookupContext, ResolvedBy};
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::metrics::{Metric, MetricSource};

#[derive(Debug, Default)]
struct CacheCounters {
    lookups: AtomicU64,
    hits: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time statistics of one cache direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStatistics {
    pub lookups: u64,
    pub hits: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStatistics {
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups > 0 {
            self.hits as f64 / self.lookups as f64
        } else {
            0.0
        }
    }
}

struct DirectionalCache<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, V>>,
    counters: CacheCounters,
}

impl<K: Hash + Eq + Clone, V: Clone> DirectionalCache<K, V> {
    fn new(capacity: NonZeroUsize) -> Self {
        Self { entries: Mutex::new(LruCache::new(capacity)), counters: CacheCounters::default() }
    }

    fn lookup(&self, key: &K, mode: CacheMode) -> Option<V> {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock();
        let value = match mode {
            CacheMode::Cumulative => entries.get(key).cloned(),
            // Insertion order only: lookups do not refresh recency
            CacheMode::FirstLevel => entries.peek(key).cloned(),
        };
        if value.is_some() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock();
        if entries.contains(&key) {
            // A concurrent miss already populated this entry
            return;
        }
        if entries.push(key, value).is_some() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn invalidate(&self, key: &K) -> Option<V> {
        self.entries.lock().pop(key)
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn statistics(&self) -> CacheStatistics {
        let entries = self.entries.lock();
        CacheStatistics {
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            size: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

pub struct CacheDictionary {
    name: String,
    decoratee: Arc<dyn Dictionary>,
    mode: CacheMode,
    ids: DirectionalCache<Term, Id>,
    values: DirectionalCache<Id, Term>,
    closed: AtomicBool,
}

/// Builder for [`CacheDictionary`]; building without a decoratee fails
#[derive(Default)]
pub struct CacheDictionaryBuilder {
    name: Option<String>,
    decoratee: Option<Arc<dyn Dictionary>>,
    config: CacheConfig,
}

impl CacheDictionaryBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn decoratee(mut self, decoratee: Arc<dyn Dictionary>) -> Self {
        self.decoratee = Some(decoratee);
        self
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<CacheDictionary> {
        let decoratee = self.decoratee.ok_or_else(|| {
            Error::Config("a cache dictionary requires a decoratee".to_string())
        })?;
        let name = self.name.unwrap_or_else(|| match self.config.mode {
            CacheMode::Cumulative => "cumulative".to_string(),
            CacheMode::FirstLevel => "first_level".to_string(),
        });
        Ok(CacheDictionary {
            name,
            decoratee,
            mode: self.config.mode,
            ids: DirectionalCache::new(self.config.term_capacity()),
            values: DirectionalCache::new(self.config.id_capacity()),
            closed: AtomicBool::new(false),
        })
    }
}

impl CacheDictionary {
    pub fn builder() -> CacheDictionaryBuilder {
        CacheDictionaryBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Statistics of the term→id cache
    pub fn id_cache_statistics(&self) -> CacheStatistics {
        self.ids.statistics()
    }

    /// Statistics of the id→term cache
    pub fn value_cache_statistics(&self) -> CacheStatistics {
        self.values.statistics()
    }

    fn tier(&self) -> ResolvedBy {
        match self.mode {
            CacheMode::Cumulative => ResolvedBy::CumulativeCache,
            CacheMode::FirstLevel => ResolvedBy::FirstLevelCache,
        }
    }

    fn populate(&self, term: &Term, id: Id) {
        self.ids.insert(term.clone(), id);
        self.values.insert(id, term.clone());
    }
}

impl Dictionary for CacheDictionary {
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
        if let Some(id) = self.ids.lookup(term, self.mode) {
            ctx.record(self.tier());
            return Some(id);
        }
        let id = self.decoratee.get_id(ctx, Some(term), create_if_missing)?;
        self.populate(term, id);
        Some(id)
    }

    fn get_value(
        &self,
        ctx: &mut LookupContext,
        id: Option<&Id>,
        create_if_missing: bool,
    ) -> Option<Term> {
        let id = bound(id)?;
        if let Some(term) = self.values.lookup(id, self.mode) {
            ctx.record(self.tier());
            return Some(term);
        }
        let term = self.decoratee.get_value(ctx, Some(id), create_if_missing)?;
        self.populate(&term, *id);
        Some(term)
    }

    fn remove_value(&self, ctx: &mut LookupContext, term: &Term) {
        // The two directions evict independently, so the id may only be
        // known below this tier.
        let id = self
            .ids
            .invalidate(term)
            .or_else(|| self.decoratee.get_id(ctx, Some(term), false));
        if let Some(id) = id {
            self.values.invalidate(&id);
        }
        self.decoratee.remove_value(ctx, term);
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.ids.clear();
        self.values.clear();
        self.decoratee.close();
        debug!("Cache dictionary {} closed", self.name);
    }
}

impl MetricSource for CacheDictionary {
    fn metrics(&self) -> Vec<Metric> {
        let mut metrics = Vec::with_capacity(10);
        for (direction, stats) in
            [("term_to_id", self.ids.statistics()), ("id_to_term", self.values.statistics())]
        {
            metrics.push(Metric::new(format!("{direction}.lookups"), stats.lookups as f64));
            metrics.push(Metric::new(format!("{direction}.hits"), stats.hits as f64));
            metrics.push(Metric::new(format!("{direction}.evictions"), stats.evictions as f64));
            metrics.push(Metric::new(format!("{direction}.size"), stats.size as f64));
            metrics.push(Metric::new(format!("{direction}.hit_ratio"), stats.hit_ratio()));
        }
        metrics
    }
}
