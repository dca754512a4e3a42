//! Named persistent counters
//!
//! Counters are created once per store and live for its lifetime. Values
//! can be snapshotted to JSON and restored on the next open.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Number of statements currently in the store
pub const TRIPLE_COUNTER: &str = "TRIPLE_COUNTER";

pub trait Counter: Send + Sync {
    fn name(&self) -> &str;
    fn current(&self) -> Result<i64>;
    fn increment(&self, by: i64) -> Result<()>;
    fn decrement(&self, by: i64) -> Result<()>;
}

pub trait CounterFactory: Send + Sync {
    /// Counter registered under `name`, created at zero on first request
    fn counter(&self, name: &str) -> Result<Arc<dyn Counter>>;
}

#[derive(Debug)]
pub struct AtomicCounter {
    name: String,
    value: AtomicI64,
}

impl AtomicCounter {
    pub fn new(name: impl Into<String>, initial: i64) -> Self {
        Self { name: name.into(), value: AtomicI64::new(initial) }
    }
}

impl Counter for AtomicCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn current(&self) -> Result<i64> {
        Ok(self.value.load(Ordering::SeqCst))
    }

    fn increment(&self, by: i64) -> Result<()> {
        self.value.fetch_add(by, Ordering::SeqCst);
        Ok(())
    }

    /// Never takes the value below zero
    fn decrement(&self, by: i64) -> Result<()> {
        // The closure always returns Some
        let _ = self.value.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            Some(current.saturating_sub(by).max(0))
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCounterFactory {
    counters: Mutex<BTreeMap<String, Arc<AtomicCounter>>>,
}

impl MemoryCounterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> BTreeMap<String, i64> {
        self.counters
            .lock()
            .iter()
            .map(|(name, counter)| (name.clone(), counter.value.load(Ordering::SeqCst)))
            .collect()
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values())?;
        fs::write(path, json)?;
        debug!("Saved counters to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let values: BTreeMap<String, i64> = serde_json::from_str(&json)?;
        let counters = values
            .into_iter()
            .map(|(name, value)| {
                let counter = Arc::new(AtomicCounter::new(name.clone(), value));
                (name, counter)
            })
            .collect();
        debug!("Loaded counters from {}", path.display());
        Ok(Self { counters: Mutex::new(counters) })
    }
}

impl CounterFactory for MemoryCounterFactory {
    fn counter(&self, name: &str) -> Result<Arc<dyn Counter>> {
        if name.is_empty() {
            return Err(Error::Config("counter name must not be empty".to_string()));
        }
        let mut counters = self.counters.lock();
        let counter: Arc<dyn Counter> = counters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicCounter::new(name, 0)))
            .clone();
        Ok(counter)
    }
}
