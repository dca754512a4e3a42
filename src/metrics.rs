//! Generic metrics registration
//!
//! Components expose named readings through [`MetricSource`]; an external
//! observability layer polls a [`MetricsRegistry`] for snapshots.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value }
    }
}

pub trait MetricSource: Send + Sync {
    fn metrics(&self) -> Vec<Metric>;
}

#[derive(Default)]
pub struct MetricsRegistry {
    sources: RwLock<Vec<(String, Arc<dyn MetricSource>)>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source whose metric names are prefixed with `prefix.`
    pub fn register(&self, prefix: impl Into<String>, source: Arc<dyn MetricSource>) {
        self.sources.write().push((prefix.into(), source));
    }

    pub fn unregister(&self, prefix: &str) -> bool {
        let mut sources = self.sources.write();
        let before = sources.len();
        sources.retain(|(name, _)| name != prefix);
        sources.len() != before
    }

    /// Current readings of every registered source, sorted by name
    pub fn snapshot(&self) -> Vec<Metric> {
        let sources = self.sources.read().clone();
        let mut metrics: Vec<Metric> = sources
            .iter()
            .flat_map(|(prefix, source)| {
                source
                    .metrics()
                    .into_iter()
                    .map(move |m| Metric::new(format!("{}.{}", prefix, m.name), m.value))
            })
            .collect();
        metrics.sort_by(|a, b| a.name.cmp(&b.name));
        metrics
    }

    pub fn to_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .snapshot()
            .into_iter()
            .map(|m| (m.name, serde_json::json!(m.value)))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}
