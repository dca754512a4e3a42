//! Synchronous change notification bus

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error};
use parking_lot::RwLock;

use crate::core::Statement;
use crate::error::Result;
use crate::metrics::{Metric, MetricSource};
use crate::notification::event::ChangeEvent;

pub trait ChangeListener: Send + Sync {
    fn on_event(&self, event: &ChangeEvent) -> Result<()>;
}

/// Handle returned by [`NotificationBus::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Delivers change events to listeners in registration order
///
/// Each publish runs every listener on the calling thread before returning.
/// A listener that fails or panics is logged and skipped; later listeners
/// still see the event. Delivery iterates a snapshot of the registrations,
/// so listeners may register or unregister from inside `on_event`.
#[derive(Default)]
pub struct NotificationBus {
    listeners: RwLock<Vec<(ListenerId, Arc<dyn ChangeListener>)>>,
    next_id: AtomicU64,
    events_published: AtomicU64,
    listener_failures: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn ChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push((id, listener));
        debug!("Registered change listener {:?}", id);
        id
    }

    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        let removed = listeners.len() != before;
        if removed {
            debug!("Unregistered change listener {:?}", id);
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn publish(&self, event: &ChangeEvent) {
        let snapshot: Vec<(ListenerId, Arc<dyn ChangeListener>)> = self.listeners.read().clone();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        for (id, listener) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.listener_failures.fetch_add(1, Ordering::Relaxed);
                    error!("Listener {:?} failed on {} event: {}", id, event.kind(), e);
                }
                Err(_) => {
                    self.listener_failures.fetch_add(1, Ordering::Relaxed);
                    error!("Listener {:?} panicked on {} event", id, event.kind());
                }
            }
        }
    }

    pub fn statements_added(&self, source: &str, statements: Vec<Statement>) {
        self.publish(&ChangeEvent::added(source, statements));
    }

    pub fn statements_removed(&self, source: &str, statements: Vec<Statement>) {
        self.publish(&ChangeEvent::removed(source, statements));
    }

    pub fn batch_started(&self, source: &str) {
        self.publish(&ChangeEvent::BatchStarted { source: source.to_string() });
    }

    pub fn batch_finished(&self, source: &str) {
        self.publish(&ChangeEvent::BatchFinished { source: source.to_string() });
    }

    /// Publish `BatchStarted` now and `BatchFinished` when the guard drops
    pub fn begin_batch<'a>(&'a self, source: &str) -> BatchGuard<'a> {
        self.batch_started(source);
        BatchGuard { bus: self, source: source.to_string() }
    }
}

impl MetricSource for NotificationBus {
    fn metrics(&self) -> Vec<Metric> {
        vec![
            Metric::new("listeners", self.listener_count() as f64),
            Metric::new("events_published", self.events_published.load(Ordering::Relaxed) as f64),
            Metric::new("listener_failures", self.listener_failures.load(Ordering::Relaxed) as f64),
        ]
    }
}

pub struct BatchGuard<'a> {
    bus: &'a NotificationBus,
    source: String,
}

impl BatchGuard<'_> {
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.bus.batch_finished(&self.source);
    }
}
