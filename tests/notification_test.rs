use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tessera::core::{Id, Statement};
use tessera::notification::{ChangeEvent, ChangeListener, ListenerId, NotificationBus};
use tessera::{Error, Result};

type Log = Arc<Mutex<Vec<String>>>;

struct Named {
    name: &'static str,
    log: Log,
}

impl ChangeListener for Named {
    fn on_event(&self, event: &ChangeEvent) -> Result<()> {
        self.log.lock().push(format!("{}:{}", self.name, event.kind()));
        Ok(())
    }
}

struct Failing;

impl ChangeListener for Failing {
    fn on_event(&self, _event: &ChangeEvent) -> Result<()> {
        Err(Error::Listener("disk full".to_string()))
    }
}

struct Panicking;

impl ChangeListener for Panicking {
    fn on_event(&self, _event: &ChangeEvent) -> Result<()> {
        panic!("listener bug");
    }
}

/// Registers a new listener the first time it sees an event
struct Recruiter {
    bus: Weak<NotificationBus>,
    log: Log,
    recruited: Mutex<Option<ListenerId>>,
}

impl ChangeListener for Recruiter {
    fn on_event(&self, _event: &ChangeEvent) -> Result<()> {
        let mut recruited = self.recruited.lock();
        if recruited.is_none() {
            if let Some(bus) = self.bus.upgrade() {
                *recruited = Some(bus.register(Arc::new(Named { name: "late", log: self.log.clone() })));
            }
        }
        Ok(())
    }
}

/// Unregisters itself when it sees an event
struct OneShot {
    bus: Weak<NotificationBus>,
    id: Mutex<Option<ListenerId>>,
    log: Log,
}

impl ChangeListener for OneShot {
    fn on_event(&self, event: &ChangeEvent) -> Result<()> {
        self.log.lock().push(format!("once:{}", event.kind()));
        if let (Some(bus), Some(id)) = (self.bus.upgrade(), self.id.lock().take()) {
            bus.unregister(id);
        }
        Ok(())
    }
}

fn statement() -> Statement {
    Statement::triple(Id::from_u64(1), Id::from_u64(2), Id::from_u64(3))
}

#[test]
fn test_delivery_in_registration_order() {
    let bus = NotificationBus::new();
    let log: Log = Arc::default();
    for name in ["first", "second", "third"] {
        bus.register(Arc::new(Named { name, log: log.clone() }));
    }

    bus.statements_added("loader", vec![statement()]);

    assert_eq!(*log.lock(), vec!["first:added", "second:added", "third:added"]);
}

#[test]
fn test_failing_listeners_do_not_stop_delivery() {
    let bus = NotificationBus::new();
    let log: Log = Arc::default();
    bus.register(Arc::new(Failing));
    bus.register(Arc::new(Panicking));
    bus.register(Arc::new(Named { name: "survivor", log: log.clone() }));

    bus.statements_removed("loader", vec![statement()]);
    bus.statements_added("loader", vec![statement()]);

    assert_eq!(*log.lock(), vec!["survivor:removed", "survivor:added"]);
}

#[test]
fn test_registration_during_delivery() {
    let bus = Arc::new(NotificationBus::new());
    let log: Log = Arc::default();
    bus.register(Arc::new(Recruiter {
        bus: Arc::downgrade(&bus),
        log: log.clone(),
        recruited: Mutex::new(None),
    }));

    bus.batch_started("loader");
    assert!(log.lock().is_empty());
    assert_eq!(bus.listener_count(), 2);

    bus.batch_finished("loader");
    assert_eq!(*log.lock(), vec!["late:batch_finished"]);
}

#[test]
fn test_unregistration_during_delivery() {
    let bus = Arc::new(NotificationBus::new());
    let log: Log = Arc::default();
    let one_shot = Arc::new(OneShot { bus: Arc::downgrade(&bus), id: Mutex::new(None), log: log.clone() });
    let id = bus.register(one_shot.clone());
    *one_shot.id.lock() = Some(id);

    bus.batch_started("loader");
    bus.batch_finished("loader");

    assert_eq!(*log.lock(), vec!["once:batch_started"]);
    assert_eq!(bus.listener_count(), 0);
}

#[test]
fn test_batch_guard_closes_on_early_return() {
    fn load(bus: &NotificationBus) -> Result<()> {
        let _batch = bus.begin_batch("loader");
        bus.statements_added("loader", vec![statement()]);
        Err(Error::Backend("connection lost".to_string()))
    }

    let bus = NotificationBus::new();
    let log: Log = Arc::default();
    bus.register(Arc::new(Named { name: "l", log: log.clone() }));

    assert!(load(&bus).is_err());
    assert_eq!(*log.lock(), vec!["l:batch_started", "l:added", "l:batch_finished"]);
}

#[test]
fn test_concurrent_publishers() {
    let bus = Arc::new(NotificationBus::new());
    let log: Log = Arc::default();
    bus.register(Arc::new(Named { name: "l", log: log.clone() }));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    bus.statements_added("worker", vec![statement()]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(log.lock().len(), 100);
}
