//! Change notification
//!
//! Mutations publish [`ChangeEvent`]s on a [`NotificationBus`]; counters
//! and statistics subscribe as [`ChangeListener`]s to stay consistent with
//! the store's contents.

pub mod bus;
pub mod event;

pub use bus::{BatchGuard, ChangeListener, ListenerId, NotificationBus};
pub use event::ChangeEvent;
