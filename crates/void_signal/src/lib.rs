//! # void_signal - Synchronous Signal Channels
//!
//! Typed notification channels for editor observers:
//! - Synchronous dispatch on the caller's thread
//! - Priority-ordered handlers
//! - An `active` gate that suppresses dispatch while a batch is applied

use std::fmt;

/// Handler priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low = 0,
    Normal = 1,
    High = 2,
    Critical = 3,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Handler function type
pub type SignalHandler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// A named channel observers subscribe to.
///
/// Dispatch is synchronous: every handler runs before `dispatch` returns.
/// While the channel is inactive, dispatches are dropped, not queued.
pub struct Signal<T> {
    name: &'static str,
    handlers: Vec<(SubscriberId, Priority, SignalHandler<T>)>,
    next_subscriber_id: u64,
    active: bool,
}

impl<T> Signal<T> {
    /// Create a new, active channel
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: Vec::new(),
            next_subscriber_id: 1,
            active: true,
        }
    }

    /// Channel name, used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribe a handler
    pub fn add<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.add_with_priority(handler, Priority::Normal)
    }

    /// Subscribe with priority
    pub fn add_with_priority<F>(&mut self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;

        self.handlers.push((id, priority, Box::new(handler)));

        // Higher priority first; sort_by is stable so insertion order holds within a priority
        self.handlers.sort_by(|a, b| b.1.cmp(&a.1));

        id
    }

    /// Unsubscribe. Returns false if the id was not subscribed.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub_id, _, _)| *sub_id != id);
        self.handlers.len() != before
    }

    /// Remove every handler
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Deliver a payload to every handler, unless the channel is inactive.
    pub fn dispatch(&self, payload: &T) {
        if !self.active {
            log::trace!("signal '{}' suppressed (inactive)", self.name);
            return;
        }

        for (_, _, handler) in &self.handlers {
            handler(payload);
        }
    }

    /// Enable or disable dispatch
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Check whether dispatch is enabled
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of subscribed handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handler is subscribed
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .field("active", &self.active)
            .finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Priority, Signal, SignalHandler, SubscriberId};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct TestEvent(i32);

    #[test]
    fn test_dispatch() {
        let mut signal = Signal::new("test");
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        signal.add(move |e: &TestEvent| {
            counter_clone.fetch_add(e.0 as u32, Ordering::SeqCst);
        });

        signal.dispatch(&TestEvent(2));
        signal.dispatch(&TestEvent(3));

        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_inactive_suppresses_dispatch() {
        let mut signal = Signal::new("test");
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        signal.add(move |_: &()| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_active(false);
        signal.dispatch(&());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        signal.set_active(true);
        signal.dispatch(&());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove() {
        let mut signal = Signal::new("test");
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = signal.add(move |_: &()| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(signal.remove(id));
        assert!(!signal.remove(id));
        assert!(signal.is_empty());

        signal.dispatch(&());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_priority() {
        let mut signal = Signal::new("test");
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let order1 = order.clone();
        let order2 = order.clone();
        let order3 = order.clone();

        signal.add_with_priority(
            move |e: &TestEvent| {
                order1.lock().push(("low", e.0));
            },
            Priority::Low,
        );

        signal.add_with_priority(
            move |e: &TestEvent| {
                order2.lock().push(("high", e.0));
            },
            Priority::High,
        );

        signal.add(move |e: &TestEvent| {
            order3.lock().push(("normal", e.0));
        });

        signal.dispatch(&TestEvent(42));

        let received = order.lock();
        assert_eq!(received[0].0, "high");
        assert_eq!(received[1].0, "normal");
        assert_eq!(received[2].0, "low");
    }
}
