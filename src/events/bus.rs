//! # Event bus for lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]: publishing never blocks and never fails,
//! so bookkeeping code can publish while holding its locks.
//!
//! ```text
//! Publishers:                         Receivers:
//!   Controller::perform ──┐
//!   Invocation::start ────┼──► Bus ──► Controller::subscribe() receivers
//!   invocation driver ────┘            subscriber listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - Bounded ring buffer shared by all receivers.
//! - Slow receivers get `RecvError::Lagged(n)` and skip the `n` oldest events.
//! - Events published while nobody listens are lost.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone; every invocation created by a controller holds a clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given ring capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_after_subscribing() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::InvocationCreated).with_invocation(0));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::InvocationStarted).with_invocation(1));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::InvocationStarted);
        assert_eq!(ev.invocation, Some(1));
    }
}
