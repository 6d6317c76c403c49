//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for observing a controller's
//! lifecycle events (logging, metrics, audit).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently of the invocations)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported on stderr)
//!
//! ## Architecture
//! ```text
//! Bus ──► listener ──► SubscriberSet ──► [bounded queue] ──► worker ──► on_event()
//!                                                               └─► panic caught, reported
//! ```
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event **for this subscriber only**.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block `perform`, `cancel` or each other.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use taskmode::{Event, EventKind, Subscribe};
//!
//! struct CancelCounter;
//!
//! #[async_trait]
//! impl Subscribe for CancelCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::InvocationCanceled) {
//!             // bump a counter, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "cancel-counter" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of controller lifecycle events.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, in FIFO order.
    async fn on_event(&self, event: &Event);

    /// Name used when reporting overflow or panics.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity; clamped to a minimum of 1.
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
