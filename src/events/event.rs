//! # Lifecycle events emitted by controllers and invocations.
//!
//! The [`EventKind`] enum mirrors the invocation state machine:
//! - **Admission**: created, started, enqueued, promoted, dropped
//! - **Cancellation**: cancel requested
//! - **Settlement**: completed, failed, canceled, panicked
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use taskmode::{Event, EventKind, Policy};
//!
//! let ev = Event::new(EventKind::InvocationCreated)
//!     .with_invocation(3)
//!     .with_policy(Policy::Restart);
//!
//! assert_eq!(ev.kind, EventKind::InvocationCreated);
//! assert_eq!(ev.invocation, Some(3));
//! assert_eq!(ev.policy, Some(Policy::Restart));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::controller::Policy;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `perform` created a new invocation.
    ///
    /// Sets: `invocation`, `policy`
    InvocationCreated,

    /// Invocation moved to RUNNING and its work was spawned.
    ///
    /// Sets: `invocation`
    InvocationStarted,

    /// Invocation moved to WAITING.
    ///
    /// Sets: `invocation`
    InvocationEnqueued,

    /// Invocation left the pending queue to be started.
    ///
    /// Sets: `invocation`
    InvocationPromoted,

    /// Invocation was discarded without running.
    ///
    /// Sets: `invocation`
    InvocationDropped,

    /// Cancel was accepted; the invocation is now CANCELED.
    ///
    /// Sets: `invocation`
    CancelRequested,

    /// Work finished with a value.
    ///
    /// Sets: `invocation`
    InvocationCompleted,

    /// Work finished with an error.
    ///
    /// Sets: `invocation`
    InvocationFailed,

    /// Result handle settled with the cancellation error.
    ///
    /// Sets: `invocation`
    InvocationCanceled,

    /// Work panicked.
    ///
    /// Sets: `invocation`, `reason`
    InvocationPanicked,
}

impl EventKind {
    /// Short label used by log output.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::InvocationCreated => "created",
            EventKind::InvocationStarted => "started",
            EventKind::InvocationEnqueued => "enqueued",
            EventKind::InvocationPromoted => "promoted",
            EventKind::InvocationDropped => "dropped",
            EventKind::CancelRequested => "cancel-requested",
            EventKind::InvocationCompleted => "completed",
            EventKind::InvocationFailed => "failed",
            EventKind::InvocationCanceled => "canceled",
            EventKind::InvocationPanicked => "panicked",
        }
    }
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Invocation id, if applicable.
    pub invocation: Option<u64>,
    /// Policy of the publishing controller (set on creation events).
    pub policy: Option<Policy>,
    /// Human-readable reason (failure or panic message).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            invocation: None,
            policy: None,
            reason: None,
        }
    }

    /// Attaches an invocation id.
    #[inline]
    pub fn with_invocation(mut self, id: u64) -> Self {
        self.invocation = Some(id);
        self
    }

    /// Attaches the controller policy.
    #[inline]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
