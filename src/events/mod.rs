//! Lifecycle events: types and broadcast bus.
//!
//! Controllers and invocations publish an [`Event`] at every state transition.
//! Events are observability only; nothing in the dispatch logic consumes them.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Controller::perform` (created, promoted), `Invocation`
//!   (started, enqueued, dropped, cancel requested, settled).
//! - **Consumers**: `Controller::subscribe()` receivers and the subscriber listener
//!   spawned by `ControllerBuilder::with_subscribers`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
