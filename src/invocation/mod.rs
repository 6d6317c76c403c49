//! # Invocations: one execution record per `perform` call.
//!
//! - [`InvocationState`] the lifecycle state machine
//! - [`Invocation`] shared handle owning args, state and the cancellation hook
//! - [`ResultHandle`] deferred result, awaitable by any number of holders
//!
//! ## State machine
//! ```text
//!            ┌──────────► WAITING ──────────┐
//!            │              │   │           ▼
//!  IDLE ─────┼──────────────┼───┼──────► RUNNING ──► COMPLETED
//!            │              │   │           │
//!            └──► DROPPED ◄─┘   └──► CANCELED ◄┘
//! ```
//! COMPLETED, CANCELED and DROPPED are terminal.

mod builder;
mod core;
mod handle;
mod state;

pub use builder::InvocationBuilder;
pub use core::Invocation;
pub use handle::{Outcome, ResultHandle};
pub use state::InvocationState;
