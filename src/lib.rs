//! # taskmode
//!
//! **Taskmode** governs repeated invocations of one async unit of work.
//!
//! A [`Controller`] wraps a work function and a [`Policy`]. Every call to
//! [`Controller::perform`] creates an [`Invocation`]; the policy decides whether it
//! starts right away, waits in a FIFO queue, cancels its predecessor or is dropped.
//!
//! ## Architecture
//! ```text
//!   perform(args) ─────────► Controller (policy, ledger, queue)
//!                                 │
//!             ┌───────────────────┼────────────────────┐
//!             ▼                   ▼                    ▼
//!        Invocation #0       Invocation #1        Invocation #2
//!        RUNNING             WAITING              DROPPED
//!             │
//!             ├─► tokio::spawn(work(token, args))
//!             └─► driver: select! { token.cancelled(), work }
//!                    └─► state, outcome, promote next in queue
//!
//!   every transition ──► Bus (broadcast) ──► listener ──► SubscriberSet
//!                                                            ├─► LogWriter
//!                                                            └─► custom ...
//! ```
//!
//! ## Policies
//! | Policy        | While something runs, a new `perform`...                 |
//! |---------------|-----------------------------------------------------------|
//! | `Concurrent`  | starts as well                                            |
//! | `Drop`        | is dropped                                                |
//! | `Restart`     | cancels the last started invocation, then starts          |
//! | `Enqueue`     | waits; queued invocations run one at a time, in order     |
//! | `KeepLatest`  | waits, replacing any invocation already waiting           |
//!
//! ## Cancellation
//! [`Invocation::cancel`] is synchronous: the state is CANCELED as soon as it returns
//! and the result handle fails with [`InvocationError::Canceled`]. The work function
//! receives a [`CancellationToken`](tokio_util::sync::CancellationToken) and may stop
//! early; if it does not, its late result is discarded.
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskmode::{Controller, InvocationState, Policy, WorkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let save = Controller::builder()
//!         .work(WorkFn::arc(|_ctx: CancellationToken, (doc,): (String,)| async move {
//!             Ok::<_, String>(format!("saved {doc}"))
//!         }))
//!         .policy(Policy::Enqueue)
//!         .build()?;
//!
//!     let a = save.perform(("a.txt".to_string(),));
//!     let b = save.perform(("b.txt".to_string(),));
//!     assert_eq!(a.state(), InvocationState::Running);
//!     assert_eq!(b.state(), InvocationState::Waiting);
//!
//!     assert_eq!(a.value().await?, "saved a.txt");
//!     assert_eq!(b.value().await?, "saved b.txt");
//!     Ok(())
//! }
//! ```
mod controller;
mod error;
mod events;
mod invocation;
mod subscribers;
mod work;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use controller::{Controller, ControllerBuilder, ControllerConfig, Policy};
pub use error::{CancelError, ConfigError, InvocationError, StartError};
pub use events::{Bus, Event, EventKind};
pub use invocation::{Invocation, InvocationBuilder, InvocationState, Outcome, ResultHandle};
pub use subscribers::{Subscribe, SubscriberSet};
pub use work::{BoxWorkFuture, Work, WorkFn, WorkRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
