//! # Invocation: lifecycle and cancellation race.
//!
//! `start()` spawns the work as its own tokio task and a driver that races it
//! against the invocation's [`CancellationToken`]:
//!
//! ```text
//! start()
//!   ├─► state = RUNNING, hook armed
//!   ├─► tokio::spawn(work(token, args))          (never aborted)
//!   └─► driver: select! { token.cancelled(), work }
//!          ├─ work won   ─► RUNNING → COMPLETED, outcome = value | Failed | Panicked
//!          └─ token won  ─► state stays CANCELED, outcome = Canceled { id }
//!               then: on_settled() (controller promotion), then publish outcome
//! ```
//!
//! ## Rules
//! - All state changes happen under the invocation's lock; the lock is never held across `.await`.
//! - The outcome slot is single-shot: the first writer wins.
//! - A cancelled invocation is never moved to COMPLETED, even if its work finishes later.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{CancelError, InvocationError, StartError},
    events::{Bus, Event, EventKind},
    invocation::{
        builder::InvocationBuilder,
        handle::{Outcome, ResultHandle},
        state::InvocationState,
    },
    work::WorkRef,
};

/// Mutable part of an invocation.
struct Cell {
    state: InvocationState,
    /// Cancellation trigger; armed on `enqueue()` or `start()`.
    hook: Option<CancellationToken>,
}

struct Inner<A, R, E> {
    id: u64,
    args: A,
    work: WorkRef<A, R, E>,
    bus: Option<Bus>,
    cell: Mutex<Cell>,
    outcome: watch::Sender<Option<Outcome<R, E>>>,
}

/// One execution record of a work function with bound arguments.
///
/// Cheap to clone; all clones share the same state and outcome.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskmode::{Invocation, InvocationState, WorkFn, WorkRef};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let double: WorkRef<(u32,), u32, String> =
///     WorkFn::arc(|_ctx: CancellationToken, (n,): (u32,)| async move { Ok::<_, String>(n * 2) });
///
/// let inv = Invocation::builder(0).work(double).args((21,)).build().unwrap();
/// assert_eq!(inv.state(), InvocationState::Idle);
///
/// let handle = inv.start().unwrap();
/// assert_eq!(inv.state(), InvocationState::Running);
/// assert_eq!(handle.await.unwrap(), 42);
/// assert_eq!(inv.state(), InvocationState::Completed);
/// # }
/// ```
pub struct Invocation<A, R, E> {
    inner: Arc<Inner<A, R, E>>,
}

impl<A, R, E> Invocation<A, R, E> {
    /// Returns a builder for a standalone invocation.
    pub fn builder(id: u64) -> InvocationBuilder<A, R, E> {
        InvocationBuilder::new(id)
    }

    pub(crate) fn new(id: u64, work: WorkRef<A, R, E>, args: A, bus: Option<Bus>) -> Self {
        let (outcome, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                id,
                args,
                work,
                bus,
                cell: Mutex::new(Cell {
                    state: InvocationState::Idle,
                    hook: None,
                }),
                outcome,
            }),
        }
    }

    /// Sequence number assigned by the owning controller.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Arguments bound at creation.
    pub fn args(&self) -> &A {
        &self.inner.args
    }

    /// Current lifecycle state.
    pub fn state(&self) -> InvocationState {
        self.lock().state
    }

    /// True while running or waiting.
    pub fn is_cancelable(&self) -> bool {
        self.state().is_cancelable()
    }

    /// Deferred handle to the outcome; not yet available until the invocation settles.
    pub fn value(&self) -> ResultHandle<R, E> {
        ResultHandle::new(self.inner.id, self.inner.outcome.subscribe())
    }

    /// Requests cancellation.
    ///
    /// On success the state is CANCELED immediately and the cancellation trigger
    /// fires; the result handle then fails with [`InvocationError::Canceled`].
    /// A waiting invocation settles right away since it has no work to race.
    ///
    /// # Errors
    /// A state-specific [`CancelError`] if the invocation is neither running nor
    /// waiting; the state is left unchanged.
    pub fn cancel(&self) -> Result<(), CancelError> {
        let id = self.inner.id;
        let (hook, was_waiting) = {
            let mut cell = self.lock();
            if !cell.state.is_cancelable() {
                return Err(CancelError::for_state(id, cell.state));
            }
            let Some(hook) = cell.hook.clone() else {
                return Err(CancelError::MissingCancelHook { id });
            };
            let was_waiting = cell.state == InvocationState::Waiting;
            cell.state = InvocationState::Canceled;
            (hook, was_waiting)
        };

        self.publish(Event::new(EventKind::CancelRequested));
        hook.cancel();
        if was_waiting && self.settle(Err(InvocationError::Canceled { id })) {
            self.publish(Event::new(EventKind::InvocationCanceled));
        }
        Ok(())
    }

    /// Discards the invocation; it will never run.
    pub fn drop(&self) {
        self.lock().state = InvocationState::Dropped;
        self.publish(Event::new(EventKind::InvocationDropped));
        self.settle(Err(InvocationError::Dropped { id: self.inner.id }));
    }

    /// Marks the invocation as queued and arms its cancellation hook.
    pub fn enqueue(&self) {
        {
            let mut cell = self.lock();
            cell.state = InvocationState::Waiting;
            cell.hook.get_or_insert_with(CancellationToken::new);
        }
        self.publish(Event::new(EventKind::InvocationEnqueued));
    }

    fn lock(&self) -> MutexGuard<'_, Cell> {
        self.inner.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.inner.bus {
            bus.publish(ev.with_invocation(self.inner.id));
        }
    }

    /// Writes the outcome if none was written yet.
    fn settle(&self, outcome: Outcome<R, E>) -> bool {
        self.inner.outcome.send_if_modified(move |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }
}

impl<A, R, E> Invocation<A, R, E>
where
    A: Clone + Send + Sync + 'static,
    R: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Moves the invocation to RUNNING and spawns its work under the cancellation race.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// [`StartError`] if the invocation is already running or terminal.
    pub fn start(&self) -> Result<ResultHandle<R, E>, StartError> {
        self.start_then(|| {})
    }

    /// Like [`start`](Self::start), running `on_settled` once the race has resolved
    /// and the state is final, right before the outcome is published.
    pub(crate) fn start_then<F>(&self, on_settled: F) -> Result<ResultHandle<R, E>, StartError>
    where
        F: FnOnce() + Send + 'static,
    {
        let token = {
            let mut cell = self.lock();
            if cell.state == InvocationState::Running || cell.state.is_terminal() {
                return Err(StartError {
                    id: self.inner.id,
                    state: cell.state,
                });
            }
            cell.state = InvocationState::Running;
            cell.hook.get_or_insert_with(CancellationToken::new).clone()
        };
        self.publish(Event::new(EventKind::InvocationStarted));

        // The work closure itself may panic; it must do so inside the task.
        let (work, ctx, args) = (
            Arc::clone(&self.inner.work),
            token.clone(),
            self.inner.args.clone(),
        );
        let work = tokio::spawn(async move { work.spawn(ctx, args).await });
        let this = self.clone();
        tokio::spawn(async move {
            let raced = this.race(&token, work).await;
            let outcome = this.finish(raced);
            on_settled();
            this.settle(outcome);
        });

        Ok(self.value())
    }

    /// Whichever of {work result, cancellation trigger} resolves first wins.
    ///
    /// The losing work task is detached, not aborted.
    async fn race(
        &self,
        token: &CancellationToken,
        mut work: JoinHandle<Result<R, E>>,
    ) -> Outcome<R, E> {
        let id = self.inner.id;
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(InvocationError::Canceled { id }),
            joined = &mut work => match joined {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(InvocationError::Failed(Arc::new(e))),
                Err(e) => Err(InvocationError::Panicked { id, reason: panic_reason(e) }),
            },
        }
    }

    /// Applies the completion bookkeeping and returns the outcome to publish.
    fn finish(&self, raced: Outcome<R, E>) -> Outcome<R, E> {
        let id = self.inner.id;
        let outcome = {
            let mut cell = self.lock();
            match cell.state {
                InvocationState::Running => {
                    // The work may cancel its own token.
                    cell.state = if matches!(raced, Err(InvocationError::Canceled { .. })) {
                        InvocationState::Canceled
                    } else {
                        InvocationState::Completed
                    };
                    raced
                }
                InvocationState::Dropped => Err(InvocationError::Dropped { id }),
                _ => Err(InvocationError::Canceled { id }),
            }
        };

        let ev = match &outcome {
            Ok(_) => Some(Event::new(EventKind::InvocationCompleted)),
            Err(InvocationError::Failed(_)) => Some(Event::new(EventKind::InvocationFailed)),
            Err(InvocationError::Canceled { .. }) => {
                Some(Event::new(EventKind::InvocationCanceled))
            }
            Err(InvocationError::Panicked { reason, .. }) => Some(
                Event::new(EventKind::InvocationPanicked).with_reason(Arc::clone(reason)),
            ),
            // Already reported by `drop()`.
            Err(InvocationError::Dropped { .. }) => None,
        };
        if let Some(ev) = ev {
            self.publish(ev);
        }
        outcome
    }
}

fn panic_reason(err: JoinError) -> Arc<str> {
    if !err.is_panic() {
        return Arc::from("work task was aborted");
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        Arc::from(*msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        Arc::from(msg.as_str())
    } else {
        Arc::from("unknown panic payload")
    }
}

impl<A, R, E> Clone for Invocation<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R, E> std::fmt::Debug for Invocation<A, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}
