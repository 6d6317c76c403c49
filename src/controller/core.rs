//! # Controller: policy dispatch and the pending queue.
//!
//! ```text
//! perform(args)
//!   ├─► id = next_id++ ; Invocation(IDLE) ; history.push
//!   └─► match policy
//!         Concurrent ─► start
//!         Drop       ─► any RUNNING? drop : start
//!         Restart    ─► last cancelable? cancel last ; start
//!         Enqueue    ─► enqueue
//!         KeepLatest ─► any RUNNING? drop the WAITING one ; enqueue
//!
//! enqueue(inv)
//!   ├─► inv: WAITING ; queue.push_back
//!   └─► last not RUNNING? promote
//!
//! invocation settles (value, error, panic or cancel)
//!   └─► last not RUNNING? promote ─► queue.pop_front ─► start
//! ```
//!
//! ## Rules
//! - All bookkeeping runs under one lock that is never held across `.await`,
//!   so the result of `perform` is observable as soon as it returns.
//! - Lock order is ledger, then invocation.
//! - Popping from the queue and moving to RUNNING happen under the same lock.
//! - An entry cancelled or dropped while waiting stays in the queue until the next
//!   pass over it (`perform` on a queueing policy, `queued`, `cancel_all`,
//!   promotion). Every pass prunes before reading, so such an entry is never
//!   reported or started.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast;

use crate::{
    controller::{
        builder::ControllerBuilder, config::ControllerConfig, ledger::Ledger, policy::Policy,
    },
    events::{Bus, Event, EventKind},
    invocation::{Invocation, InvocationState},
    work::WorkRef,
};

struct Shared<A, R, E> {
    work: WorkRef<A, R, E>,
    config: ControllerConfig,
    bus: Bus,
    ledger: Mutex<Ledger<A, R, E>>,
}

/// Governs repeated invocations of one unit of work under a [`Policy`].
///
/// Cheap to clone; clones share the same history and queue.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskmode::{Controller, ControllerConfig, InvocationState, Policy, WorkFn, WorkRef};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let search: WorkRef<(String,), usize, String> =
///     WorkFn::arc(|_ctx: CancellationToken, (q,): (String,)| async move {
///         Ok::<_, String>(q.len())
///     });
///
/// let ctl = Controller::new(search, ControllerConfig::with_policy(Policy::Restart));
/// let first = ctl.perform(("ru".into(),));
/// let second = ctl.perform(("rust".into(),));
///
/// assert_eq!(first.state(), InvocationState::Canceled);
/// assert_eq!(second.state(), InvocationState::Running);
/// assert!(first.value().await.unwrap_err().is_canceled());
/// assert_eq!(second.value().await.unwrap(), 4);
/// # }
/// ```
pub struct Controller<A, R, E> {
    inner: Arc<Shared<A, R, E>>,
}

impl<A, R, E> Controller<A, R, E>
where
    A: Clone + Send + Sync + 'static,
    R: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a controller for `work`; `config` is copied.
    pub fn new(work: WorkRef<A, R, E>, config: ControllerConfig) -> Self {
        let bus = Bus::new(config.bus_capacity_clamped());
        Self {
            inner: Arc::new(Shared {
                work,
                config,
                bus,
                ledger: Mutex::new(Ledger::new()),
            }),
        }
    }

    /// Returns a builder (work function, policy, subscribers).
    pub fn builder() -> ControllerBuilder<A, R, E> {
        ControllerBuilder::new()
    }

    /// The policy fixed at construction.
    pub fn policy(&self) -> Policy {
        self.inner.config.policy
    }

    /// The configuration fixed at construction.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Receiver for lifecycle events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Requests one execution with `args` and applies the policy.
    ///
    /// Returns the new invocation; inspect its state or await [`Invocation::value`].
    ///
    /// # Panics
    /// If an invocation has to be started outside a tokio runtime.
    pub fn perform(&self, args: A) -> Invocation<A, R, E> {
        let policy = self.inner.config.policy;
        let mut ledger = self.lock();
        if policy.uses_queue() {
            ledger.prune_queue();
        }

        let id = ledger.next_id;
        ledger.next_id += 1;
        let inv = Invocation::new(
            id,
            Arc::clone(&self.inner.work),
            args,
            Some(self.inner.bus.clone()),
        );
        ledger.instances.push(inv.clone());
        self.inner.bus.publish(
            Event::new(EventKind::InvocationCreated)
                .with_invocation(id)
                .with_policy(policy),
        );

        match policy {
            Policy::Concurrent => {
                self.start(&mut ledger, &inv);
            }
            Policy::Drop => {
                if ledger.has_running() {
                    inv.drop();
                } else {
                    self.start(&mut ledger, &inv);
                }
            }
            Policy::Restart => {
                if let Some(last) = ledger.last.as_ref().filter(|l| l.is_cancelable()) {
                    // May have settled since the check; nothing left to cancel then.
                    let _ = last.cancel();
                }
                self.start(&mut ledger, &inv);
            }
            Policy::Enqueue => self.enqueue(&mut ledger, &inv),
            Policy::KeepLatest => {
                if ledger.has_running() {
                    if let Some(waiting) = ledger.first_waiting().cloned() {
                        waiting.drop();
                        ledger.prune_queue();
                    }
                }
                self.enqueue(&mut ledger, &inv);
            }
        }
        inv
    }

    /// Snapshot of every invocation created so far, in creation order.
    pub fn instances(&self) -> Vec<Invocation<A, R, E>> {
        self.lock().instances.clone()
    }

    /// The most recently started invocation.
    pub fn last_started(&self) -> Option<Invocation<A, R, E>> {
        self.lock().last.clone()
    }

    /// Ids of the invocations waiting for promotion, front first.
    pub fn queued(&self) -> Vec<u64> {
        let mut ledger = self.lock();
        ledger.prune_queue();
        ledger.queue.iter().map(Invocation::id).collect()
    }

    /// Number of invocations currently RUNNING.
    pub fn running_count(&self) -> usize {
        self.lock()
            .instances
            .iter()
            .filter(|i| i.state() == InvocationState::Running)
            .count()
    }

    /// True if any invocation is RUNNING.
    pub fn has_running(&self) -> bool {
        self.lock().has_running()
    }

    /// Cancels every running or waiting invocation; returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut ledger = self.lock();
        let cancelled = ledger
            .instances
            .iter()
            .filter(|i| i.cancel().is_ok())
            .count();
        ledger.prune_queue();
        cancelled
    }

    fn lock(&self) -> MutexGuard<'_, Ledger<A, R, E>> {
        self.inner.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts `inv` and records it as the last started invocation.
    fn start(&self, ledger: &mut Ledger<A, R, E>, inv: &Invocation<A, R, E>) -> bool {
        let weak = Arc::downgrade(&self.inner);
        match inv.start_then(move || Self::promote_next(&weak)) {
            Ok(_) => {
                ledger.last = Some(inv.clone());
                true
            }
            Err(_) => false,
        }
    }

    fn enqueue(&self, ledger: &mut Ledger<A, R, E>, inv: &Invocation<A, R, E>) {
        inv.enqueue();
        ledger.queue.push_back(inv.clone());
        if !ledger.last_is_running() {
            self.promote(ledger);
        }
    }

    /// Starts the earliest queued invocation that is still waiting.
    fn promote(&self, ledger: &mut Ledger<A, R, E>) {
        while let Some(next) = ledger.queue.pop_front() {
            if next.state() != InvocationState::Waiting {
                continue;
            }
            if self.start(ledger, &next) {
                self.inner.bus.publish(
                    Event::new(EventKind::InvocationPromoted).with_invocation(next.id()),
                );
                break;
            }
        }
    }

    /// Runs after a started invocation settles.
    fn promote_next(weak: &Weak<Shared<A, R, E>>) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let ctl = Controller { inner };
        let mut ledger = ctl.lock();
        if !ledger.last_is_running() {
            ctl.promote(&mut ledger);
        }
    }
}

impl<A, R, E> Clone for Controller<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R, E> std::fmt::Debug for Controller<A, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("policy", &self.inner.config.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::{CancelError, InvocationError};
    use crate::testing::{double, fragile, mock_fetches};
    use crate::work::WorkFn;

    use crate::invocation::InvocationState::*;

    type Fetch = Controller<(String,), String, String>;

    fn fetcher(urls: &[&str], policy: Policy) -> (Arc<crate::testing::Resolvers>, Fetch) {
        let (resolvers, work) = mock_fetches(urls);
        (
            resolvers,
            Controller::new(work, ControllerConfig::with_policy(policy)),
        )
    }

    fn perform(ctl: &Fetch, url: &str) -> Invocation<(String,), String, String> {
        ctl.perform((url.to_string(),))
    }

    #[tokio::test]
    async fn ids_are_sequential_for_every_policy() {
        for policy in Policy::ALL {
            let ctl = Controller::new(double(), ControllerConfig::with_policy(policy));
            let ids: Vec<u64> = (0..4).map(|n| ctl.perform((n,)).id()).collect();
            assert_eq!(ids, vec![0, 1, 2, 3], "{policy}");
            let history: Vec<u64> = ctl.instances().iter().map(Invocation::id).collect();
            assert_eq!(history, ids, "{policy}");
        }
    }

    #[tokio::test]
    async fn perform_binds_arguments() {
        let ctl = Controller::new(double(), ControllerConfig::default());
        let inv = ctl.perform((21,));
        assert_eq!(inv.args(), &(21,));
        assert_eq!(inv.value().await, Ok(42));
    }

    #[tokio::test]
    async fn concurrent_runs_everything() {
        let (resolvers, ctl) = fetcher(&["t1", "t2", "t3"], Policy::Concurrent);
        let all: Vec<_> = ["t1", "t2", "t3"].iter().map(|u| perform(&ctl, u)).collect();
        assert!(all.iter().all(|i| i.state() == Running));
        assert_eq!(ctl.running_count(), 3);

        resolvers.resolve("t2", "second");
        assert_eq!(all[1].value().await.as_deref(), Ok("second"));
        assert_eq!(all[1].state(), Completed);
        assert_eq!(ctl.running_count(), 2);
    }

    #[tokio::test]
    async fn drop_discards_while_running() {
        let (resolvers, ctl) = fetcher(&["t1", "t2", "t3"], Policy::Drop);
        let first = perform(&ctl, "t1");
        let second = perform(&ctl, "t2");
        assert_eq!(first.state(), Running);
        assert_eq!(second.state(), Dropped);
        assert!(matches!(
            second.value().await,
            Err(InvocationError::Dropped { id: 1 })
        ));

        resolvers.resolve("t1", "done");
        first.value().await.expect("first");
        let third = perform(&ctl, "t3");
        assert_eq!(third.state(), Running);
    }

    #[tokio::test]
    async fn restart_cancels_previous_synchronously() {
        let (resolvers, ctl) = fetcher(&["t1", "t2"], Policy::Restart);
        let first = perform(&ctl, "t1");
        let second = perform(&ctl, "t2");
        assert_eq!(first.state(), Canceled);
        assert_eq!(second.state(), Running);

        assert_eq!(
            first.value().await,
            Err(InvocationError::Canceled { id: 0 })
        );
        resolvers.resolve("t2", "fresh");
        assert_eq!(second.value().await.as_deref(), Ok("fresh"));
        assert_eq!(first.state(), Canceled);
        assert_eq!(second.state(), Completed);
    }

    #[tokio::test]
    async fn restart_leaves_finished_previous_alone() {
        let (resolvers, ctl) = fetcher(&["t1", "t2"], Policy::Restart);
        let first = perform(&ctl, "t1");
        resolvers.resolve("t1", "success");
        first.value().await.expect("first");

        let second = perform(&ctl, "t2");
        assert_eq!(first.state(), Completed);
        assert_eq!(second.state(), Running);
        assert_eq!(ctl.last_started().map(|i| i.id()), Some(1));
    }

    #[tokio::test]
    async fn enqueue_promotes_in_arrival_order_despite_failures() {
        let (resolvers, ctl) = fetcher(&["t1", "t2", "t3"], Policy::Enqueue);
        let first = perform(&ctl, "t1");
        let second = perform(&ctl, "t2");
        let third = perform(&ctl, "t3");
        assert_eq!(
            [first.state(), second.state(), third.state()],
            [Running, Waiting, Waiting]
        );
        assert_eq!(ctl.queued(), vec![1, 2]);

        resolvers.resolve("t1", "success");
        first.value().await.expect("first");
        assert_eq!(
            [first.state(), second.state(), third.state()],
            [Completed, Running, Waiting]
        );

        resolvers.reject("t2", "Unknown mock endpoint failure");
        let err = second.value().await.unwrap_err();
        assert_eq!(
            err.failure().map(String::as_str),
            Some("Unknown mock endpoint failure")
        );
        assert_eq!(
            [first.state(), second.state(), third.state()],
            [Completed, Completed, Running]
        );
        assert!(ctl.queued().is_empty());
    }

    #[tokio::test]
    async fn enqueue_skips_entries_cancelled_while_waiting() {
        let (resolvers, ctl) = fetcher(&["t1", "t2", "t3"], Policy::Enqueue);
        let first = perform(&ctl, "t1");
        let second = perform(&ctl, "t2");
        let third = perform(&ctl, "t3");

        second.cancel().expect("cancel waiting");
        assert!(second.value().await.unwrap_err().is_canceled());
        assert_eq!(ctl.queued(), vec![2]);

        resolvers.resolve("t1", "success");
        first.value().await.expect("first");
        assert_eq!(second.state(), Canceled);
        assert_eq!(third.state(), Running);
    }

    #[tokio::test]
    async fn cancelling_the_running_one_promotes_the_next() {
        let (_resolvers, ctl) = fetcher(&["t1", "t2"], Policy::Enqueue);
        let first = perform(&ctl, "t1");
        let second = perform(&ctl, "t2");

        first.cancel().expect("cancel");
        assert!(first.value().await.unwrap_err().is_canceled());
        assert_eq!(second.state(), Running);
    }

    #[tokio::test]
    async fn keep_latest_holds_only_the_newest_request() {
        let (resolvers, ctl) = fetcher(&["t1", "t2", "t3", "t4"], Policy::KeepLatest);
        let first = perform(&ctl, "t1");
        let second = perform(&ctl, "t2");
        assert_eq!([first.state(), second.state()], [Running, Waiting]);

        let third = perform(&ctl, "t3");
        let fourth = perform(&ctl, "t4");
        assert_eq!(
            [first.state(), second.state(), third.state(), fourth.state()],
            [Running, Dropped, Dropped, Waiting]
        );
        assert_eq!(ctl.queued(), vec![3]);

        resolvers.resolve("t1", "success");
        first.value().await.expect("first");
        assert_eq!(fourth.state(), Running);

        resolvers.resolve("t4", "latest");
        assert_eq!(fourth.value().await.as_deref(), Ok("latest"));
        assert_eq!(second.state(), Dropped);
        assert_eq!(third.state(), Dropped);
    }

    #[tokio::test]
    async fn drop_recovers_after_work_panics_before_running() {
        let ctl = Controller::new(fragile(), ControllerConfig::with_policy(Policy::Drop));
        let broken = ctl.perform((2,));
        assert_eq!(broken.state(), Running);
        assert!(matches!(
            broken.value().await,
            Err(InvocationError::Panicked { id: 0, .. })
        ));
        assert_eq!(broken.state(), Completed);
        assert!(!ctl.has_running());

        let next = ctl.perform((3,));
        assert_eq!(next.state(), Running);
        assert_eq!(next.value().await, Ok(3));
    }

    #[tokio::test]
    async fn enqueue_promotes_after_panic() {
        let ctl = Controller::new(fragile(), ControllerConfig::with_policy(Policy::Enqueue));
        let first = ctl.perform((1,));
        let second = ctl.perform((2,));
        let third = ctl.perform((3,));
        assert_eq!(
            [first.state(), second.state(), third.state()],
            [Running, Waiting, Waiting]
        );

        // Promoting the panicking one must not stall the first result.
        let first_value = tokio::time::timeout(Duration::from_millis(500), first.value())
            .await
            .expect("first settles");
        assert_eq!(first_value, Ok(1));

        let err = second.value().await.unwrap_err();
        assert_eq!(err.as_label(), "invocation_panicked");
        assert_eq!(third.value().await, Ok(3));
        assert_eq!(
            [first.state(), second.state(), third.state()],
            [Completed, Completed, Completed]
        );
    }

    #[tokio::test]
    async fn keep_latest_promotes_after_failure() {
        let (resolvers, ctl) = fetcher(&["t1", "t2", "t3"], Policy::KeepLatest);
        let first = perform(&ctl, "t1");
        let second = perform(&ctl, "t2");
        let third = perform(&ctl, "t3");
        assert_eq!(
            [first.state(), second.state(), third.state()],
            [Running, Dropped, Waiting]
        );

        resolvers.reject("t1", "upstream unavailable");
        let err = first.value().await.unwrap_err();
        assert_eq!(err.failure().map(String::as_str), Some("upstream unavailable"));
        assert_eq!(third.state(), Running);

        resolvers.resolve("t3", "latest");
        assert_eq!(third.value().await.as_deref(), Ok("latest"));
        assert_eq!(second.state(), Dropped);
    }

    #[tokio::test]
    async fn keep_latest_starts_at_once_when_idle() {
        let ctl = Controller::new(double(), ControllerConfig::with_policy(Policy::KeepLatest));
        let inv = ctl.perform((3,));
        assert_eq!(inv.state(), Running);
        assert_eq!(inv.value().await, Ok(6));

        let next = ctl.perform((4,));
        assert_eq!(next.state(), Running);
    }

    #[tokio::test]
    async fn failed_cancel_does_not_change_state() {
        let ctl = Controller::new(double(), ControllerConfig::with_policy(Policy::Drop));
        let inv = ctl.perform((1,));
        inv.value().await.expect("value");
        assert_eq!(inv.cancel(), Err(CancelError::Completed { id: 0 }));
        assert_eq!(inv.state(), Completed);
    }

    #[tokio::test]
    async fn config_is_copied() {
        let mut cfg = ControllerConfig::with_policy(Policy::Drop);
        let ctl = Controller::new(double(), cfg.clone());
        cfg.policy = Policy::Enqueue;
        assert_eq!(ctl.policy(), Policy::Drop);
        assert_eq!(ctl.config().policy, Policy::Drop);
    }

    #[tokio::test]
    async fn cancel_all_stops_running_and_waiting() {
        let (_resolvers, ctl) = fetcher(&["t1", "t2", "t3"], Policy::Enqueue);
        let all: Vec<_> = ["t1", "t2", "t3"].iter().map(|u| perform(&ctl, u)).collect();

        assert_eq!(ctl.cancel_all(), 3);
        assert!(all.iter().all(|i| i.state() == Canceled));
        assert!(ctl.queued().is_empty());
        for inv in &all {
            assert!(inv.value().await.unwrap_err().is_canceled());
        }
        assert!(!ctl.has_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn enqueue_never_overlaps_on_multi_thread_runtime() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let work: WorkRef<(u64,), u64, String> = {
            let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
            WorkFn::arc(move |_ctx: CancellationToken, (n,): (u64,)| {
                let (active, peak) = (Arc::clone(&active), Arc::clone(&peak));
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(n)
                }
            })
        };

        let ctl = Controller::new(work, ControllerConfig::with_policy(Policy::Enqueue));
        let all: Vec<_> = (0..10).map(|n| ctl.perform((n,))).collect();
        for (n, inv) in all.iter().enumerate() {
            assert_eq!(inv.value().await, Ok(n as u64));
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lifecycle_events_are_published() {
        let (resolvers, ctl) = fetcher(&["t1", "t2"], Policy::Enqueue);
        let mut rx = ctl.subscribe();
        let first = perform(&ctl, "t1");
        let _second = perform(&ctl, "t2");
        resolvers.resolve("t1", "ok");
        first.value().await.expect("first");

        let mut seen = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            seen.push((ev.kind, ev.invocation));
        }
        assert_eq!(
            seen,
            vec![
                (EventKind::InvocationCreated, Some(0)),
                (EventKind::InvocationEnqueued, Some(0)),
                (EventKind::InvocationStarted, Some(0)),
                (EventKind::InvocationPromoted, Some(0)),
                (EventKind::InvocationCreated, Some(1)),
                (EventKind::InvocationEnqueued, Some(1)),
                (EventKind::InvocationCompleted, Some(0)),
                (EventKind::InvocationStarted, Some(1)),
                (EventKind::InvocationPromoted, Some(1)),
            ]
        );
    }
}
