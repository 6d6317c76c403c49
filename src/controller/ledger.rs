use std::collections::VecDeque;

use crate::invocation::{Invocation, InvocationState};

/// Bookkeeping owned by one controller.
pub(super) struct Ledger<A, R, E> {
    /// Next invocation id.
    pub next_id: u64,

    /// Every invocation ever created, in creation order.
    pub instances: Vec<Invocation<A, R, E>>,

    /// Most recently started invocation.
    pub last: Option<Invocation<A, R, E>>,

    /// Pending invocations (FIFO).
    pub queue: VecDeque<Invocation<A, R, E>>,
}

impl<A, R, E> Ledger<A, R, E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            instances: Vec::new(),
            last: None,
            queue: VecDeque::new(),
        }
    }

    pub fn has_running(&self) -> bool {
        self.instances
            .iter()
            .any(|i| i.state() == InvocationState::Running)
    }

    pub fn last_is_running(&self) -> bool {
        self.last
            .as_ref()
            .is_some_and(|i| i.state() == InvocationState::Running)
    }

    pub fn first_waiting(&self) -> Option<&Invocation<A, R, E>> {
        self.instances
            .iter()
            .find(|i| i.state() == InvocationState::Waiting)
    }

    /// Removes entries cancelled or dropped while they waited.
    pub fn prune_queue(&mut self) {
        self.queue.retain(|i| i.state() == InvocationState::Waiting);
    }
}
