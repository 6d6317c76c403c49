use std::fmt;

/// Lifecycle state of an [`Invocation`](crate::Invocation).
///
/// | State     | Reachable from  | Can transition to          |
/// |-----------|-----------------|----------------------------|
/// | Idle      | (initial)       | Running, Waiting, Dropped  |
/// | Waiting   | Idle            | Running, Canceled, Dropped |
/// | Running   | Idle, Waiting   | Completed, Canceled        |
/// | Completed | Running         | (terminal)                 |
/// | Canceled  | Running, Waiting| (terminal)                 |
/// | Dropped   | Idle, Waiting   | (terminal)                 |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvocationState {
    /// Created, not yet dispatched.
    Idle,
    /// Queued, awaiting promotion.
    Waiting,
    /// Work is executing.
    Running,
    /// Work finished (value or error).
    Completed,
    /// Cancel was requested while running or waiting.
    Canceled,
    /// Discarded without ever running.
    Dropped,
}

impl InvocationState {
    /// True for `Completed`, `Canceled` and `Dropped`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvocationState::Completed | InvocationState::Canceled | InvocationState::Dropped
        )
    }

    /// True for `Running` and `Waiting`.
    pub fn is_cancelable(self) -> bool {
        matches!(self, InvocationState::Running | InvocationState::Waiting)
    }

    /// Upper-case label used in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            InvocationState::Idle => "IDLE",
            InvocationState::Waiting => "WAITING",
            InvocationState::Running => "RUNNING",
            InvocationState::Completed => "COMPLETED",
            InvocationState::Canceled => "CANCELED",
            InvocationState::Dropped => "DROPPED",
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
