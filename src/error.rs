//! Error types used by controllers and invocations.
//!
//! This module defines four error types:
//!
//! - [`ConfigError`]: invalid construction (missing work function or arguments, unknown policy).
//! - [`StartError`]: starting an invocation that already ran or was discarded.
//! - [`CancelError`]: cancelling an invocation that is neither running nor waiting.
//! - [`InvocationError`]: the failure side of an invocation's result handle.
//!
//! All of them provide `as_label` for logs/metrics. Work-function errors are never
//! wrapped in anything but [`InvocationError::Failed`]; the controller does not inspect them.

use std::sync::Arc;

use thiserror::Error;

use crate::invocation::InvocationState;

/// # Construction errors.
///
/// Raised synchronously while building a [`Controller`](crate::Controller) or an
/// [`Invocation`](crate::Invocation); never recovered internally.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No work function was supplied.
    #[error("cannot build without a work function")]
    MissingWork,

    /// No argument tuple was supplied to an invocation.
    #[error("cannot build an invocation without arguments")]
    MissingArgs,

    /// A policy name did not match any of the five known policies.
    #[error("unknown policy {0:?}; expected CONCURRENT, DROP, RESTART, ENQUEUE or KEEP_LATEST")]
    UnknownPolicy(String),

    /// Subscribers were requested but no tokio runtime is available to drive them.
    #[error("subscribers require a running tokio runtime")]
    NoRuntime,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskmode::ConfigError;
    ///
    /// assert_eq!(ConfigError::MissingWork.as_label(), "config_missing_work");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingWork => "config_missing_work",
            ConfigError::MissingArgs => "config_missing_args",
            ConfigError::UnknownPolicy(_) => "config_unknown_policy",
            ConfigError::NoRuntime => "config_no_runtime",
        }
    }
}

/// Error returned by [`Invocation::start`](crate::Invocation::start) when the
/// invocation is already running or has reached a terminal state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot start invocation {id}; it is {state}")]
pub struct StartError {
    /// Invocation id.
    pub id: u64,
    /// State observed when the start was attempted.
    pub state: InvocationState,
}

/// # Cancellation misuse.
///
/// One variant per offending state. A failed cancel never changes the invocation's state.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelError {
    /// The invocation was created but never dispatched.
    #[error("cannot cancel invocation {id}; it is idle")]
    Idle { id: u64 },

    /// The work function already finished.
    #[error("cannot cancel invocation {id}; it has completed")]
    Completed { id: u64 },

    /// The invocation was discarded without running.
    #[error("cannot cancel invocation {id}; it was dropped")]
    Dropped { id: u64 },

    /// Cancel was already requested.
    #[error("cannot cancel invocation {id}; it was already canceled")]
    AlreadyCanceled { id: u64 },

    /// Fallback for any other state that is neither running nor waiting.
    #[error("cannot cancel invocation {id}; it is neither running nor waiting ({state})")]
    NotCancelable { id: u64, state: InvocationState },

    /// Running or waiting without a registered cancellation hook (internal defect).
    #[error("cannot cancel invocation {id}; no cancellation hook is registered")]
    MissingCancelHook { id: u64 },
}

impl CancelError {
    /// Maps a non-cancelable state to its specific error.
    pub(crate) fn for_state(id: u64, state: InvocationState) -> Self {
        match state {
            InvocationState::Idle => CancelError::Idle { id },
            InvocationState::Completed => CancelError::Completed { id },
            InvocationState::Dropped => CancelError::Dropped { id },
            InvocationState::Canceled => CancelError::AlreadyCanceled { id },
            InvocationState::Running | InvocationState::Waiting => {
                CancelError::NotCancelable { id, state }
            }
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CancelError::Idle { .. } => "cancel_idle",
            CancelError::Completed { .. } => "cancel_completed",
            CancelError::Dropped { .. } => "cancel_dropped",
            CancelError::AlreadyCanceled { .. } => "cancel_already_canceled",
            CancelError::NotCancelable { .. } => "cancel_not_cancelable",
            CancelError::MissingCancelHook { .. } => "cancel_missing_hook",
        }
    }

    /// Returns the id of the invocation the cancel was attempted on.
    pub fn id(&self) -> u64 {
        match *self {
            CancelError::Idle { id }
            | CancelError::Completed { id }
            | CancelError::Dropped { id }
            | CancelError::AlreadyCanceled { id }
            | CancelError::NotCancelable { id, .. }
            | CancelError::MissingCancelHook { id } => id,
        }
    }
}

/// # Failure side of an invocation's result.
///
/// Work-function errors are carried unchanged inside [`InvocationError::Failed`]
/// (shared behind an `Arc` so that every holder of the result handle can observe them).
/// Cancellation is reported separately and always identifies the invocation.
#[derive(Error, Debug, PartialEq)]
pub enum InvocationError<E> {
    /// Cancellation won the race against the work function.
    #[error("invocation {id} was cancelled")]
    Canceled { id: u64 },

    /// The work function returned an error.
    #[error("{0}")]
    Failed(Arc<E>),

    /// The work function panicked.
    #[error("invocation {id} panicked: {reason}")]
    Panicked { id: u64, reason: Arc<str> },

    /// The invocation was discarded before it produced a result.
    #[error("invocation {id} was dropped before producing a result")]
    Dropped { id: u64 },
}

impl<E> InvocationError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            InvocationError::Canceled { .. } => "invocation_canceled",
            InvocationError::Failed(_) => "invocation_failed",
            InvocationError::Panicked { .. } => "invocation_panicked",
            InvocationError::Dropped { .. } => "invocation_dropped",
        }
    }

    /// True if the invocation was cancelled rather than failing on its own.
    pub fn is_canceled(&self) -> bool {
        matches!(self, InvocationError::Canceled { .. })
    }

    /// Returns the work function's error, if that is what this is.
    pub fn failure(&self) -> Option<&E> {
        match self {
            InvocationError::Failed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl<E> Clone for InvocationError<E> {
    fn clone(&self) -> Self {
        match self {
            InvocationError::Canceled { id } => InvocationError::Canceled { id: *id },
            InvocationError::Failed(e) => InvocationError::Failed(Arc::clone(e)),
            InvocationError::Panicked { id, reason } => InvocationError::Panicked {
                id: *id,
                reason: Arc::clone(reason),
            },
            InvocationError::Dropped { id } => InvocationError::Dropped { id: *id },
        }
    }
}
