//! # Deferred result of an invocation.
//!
//! [`ResultHandle`] observes a single-shot outcome slot owned by the invocation.
//! The slot is written exactly once (work result, cancellation or drop); every
//! handle, including ones created later, sees the same outcome.

use std::future::IntoFuture;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::error::InvocationError;

/// Result type carried by a [`ResultHandle`].
pub type Outcome<R, E> = Result<R, InvocationError<E>>;

/// Deferred handle to an invocation's outcome.
///
/// Await it directly (`handle.await`) or call [`ResultHandle::wait`].
/// [`ResultHandle::try_get`] returns `None` while the result is not yet available.
pub struct ResultHandle<R, E> {
    id: u64,
    rx: watch::Receiver<Option<Outcome<R, E>>>,
}

impl<R, E> ResultHandle<R, E> {
    pub(crate) fn new(id: u64, rx: watch::Receiver<Option<Outcome<R, E>>>) -> Self {
        Self { id, rx }
    }

    /// Id of the invocation this handle belongs to.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once the outcome is available.
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

impl<R: Clone, E> ResultHandle<R, E> {
    /// Returns the outcome without waiting, or `None` if not yet available.
    pub fn try_get(&self) -> Option<Outcome<R, E>> {
        (*self.rx.borrow()).clone()
    }

    /// Waits for the outcome.
    ///
    /// If every owner of the invocation went away without settling it, this
    /// resolves to [`InvocationError::Dropped`].
    pub async fn wait(mut self) -> Outcome<R, E> {
        let id = self.id;
        let settled = match self.rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_closed) => None,
        };
        settled.unwrap_or(Err(InvocationError::Dropped { id }))
    }
}

impl<R, E> Clone for ResultHandle<R, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            rx: self.rx.clone(),
        }
    }
}

impl<R, E> std::fmt::Debug for ResultHandle<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultHandle")
            .field("id", &self.id)
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<R, E> IntoFuture for ResultHandle<R, E>
where
    R: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    type Output = Outcome<R, E>;
    type IntoFuture = BoxFuture<'static, Outcome<R, E>>;

    fn into_future(self) -> Self::IntoFuture {
        self.wait().boxed()
    }
}
