//! # Function-backed work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: Fn(CancellationToken, A) -> Fut`, producing a fresh
//! future per invocation. No state is shared between invocations unless the closure
//! captures it explicitly (e.g. an `Arc<...>`).
//!
//! Synchronous work is just a closure returning a ready future.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskmode::{WorkFn, WorkRef};
//!
//! let double: WorkRef<(u32,), u32, String> =
//!     WorkFn::arc(|_ctx: CancellationToken, (n,): (u32,)| async move { Ok::<_, String>(n * 2) });
//! # let _ = double;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::work::work::{BoxWorkFuture, Work};

/// Shared handle to a unit of work.
pub type WorkRef<A, R, E> = Arc<dyn Work<A, R, E>>;

/// Function-backed work implementation.
///
/// Wraps a closure that *creates* a new future per invocation.
#[derive(Debug)]
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Creates a new function-backed work.
    ///
    /// Prefer [`WorkFn::arc`] when you immediately need a [`WorkRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the work and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut, A, R, E> Work<A, R, E> for WorkFn<F>
where
    F: Fn(CancellationToken, A) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    fn spawn(&self, ctx: CancellationToken, args: A) -> BoxWorkFuture<R, E> {
        Box::pin((self.f)(ctx, args))
    }
}
