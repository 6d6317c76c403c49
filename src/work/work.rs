//! # Work abstraction.
//!
//! A [`Work`] produces one fresh future per invocation. The future receives the
//! invocation's [`CancellationToken`]; it may watch it to stop early, but it is
//! never aborted from the outside. If it keeps running after a cancel, its result
//! is discarded.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

/// Boxed future returned by [`Work::spawn`].
pub type BoxWorkFuture<R, E> = Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'static>>;

/// # Asynchronous, cancelable unit of work.
///
/// `A` is the argument tuple bound to each invocation, `R` the success value and
/// `E` the work's own error type (propagated to callers unchanged).
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskmode::{BoxWorkFuture, Work};
///
/// struct Double;
///
/// impl Work<(u32,), u32, std::convert::Infallible> for Double {
///     fn spawn(&self, _ctx: CancellationToken, (n,): (u32,)) -> BoxWorkFuture<u32, std::convert::Infallible> {
///         Box::pin(async move { Ok(n * 2) })
///     }
/// }
/// ```
pub trait Work<A, R, E>: Send + Sync + 'static {
    /// Creates the future for one invocation.
    fn spawn(&self, ctx: CancellationToken, args: A) -> BoxWorkFuture<R, E>;
}
