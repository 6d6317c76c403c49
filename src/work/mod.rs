//! # Units of work.
//!
//! This module provides the work-function abstraction driven by a controller:
//! - [`Work`] - trait for cancelable async work taking an argument tuple
//! - [`WorkFn`] - closure-backed implementation
//! - [`WorkRef`] - shared reference to work (`Arc<dyn Work>`)

mod work_fn;
#[allow(clippy::module_inception)]
mod work;

pub use work::{BoxWorkFuture, Work};
pub use work_fn::{WorkFn, WorkRef};
