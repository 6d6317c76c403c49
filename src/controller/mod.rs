//! # Controller: one unit of work, many invocations.
//!
//! - [`Controller`] creates invocations and applies the [`Policy`].
//! - [`ControllerBuilder`] wires the work function, configuration and subscribers.
//! - [`ControllerConfig`] holds the policy and the event bus capacity.

mod builder;
mod config;
mod core;
mod ledger;
mod policy;

pub use builder::ControllerBuilder;
pub use config::ControllerConfig;
pub use core::Controller;
pub use policy::Policy;
