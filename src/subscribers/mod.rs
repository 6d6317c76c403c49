//! # Event subscribers.
//!
//! Subscribers observe the lifecycle events a [`Controller`](crate::Controller)
//! publishes on its bus. They are attached through
//! [`ControllerBuilder::with_subscribers`](crate::ControllerBuilder::with_subscribers);
//! a listener task forwards bus events to a [`SubscriberSet`].
//!
//! ```text
//! perform / cancel ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                  ├──► LogWriter
//!                                                                  └──► custom ...
//! ```

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod embedded;

pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
