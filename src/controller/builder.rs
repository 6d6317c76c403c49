//! Builder for [`Controller`]: work function, policy and optional subscribers.
//!
//! When subscribers are attached, `build()` spawns a listener that forwards every
//! bus event to a [`SubscriberSet`]. The listener ends once the controller and all
//! of its invocations are gone.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    controller::{config::ControllerConfig, core::Controller, policy::Policy},
    error::ConfigError,
    events::Event,
    subscribers::{Subscribe, SubscriberSet},
    work::WorkRef,
};

/// Builder for constructing a [`Controller`].
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskmode::{ConfigError, Controller, Policy, WorkFn};
///
/// let missing = Controller::<(u32,), u32, String>::builder()
///     .policy(Policy::Drop)
///     .build();
/// assert_eq!(missing.unwrap_err(), ConfigError::MissingWork);
///
/// let ctl = Controller::builder()
///     .work(WorkFn::arc(|_ctx: CancellationToken, (n,): (u32,)| async move {
///         Ok::<_, String>(n + 1)
///     }))
///     .policy(Policy::Drop)
///     .build()
///     .unwrap();
/// assert_eq!(ctl.policy(), Policy::Drop);
/// ```
pub struct ControllerBuilder<A, R, E> {
    work: Option<WorkRef<A, R, E>>,
    config: ControllerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<A, R, E> ControllerBuilder<A, R, E>
where
    A: Clone + Send + Sync + 'static,
    R: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            work: None,
            config: ControllerConfig::default(),
            subscribers: Vec::new(),
        }
    }

    /// Sets the work function.
    pub fn work(mut self, work: WorkRef<A, R, E>) -> Self {
        self.work = Some(work);
        self
    }

    /// Sets the policy, keeping the rest of the configuration.
    pub fn policy(mut self, policy: Policy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches event subscribers.
    ///
    /// Requires `build()` to be called from within a tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the controller.
    ///
    /// # Errors
    /// - [`ConfigError::MissingWork`] if no work function was set.
    /// - [`ConfigError::NoRuntime`] if subscribers were attached outside a tokio runtime.
    pub fn build(self) -> Result<Controller<A, R, E>, ConfigError> {
        let work = self.work.ok_or(ConfigError::MissingWork)?;
        let ctl = Controller::new(work, self.config);

        if !self.subscribers.is_empty() {
            let runtime =
                tokio::runtime::Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
            let set = SubscriberSet::new(self.subscribers);
            runtime.spawn(subscriber_listener(ctl.subscribe(), set));
        }
        Ok(ctl)
    }
}

/// Forwards bus events to the subscriber set until the bus closes.
async fn subscriber_listener(mut rx: broadcast::Receiver<Event>, set: SubscriberSet) {
    loop {
        match rx.recv().await {
            Ok(ev) => set.emit(&ev),
            Err(RecvError::Lagged(skipped)) => {
                eprintln!("[taskmode] subscriber listener lagged; {skipped} events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    set.shutdown().await;
}
