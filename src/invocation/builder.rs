use crate::{error::ConfigError, events::Bus, invocation::core::Invocation, work::WorkRef};

/// Builder for a standalone [`Invocation`].
///
/// Controllers create their invocations directly; use this when driving one by hand.
pub struct InvocationBuilder<A, R, E> {
    id: u64,
    work: Option<WorkRef<A, R, E>>,
    args: Option<A>,
    bus: Option<Bus>,
}

impl<A, R, E> InvocationBuilder<A, R, E> {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            work: None,
            args: None,
            bus: None,
        }
    }

    pub fn work(mut self, work: WorkRef<A, R, E>) -> Self {
        self.work = Some(work);
        self
    }

    pub fn args(mut self, args: A) -> Self {
        self.args = Some(args);
        self
    }

    /// Publishes lifecycle events to `bus`.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the invocation in IDLE state.
    ///
    /// # Errors
    /// [`ConfigError::MissingWork`] or [`ConfigError::MissingArgs`].
    pub fn build(self) -> Result<Invocation<A, R, E>, ConfigError> {
        let work = self.work.ok_or(ConfigError::MissingWork)?;
        let args = self.args.ok_or(ConfigError::MissingArgs)?;
        Ok(Invocation::new(self.id, work, args, self.bus))
    }
}
