use crate::controller::policy::Policy;

/// Configuration for a [`Controller`](crate::Controller).
///
/// Copied into the controller at construction; later changes to the caller's value
/// have no effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How new `perform` calls are admitted.
    pub policy: Policy,

    /// Capacity of the lifecycle event bus (minimum 1).
    pub bus_capacity: usize,
}

impl ControllerConfig {
    /// Default configuration with the given policy.
    pub fn with_policy(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ControllerConfig {
    /// - `policy = Policy::Concurrent`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            bus_capacity: 1024,
        }
    }
}
