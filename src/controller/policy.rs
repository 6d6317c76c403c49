//! # Concurrency policy
//!
//! A controller runs one unit of work. When `perform` is called again while earlier
//! invocations are still around, the policy decides what happens to the new one.
//!
//! ## Variants
//! - `Concurrent`: start immediately, no cap on parallel invocations.
//! - `Drop`: if anything is running, **discard** the new request.
//! - `Restart`: **cancel** the previously started invocation, then start the new one.
//! - `Enqueue`: **queue** the new request (FIFO); one runs at a time.
//! - `KeepLatest`: like `Enqueue`, but at most one request waits; a newer one replaces it.
//!
//! ## Invariants
//! - Queued requests are promoted strictly in arrival order.
//! - Except under `Concurrent`, at most one invocation runs at a time.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Policy controlling how new `perform` calls interact with existing invocations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Run every request in parallel (default).
    ///
    /// Use when:
    /// - Requests are independent
    /// - Example: fire-and-forget analytics pings
    #[default]
    Concurrent,

    /// Skip the request if something is already running.
    ///
    /// Use when:
    /// - Redundant work should be avoided
    /// - Example: a save button pressed twice
    Drop,

    /// Cancel the last started invocation and start the new one.
    ///
    /// Use when:
    /// - A new request invalidates the old one
    /// - Example: search-as-you-type
    Restart,

    /// Queue the request (FIFO).
    ///
    /// Use when:
    /// - Every request must run, in order
    /// - Example: sequential writes
    Enqueue,

    /// Queue only the most recent request while one is running.
    ///
    /// Use when:
    /// - The latest state matters but in-flight work must finish
    /// - Example: polling loop
    KeepLatest,
}

impl Policy {
    /// All policies, in declaration order.
    pub const ALL: [Policy; 5] = [
        Policy::Concurrent,
        Policy::Drop,
        Policy::Restart,
        Policy::Enqueue,
        Policy::KeepLatest,
    ];

    /// Canonical upper-case name.
    pub fn as_label(self) -> &'static str {
        match self {
            Policy::Concurrent => "CONCURRENT",
            Policy::Drop => "DROP",
            Policy::Restart => "RESTART",
            Policy::Enqueue => "ENQUEUE",
            Policy::KeepLatest => "KEEP_LATEST",
        }
    }

    /// True for the policies that admit requests through the pending queue.
    pub fn uses_queue(self) -> bool {
        matches!(self, Policy::Enqueue | Policy::KeepLatest)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    /// Parses the canonical name.
    ///
    /// ```
    /// use taskmode::Policy;
    ///
    /// assert_eq!("KEEP_LATEST".parse::<Policy>().unwrap(), Policy::KeepLatest);
    /// assert!("keep-latest".parse::<Policy>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|p| p.as_label() == s)
            .ok_or_else(|| ConfigError::UnknownPolicy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for policy in Policy::ALL {
            assert_eq!(policy.to_string().parse::<Policy>(), Ok(policy));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            "LATEST".parse::<Policy>(),
            Err(ConfigError::UnknownPolicy("LATEST".into()))
        );
    }

    #[test]
    fn default_is_concurrent() {
        assert_eq!(Policy::default(), Policy::Concurrent);
        assert!(Policy::Enqueue.uses_queue());
        assert!(!Policy::Restart.uses_queue());
    }
}
