//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [created] invocation=3 policy=RESTART
//! [cancel-requested] invocation=2
//! [canceled] invocation=2
//! [started] invocation=3
//! [panicked] invocation=3 reason="index out of bounds"
//! ```

use std::fmt::Write as _;

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn format(e: &Event) -> String {
        let mut line = format!("[{}]", e.kind.as_label());
        if let Some(id) = e.invocation {
            let _ = write!(line, " invocation={id}");
        }
        if let Some(policy) = e.policy {
            let _ = write!(line, " policy={policy}");
        }
        if let Some(reason) = e.reason.as_deref() {
            let _ = write!(line, " reason={reason:?}");
        }
        line
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", Self::format(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
