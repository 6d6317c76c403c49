//! # Example: search_as_you_type
//!
//! Every keystroke performs a search; a newer query cancels the one in flight.
//!
//! Shows how to:
//! - Build a controller with [`Policy::Restart`]
//! - Observe cancellation inside the work via its [`CancellationToken`]
//! - Watch the lifecycle through the built-in [`LogWriter`]
//!
//! ## Flow
//! ```text
//! "r"    ─► #0 RUNNING
//! "ru"   ─► #0 CANCELED, #1 RUNNING
//! "rus"  ─► #1 CANCELED, #2 RUNNING
//! "rust" ─► #2 CANCELED, #3 RUNNING ─► COMPLETED
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example search_as_you_type --features logging
//! ```

use std::{sync::Arc, time::Duration};

use taskmode::{Controller, LogWriter, Policy, Subscribe, WorkFn, WorkRef};
use tokio_util::sync::CancellationToken;

const CORPUS: &[&str] = &["rust", "rustc", "rustup", "ruby", "runtime", "tokio"];

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== search_as_you_type example ===\n");

    let search: WorkRef<(String,), Vec<&'static str>, String> =
        WorkFn::arc(|ctx: CancellationToken, (query,): (String,)| async move {
            tokio::select! {
                _ = ctx.cancelled() => {
                    println!("[search] {query:?} abandoned");
                    Err(format!("{query:?} abandoned"))
                }
                _ = tokio::time::sleep(Duration::from_millis(150)) => {
                    Ok(CORPUS.iter().copied().filter(|w| w.starts_with(&query)).collect())
                }
            }
        });

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let ctl = Controller::builder()
        .work(search)
        .policy(Policy::Restart)
        .with_subscribers(subs)
        .build()?;

    let mut last = None;
    for query in ["r", "ru", "rus", "rust"] {
        last = Some(ctl.perform((query.to_string(),)));
        tokio::time::sleep(Duration::from_millis(40)).await;
    }

    if let Some(inv) = last {
        let hits = inv.value().await?;
        println!("\nresults for {:?}: {hits:?}", inv.args().0);
    }

    for inv in ctl.instances() {
        println!("#{} {:>6} -> {}", inv.id(), inv.args().0, inv.state());
    }

    // Let the subscriber drain its queue.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
