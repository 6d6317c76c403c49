//! # Example: save_queue
//!
//! Saves must never overlap and must land in order: [`Policy::Enqueue`].
//!
//! Shows how to:
//! - Queue invocations and await each result
//! - Cancel a waiting invocation before it is promoted
//! - Consume lifecycle events directly from [`Controller::subscribe`]
//!
//! ## Flow
//! ```text
//! save v1 ─► RUNNING
//! save v2 ─► WAITING ─► (cancelled while waiting)
//! save v3 ─► WAITING ─► RUNNING once v1 completes
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example save_queue
//! ```

use std::time::Duration;

use taskmode::{Controller, InvocationState, Policy, WorkFn};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== save_queue example ===\n");

    let ctl = Controller::builder()
        .work(WorkFn::arc(
            |_ctx: CancellationToken, (version, body): (u32, String)| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                println!("[store] wrote v{version} ({} bytes)", body.len());
                Ok::<_, std::io::Error>(version)
            },
        ))
        .policy(Policy::Enqueue)
        .build()?;

    let mut events = ctl.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            println!("[event] {} invocation={:?}", ev.kind.as_label(), ev.invocation);
        }
    });

    let v1 = ctl.perform((1, "first draft".into()));
    let v2 = ctl.perform((2, "second draft".into()));
    let v3 = ctl.perform((3, "final".into()));
    println!("queued: {:?}", ctl.queued());

    v2.cancel()?;
    assert_eq!(v2.state(), InvocationState::Canceled);

    println!("v1 saved as {}", v1.value().await?);
    match v2.value().await {
        Err(err) => println!("v2 skipped: {err}"),
        Ok(v) => println!("v2 unexpectedly saved as {v}"),
    }
    println!("v3 saved as {}", v3.value().await?);

    drop((v1, v2, v3, ctl));
    printer.await?;
    Ok(())
}
