//! Fan-out from the controller's event listener to its subscribers.
//!
//! Every subscriber owns a bounded queue drained by its own worker task, so one
//! slow or panicking subscriber never delays `perform`, the listener or the
//! other subscribers. An event that does not fit in a queue is lost for that
//! subscriber and reported on stderr.
//!
//! ```text
//! listener ─► emit(&Event) ─► Arc<Event>
//!                               ├─► [queue "log"]     ─► worker ─► on_event()
//!                               └─► [queue "metrics"] ─► worker ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

/// Sending side of one subscriber's queue.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// The subscribers attached to one controller.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber; call from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let (lanes, workers) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let lane = Lane {
                    name: sub.name(),
                    tx,
                };
                (lane, tokio::spawn(drain(sub, rx)))
            })
            .unzip();
        Self { lanes, workers }
    }

    /// Queues `event` for every subscriber without waiting for any of them.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            let why = match lane.tx.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker gone",
            };
            eprintln!(
                "[taskmode] {} lost for subscriber '{}' (seq={}): {why}",
                ev.kind.as_label(),
                lane.name,
                ev.seq
            );
        }
    }

    /// Stops accepting events and waits until every queue is drained.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of attached subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

/// Worker loop: hands queued events to `sub` one at a time.
async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>) {
    while let Some(ev) = rx.recv().await {
        let delivered = std::panic::AssertUnwindSafe(sub.on_event(&ev))
            .catch_unwind()
            .await;
        if let Err(panic) = delivered {
            eprintln!(
                "[taskmode] subscriber '{}' panicked handling {} (seq={}): {panic:?}",
                sub.name(),
                ev.kind.as_label(),
                ev.seq
            );
        }
    }
}
