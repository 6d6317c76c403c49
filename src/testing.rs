//! Test helpers: work functions whose completion the test controls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::work::{WorkFn, WorkRef};

type Reply = Result<String, String>;

/// Doubles its argument immediately.
pub(crate) fn double() -> WorkRef<(u32,), u32, String> {
    WorkFn::arc(|_ctx: CancellationToken, (n,): (u32,)| async move { Ok::<_, String>(n * 2) })
}

/// Echoes its argument, but panics on `2` before producing a future.
pub(crate) fn fragile() -> WorkRef<(u32,), u32, String> {
    WorkFn::arc(|_ctx: CancellationToken, (n,): (u32,)| {
        if n == 2 {
            panic!("rejected argument {n}");
        }
        async move { Ok::<_, String>(n) }
    })
}

/// Pending replies of a mock fetch, keyed by url.
pub(crate) struct Resolvers {
    senders: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
}

impl Resolvers {
    pub(crate) fn resolve(&self, url: &str, value: &str) {
        self.send(url, Ok(value.to_string()));
    }

    pub(crate) fn reject(&self, url: &str, error: &str) {
        self.send(url, Err(error.to_string()));
    }

    fn send(&self, url: &str, reply: Reply) {
        let tx = self.senders.lock().unwrap().remove(url);
        if let Some(tx) = tx {
            let _ = tx.send(reply);
        }
    }
}

/// Work that "fetches" a url and stays pending until the test resolves or rejects it.
///
/// The work ignores its cancellation token.
pub(crate) fn mock_fetches(urls: &[&str]) -> (Arc<Resolvers>, WorkRef<(String,), String, String>) {
    let mut senders = HashMap::new();
    let mut receivers = HashMap::new();
    for url in urls {
        let (tx, rx) = oneshot::channel::<Reply>();
        senders.insert(url.to_string(), tx);
        receivers.insert(url.to_string(), rx);
    }
    let receivers = Arc::new(Mutex::new(receivers));

    let work: WorkRef<(String,), String, String> =
        WorkFn::arc(move |_ctx: CancellationToken, (url,): (String,)| {
            let rx = receivers.lock().unwrap().remove(&url);
            async move {
                match rx {
                    Some(rx) => rx
                        .await
                        .unwrap_or_else(|_| Err(format!("{url}: resolver dropped"))),
                    None => Err(format!("unknown mock endpoint {url}")),
                }
            }
        });

    (
        Arc::new(Resolvers {
            senders: Mutex::new(senders),
        }),
        work,
    )
}
