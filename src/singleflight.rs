//! Single Flight Module
//!
//! Collapses concurrent requests for the same key into one execution and
//! hands its result to every waiter.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

pub use futures::channel::oneshot::Canceled;

type Call<T> = Shared<oneshot::Receiver<T>>;
type CallMap<T> = Mutex<HashMap<String, Call<T>>>;

// == Single Flight ==
/// Deduplicates in-flight calls by key.
///
/// While a call for a key is running, later callers for that key wait on
/// the same result instead of starting their own. Once it resolves the call
/// is forgotten, so the next caller starts a fresh one. Results are never
/// cached here.
///
/// Each call runs on its own tokio task. A caller that stops waiting, for
/// example because it wrapped [`SingleFlight::run`] in a timeout, does not
/// stop the call: it still completes and is still removed from the table.
pub struct SingleFlight<T> {
    calls: Arc<CallMap<T>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // == Run ==
    /// Runs `fetch` unless a call for `key` is already in flight, in which
    /// case `fetch` is dropped unpolled and the running call's result is
    /// returned instead.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// [`Canceled`] if the task running the call ended without a result,
    /// which only happens when `fetch` panics or the runtime shuts down.
    pub async fn run<F>(&self, key: &str, fetch: F) -> Result<T, Canceled>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let call = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(call) => {
                    debug!("joining in-flight call for key '{}'", key);
                    call.clone()
                }
                None => {
                    let call = self.spawn_call(key, fetch);
                    calls.insert(key.to_owned(), call.clone());
                    call
                }
            }
        };

        call.await
    }

    /// Spawns `fetch` and returns the channel its result is sent on.
    ///
    /// Called with the table locked, so the task cannot remove its entry
    /// before the caller has inserted it.
    fn spawn_call<F>(&self, key: &str, fetch: F) -> Call<T>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let token = RemoveOnDrop {
            calls: Arc::downgrade(&self.calls),
            key: key.to_owned(),
        };

        tokio::spawn(async move {
            let result = fetch.await;
            // Forget the call before waiters see the result, so a caller
            // arriving afterwards starts a new generation.
            drop(token);
            sender.send(result).ok();
        });

        receiver.shared()
    }

    // == In Flight ==
    /// Number of keys with a call currently running.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = self.calls.try_lock().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("SingleFlight")
            .field("in_flight", &in_flight)
            .finish()
    }
}

/// Removes a finished call from its table.
///
/// Holds a weak reference so a running call cannot keep the table alive.
struct RemoveOnDrop<T> {
    calls: Weak<CallMap<T>>,
    key: String,
}

impl<T> Drop for RemoveOnDrop<T> {
    fn drop(&mut self) {
        if let Some(calls) = self.calls.upgrade() {
            calls.lock().remove(&self.key);
        }
    }
}
