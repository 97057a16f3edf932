//! Read-through fetcher with request coalescing.
//!
//! Reads check the cache first. On a miss, concurrent callers for one key
//! share a single loader call: the first caller spawns the load on the
//! runtime and registers it in the in-flight table, later callers join it.
//! The spawned task runs to completion even if every caller goes away, then
//! populates the cache (on success) and removes its in-flight entry. A loader
//! that panics settles as [`FetchError::Aborted`] and the key stays retryable.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use plantops_core::cache::{deserialize_value, serialize_value, Cache};
use plantops_core::remote;

use crate::error::FetchError;

/// A load shared by every caller of one key. Values cross the table as
/// serialized bytes so callers of different types can share one table.
type SharedLoad = Shared<BoxFuture<'static, Result<Arc<Vec<u8>>, FetchError>>>;

struct InFlight {
    ticket: u64,
    load: SharedLoad,
}

type InFlightTable = Arc<Mutex<HashMap<String, InFlight>>>;

/// Cache-aside reader that deduplicates concurrent loads of the same key.
///
/// Cloning shares the cache and the in-flight table.
pub struct ReadThroughFetcher<C: Cache> {
    cache: Arc<C>,
    in_flight: InFlightTable,
    next_ticket: Arc<AtomicU64>,
}

impl<C: Cache> Clone for ReadThroughFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            in_flight: Arc::clone(&self.in_flight),
            next_ticket: Arc::clone(&self.next_ticket),
        }
    }
}

impl<C: Cache + 'static> ReadThroughFetcher<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the cache this fetcher reads through.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Number of loads currently in flight.
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Returns the value cached under `key`, or loads it.
    ///
    /// `loader` is only invoked when there is neither a cached value nor a
    /// load in flight for `key`. A loader failure is returned to every caller
    /// that joined the load and nothing is cached.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &str,
        loader: F,
        ttl: Duration,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = remote::Result<T>> + Send + 'static,
    {
        if let Some(value) = self.cached(key).await {
            return Ok(value);
        }

        let load = {
            let mut in_flight = self.in_flight.lock().await;

            // A load may have settled between the first lookup and the lock.
            if let Some(value) = self.cached(key).await {
                return Ok(value);
            }

            match in_flight.get(key) {
                Some(pending) => {
                    tracing::trace!(key, ticket = pending.ticket, "Joined in-flight load");
                    pending.load.clone()
                }
                None => {
                    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let load = self.spawn_load(key, ticket, loader(), ttl);
                    in_flight.insert(
                        key.to_string(),
                        InFlight {
                            ticket,
                            load: load.clone(),
                        },
                    );
                    tracing::trace!(key, ticket, "Started load");
                    load
                }
            }
        };

        let bytes = load.await?;
        deserialize_value(&bytes).map_err(|e| FetchError::Serialization(e.to_string()))
    }

    /// Drops every cached value and forgets every in-flight load.
    ///
    /// Loads already running still complete for the callers awaiting them,
    /// but their results are not written back into the cache.
    pub async fn clear(&self) -> Result<(), FetchError> {
        let mut in_flight = self.in_flight.lock().await;
        let dropped = in_flight.len();
        in_flight.clear();

        self.cache
            .clear()
            .await
            .map_err(|e| FetchError::Aborted(e.to_string()))?;

        tracing::debug!(dropped, "Cleared cache and in-flight loads");
        Ok(())
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match deserialize_value(&bytes) {
                Ok(value) => {
                    tracing::trace!(key, "Cache hit");
                    Some(value)
                }
                Err(err) => {
                    // Treated as a miss.
                    tracing::warn!(key, error = %err, "Cached value deserialization failed");
                    None
                }
            },
            Ok(None) => {
                tracing::trace!(key, "Cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Cache read failed");
                None
            }
        }
    }

    fn spawn_load<T, Fut>(
        &self,
        key: &str,
        ticket: u64,
        future: Fut,
        ttl: Duration,
    ) -> SharedLoad
    where
        T: Serialize + Send + 'static,
        Fut: Future<Output = remote::Result<T>> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let table = Arc::clone(&self.in_flight);
        let task_key = key.to_string();

        let handle = tokio::spawn(async move {
            let key = task_key;
            // A panicking loader still settles, so the entry below is removed.
            let result = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(value)) => serialize_value(&value)
                    .map(Arc::new)
                    .map_err(|e| FetchError::Serialization(e.to_string())),
                Ok(Err(err)) => Err(FetchError::Remote(err)),
                Err(panic) => Err(FetchError::Aborted(panic_message(panic.as_ref()))),
            };

            let mut pending = table.lock().await;
            let current = pending.get(&key).is_some_and(|p| p.ticket == ticket);
            if !current {
                tracing::debug!(%key, ticket, "Discarded result of cleared load");
                return result;
            }

            match &result {
                Ok(bytes) => {
                    if let Err(err) = cache.set(&key, bytes, Some(ttl)).await {
                        tracing::warn!(%key, error = %err, "Failed to cache loaded value");
                    }
                }
                Err(FetchError::Aborted(reason)) => {
                    tracing::warn!(%key, %reason, "Loader panicked")
                }
                Err(err) => tracing::debug!(%key, error = %err, "Load failed"),
            }
            pending.remove(&key);
            result
        });

        let in_flight = Arc::clone(&self.in_flight);
        let key = key.to_string();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => {
                    // Cancelled with the runtime; forget the load so it can be retried.
                    let mut pending = in_flight.lock().await;
                    if pending.get(&key).is_some_and(|p| p.ticket == ticket) {
                        pending.remove(&key);
                    }
                    Err(FetchError::Aborted(err.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("loader panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("loader panicked: {message}")
    } else {
        "loader panicked".to_string()
    }
}
