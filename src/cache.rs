//! Keyed stale-while-revalidate cache for fetched resources.
//!
//! Each key (normally the request URL) holds the last successful payload and
//! an error flag. Reads within the de-duplication window share one in-flight
//! request. Every write is stamped with a sequence number so a slow fetch
//! cannot overwrite a newer mutation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::ClientResult;

type SharedFetch<T> = Shared<BoxFuture<'static, ClientResult<T>>>;

/// Replacement for a cached value.
pub enum Mutation<T> {
    Value(T),
    Recompute(BoxFuture<'static, ClientResult<T>>),
}

impl<T> Mutation<T> {
    pub fn recompute<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        Mutation::Recompute(fut.boxed())
    }
}

struct InFlight<T> {
    seq: u64,
    started: Instant,
    future: SharedFetch<T>,
}

struct Entry<T> {
    data: Option<T>,
    error: bool,
    stale: bool,
    applied_seq: u64,
    in_flight: Option<InFlight<T>>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: false,
            stale: false,
            applied_seq: 0,
            in_flight: None,
        }
    }
}

struct Inner<T> {
    entries: HashMap<String, Entry<T>>,
    next_seq: u64,
}

impl<T> Inner<T> {
    fn bump(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

pub struct FetchCache<T> {
    inner: Mutex<Inner<T>>,
    dedup_window: Duration,
}

impl<T> FetchCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            dedup_window,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value without fetching.
    pub fn peek(&self, key: &str) -> Option<T> {
        self.lock().entries.get(key).and_then(|e| e.data.clone())
    }

    /// Whether the last fetch for `key` failed.
    pub fn has_error(&self, key: &str) -> bool {
        self.lock().entries.get(key).map(|e| e.error).unwrap_or(false)
    }

    /// Mark `key` stale so the next read refetches.
    pub fn invalidate(&self, key: &str) {
        if let Some(entry) = self.lock().entries.get_mut(key) {
            entry.stale = true;
            entry.in_flight = None;
        }
    }

    /// Fresh cached value, or the result of a (possibly shared) fetch.
    pub async fn read<F, Fut>(&self, key: &str, fetch: F) -> ClientResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let (seq, future) = {
            let mut inner = self.lock();
            let window = self.dedup_window;

            let joinable = match inner.entries.get(key) {
                Some(entry) => {
                    if let (Some(data), false) = (&entry.data, entry.stale) {
                        return Ok(data.clone());
                    }
                    entry
                        .in_flight
                        .as_ref()
                        .filter(|f| f.started.elapsed() < window)
                        .map(|f| (f.seq, f.future.clone()))
                }
                None => None,
            };

            match joinable {
                Some(shared) => {
                    tracing::trace!("Joining in-flight fetch for {}", key);
                    shared
                }
                None => {
                    let seq = inner.bump();
                    let future = fetch().boxed().shared();
                    inner.entries.entry(key.to_string()).or_default().in_flight = Some(InFlight {
                        seq,
                        started: Instant::now(),
                        future: future.clone(),
                    });
                    (seq, future)
                }
            }
        };

        let result = future.await;
        self.settle(key, seq, &result);
        result
    }

    /// Drop the cached value and fetch again.
    pub async fn revalidate<F, Fut>(&self, key: &str, fetch: F) -> ClientResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        self.invalidate(key);
        self.read(key, fetch).await
    }

    /// Replace the cached value. With `revalidate` the entry is left stale
    /// and the next read refetches; without it the caller vouches that the
    /// value is already correct.
    pub async fn mutate(&self, key: &str, mutation: Mutation<T>, revalidate: bool) -> ClientResult<T> {
        let value = match mutation {
            Mutation::Value(value) => value,
            Mutation::Recompute(fut) => fut.await?,
        };

        let mut inner = self.lock();
        let seq = inner.bump();
        let entry = inner.entries.entry(key.to_string()).or_default();
        entry.data = Some(value.clone());
        entry.error = false;
        entry.stale = revalidate;
        entry.applied_seq = seq;
        entry.in_flight = None;

        Ok(value)
    }

    fn settle(&self, key: &str, seq: u64, result: &ClientResult<T>) {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            return;
        };

        if entry.in_flight.as_ref().map(|f| f.seq) == Some(seq) {
            entry.in_flight = None;
        }
        if seq <= entry.applied_seq {
            tracing::trace!("Discarding superseded fetch result for {}", key);
            return;
        }
        entry.applied_seq = seq;

        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.error = false;
                entry.stale = false;
            }
            Err(e) => {
                tracing::warn!("Fetch for {} failed: {}", key, e);
                entry.error = true;
            }
        }
    }
}
