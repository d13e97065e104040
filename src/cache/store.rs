//! In-memory response cache with time-based expiry
//!
//! Provides a `ResponseCache` that stores raw response bodies keyed by an opaque
//! string, plus a background sweep task that evicts entries older than the TTL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// A single cached response body
#[derive(Debug, Clone)]
struct CacheEntry {
    /// When the entry was stored
    created_at: Instant,
    /// The raw response bytes
    value: Vec<u8>,
}

/// Thread-safe map of cache keys to response bodies
///
/// Cloning a `ResponseCache` yields another handle to the same entries. A single
/// mutex guards the whole map; it is held only for the duration of a map
/// read, write or sweep, never across a network call.
///
/// Freshness: `get` treats any entry older than the TTL as a miss, so a stale
/// value is never returned even when the sweep has not reached it yet. The
/// sweep only reclaims memory.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Creates an empty cache without a background sweeper
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Creates an empty cache and spawns its sweep task on the current tokio runtime
    ///
    /// The sweep runs every `ttl`. Dropping or shutting down the returned
    /// handle stops it.
    pub fn start(ttl: Duration) -> (Self, SweepHandle) {
        let cache = Self::new(ttl);
        let handle = SweepHandle::spawn(cache.clone());
        (cache, handle)
    }

    /// Returns the configured time-to-live (also the sweep interval)
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites `key`, stamping the current time
    pub fn put(&self, key: impl Into<String>, value: Vec<u8>) {
        let key = key.into();
        debug!(%key, bytes = value.len(), "adding item to cache");
        self.lock().insert(
            key,
            CacheEntry {
                created_at: Instant::now(),
                value,
            },
        );
    }

    /// Returns a copy of the bytes stored under `key` if present and not expired
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.created_at.elapsed() <= self.ttl => {
                debug!(%key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(%key, "cache entry expired");
                None
            }
            None => {
                debug!(%key, "cache miss");
                None
            }
        }
    }

    /// Number of physically stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no entries are stored
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every entry older than the TTL and returns how many were dropped
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|key, entry| {
            let keep = entry.created_at.elapsed() <= ttl;
            if !keep {
                debug!(%key, "removing expired item from cache");
            }
            keep
        });
        let removed = before - entries.len();
        if removed > 0 {
            info!(removed, "swept expired cache entries");
        }
        removed
    }
}

/// Handle for the background sweep task
#[derive(Debug)]
pub struct SweepHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    fn spawn(cache: ResponseCache) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let period = cache.ttl();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // Skip the first tick (immediate)
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        cache.sweep();
                    }
                    // Fires on an explicit shutdown and when the handle is dropped
                    _ = shutdown_rx.recv() => {
                        debug!("cache sweeper stopping");
                        break;
                    }
                }
            }
        });

        Self { shutdown_tx, task }
    }

    /// Stops the sweep task and waits for it to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}
