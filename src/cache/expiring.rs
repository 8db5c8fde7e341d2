//! Map with per-entry idle expiry.
//!
//! # Responsibilities
//! - Store values with a last-touched instant
//! - Hide entries whose idle age reached the TTL
//! - Purge expired entries lazily on access, or in bulk via `purge_expired`
//!
//! # Design Decisions
//! - Read-through: `get` never refreshes the timer, only `set` does
//! - Backed by `DashMap`: sharded locks held for one operation at a time,
//!   never across an await
//! - Time comes from a `Clock` so expiry can be tested without sleeping

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Idle window used when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall-clock time via `Instant::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    touched: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.touched) >= ttl
    }
}

/// Something holding expirable entries; lets one sweeper serve many maps.
pub trait Sweep: Send + Sync {
    /// Cache name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Remove expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;

    /// Entries currently stored, including expired ones not yet purged.
    fn len(&self) -> usize;
}

/// A concurrent map whose entries vanish after `ttl` without a `set`.
pub struct ExpiringMap<K, V> {
    name: &'static str,
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: "expiring_map",
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Set the name used in logs and metrics.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or overwrite, restarting the entry's idle timer.
    pub fn set(&self, key: K, value: V) {
        let touched = self.clock.now();
        self.entries.insert(key, Entry { value, touched });
    }

    /// Return the value unless absent or expired. Does not refresh the timer.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now, self.ttl) {
                return Some(entry.value.clone());
            }
        }

        // Shard guard released above; remove only if still expired, since a
        // concurrent `set` may have refreshed it in between.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now, self.ttl));
        None
    }

    /// Remove an entry regardless of age.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Live (unexpired) entry check.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }
}

impl<K, V> Sweep for ExpiringMap<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn purge_expired(&self) -> usize {
        ExpiringMap::purge_expired(self)
    }

    fn len(&self) -> usize {
        ExpiringMap::len(self)
    }
}

impl<K: Eq + Hash, V> fmt::Debug for ExpiringMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringMap")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .finish()
    }
}
