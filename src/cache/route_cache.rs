//! Memoized route resolutions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;

use crate::cache::expiring::{Clock, ExpiringMap, Sweep, SystemClock};
use crate::page::ResolvedRoute;

/// Cache key for a resolved route: upper-cased method plus pathname.
///
/// The query string is never part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn new(method: &Method, pathname: &str) -> Self {
        Self(format!("{} {}", method.as_str().to_ascii_uppercase(), pathname))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(method, pathname)` → `ResolvedRoute`, expiring after idle TTL.
///
/// Holds no matching logic; the dispatcher decides what to remember.
#[derive(Debug)]
pub struct RouteCache {
    entries: ExpiringMap<RouteKey, ResolvedRoute>,
}

impl RouteCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: ExpiringMap::with_clock(ttl, clock).named("route_cache"),
        }
    }

    pub fn lookup(&self, method: &Method, pathname: &str) -> Option<ResolvedRoute> {
        self.lookup_key(&RouteKey::new(method, pathname))
    }

    pub fn remember(&self, method: &Method, pathname: &str, resolved: ResolvedRoute) {
        self.remember_key(RouteKey::new(method, pathname), resolved);
    }

    pub fn lookup_key(&self, key: &RouteKey) -> Option<ResolvedRoute> {
        self.entries.get(key)
    }

    pub fn remember_key(&self, key: RouteKey, resolved: ResolvedRoute) {
        self.entries.set(key, resolved);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying map, for sweeping.
    pub fn entries(&self) -> &ExpiringMap<RouteKey, ResolvedRoute> {
        &self.entries
    }
}

impl Sweep for RouteCache {
    fn name(&self) -> &'static str {
        Sweep::name(&self.entries)
    }

    fn purge_expired(&self) -> usize {
        self.entries.purge_expired()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::expiring::ManualClock;
    use crate::page::{page_fn, PageDescriptor};
    use crate::routing::{Params, SegmentCompiler};

    fn resolved(id: &str) -> ResolvedRoute {
        let ctor = page_fn("GET", "/user/:id", |_| async { Ok(()) });
        let descriptor = PageDescriptor::new(ctor, &SegmentCompiler).unwrap();
        let mut params = Params::new();
        params.insert("id".into(), id.into());
        ResolvedRoute {
            descriptor: Arc::new(descriptor),
            params,
        }
    }

    #[test]
    fn test_route_key_ignores_method_case() {
        let lower = Method::from_bytes(b"get").unwrap();
        assert_eq!(RouteKey::new(&lower, "/a"), RouteKey::new(&Method::GET, "/a"));
        assert_eq!(RouteKey::new(&Method::GET, "/a").as_str(), "GET /a");
        assert_ne!(RouteKey::new(&Method::GET, "/a"), RouteKey::new(&Method::POST, "/a"));
    }

    #[test]
    fn test_expiry_and_re_remember() {
        let clock = ManualClock::new();
        let cache = RouteCache::with_clock(Duration::from_secs(300), Arc::new(clock.clone()));

        cache.remember(&Method::GET, "/user/1", resolved("1"));
        assert_eq!(cache.lookup(&Method::GET, "/user/1").unwrap().params["id"], "1");
        assert!(cache.lookup(&Method::POST, "/user/1").is_none());

        clock.advance(Duration::from_secs(300));
        assert!(cache.lookup(&Method::GET, "/user/1").is_none());

        cache.remember(&Method::GET, "/user/1", resolved("1"));
        assert!(cache.lookup(&Method::GET, "/user/1").is_some());
    }
}
