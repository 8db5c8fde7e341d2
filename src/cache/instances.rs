//! Live page instances per session and route.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::expiring::{Clock, ExpiringMap, Sweep, SystemClock};
use crate::cache::route_cache::RouteKey;
use crate::http::request::SessionId;
use crate::page::Page;

/// `"<session>:<route key>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey(String);

impl InstanceKey {
    pub fn new(session: &SessionId, route: &RouteKey) -> Self {
        Self(format!("{}:{}", session, route))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live page per `(session, route)`; a later bind replaces the earlier one.
///
/// Replaced instances are not torn down here; they end with their own task.
pub struct InstanceRegistry {
    entries: ExpiringMap<InstanceKey, Arc<dyn Page>>,
}

impl InstanceRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: ExpiringMap::with_clock(ttl, clock).named("instance_registry"),
        }
    }

    /// Store `instance`, overwriting any previous one. Returns the key used.
    pub fn bind(&self, session: &SessionId, route: &RouteKey, instance: Arc<dyn Page>) -> InstanceKey {
        let key = InstanceKey::new(session, route);
        self.entries.set(key.clone(), instance);
        key
    }

    pub fn get(&self, session: &SessionId, route: &RouteKey) -> Option<Arc<dyn Page>> {
        self.entries.get(&InstanceKey::new(session, route))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying map, for sweeping.
    pub fn entries(&self) -> &ExpiringMap<InstanceKey, Arc<dyn Page>> {
        &self.entries
    }
}

impl Sweep for InstanceRegistry {
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

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("entries", &self.entries.len())
            .field("ttl", &self.entries.ttl())
            .finish()
    }
}
