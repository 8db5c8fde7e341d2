//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher
//!     → route_cache.rs  (RouteKey "GET /user/42" → ResolvedRoute)
//!     → instances.rs    (InstanceKey "sid:GET /user/42" → live page)
//!         both backed by expiring.rs (idle TTL, lazy purge)
//!
//! Background:
//!     sweeper.rs → purge_expired() on every cache, on an interval
//! ```
//!
//! # Design Decisions
//! - Caches are constructed by the dispatcher at attach time and owned by it
//! - One expiry policy everywhere: `set` refreshes, `get` does not
//! - Correctness never depends on the sweeper; it only bounds memory

pub mod expiring;
pub mod instances;
pub mod route_cache;
pub mod sweeper;

pub use expiring::{Clock, ExpiringMap, ManualClock, Sweep, SystemClock, DEFAULT_TTL};
pub use instances::{InstanceKey, InstanceRegistry};
pub use route_cache::{RouteCache, RouteKey};
pub use sweeper::CacheSweeper;
