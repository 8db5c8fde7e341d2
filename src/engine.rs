//! Real-time engine seam.
//!
//! The engine (live updates pushed to clients) is an external collaborator.
//! The dispatcher hands it to every page context and tells it when a page
//! instance is bound to a session slot; everything else about its protocol
//! stays on the engine's side.

use std::fmt::Debug;

use crate::cache::InstanceKey;

pub trait Engine: Send + Sync + Debug + 'static {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Called after a page instance is registered under `key`.
    fn page_bound(&self, _key: &InstanceKey) {}
}
