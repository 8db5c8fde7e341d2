//! Page Router Library
//!
//! HTTP middleware that routes requests to page handlers, memoizes route
//! resolutions and keeps one live page per session and route, both behind
//! idle-expiring caches.

pub mod cache;
pub mod config;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod page;
pub mod routing;

pub use config::RouterConfig;
pub use engine::Engine;
pub use http::{AttachOptions, Dispatcher, PageServer};
pub use lifecycle::Shutdown;
pub use page::{page_fn, AttachError, Page, PageConstructor, PageContext, PageError, PageSource};
