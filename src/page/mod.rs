//! Page subsystem.
//!
//! # Data Flow
//! ```text
//! Attach time:
//!     PageSource (directory manifests | constructor list)
//!     → loader.rs (resolve handlers via PageCatalog)
//!     → descriptor.rs (read method/path metadata, compile matcher once)
//!     → ordered Vec<PageDescriptor>
//!
//! Request time:
//!     ResolvedRoute
//!     → PageConstructor::construct(PageContext)
//!     → Arc<dyn Page> (registered, then run on its own task)
//!     → ResponseWriter (single response or single 500)
//! ```
//!
//! # Design Decisions
//! - Constructors and instances are distinct traits, so an instance can
//!   never be registered where a constructor is expected
//! - Method and path are constructor metadata, available before any instance
//! - Errors surface as `Result` from `Page::handle` or through the writer

pub mod descriptor;
pub mod func;
pub mod loader;
pub mod not_found;

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::engine::Engine;
use crate::http::request::PageRequest;
use crate::http::response::ResponseWriter;
use crate::routing::Params;

pub use descriptor::{PageDescriptor, ResolvedRoute};
pub use func::{page_fn, FnPage};
pub use loader::{AttachError, PageCatalog, PageSource};
pub use not_found::NotFound;

/// Error reported by a page after instantiation.
///
/// Its `Display` output becomes the body of the `500` response.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl PageError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Everything a page is constructed with.
pub struct PageContext {
    pub request: PageRequest,
    pub response: ResponseWriter,
    pub params: Params,
    /// Status the page should render with (`404` for the not-found page).
    pub status: StatusCode,
    pub engine: Option<Arc<dyn Engine>>,
    pub not_found: NotFound,
}

impl fmt::Debug for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("request", &self.request)
            .field("params", &self.params)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// A live page handling one request.
pub trait Page: Send + Sync + 'static {
    /// Handle the request. An `Err` is turned into a `500` unless a response
    /// was already written.
    fn handle(self: Arc<Self>) -> BoxFuture<'static, Result<(), PageError>>;
}

/// Builds pages and carries their routing metadata.
pub trait PageConstructor: Send + Sync + 'static {
    /// HTTP method served (case-insensitive).
    fn method(&self) -> &str;

    /// Path pattern served, e.g. `/user/:id`.
    fn path(&self) -> &str;

    fn construct(&self, ctx: PageContext) -> Arc<dyn Page>;
}

impl fmt::Debug for dyn PageConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageConstructor({} {})", self.method(), self.path())
    }
}
