//! Request-side types handed to pages.
//!
//! # Responsibilities
//! - Wrap the host's parsed request so page instances can be shared (`Sync`)
//! - Resolve the session a request belongs to
//! - Resolve the request ID used for log correlation
//!
//! # Design Decisions
//! - Session sources, in order: `SessionId` extension set by an upstream
//!   layer, the configured session cookie, then the anonymous sentinel
//! - A missing session is never an error

use std::fmt;
use std::sync::Mutex;

use axum::body::Body;
use axum::http::{request::Parts, HeaderMap, Method, Request, Uri};
use uuid::Uuid;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Session identifier attached to a request.
///
/// An upstream session layer may insert this as a request extension; it takes
/// precedence over the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Sentinel used when a request carries no session.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Create a session id; empty values collapse to the sentinel.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::anonymous()
        } else {
            Self(id)
        }
    }

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the session for a request.
    pub fn from_request<B>(request: &Request<B>, cookie_name: &str) -> Self {
        if let Some(id) = request.extensions().get::<SessionId>() {
            return id.clone();
        }

        cookie_value(request.headers(), cookie_name)
            .map(Self::new)
            .unwrap_or_else(Self::anonymous)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find a cookie by name across all `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"'))
}

/// Request ID from the incoming header, or a fresh UUID v4.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// The request as seen by a page.
///
/// The body can be taken once; the head stays available.
pub struct PageRequest {
    parts: Parts,
    body: Mutex<Option<Body>>,
}

impl PageRequest {
    pub fn new(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body: Mutex::new(Some(body)),
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Path without the query string.
    pub fn pathname(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Take the body. Returns `None` once taken.
    pub fn take_body(&self) -> Option<Body> {
        self.body
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

impl fmt::Debug for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRequest")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .finish_non_exhaustive()
    }
}
