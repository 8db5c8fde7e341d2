//! Registered pages.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::page::loader::AttachError;
use crate::page::PageConstructor;
use crate::routing::{Matcher, Params, PatternCompiler};

/// A page registered for a method and path pattern.
///
/// The matcher is compiled once here and reused for every request.
pub struct PageDescriptor {
    method: Method,
    pattern: String,
    matcher: Arc<dyn Matcher>,
    constructor: Arc<dyn PageConstructor>,
}

impl PageDescriptor {
    /// Build a descriptor from a constructor's own metadata.
    pub fn new(
        constructor: Arc<dyn PageConstructor>,
        compiler: &dyn PatternCompiler,
    ) -> Result<Self, AttachError> {
        let method = constructor.method().to_string();
        let pattern = constructor.path().to_string();
        Self::with_metadata(constructor, &method, &pattern, compiler)
    }

    /// Build a descriptor with method/path overriding the constructor's.
    pub fn with_metadata(
        constructor: Arc<dyn PageConstructor>,
        method: &str,
        pattern: &str,
        compiler: &dyn PatternCompiler,
    ) -> Result<Self, AttachError> {
        let method = parse_method(method)?;
        let matcher = compiler.compile(pattern)?;

        Ok(Self {
            method,
            pattern: pattern.to_string(),
            matcher,
            constructor,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn constructor(&self) -> &Arc<dyn PageConstructor> {
        &self.constructor
    }

    /// Method comparison is case-insensitive.
    pub fn accepts(&self, method: &Method) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method.as_str())
    }

    /// Match a request and extract parameters.
    pub fn resolve(&self, method: &Method, pathname: &str) -> Option<Params> {
        if self.accepts(method) && self.matcher.test(pathname) {
            Some(self.matcher.exec(pathname))
        } else {
            None
        }
    }
}

impl fmt::Debug for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDescriptor")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// Outcome of matching a request against the registered pages.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub descriptor: Arc<PageDescriptor>,
    pub params: Params,
}

fn parse_method(method: &str) -> Result<Method, AttachError> {
    let upper = method.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(AttachError::InvalidMethod(method.to_string()));
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| AttachError::InvalidMethod(method.to_string()))
}
