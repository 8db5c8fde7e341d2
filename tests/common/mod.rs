//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use page_router::routing::{Matcher, Params, PatternCompiler, PatternError, SegmentCompiler};

/// Compiler whose matchers count `test` invocations.
#[derive(Debug, Default, Clone)]
pub struct CountingCompiler {
    pub tests: Arc<AtomicUsize>,
}

impl CountingCompiler {
    pub fn count(&self) -> usize {
        self.tests.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct CountingMatcher {
    inner: Arc<dyn Matcher>,
    tests: Arc<AtomicUsize>,
}

impl Matcher for CountingMatcher {
    fn test(&self, path: &str) -> bool {
        self.tests.fetch_add(1, Ordering::SeqCst);
        self.inner.test(path)
    }

    fn exec(&self, path: &str) -> Params {
        self.inner.exec(path)
    }
}

impl PatternCompiler for CountingCompiler {
    fn compile(&self, pattern: &str) -> Result<Arc<dyn Matcher>, PatternError> {
        Ok(Arc::new(CountingMatcher {
            inner: SegmentCompiler.compile(pattern)?,
            tests: self.tests.clone(),
        }))
    }
}

/// GET request with an optional session cookie.
#[allow(dead_code)]
pub fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(sid) = session {
        builder = builder.header("Cookie", format!("sid={}", sid));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
