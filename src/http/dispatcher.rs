//! Request dispatch to pages.
//!
//! # Responsibilities
//! - Attach: load pages, compile matchers, build the caches (fail fast)
//! - Resolve each request through the route cache, falling back to a scan
//! - Instantiate the page, register it per session, and start it
//! - Forward requests no page claims
//!
//! # Request States
//! ```text
//! START → CACHE_LOOKUP ─ hit ──────────────→ INSTANTIATE → DISPATCHED
//!                      └ miss → SCAN ─ match → (remember) ┘
//!                                    └ no match ─────────→ FORWARDED
//! ```
//!
//! # Design Decisions
//! - `dispatch` is synchronous up to registration; the page then runs on its
//!   own task and the caller only awaits the response slot
//! - Page failures (error, panic, no response) become a `500` for that
//!   request only; caches are never touched on failure
//! - No match means forward, never a 404 written here

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::FutureExt;
use tracing::Instrument;

use crate::cache::{
    Clock, InstanceRegistry, RouteCache, RouteKey, Sweep, SystemClock, DEFAULT_TTL,
};
use crate::engine::Engine;
use crate::http::request::{request_id, PageRequest, SessionId};
use crate::http::response::{PendingResponse, ResponseWriter, NO_RESPONSE_MESSAGE};
use crate::observability::metrics;
use crate::page::loader::AttachError;
use crate::page::{NotFound, Page, PageConstructor, PageContext, PageSource};
use crate::routing::{PatternCompiler, RouteTable, SegmentCompiler};

/// Cookie consulted for the session id when no `SessionId` extension is set.
pub const DEFAULT_SESSION_COOKIE: &str = "sid";

/// Options accepted by [`Dispatcher::attach`].
pub struct AttachOptions {
    pub engine: Option<Arc<dyn Engine>>,
    pub pages: Option<PageSource>,
    pub not_found: Option<Arc<dyn PageConstructor>>,
    pub compiler: Arc<dyn PatternCompiler>,
    pub cache_ttl: Duration,
    pub clock: Arc<dyn Clock>,
    pub session_cookie: String,
}

impl AttachOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(mut self, pages: PageSource) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn not_found(mut self, page: Arc<dyn PageConstructor>) -> Self {
        self.not_found = Some(page);
        self
    }

    pub fn compiler(mut self, compiler: Arc<dyn PatternCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }
}

impl Default for AttachOptions {
    fn default() -> Self {
        Self {
            engine: None,
            pages: None,
            not_found: None,
            compiler: Arc::new(SegmentCompiler),
            cache_ttl: DEFAULT_TTL,
            clock: Arc::new(SystemClock),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }
}

impl fmt::Debug for AttachOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachOptions")
            .field("engine", &self.engine)
            .field("pages", &self.pages)
            .field("not_found", &self.not_found.is_some())
            .field("cache_ttl", &self.cache_ttl)
            .field("session_cookie", &self.session_cookie)
            .finish_non_exhaustive()
    }
}

/// What `dispatch` did with a request.
pub enum Dispatch {
    /// A page took the request; await its response.
    Page(PendingResponse),
    /// No page matched; hand the request to the next handler untouched.
    Forward(Request<Body>),
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(_) => f.write_str("Dispatch::Page"),
            Self::Forward(req) => write!(f, "Dispatch::Forward({} {})", req.method(), req.uri()),
        }
    }
}

/// The page dispatcher. Owns the route table and both caches.
pub struct Dispatcher {
    table: RouteTable,
    route_cache: Arc<RouteCache>,
    instances: Arc<InstanceRegistry>,
    engine: Option<Arc<dyn Engine>>,
    not_found: NotFound,
    session_cookie: String,
}

impl Dispatcher {
    /// Load every page and build the caches. Any error aborts the attach.
    pub fn attach(options: AttachOptions) -> Result<Self, AttachError> {
        let source = options.pages.ok_or(AttachError::MissingPages)?;
        let descriptors = source.load(options.compiler.as_ref())?;

        // The not-found page's own metadata must be valid too.
        if let Some(page) = &options.not_found {
            crate::page::PageDescriptor::new(page.clone(), options.compiler.as_ref())?;
        }

        let table = RouteTable::new(descriptors);
        tracing::info!(
            pages = table.len(),
            cache_ttl_secs = options.cache_ttl.as_secs(),
            engine = options.engine.as_ref().map(|e| e.name()),
            not_found = options.not_found.is_some(),
            "Page dispatcher attached"
        );

        Ok(Self {
            table,
            route_cache: Arc::new(RouteCache::with_clock(options.cache_ttl, options.clock.clone())),
            instances: Arc::new(InstanceRegistry::with_clock(options.cache_ttl, options.clock)),
            not_found: NotFound::new(options.not_found, options.engine.clone()),
            engine: options.engine,
            session_cookie: options.session_cookie,
        })
    }

    pub fn route_cache(&self) -> &RouteCache {
        &self.route_cache
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Caches for the background sweeper.
    pub fn caches(&self) -> Vec<Arc<dyn Sweep>> {
        vec![
            self.route_cache.clone() as Arc<dyn Sweep>,
            self.instances.clone() as Arc<dyn Sweep>,
        ]
    }

    /// Route a request to a page or hand it back for forwarding.
    ///
    /// Must be called within a Tokio runtime: the page is spawned onto it.
    pub fn dispatch(&self, request: Request<Body>) -> Dispatch {
        let method = request.method().clone();
        let pathname = request.uri().path().to_string();
        let key = RouteKey::new(&method, &pathname);

        let resolved = match self.route_cache.lookup_key(&key) {
            Some(hit) => {
                metrics::record_route_lookup("hit");
                hit
            }
            None => {
                metrics::record_route_lookup("miss");
                match self.table.resolve(&method, &pathname) {
                    Some(found) => {
                        self.route_cache.remember_key(key.clone(), found.clone());
                        found
                    }
                    None => {
                        tracing::debug!(method = %method, path = %pathname, "No page matched; forwarding");
                        metrics::record_dispatch("forwarded");
                        return Dispatch::Forward(request);
                    }
                }
            }
        };

        let session = SessionId::from_request(&request, &self.session_cookie);
        let span = tracing::debug_span!(
            "page",
            request_id = %request_id(&request),
            route = %key,
            session = %session,
        );
        let _entered = span.enter();

        let (writer, pending) = ResponseWriter::channel();
        let ctx = PageContext {
            request: PageRequest::new(request),
            response: writer.clone(),
            params: resolved.params,
            status: StatusCode::OK,
            engine: self.engine.clone(),
            not_found: self.not_found.clone(),
        };

        let page = resolved.descriptor.constructor().construct(ctx);
        let instance_key = self.instances.bind(&session, &key, page.clone());
        if let Some(engine) = &self.engine {
            engine.page_bound(&instance_key);
        }

        tracing::debug!(pattern = %resolved.descriptor.pattern(), "Dispatching to page");
        metrics::record_dispatch("dispatched");
        tokio::spawn(run_page(page, writer).instrument(span.clone()));

        Dispatch::Page(pending)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .field("route_cache", &self.route_cache)
            .field("instances", &self.instances)
            .field("engine", &self.engine)
            .field("session_cookie", &self.session_cookie)
            .finish_non_exhaustive()
    }
}

/// Drive a page to completion, routing its error into the response slot.
///
/// The page may keep its own writer clone alive (it stays in the instance
/// registry), so an unwritten slot is closed here rather than on drop.
async fn run_page(page: Arc<dyn Page>, writer: ResponseWriter) {
    let outcome = AssertUnwindSafe(async move { page.handle().await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            writer.fail(&err);
        }
        Err(_) => tracing::error!("Page task panicked"),
    }

    if writer.text(StatusCode::INTERNAL_SERVER_ERROR, NO_RESPONSE_MESSAGE) {
        metrics::record_page_error();
        tracing::error!("{}", NO_RESPONSE_MESSAGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::page_fn;

    #[test]
    fn test_attach_requires_pages() {
        let err = Dispatcher::attach(AttachOptions::new()).unwrap_err();
        assert!(matches!(err, AttachError::MissingPages));
    }

    #[test]
    fn test_attach_rejects_bad_pattern() {
        let options = AttachOptions::new().pages(PageSource::List(vec![
            page_fn("GET", "/ok", |_| async { Ok(()) }),
            page_fn("GET", "/bad/:", |_| async { Ok(()) }),
        ]));
        let err = Dispatcher::attach(options).unwrap_err();
        assert!(matches!(err, AttachError::Pattern(_)));
    }

    #[test]
    fn test_attach_rejects_bad_not_found_metadata() {
        let options = AttachOptions::new()
            .pages(PageSource::List(Vec::new()))
            .not_found(page_fn("NOT A METHOD", "/404", |_| async { Ok(()) }));
        assert!(matches!(
            Dispatcher::attach(options),
            Err(AttachError::InvalidMethod(_))
        ));
    }

    #[tokio::test]
    async fn test_unmatched_request_is_forwarded_untouched() {
        let dispatcher = Dispatcher::attach(
            AttachOptions::new().pages(PageSource::List(vec![page_fn("GET", "/a", |_| async {
                Ok(())
            })])),
        )
        .unwrap();

        let req = Request::builder()
            .uri("/b?x=1")
            .header("x-marker", "kept")
            .body(Body::empty())
            .unwrap();

        match dispatcher.dispatch(req) {
            Dispatch::Forward(req) => {
                assert_eq!(req.uri(), "/b?x=1");
                assert_eq!(req.headers()["x-marker"], "kept");
            }
            other => panic!("expected forward, got {:?}", other),
        }
        assert!(dispatcher.route_cache().is_empty());
        assert!(dispatcher.instances().is_empty());
    }

    #[tokio::test]
    async fn test_query_string_not_part_of_route_key() {
        let dispatcher = Dispatcher::attach(AttachOptions::new().pages(PageSource::List(vec![
            page_fn("GET", "/search", |ctx| async move {
                ctx.response.text(StatusCode::OK, "ok");
                Ok(())
            }),
        ])))
        .unwrap();

        for uri in ["/search?q=a", "/search?q=b"] {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            match dispatcher.dispatch(req) {
                Dispatch::Page(pending) => assert_eq!(pending.wait().await.status(), StatusCode::OK),
                other => panic!("expected page, got {:?}", other),
            }
        }
        assert_eq!(dispatcher.route_cache().len(), 1);
        assert!(dispatcher.route_cache().lookup(&axum::http::Method::GET, "/search").is_some());
    }

    struct Lingering {
        _response: ResponseWriter,
        panics: bool,
    }

    impl Page for Lingering {
        fn handle(self: Arc<Self>) -> futures_util::future::BoxFuture<'static, Result<(), crate::page::PageError>> {
            async move {
                if self.panics {
                    panic!("lingering page bug");
                }
                Ok(())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_run_page_closes_slot_held_by_page() {
        for panics in [false, true] {
            let (writer, pending) = ResponseWriter::channel();
            let page: Arc<dyn Page> = Arc::new(Lingering {
                _response: writer.clone(),
                panics,
            });
            let _registered = page.clone();

            run_page(page, writer).await;

            let response = tokio::time::timeout(Duration::from_secs(1), pending.wait())
                .await
                .expect("slot left open");
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
