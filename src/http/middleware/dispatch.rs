//! Page dispatch middleware.
//! Hands matched requests to pages; everything else continues down the chain.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::dispatcher::{Dispatch, Dispatcher};

/// Mount with `axum::middleware::from_fn_with_state(dispatcher, page_dispatch_middleware)`.
pub async fn page_dispatch_middleware(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match dispatcher.dispatch(request) {
        Dispatch::Page(pending) => pending.wait().await,
        Dispatch::Forward(request) => next.run(request).await,
    }
}
