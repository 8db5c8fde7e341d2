//! Pages served by the binary.
//!
//! | handler   | route            | behaviour                                  |
//! |-----------|------------------|--------------------------------------------|
//! | `home`    | `GET /`          | plain-text banner                          |
//! | `user`    | `GET /user/:id`  | JSON for numeric ids, 404 state otherwise  |
//! | `fail`    | `GET /fail`      | reports an error (→ 500)                   |
//! | `missing` | `GET /404`       | not-found page                             |

use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use page_router::cache::InstanceKey;
use page_router::engine::Engine;
use page_router::page::{AttachError, PageCatalog};
use page_router::{page_fn, PageConstructor, PageError};

pub fn home() -> Arc<dyn PageConstructor> {
    page_fn("GET", "/", |ctx| async move {
        ctx.response
            .text(StatusCode::OK, concat!("page-router ", env!("CARGO_PKG_VERSION")));
        Ok(())
    })
}

pub fn user() -> Arc<dyn PageConstructor> {
    page_fn("GET", "/user/:id", |ctx| async move {
        let id = ctx.params.get("id").cloned().unwrap_or_default();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return ctx.not_found.render(ctx.request, ctx.response).await;
        }

        let body = serde_json::to_string(&serde_json::json!({ "id": id }))
            .map_err(|e| PageError::from(Box::new(e) as Box<dyn std::error::Error + Send + Sync>))?;
        let mut response = (StatusCode::OK, body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        ctx.response.send(response);
        Ok(())
    })
}

pub fn fail() -> Arc<dyn PageConstructor> {
    page_fn("GET", "/fail", |_ctx| async move {
        Err(PageError::msg("intentional failure"))
    })
}

pub fn missing() -> Arc<dyn PageConstructor> {
    page_fn("GET", "/404", |ctx| async move {
        let body = format!("Nothing lives at {}", ctx.request.pathname());
        ctx.response.text(ctx.status, body);
        Ok(())
    })
}

/// Every demo page under its handler name.
pub fn catalog() -> Result<PageCatalog, AttachError> {
    let mut catalog = PageCatalog::new();
    catalog.register("home", home())?;
    catalog.register("user", user())?;
    catalog.register("fail", fail())?;
    catalog.register("missing", missing())?;
    Ok(catalog)
}

/// Built-in page list, in match order.
pub fn pages() -> Vec<Arc<dyn PageConstructor>> {
    vec![home(), user(), fail()]
}

/// Engine stand-in that only logs page bindings.
#[derive(Debug, Default)]
pub struct LogEngine;

impl Engine for LogEngine {
    fn name(&self) -> &str {
        "log"
    }

    fn page_bound(&self, key: &InstanceKey) {
        tracing::debug!(instance = %key, "Page bound");
    }
}
