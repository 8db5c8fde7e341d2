//! Not-found rendering for pages.
//!
//! Unmatched requests are forwarded, never answered here. This handle is for
//! pages that decide on their own that the resource is missing (e.g. an
//! unknown user id): it runs the configured not-found page with empty params
//! and status `404`, or writes a plain-text `Not Found`.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::engine::Engine;
use crate::http::request::PageRequest;
use crate::http::response::ResponseWriter;
use crate::page::{PageConstructor, PageContext, PageError};
use crate::routing::Params;

/// Body written when no not-found page is configured.
pub const NOT_FOUND_BODY: &str = "Not Found";

#[derive(Clone, Default)]
pub struct NotFound {
    page: Option<Arc<dyn PageConstructor>>,
    engine: Option<Arc<dyn Engine>>,
}

impl NotFound {
    pub fn new(page: Option<Arc<dyn PageConstructor>>, engine: Option<Arc<dyn Engine>>) -> Self {
        Self { page, engine }
    }

    pub fn is_configured(&self) -> bool {
        self.page.is_some()
    }

    /// Render the 404 state into `response`.
    ///
    /// Errors from the not-found page go through the same single-fire writer.
    pub async fn render(
        &self,
        request: PageRequest,
        response: ResponseWriter,
    ) -> Result<(), PageError> {
        let Some(ctor) = &self.page else {
            response.text(StatusCode::NOT_FOUND, NOT_FOUND_BODY);
            return Ok(());
        };

        let ctx = PageContext {
            request,
            response: response.clone(),
            params: Params::new(),
            status: StatusCode::NOT_FOUND,
            engine: self.engine.clone(),
            // The not-found page rendering itself falls back to the plain body.
            not_found: NotFound::new(None, self.engine.clone()),
        };

        tracing::debug!(page = ?ctor, "Rendering not-found page");
        if let Err(err) = ctor.construct(ctx).handle().await {
            response.fail(&err);
        }
        Ok(())
    }
}

impl fmt::Debug for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotFound")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::page_fn;
    use axum::body::Body;
    use axum::http::Request;

    async fn render(not_found: &NotFound) -> axum::response::Response {
        let (writer, pending) = ResponseWriter::channel();
        let request = PageRequest::new(Request::builder().uri("/x").body(Body::empty()).unwrap());
        not_found.render(request, writer).await.unwrap();
        pending.wait().await
    }

    #[tokio::test]
    async fn test_fallback_body() {
        let response = render(&NotFound::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], NOT_FOUND_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_configured_page_gets_404_and_empty_params() {
        let page = page_fn("GET", "/404", |ctx| async move {
            let body = format!("missing ({} params)", ctx.params.len());
            ctx.response.text(ctx.status, body);
            Ok(())
        });
        let response = render(&NotFound::new(Some(page), None)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"missing (0 params)");
    }
}
