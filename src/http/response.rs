//! Response writing for pages.
//!
//! # Responsibilities
//! - Give each dispatched request exactly one response slot
//! - Turn page errors into `500` responses carrying the error message
//! - Hand the written response back to the waiting middleware
//!
//! # Design Decisions
//! - The slot is a `oneshot` sender behind a take-once guard, so the
//!   "respond at most once" rule is structural rather than checked by callers
//! - Writes after the first one are dropped and reported as `false`
//! - A page that never writes (or panics) still yields a `500`

use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::sync::oneshot;

use crate::observability::metrics;
use crate::page::PageError;

/// Body sent when a page task ends without writing a response.
pub const NO_RESPONSE_MESSAGE: &str = "page finished without writing a response";

/// Plain-text response with the given status.
pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Single-fire response slot shared by a page and the dispatcher.
#[derive(Clone, Debug)]
pub struct ResponseWriter {
    slot: Arc<Mutex<Option<oneshot::Sender<Response>>>>,
}

impl ResponseWriter {
    /// Create a writer and the future-side handle that awaits its response.
    pub fn channel() -> (Self, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            PendingResponse { rx },
        )
    }

    /// Send a response. Returns false if one was already written.
    pub fn send(&self, response: impl IntoResponse) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            // The receiver may be gone if the client disconnected; the slot is
            // still consumed.
            Some(tx) => {
                let _ = tx.send(response.into_response());
                true
            }
            None => false,
        }
    }

    /// Send a plain-text response.
    pub fn text(&self, status: StatusCode, body: impl Into<String>) -> bool {
        self.send(text_response(status, body))
    }

    /// Report a page error as a `500` with the error message as body.
    ///
    /// Only the first write for a request goes out; later reports return false.
    pub fn fail(&self, error: &PageError) -> bool {
        let written = self.text(StatusCode::INTERNAL_SERVER_ERROR, error.to_string());
        if written {
            metrics::record_page_error();
            tracing::warn!(error = %error, "Page reported an error");
        } else {
            tracing::debug!(error = %error, "Page error after response was written; dropped");
        }
        written
    }

    /// Whether a response has been written.
    pub fn is_sent(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// The dispatcher's side of a [`ResponseWriter`].
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Response>,
}

impl PendingResponse {
    /// Wait for the page to write its response.
    pub async fn wait(self) -> Response {
        match self.rx.await {
            Ok(response) => response,
            Err(_) => {
                tracing::error!("{}", NO_RESPONSE_MESSAGE);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, NO_RESPONSE_MESSAGE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_first_write_wins() {
        let (writer, pending) = ResponseWriter::channel();

        assert!(!writer.is_sent());
        assert!(writer.text(StatusCode::OK, "first"));
        assert!(writer.is_sent());
        assert!(!writer.text(StatusCode::OK, "second"));

        let response = pending.wait().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "first");
    }

    #[tokio::test]
    async fn test_error_written_once() {
        let (writer, pending) = ResponseWriter::channel();
        let reporter = writer.clone();

        assert!(reporter.fail(&PageError::msg("boom")));
        assert!(!reporter.fail(&PageError::msg("again")));

        let response = pending.wait().await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "boom");
    }

    #[tokio::test]
    async fn test_dropped_writer_yields_500() {
        let (writer, pending) = ResponseWriter::channel();
        drop(writer);

        let response = pending.wait().await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, NO_RESPONSE_MESSAGE);
    }
}
