//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout + trace layers)
//!     → middleware/dispatch.rs (page dispatch middleware)
//!     → dispatcher.rs (route cache, scan, instantiate, register)
//!         ├─ page task → response.rs (single-fire writer) → client
//!         └─ no match  → next handler (host routes / fallback)
//! ```

pub mod dispatcher;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{AttachOptions, Dispatch, Dispatcher};
pub use request::{PageRequest, SessionId, X_REQUEST_ID};
pub use response::{PendingResponse, ResponseWriter};
pub use server::PageServer;
