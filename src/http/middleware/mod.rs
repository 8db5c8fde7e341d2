//! Middleware functions mounted on the host router.

pub mod dispatch;

pub use dispatch::page_dispatch_middleware;
