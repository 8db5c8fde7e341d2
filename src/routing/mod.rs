//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at attach):
//!     "/user/:id"
//!     → pattern.rs (parse segments, reject malformed patterns)
//!     → matcher.rs (Matcher trait object, owned by the descriptor)
//!
//! Incoming Request (method, pathname)
//!     → router.rs (ordered scan of descriptors)
//!     → matcher.rs (test, then exec for params)
//!     → Return: ResolvedRoute or None
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once at attach, immutable at runtime
//! - No regex in the hot path (segment comparison only)
//! - Deterministic: same input always matches same page
//! - First match wins (registration order)

pub mod matcher;
pub mod pattern;
pub mod router;

pub use matcher::{Matcher, PatternCompiler, SegmentCompiler};
pub use pattern::{Params, Pattern, PatternError};
pub use router::RouteTable;
