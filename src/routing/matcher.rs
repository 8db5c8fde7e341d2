//! Path matching seam.
//!
//! # Responsibilities
//! - Define the matcher contract used by the route table (`test` / `exec`)
//! - Define how patterns are turned into matchers (`PatternCompiler`)
//! - Provide the default segment-based implementation
//!
//! # Design Decisions
//! - Matchers are compiled once per descriptor and shared via `Arc`
//! - `&self` only: a matcher carries no per-call state, so concurrent
//!   requests can share one instance
//! - The compiler is a trait so hosts can plug in their own router

use std::sync::Arc;

use crate::routing::pattern::{Params, Pattern, PatternError};

/// Trait for matching request paths against a compiled pattern.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this pattern.
    fn test(&self, path: &str) -> bool;

    /// Extracts named parameters. Only meaningful after `test` returned true;
    /// returns an empty map otherwise.
    fn exec(&self, path: &str) -> Params;
}

impl Matcher for Pattern {
    fn test(&self, path: &str) -> bool {
        self.is_match(path)
    }

    fn exec(&self, path: &str) -> Params {
        self.captures(path).unwrap_or_default()
    }
}

/// Turns a pattern string into a matcher.
pub trait PatternCompiler: Send + Sync + std::fmt::Debug {
    fn compile(&self, pattern: &str) -> Result<Arc<dyn Matcher>, PatternError>;
}

/// Default compiler producing [`Pattern`] matchers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentCompiler;

impl PatternCompiler for SegmentCompiler {
    fn compile(&self, pattern: &str) -> Result<Arc<dyn Matcher>, PatternError> {
        Ok(Arc::new(Pattern::compile(pattern)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_round_trip() {
        let matcher = SegmentCompiler.compile("/user/:id").unwrap();

        assert!(matcher.test("/user/42"));
        let params = matcher.exec("/user/42");
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_exec_without_params() {
        let matcher = SegmentCompiler.compile("/about").unwrap();
        assert!(matcher.test("/about"));
        assert!(matcher.exec("/about").is_empty());
    }

    #[test]
    fn test_exec_on_mismatch_is_empty() {
        let matcher = SegmentCompiler.compile("/user/:id").unwrap();
        assert!(!matcher.test("/team/42"));
        assert!(matcher.exec("/team/42").is_empty());
    }

    #[test]
    fn test_compile_error_propagates() {
        assert!(SegmentCompiler.compile("no-slash").is_err());
    }
}
