//! Route lookup over the registered pages.
//!
//! # Responsibilities
//! - Store descriptors in registration order
//! - Find the first descriptor accepting a method and path
//! - Flag descriptors that can never be reached
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - O(n) scan with short-circuit; memoization lives in the route cache
//! - Explicit `None` on no match; the caller decides to forward

use std::sync::Arc;

use axum::http::Method;

use crate::page::{PageDescriptor, ResolvedRoute};

/// Ordered, immutable set of page descriptors.
#[derive(Debug, Default)]
pub struct RouteTable {
    descriptors: Vec<Arc<PageDescriptor>>,
}

impl RouteTable {
    /// Build a table; earlier descriptors take precedence.
    pub fn new(descriptors: Vec<PageDescriptor>) -> Self {
        let descriptors: Vec<_> = descriptors.into_iter().map(Arc::new).collect();

        for (i, later) in descriptors.iter().enumerate() {
            let shadowed_by = descriptors[..i].iter().find(|earlier| {
                earlier.accepts(later.method()) && earlier.pattern() == later.pattern()
            });
            if let Some(earlier) = shadowed_by {
                tracing::warn!(
                    method = %later.method(),
                    pattern = %later.pattern(),
                    first = ?earlier.constructor(),
                    "Duplicate page registration; the later page is unreachable"
                );
            }
        }

        Self { descriptors }
    }

    /// First descriptor (in registration order) matching the request.
    pub fn resolve(&self, method: &Method, pathname: &str) -> Option<ResolvedRoute> {
        self.descriptors.iter().find_map(|descriptor| {
            descriptor
                .resolve(method, pathname)
                .map(|params| ResolvedRoute {
                    descriptor: descriptor.clone(),
                    params,
                })
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[Arc<PageDescriptor>] {
        &self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{page_fn, PageConstructor};
    use crate::routing::SegmentCompiler;

    fn descriptor(ctor: Arc<dyn PageConstructor>) -> PageDescriptor {
        PageDescriptor::new(ctor, &SegmentCompiler).unwrap()
    }

    #[test]
    fn test_first_registered_wins() {
        let specific = page_fn("GET", "/user/me", |_| async { Ok(()) });
        let generic = page_fn("GET", "/user/:id", |_| async { Ok(()) });
        let table = RouteTable::new(vec![descriptor(specific.clone()), descriptor(generic.clone())]);

        for _ in 0..3 {
            let hit = table.resolve(&Method::GET, "/user/me").unwrap();
            assert!(Arc::ptr_eq(hit.descriptor.constructor(), &specific));
            assert!(hit.params.is_empty());
        }

        let hit = table.resolve(&Method::GET, "/user/42").unwrap();
        assert!(Arc::ptr_eq(hit.descriptor.constructor(), &generic));
        assert_eq!(hit.params["id"], "42");
    }

    #[test]
    fn test_method_must_match() {
        let table = RouteTable::new(vec![descriptor(page_fn("POST", "/login", |_| async {
            Ok(())
        }))]);

        assert!(table.resolve(&Method::GET, "/login").is_none());
        assert!(table.resolve(&Method::POST, "/login").is_some());
    }

    #[test]
    fn test_duplicates_are_unreachable() {
        let first = page_fn("GET", "/a", |_| async { Ok(()) });
        let second = page_fn("get", "/a", |_| async { Ok(()) });
        let table = RouteTable::new(vec![descriptor(first.clone()), descriptor(second)]);

        assert_eq!(table.len(), 2);
        let hit = table.resolve(&Method::GET, "/a").unwrap();
        assert!(Arc::ptr_eq(hit.descriptor.constructor(), &first));
    }

    #[test]
    fn test_no_match() {
        let table = RouteTable::default();
        assert!(table.is_empty());
        assert!(table.resolve(&Method::GET, "/").is_none());
    }
}
