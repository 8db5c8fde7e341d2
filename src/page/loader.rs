//! Page loading at attach time.
//!
//! # Responsibilities
//! - Resolve a `PageSource` into an ordered list of descriptors
//! - Read a pages directory once (non-recursive) and parse its manifests
//! - Map manifest handler names to constructors via `PageCatalog`
//!
//! # Design Decisions
//! - Directory entries are loaded in file-name order, which fixes match
//!   precedence across runs
//! - Only `*.toml` files are manifests; other entries are skipped
//! - Any bad manifest aborts the whole load (no partial attach)
//!
//! # Manifest format
//! ```toml
//! handler = "user_profile"   # catalog name (required)
//! method = "GET"             # optional, overrides the constructor's
//! path = "/user/:id"         # optional, overrides the constructor's
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::page::{PageConstructor, PageDescriptor};
use crate::routing::{PatternCompiler, PatternError};

/// Attach-time configuration errors. All of them abort startup.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("the `pages` option is required")]
    MissingPages,

    #[error("failed to read pages directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed page manifest {path}: {reason}")]
    MalformedPage { path: PathBuf, reason: String },

    #[error("page handler `{0}` is not registered in the catalog")]
    UnknownHandler(String),

    #[error("page handler `{0}` is registered more than once")]
    DuplicateHandler(String),

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Where the pages come from.
pub enum PageSource {
    /// A directory of page manifests, resolved against a catalog.
    Directory { path: PathBuf, catalog: PageCatalog },
    /// An explicit, ordered list of constructors.
    List(Vec<Arc<dyn PageConstructor>>),
}

impl PageSource {
    pub fn directory(path: impl Into<PathBuf>, catalog: PageCatalog) -> Self {
        Self::Directory {
            path: path.into(),
            catalog,
        }
    }

    /// Resolve into descriptors, in match-precedence order.
    pub fn load(&self, compiler: &dyn PatternCompiler) -> Result<Vec<PageDescriptor>, AttachError> {
        match self {
            Self::List(ctors) => ctors
                .iter()
                .map(|ctor| PageDescriptor::new(ctor.clone(), compiler))
                .collect(),
            Self::Directory { path, catalog } => load_directory(path, catalog, compiler),
        }
    }
}

impl fmt::Debug for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory { path, catalog } => f
                .debug_struct("Directory")
                .field("path", path)
                .field("catalog", catalog)
                .finish(),
            Self::List(ctors) => f.debug_tuple("List").field(&ctors.len()).finish(),
        }
    }
}

/// Named page constructors that manifests can refer to.
#[derive(Default, Clone)]
pub struct PageCatalog {
    entries: HashMap<String, Arc<dyn PageConstructor>>,
}

impl PageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. Registering a name twice is a configuration error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        ctor: Arc<dyn PageConstructor>,
    ) -> Result<(), AttachError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(AttachError::DuplicateHandler(name));
        }
        self.entries.insert(name, ctor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PageConstructor>> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for PageCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("PageCatalog").field("handlers", &names).finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PageManifest {
    handler: String,
    method: Option<String>,
    path: Option<String>,
}

fn load_directory(
    dir: &Path,
    catalog: &PageCatalog,
    compiler: &dyn PatternCompiler,
) -> Result<Vec<PageDescriptor>, AttachError> {
    let dir_error = |source| AttachError::Directory {
        path: dir.to_path_buf(),
        source,
    };

    let mut manifests = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            manifests.push(path);
        } else {
            tracing::debug!(path = %path.display(), "Skipping non-manifest entry");
        }
    }
    manifests.sort();

    let descriptors = manifests
        .iter()
        .map(|path| load_manifest(path, catalog, compiler))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        directory = %dir.display(),
        pages = descriptors.len(),
        "Pages loaded from directory"
    );
    Ok(descriptors)
}

fn load_manifest(
    path: &Path,
    catalog: &PageCatalog,
    compiler: &dyn PatternCompiler,
) -> Result<PageDescriptor, AttachError> {
    let malformed = |reason: String| AttachError::MalformedPage {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    let manifest: PageManifest = toml::from_str(&content).map_err(|e| malformed(e.to_string()))?;

    let ctor = catalog
        .get(&manifest.handler)
        .ok_or_else(|| AttachError::UnknownHandler(manifest.handler.clone()))?;

    let method = manifest.method.as_deref().unwrap_or_else(|| ctor.method());
    let pattern = manifest.path.as_deref().unwrap_or_else(|| ctor.path());

    PageDescriptor::with_metadata(ctor.clone(), method, pattern, compiler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::page_fn;
    use crate::routing::SegmentCompiler;
    use axum::http::Method;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("page-router-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn catalog() -> PageCatalog {
        let mut catalog = PageCatalog::new();
        catalog
            .register("home", page_fn("GET", "/", |_| async { Ok(()) }))
            .unwrap();
        catalog
            .register("user", page_fn("GET", "/user/:id", |_| async { Ok(()) }))
            .unwrap();
        catalog
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut catalog = catalog();
        let err = catalog
            .register("home", page_fn("GET", "/home", |_| async { Ok(()) }))
            .unwrap_err();
        assert!(matches!(err, AttachError::DuplicateHandler(name) if name == "home"));
    }

    #[test]
    fn test_list_keeps_order() {
        let source = PageSource::List(vec![
            page_fn("GET", "/b", |_| async { Ok(()) }),
            page_fn("post", "/a", |_| async { Ok(()) }),
        ]);
        let descriptors = source.load(&SegmentCompiler).unwrap();

        assert_eq!(descriptors[0].pattern(), "/b");
        assert_eq!(descriptors[1].pattern(), "/a");
        assert_eq!(descriptors[1].method(), &Method::POST);
    }

    #[test]
    fn test_directory_load_sorted_and_non_recursive() {
        let dir = temp_dir();
        fs::write(dir.join("20-user.toml"), "handler = \"user\"\n").unwrap();
        fs::write(
            dir.join("10-home.toml"),
            "handler = \"home\"\npath = \"/index\"\n",
        )
        .unwrap();
        fs::write(dir.join("README.md"), "not a page").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("30-x.toml"), "handler = \"missing\"\n").unwrap();

        let source = PageSource::directory(&dir, catalog());
        let descriptors = source.load(&SegmentCompiler).unwrap();

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].pattern(), "/index");
        assert_eq!(descriptors[1].pattern(), "/user/:id");

        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_unknown_handler_fails() {
        let dir = temp_dir();
        fs::write(dir.join("page.toml"), "handler = \"nope\"\n").unwrap();

        let err = PageSource::directory(&dir, catalog())
            .load(&SegmentCompiler)
            .unwrap_err();
        assert!(matches!(err, AttachError::UnknownHandler(name) if name == "nope"));

        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_malformed_manifest_fails() {
        let dir = temp_dir();
        fs::write(dir.join("page.toml"), "handler = 42\n").unwrap();

        let err = PageSource::directory(&dir, catalog())
            .load(&SegmentCompiler)
            .unwrap_err();
        assert!(matches!(err, AttachError::MalformedPage { .. }));

        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_missing_directory_fails() {
        let err = PageSource::directory("/definitely/not/here", catalog())
            .load(&SegmentCompiler)
            .unwrap_err();
        assert!(matches!(err, AttachError::Directory { .. }));
    }
}
