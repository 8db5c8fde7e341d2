//! Pages built from async closures.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::page::{Page, PageConstructor, PageContext, PageError};

/// Build a constructor for `method path` whose pages run `f`.
///
/// ```ignore
/// let hello = page_fn("GET", "/hello/:name", |ctx| async move {
///     ctx.response.text(StatusCode::OK, format!("hello {}", ctx.params["name"]));
///     Ok(())
/// });
/// ```
pub fn page_fn<F, Fut>(method: &str, path: &str, f: F) -> Arc<dyn PageConstructor>
where
    F: Fn(PageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PageError>> + Send + 'static,
{
    Arc::new(FnConstructor {
        method: method.to_string(),
        path: path.to_string(),
        f,
    })
}

struct FnConstructor<F> {
    method: String,
    path: String,
    f: F,
}

impl<F, Fut> PageConstructor for FnConstructor<F>
where
    F: Fn(PageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PageError>> + Send + 'static,
{
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn construct(&self, ctx: PageContext) -> Arc<dyn Page> {
        Arc::new(FnPage {
            run: Mutex::new(Some((self.f)(ctx).boxed())),
        })
    }
}

/// A page whose work is a single future, run on the first `handle` call.
pub struct FnPage {
    run: Mutex<Option<BoxFuture<'static, Result<(), PageError>>>>,
}

impl Page for FnPage {
    fn handle(self: Arc<Self>) -> BoxFuture<'static, Result<(), PageError>> {
        let run = self
            .run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match run {
            Some(fut) => fut,
            None => async { Err(PageError::msg("page already handled")) }.boxed(),
        }
    }
}
