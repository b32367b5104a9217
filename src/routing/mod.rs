//! Router fallbacks that raise the "no route" exceptions.

use crate::exception::{Exception, ExceptionFilter, MethodNotSupported, NoHandlerFound};
use crate::interceptor::ExceptionLayer;
use axum::Router;
use axum::extract::OriginalUri;
use axum::http::Method;

/// Fallback for paths no route matches.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> Exception {
    NoHandlerFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
    .into()
}

/// Fallback for routes that exist but not for this method.
pub async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> Exception {
    MethodNotSupported {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
    .into()
}

pub trait RouterExt<S> {
    /// Install both fallbacks and an [`ExceptionLayer`] using `filter`.
    ///
    /// Call this last so the layer wraps every route.
    fn with_exception_handling<F: ExceptionFilter>(self, filter: F) -> Self;
}

impl<S> RouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_exception_handling<F: ExceptionFilter>(self, filter: F) -> Self {
        self.fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .layer(ExceptionLayer::new(filter))
    }
}
