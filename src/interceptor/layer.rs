use crate::exception::ExceptionFilter;
use crate::exception::http::RestExceptionFilter;
use axum::{body::Body, http::Request, response::Response};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};
use tracing::Instrument;

tokio::task_local! {
    static ACTIVE_FILTER: Arc<dyn ExceptionFilter>;
}

/// Run `f` with the filter of the innermost enclosing [`ExceptionLayer`].
///
/// Returns `None` outside of any layer.
pub(crate) fn active_filter<R>(f: impl FnOnce(&dyn ExceptionFilter) -> R) -> Option<R> {
    ACTIVE_FILTER.try_with(|filter| f(filter.as_ref())).ok()
}

/// Tower Layer translating handler failures with a shared [`ExceptionFilter`]
///
/// Handlers inside the layer that fail with an
/// [`Exception`](crate::exception::Exception) are translated by this layer's
/// filter. Responses that are already built, including the plain-text
/// rejections of axum's own extractors, pass through untouched; use the
/// extractors in [`crate::extract`], or take axum's as
/// `Result<axum::Json<T>, JsonRejection>` and `?` the rejection.
#[derive(Clone)]
pub struct ExceptionLayer {
    filter: Arc<dyn ExceptionFilter>,
}

impl ExceptionLayer {
    pub fn new<F: ExceptionFilter>(filter: F) -> Self {
        Self {
            filter: Arc::new(filter),
        }
    }

    pub fn from_shared(filter: Arc<dyn ExceptionFilter>) -> Self {
        Self { filter }
    }
}

impl Default for ExceptionLayer {
    fn default() -> Self {
        Self::new(RestExceptionFilter::default())
    }
}

impl<S> Layer<S> for ExceptionLayer {
    type Service = ExceptionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionMiddleware {
            inner,
            filter: self.filter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ExceptionMiddleware<S> {
    inner: S,
    filter: Arc<dyn ExceptionFilter>,
}

impl<S> Service<Request<Body>> for ExceptionMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner service is awaited per call on the clone.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let filter = self.filter.clone();
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        let span = tracing::debug_span!(
            "exception_boundary",
            method = %request.method(),
            path = %request.uri().path(),
        );

        let scoped = filter.clone();
        Box::pin(
            ACTIVE_FILTER
                .scope(scoped, async move {
                    match inner.oneshot(request).await {
                        Ok(response) => Ok(response),
                        Err(error) => {
                            let error: Box<dyn StdError + Send + Sync> = error.into();
                            Ok(filter.catch(&*error))
                        }
                    }
                })
                .instrument(span),
        )
    }
}
