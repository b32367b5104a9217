//! Errors raised during request processing and their translation.
//!
//! Every concrete error type a handler, extractor or service can raise lives
//! in one of the submodules. Handlers return [`Exception`], which any
//! `std::error::Error` converts into with `?`; the [`ExceptionFilter`] decides
//! which response the client sees.

use crate::exception::http::RestExceptionFilter;
use crate::interceptor::layer::active_filter;
use axum::response::{IntoResponse, Response};
use std::error::Error as StdError;
use std::fmt;
use validator::{ValidationErrors, ValidationErrorsKind};

pub mod domain;
pub mod http;
pub mod persistence;
pub mod web;

pub use domain::{EntityAlreadyExists, EntityNotFound};
pub use persistence::{ConstraintViolation, ConstraintViolations, TransactionSystem};
pub use web::{
    ConversionFailed, FieldError, InternalCallFailed, InvalidFormat, MediaTypeNotSupported,
    MessageNotReadable, MethodArgumentNotValid, MethodNotSupported, MissingParameter,
    NoHandlerFound, PathSegment, PropertyReference, TypeMismatch,
};

/// The ExceptionFilter trait
///
/// Filters handle errors thrown during request processing.
/// They must return a valid Response.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an exception and return a response
    fn catch(&self, error: &(dyn StdError + 'static)) -> Response;
}

/// Type-erased error raised while handling a request
///
/// ```
/// use rest_advice::exception::{EntityNotFound, Exception};
///
/// fn find_user(id: i64) -> Result<String, Exception> {
///     Err(EntityNotFound::with_id("User", id))?
/// }
///
/// let err = find_user(7).unwrap_err();
/// assert!(err.downcast_ref::<EntityNotFound>().is_some());
/// ```
pub struct Exception {
    inner: anyhow::Error,
}

impl Exception {
    /// Wrap an `anyhow` error raised by a service layer.
    pub fn new(error: anyhow::Error) -> Self {
        Self { inner: error }
    }

    /// An unclassified failure with only a message.
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self {
            inner: anyhow::Error::msg(message),
        }
    }

    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.inner
    }
}

impl<E> From<E> for Exception
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            inner: anyhow::Error::new(error),
        }
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

/// Translates with the filter of the enclosing
/// [`ExceptionLayer`](crate::interceptor::ExceptionLayer), or with the default
/// filter when the handler runs outside one. Either way the error is
/// translated, and logged, exactly once.
impl IntoResponse for Exception {
    fn into_response(self) -> Response {
        let error = self.as_error();
        active_filter(|filter| filter.catch(error))
            .unwrap_or_else(|| RestExceptionFilter::default().catch(error))
    }
}

/// Innermost error of a `source()` chain.
pub fn root_cause<'a>(error: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current
}

/// `my_app::model::User` -> `User`, `alloc::vec::Vec<u8>` -> `Vec`.
pub fn simple_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

/// A single failed constraint flattened out of a `validator` report.
pub(crate) struct FlatViolation {
    pub path: String,
    pub value: Option<serde_json::Value>,
    pub message: String,
}

/// Flatten nested struct and list errors into dotted property paths
/// (`address.city`, `items[0].name`), sorted by path.
pub(crate) fn flatten_validation(errors: &ValidationErrors) -> Vec<FlatViolation> {
    let mut flat = Vec::new();
    collect_violations(errors, "", &mut flat);
    flat.sort_by(|a, b| a.path.cmp(&b.path));
    flat
}

fn collect_violations(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FlatViolation>) {
    for (key, kind) in errors.errors() {
        let path = if *key == "__all__" {
            prefix.to_string()
        } else if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(FlatViolation {
                        path: path.clone(),
                        value: error.params.get("value").cloned(),
                        message: error
                            .message
                            .as_ref()
                            .map(|message| message.to_string())
                            .unwrap_or_else(|| format!("failed '{}' constraint", error.code)),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_violations(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}
