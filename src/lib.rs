//! # rest-advice
//!
//! Centralized exception-to-HTTP-response translation for axum REST services.
//!
//! Every failure raised while handling a request, whether from routing, body
//! parsing, validation, persistence or a plain domain error, is translated
//! into one uniform JSON error body:
//!
//! ```json
//! {
//!   "status": "NOT_FOUND",
//!   "timestamp": "14:05 2024/03/01",
//!   "message": "User with id [42] not found",
//!   "subErrors": []
//! }
//! ```
//!
//! ## Features
//!
//! - **Uniform error body**: [`ErrorResponse`] with optional debug message and
//!   validation / internal-call sub-errors
//! - **Exception filter**: [`RestExceptionFilter`] maps each known error type to
//!   a status and message, most specific type first, with user-registered
//!   handlers taking priority
//! - **Tower layer**: [`ExceptionLayer`] makes handler failures translate with
//!   the configured filter
//! - **Extractors and pipes** that fail with translatable errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rest_advice::prelude::*;
//!
//! async fn get_user(Path(id): Path<i64>) -> Result<String, Exception> {
//!     Err(EntityNotFound::with_id("User", id).into())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let filter = RestExceptionFilter::new(FilterConfig::from_env().unwrap_or_default());
//!
//!     let app = Router::new()
//!         .route("/users/{id}", get(get_user))
//!         .with_exception_handling(filter);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod exception;
pub mod extract;
pub mod interceptor;
pub mod pipe;
pub mod routing;

// Re-export core types
pub use common::{ErrorResponse, HttpStatus, SubError};
pub use config::{ConfigService, FilterConfig};
pub use error::{AdviceError, Result};
pub use exception::http::RestExceptionFilter;
pub use exception::{Exception, ExceptionFilter};
pub use interceptor::ExceptionLayer;
pub use routing::RouterExt;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use rest_advice::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{
        ErrorResponse, HttpStatus, InternalCallSubError, SubError, ValidationSubError,
    };
    pub use crate::config::{ConfigService, FilterConfig};
    pub use crate::error::AdviceError;
    pub use crate::exception::http::RestExceptionFilter;
    pub use crate::exception::*;
    pub use crate::extract::{Json, Path, Query, Valid};
    pub use crate::interceptor::ExceptionLayer;
    pub use crate::pipe::builtins::*;
    pub use crate::pipe::{Pipe, PipeResult};
    pub use crate::routing::RouterExt;
    pub use async_trait::async_trait;
    pub use axum::{
        Router,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{delete, get, patch, post, put},
    };
    pub use std::sync::Arc;
}
