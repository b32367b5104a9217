//! Tower middleware that routes every failure through an exception filter.
//!
//! Handlers return [`Exception`](crate::exception::Exception) (or anything
//! convertible into it); the [`ExceptionLayer`] makes sure the configured
//! [`ExceptionFilter`](crate::exception::ExceptionFilter) has the final say on
//! the response body.

pub mod layer;

pub use layer::{ExceptionLayer, ExceptionMiddleware};
