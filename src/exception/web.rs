//! Errors raised by the HTTP layer: routing, extraction, conversion.

use crate::exception::{flatten_validation, simple_name};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;
use validator::ValidationErrors;

type BoxError = Box<dyn StdError + Send + Sync>;

/// No route matched the request path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No handler found for {method} {path}")]
pub struct NoHandlerFound {
    pub method: String,
    pub path: String,
}

/// A required query or form parameter was absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Required request parameter '{name}' is not present")]
pub struct MissingParameter {
    pub name: String,
}

impl MissingParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The route exists but not for this HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Request method '{method}' is not supported")]
pub struct MethodNotSupported {
    pub method: String,
    pub path: String,
}

/// The request body has a content type the handler cannot read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Content type '{}' not supported", .content_type.as_deref().unwrap_or_default())]
pub struct MediaTypeNotSupported {
    pub content_type: Option<String>,
    pub supported: Vec<String>,
}

/// The request body could not be read or parsed.
///
/// When built with a cause, the message reads
/// `"<message>; nested exception is <cause>"`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MessageNotReadable {
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl MessageNotReadable {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl fmt::Display, cause: impl Into<BoxError>) -> Self {
        let cause = cause.into();
        Self {
            message: format!("{message}; nested exception is {cause}"),
            cause: Some(cause),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    Unknown,
}

impl PathSegment {
    pub fn from_path(path: &serde_path_to_error::Path) -> Vec<PathSegment> {
        path.iter()
            .map(|segment| match segment {
                serde_path_to_error::Segment::Seq { index } => PathSegment::Index(*index),
                serde_path_to_error::Segment::Map { key } => PathSegment::Field(key.clone()),
                serde_path_to_error::Segment::Enum { variant } => {
                    PathSegment::Field(variant.clone())
                }
                _ => PathSegment::Unknown,
            })
            .collect()
    }
}

fn render_path(path: &[PathSegment]) -> String {
    let mut rendered = String::new();
    for segment in path {
        match segment {
            PathSegment::Field(name) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(name);
            }
            PathSegment::Index(index) => rendered.push_str(&format!("[{index}]")),
            PathSegment::Unknown => rendered.push('?'),
        }
    }
    rendered
}

/// A JSON value had the wrong shape for its target field.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidFormat {
    target_type: String,
    path: Vec<PathSegment>,
    value: Option<Value>,
    original_message: String,
}

impl InvalidFormat {
    pub fn new(target_type: impl Into<String>, original_message: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            path: Vec::new(),
            value: None,
            original_message: original_message.into(),
        }
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    pub fn with_value(mut self, value: Option<Value>) -> Self {
        self.value = value;
        self
    }

    /// Fully qualified name of the type being deserialized.
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Field name of the first path segment, if it names a field.
    pub fn field_name(&self) -> Option<&str> {
        match self.path.first() {
            Some(PathSegment::Field(name)) => Some(name),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn original_message(&self) -> &str {
        &self.original_message
    }
}

impl fmt::Display for InvalidFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.original_message)
        } else {
            write!(f, "{}: {}", render_path(&self.path), self.original_message)
        }
    }
}

impl StdError for InvalidFormat {}

/// One failed field of a validated request argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub rejected_value: Option<Value>,
    pub default_message: Option<String>,
}

/// Declarative validation of a handler argument failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Validation failed for argument of type {target} with {} errors", .field_errors.len())]
pub struct MethodArgumentNotValid {
    target: String,
    field_errors: Vec<FieldError>,
}

impl MethodArgumentNotValid {
    pub fn new(target: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            target: target.into(),
            field_errors,
        }
    }

    /// Field errors of `T` in path order.
    pub fn from_validation<T: ?Sized>(errors: &ValidationErrors) -> Self {
        let field_errors = flatten_validation(errors)
            .into_iter()
            .map(|violation| FieldError {
                field: violation.path,
                rejected_value: violation.value,
                default_message: Some(violation.message),
            })
            .collect();
        Self::new(simple_name(std::any::type_name::<T>()), field_errors)
    }

    /// Simple name of the validated type.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }
}

/// A handler argument could not be converted to its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub name: String,
    pub value: Option<String>,
    pub required_type: Option<String>,
}

impl TypeMismatch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            required_type: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_required_type(mut self, required_type: impl Into<String>) -> Self {
        self.required_type = Some(required_type.into());
        self
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to convert parameter '{}'", self.name)?;
        if let Some(value) = &self.value {
            write!(f, " with value '{value}'")?;
        }
        if let Some(required_type) = &self.required_type {
            write!(f, " to required type '{required_type}'")?;
        }
        Ok(())
    }
}

impl StdError for TypeMismatch {}

/// A sort or filter expression referenced an unknown property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No property '{property}' found for type '{type_name}'")]
pub struct PropertyReference {
    pub property: String,
    pub type_name: String,
}

/// A value conversion between two types failed.
#[derive(Debug, Error)]
#[error("Failed to convert from type [{source_type}] to type [{target_type}] for value '{value}'")]
pub struct ConversionFailed {
    pub source_type: String,
    pub target_type: String,
    pub value: String,
    #[source]
    cause: Option<BoxError>,
}

impl ConversionFailed {
    pub fn new<S: ?Sized, T: ?Sized>(value: impl fmt::Display) -> Self {
        Self {
            source_type: std::any::type_name::<S>().to_string(),
            target_type: std::any::type_name::<T>().to_string(),
            value: value.to_string(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// A call to another service failed while handling the request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Internal call {method} {url} failed with status {status}")]
pub struct InternalCallFailed {
    pub status: u16,
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_readable_message_with_cause() {
        let cause = serde_json::from_str::<Value>("{").unwrap_err();
        let error = MessageNotReadable::with_cause("JSON parse error", cause);
        assert!(
            error
                .message()
                .starts_with("JSON parse error; nested exception is EOF")
        );
        assert!(
            error
                .cause()
                .and_then(|cause| cause.downcast_ref::<serde_json::Error>())
                .is_some()
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_invalid_format_field_name() {
        let error = InvalidFormat::new("app::User", "invalid type: string \"x\", expected u32")
            .with_path(vec![
                PathSegment::Field("address".to_string()),
                PathSegment::Field("zip".to_string()),
            ]);
        assert_eq!(error.field_name(), Some("address"));
        assert_eq!(
            error.to_string(),
            "address.zip: invalid type: string \"x\", expected u32"
        );

        let top_level_array = InvalidFormat::new("Vec<u32>", "bad")
            .with_path(vec![PathSegment::Index(3)]);
        assert_eq!(top_level_array.field_name(), None);
        assert_eq!(top_level_array.to_string(), "[3]: bad");
    }

    #[test]
    fn test_type_mismatch_display() {
        let full = TypeMismatch::new("id")
            .with_value("abc")
            .with_required_type("u64");
        assert_eq!(
            full.to_string(),
            "Failed to convert parameter 'id' with value 'abc' to required type 'u64'"
        );
        assert_eq!(
            TypeMismatch::new("id").to_string(),
            "Failed to convert parameter 'id'"
        );
    }

    #[test]
    fn test_media_type_display() {
        let missing = MediaTypeNotSupported {
            content_type: None,
            supported: vec!["application/json".to_string()],
        };
        assert_eq!(missing.to_string(), "Content type '' not supported");
    }

    #[test]
    fn test_conversion_failed_names_types() {
        let error = ConversionFailed::new::<str, u32>("abc");
        assert_eq!(
            error.to_string(),
            "Failed to convert from type [str] to type [u32] for value 'abc'"
        );
    }
}
