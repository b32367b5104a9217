use crate::common::HttpStatus;
use crate::exception::domain::{already_exists_message, doesnt_contain_message, not_found_message};
use axum::{
    Json,
    http::StatusCode as HttpStatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::Display;

/// Uniform error body returned for every failed request
///
/// One instance is built per caught error, serialized, and dropped.
///
/// # Example
/// ```
/// use rest_advice::common::{ErrorResponse, HttpStatus};
///
/// let error = ErrorResponse::entity_not_found("User", "id", 42);
/// assert_eq!(error.status(), HttpStatus::NotFound);
/// assert_eq!(error.message(), Some("User with id [42] not found"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    status: HttpStatus,

    #[serde(with = "timestamp_format")]
    timestamp: NaiveDateTime,

    message: Option<String>,

    #[serde(default)]
    debug_message: Option<String>,

    #[serde(default)]
    sub_errors: Vec<SubError>,
}

impl ErrorResponse {
    /// Create an empty error response stamped with the current local time.
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            timestamp: Local::now().naive_local(),
            message: None,
            debug_message: None,
            sub_errors: Vec::new(),
        }
    }

    /// `"Unexpected error"` with the cause's message as debug detail.
    pub fn unexpected(status: HttpStatus, cause: &dyn Error) -> Self {
        Self::with_cause(status, "Unexpected error", cause)
    }

    pub fn with_cause(status: HttpStatus, message: impl Into<String>, cause: &dyn Error) -> Self {
        let mut response = Self::new(status);
        response.message = Some(message.into());
        response.debug_message = Some(cause.to_string());
        response
    }

    /// 404 with `"<resource> with <id_name> [<id_value>] not found"`.
    pub fn entity_not_found(resource: &str, id_name: &str, id_value: impl Display) -> Self {
        let mut response = Self::new(HttpStatus::NotFound);
        response.message = Some(not_found_message(resource, id_name, id_value));
        response
    }

    /// 400 with `"<resource> with <id_name> [<id_value>] already exists"`.
    pub fn entity_already_exists(resource: &str, id_name: &str, id_value: impl Display) -> Self {
        let mut response = Self::new(HttpStatus::BadRequest);
        response.message = Some(already_exists_message(resource, id_name, id_value));
        response
    }

    /// 400 with `"<parent> doesn't contain <child> with <id_name> [<id_value>]"`.
    pub fn entity_doesnt_contain_entity(
        parent: &str,
        child: &str,
        id_name: &str,
        id_value: impl Display,
    ) -> Self {
        let mut response = Self::new(HttpStatus::BadRequest);
        response.message = Some(doesnt_contain_message(parent, child, id_name, id_value));
        response
    }

    pub fn status(&self) -> HttpStatus {
        self.status
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn debug_message(&self) -> Option<&str> {
        self.debug_message.as_deref()
    }

    pub fn sub_errors(&self) -> &[SubError] {
        &self.sub_errors
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn set_debug_message(&mut self, debug_message: impl Into<String>) {
        self.debug_message = Some(debug_message.into());
    }

    pub fn clear_debug_message(&mut self) {
        self.debug_message = None;
    }

    /// Append a sub-error. Order is preserved and duplicates are kept.
    pub fn add_sub_error(&mut self, sub_error: impl Into<SubError>) {
        self.sub_errors.push(sub_error.into());
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (HttpStatusCode::from(self.status), Json(self)).into_response()
    }
}

/// Detail entry attached to an [`ErrorResponse`]
///
/// Variants serialize as flat objects without a discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubError {
    Validation(ValidationSubError),
    InternalCall(InternalCallSubError),
}

/// One invalid field or property; `field` is absent for object-level violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSubError {
    pub object_type: String,

    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub rejected_value: Option<Value>,

    pub message: Option<String>,
}

impl ValidationSubError {
    /// Object-level violation without a field.
    pub fn new(object_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            field: None,
            rejected_value: None,
            message: Some(message.into()),
        }
    }

    pub fn for_field(
        object_type: impl Into<String>,
        field: impl Into<String>,
        rejected_value: Option<Value>,
        message: Option<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            field: Some(field.into()),
            rejected_value,
            message,
        }
    }
}

/// A failed call to another service made while handling the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalCallSubError {
    pub status: u16,
    pub http_method: String,
    pub url: String,

    #[serde(default)]
    pub body: Option<Value>,
}

impl InternalCallSubError {
    pub fn new(status: u16, http_method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status,
            http_method: http_method.into(),
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl From<ValidationSubError> for SubError {
    fn from(error: ValidationSubError) -> Self {
        SubError::Validation(error)
    }
}

impl From<InternalCallSubError> for SubError {
    fn from(error: InternalCallSubError) -> Self {
        SubError::InternalCall(error)
    }
}

/// `HH:mm yyyy/MM/dd` on the wire.
mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub const FORMAT: &str = "%H:%M %Y/%m/%d";

    pub fn serialize<S: Serializer>(
        timestamp: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&timestamp.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(D::Error::custom)
    }
}
