//! Request extractors whose rejections are [`Exception`]s.
//!
//! They mirror axum's `Json`, `Query` and `Path`, but fail with the error
//! types the exception filter understands, so a bad request body or parameter
//! produces the same JSON error body as any other failure.

use crate::exception::{
    Exception, InvalidFormat, MediaTypeNotSupported, MessageNotReadable, MissingParameter,
    PathSegment, TypeMismatch, simple_name,
};
use crate::pipe::Pipe;
use crate::pipe::builtins::ValidationPipe;
use axum::body::Bytes;
use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::Deref;
use validator::Validate;

const SUPPORTED_MEDIA_TYPES: &[&str] = &["application/json"];

/// JSON request body.
///
/// # Example
/// ```
/// use rest_advice::extract::Json;
///
/// #[derive(serde::Deserialize)]
/// struct Login {
///     user: String,
/// }
///
/// async fn login(Json(body): Json<Login>) -> String {
///     body.user
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> Json<T> {
    /// Deserialize `T` from raw body bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Exception> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|error| MessageNotReadable::with_cause("JSON parse error", error))?;

        match serde_path_to_error::deserialize::<_, T>(&document) {
            Ok(value) => Ok(Json(value)),
            Err(error) => {
                let path = PathSegment::from_path(error.path());
                let rejected = if path.is_empty() {
                    None
                } else {
                    lookup(&document, &path).cloned()
                };
                let invalid = InvalidFormat::new(std::any::type_name::<T>(), error.inner().to_string())
                    .with_path(path)
                    .with_value(rejected);
                Err(MessageNotReadable::with_cause("JSON parse error", invalid).into())
            }
        }
    }
}

fn lookup<'a>(document: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(document, |current, segment| match segment {
        PathSegment::Field(name) => current.get(name.as_str()),
        PathSegment::Index(index) => current.get(*index),
        PathSegment::Unknown => None,
    })
}

fn json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Exception;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !json_content_type(req.headers()) {
            return Err(MediaTypeNotSupported {
                content_type: req
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                supported: SUPPORTED_MEDIA_TYPES.iter().map(|t| t.to_string()).collect(),
            }
            .into());
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| MessageNotReadable::with_cause("Could not read request body", rejection))?;

        Self::from_bytes(&bytes)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// JSON request body that must also pass `validator` checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
    S: Send + Sync,
{
    type Rejection = Exception;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        let value = ValidationPipe::<T>::new().transform(value).await?;
        Ok(Valid(value))
    }
}

impl<T> Deref for Valid<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T: DeserializeOwned> Query<T> {
    /// Deserialize `T` from a raw query string (without the leading `?`).
    pub fn from_query(query: &str) -> Result<Self, Exception> {
        let deserializer =
            serde_urlencoded::Deserializer::new(form_urlencoded::parse(query.as_bytes()));

        serde_path_to_error::deserialize(deserializer)
            .map(Query)
            .map_err(|error| -> Exception {
                let message = error.inner().to_string();
                if let Some(name) = missing_field(&message) {
                    return MissingParameter::new(name).into();
                }

                let name = error.path().to_string();
                let mut mismatch = TypeMismatch::new(name.clone());
                if let Some((_, raw)) =
                    form_urlencoded::parse(query.as_bytes()).find(|(key, _)| *key == name)
                {
                    mismatch = mismatch.with_value(raw.into_owned());
                }
                mismatch.into()
            })
    }
}

/// Field name out of serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Exception;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_query(parts.uri.query().unwrap_or_default())
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Path parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Exception;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Path::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Path(value)| Path(value))
            .map_err(path_rejection)
    }
}

impl<T> Deref for Path<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn path_rejection(rejection: PathRejection) -> Exception {
    let PathRejection::FailedToDeserializePathParams(failed) = rejection else {
        return MissingParameter::new("path").into();
    };

    match path_type_mismatch(failed.kind()) {
        Some(mismatch) => mismatch.into(),
        None => PathRejection::FailedToDeserializePathParams(failed).into(),
    }
}

/// Parse and value errors name the offending segment; other kinds are not mismatches.
fn path_type_mismatch(kind: &ErrorKind) -> Option<TypeMismatch> {
    let mismatch = match kind {
        ErrorKind::ParseErrorAtKey {
            key,
            value,
            expected_type,
        } => TypeMismatch::new(key.clone())
            .with_value(value.clone())
            .with_required_type(simple_name(expected_type)),
        ErrorKind::ParseErrorAtIndex {
            index,
            value,
            expected_type,
        } => TypeMismatch::new(index.to_string())
            .with_value(value.clone())
            .with_required_type(simple_name(expected_type)),
        ErrorKind::ParseError {
            value,
            expected_type,
        } => TypeMismatch::new("path")
            .with_value(value.clone())
            .with_required_type(simple_name(expected_type)),
        ErrorKind::DeserializeError { key, value, .. } => {
            TypeMismatch::new(key.clone()).with_value(value.clone())
        }
        _ => return None,
    };
    Some(mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Address {
        #[allow(dead_code)]
        zip: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Customer {
        #[allow(dead_code)]
        name: String,
        #[allow(dead_code)]
        address: Address,
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: u32,
        size: Option<u32>,
    }

    fn invalid_format(exception: &Exception) -> &InvalidFormat {
        exception
            .downcast_ref::<MessageNotReadable>()
            .and_then(|e| e.cause())
            .and_then(|cause| cause.downcast_ref::<InvalidFormat>())
            .unwrap()
    }

    #[test]
    fn test_json_invalid_format_has_path_and_value() {
        let err = Json::<Customer>::from_bytes(br#"{"name":"ann","address":{"zip":"x1"}}"#)
            .unwrap_err();
        let invalid = invalid_format(&err);
        assert_eq!(invalid.field_name(), Some("address"));
        assert_eq!(invalid.value(), Some(&Value::from("x1")));
        assert!(invalid.target_type().ends_with("Customer"));
    }

    #[test]
    fn test_json_missing_field_has_no_path() {
        let err = Json::<Customer>::from_bytes(br#"{"name":"ann"}"#).unwrap_err();
        let invalid = invalid_format(&err);
        assert!(invalid.path().is_empty());
        assert_eq!(invalid.value(), None);
        assert!(invalid.original_message().contains("missing field `address`"));
    }

    #[test]
    fn test_json_syntax_error() {
        let err = Json::<Customer>::from_bytes(b"{\"name\":").unwrap_err();
        let cause = err
            .downcast_ref::<MessageNotReadable>()
            .and_then(|e| e.cause())
            .and_then(|cause| cause.downcast_ref::<serde_json::Error>())
            .unwrap();
        assert!(cause.is_eof());
    }

    #[test]
    fn test_json_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!json_content_type(&headers));
        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(json_content_type(&headers));
        headers.insert(CONTENT_TYPE, "application/problem+json".parse().unwrap());
        assert!(json_content_type(&headers));
        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!json_content_type(&headers));
    }

    #[test]
    fn test_query_parses() {
        let Query(paging) = Query::<Paging>::from_query("page=2&size=10").unwrap();
        assert_eq!(paging.page, 2);
        assert_eq!(paging.size, Some(10));
    }

    #[test]
    fn test_query_missing_parameter() {
        let err = Query::<Paging>::from_query("size=10").unwrap_err();
        let missing = err.downcast_ref::<MissingParameter>().unwrap();
        assert_eq!(missing.name, "page");
    }

    #[test]
    fn test_query_type_mismatch_carries_raw_value() {
        let err = Query::<Paging>::from_query("page=two").unwrap_err();
        let mismatch = err.downcast_ref::<TypeMismatch>().unwrap();
        assert_eq!(mismatch.name, "page");
        assert_eq!(mismatch.value.as_deref(), Some("two"));
        assert_eq!(mismatch.required_type, None);
    }

    #[test]
    fn test_path_parse_error_at_index() {
        let mismatch = path_type_mismatch(&ErrorKind::ParseErrorAtIndex {
            index: 1,
            value: "seven".to_string(),
            expected_type: "u32",
        })
        .unwrap();
        assert_eq!(mismatch.name, "1");
        assert_eq!(mismatch.value.as_deref(), Some("seven"));
        assert_eq!(mismatch.required_type.as_deref(), Some("u32"));
    }

    #[test]
    fn test_path_deserialize_error_has_no_type() {
        let mismatch = path_type_mismatch(&ErrorKind::DeserializeError {
            key: "slug".to_string(),
            value: "Bad Slug".to_string(),
            message: "slug must be lowercase".to_string(),
        })
        .unwrap();
        assert_eq!(mismatch.name, "slug");
        assert_eq!(mismatch.value.as_deref(), Some("Bad Slug"));
        assert_eq!(mismatch.required_type, None);
    }

    #[test]
    fn test_path_message_error_is_not_a_mismatch() {
        let kind = ErrorKind::Message("unexpected path shape".to_string());
        assert!(path_type_mismatch(&kind).is_none());
    }
}
