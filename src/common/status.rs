use crate::error::AdviceError;
use axum::http::StatusCode as HttpStatusCode;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// HTTP statuses an [`ErrorResponse`](crate::common::ErrorResponse) can carry.
///
/// Serialized as the upper snake case reason name (`"BAD_REQUEST"`), which is
/// also what `Display` renders.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HttpStatus {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    UnsupportedMediaType,
    UnprocessableEntity,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
}

impl HttpStatus {
    /// Numeric status code
    pub const fn code(self) -> u16 {
        match self {
            HttpStatus::BadRequest => 400,
            HttpStatus::Unauthorized => 401,
            HttpStatus::Forbidden => 403,
            HttpStatus::NotFound => 404,
            HttpStatus::MethodNotAllowed => 405,
            HttpStatus::Conflict => 409,
            HttpStatus::UnsupportedMediaType => 415,
            HttpStatus::UnprocessableEntity => 422,
            HttpStatus::InternalServerError => 500,
            HttpStatus::BadGateway => 502,
            HttpStatus::ServiceUnavailable => 503,
        }
    }

    pub const fn is_client_error(self) -> bool {
        self.code() >= 400 && self.code() < 500
    }

    pub const fn is_server_error(self) -> bool {
        self.code() >= 500
    }
}

impl From<HttpStatus> for HttpStatusCode {
    fn from(status: HttpStatus) -> Self {
        match status {
            HttpStatus::BadRequest => HttpStatusCode::BAD_REQUEST,
            HttpStatus::Unauthorized => HttpStatusCode::UNAUTHORIZED,
            HttpStatus::Forbidden => HttpStatusCode::FORBIDDEN,
            HttpStatus::NotFound => HttpStatusCode::NOT_FOUND,
            HttpStatus::MethodNotAllowed => HttpStatusCode::METHOD_NOT_ALLOWED,
            HttpStatus::Conflict => HttpStatusCode::CONFLICT,
            HttpStatus::UnsupportedMediaType => HttpStatusCode::UNSUPPORTED_MEDIA_TYPE,
            HttpStatus::UnprocessableEntity => HttpStatusCode::UNPROCESSABLE_ENTITY,
            HttpStatus::InternalServerError => HttpStatusCode::INTERNAL_SERVER_ERROR,
            HttpStatus::BadGateway => HttpStatusCode::BAD_GATEWAY,
            HttpStatus::ServiceUnavailable => HttpStatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = AdviceError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        HttpStatus::iter()
            .find(|status| status.code() == code)
            .ok_or(AdviceError::UnsupportedStatus(code))
    }
}
