use crate::common::{ErrorResponse, HttpStatus, InternalCallSubError, ValidationSubError};
use crate::config::FilterConfig;
use crate::exception::{
    ConstraintViolations, ConversionFailed, EntityAlreadyExists, EntityNotFound, ExceptionFilter,
    InternalCallFailed, InvalidFormat, MediaTypeNotSupported, MessageNotReadable,
    MethodArgumentNotValid, MethodNotSupported, MissingParameter, NoHandlerFound,
    PropertyReference, TransactionSystem, TypeMismatch, simple_name,
};
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde_json::error::Category;
use std::any::TypeId;
use std::error::Error as StdError;

type HandlerFn = Box<dyn Fn(&(dyn StdError + 'static)) -> Option<ErrorResponse> + Send + Sync>;

struct RegisteredHandler {
    type_id: TypeId,
    type_name: &'static str,
    handle: HandlerFn,
}

/// The default exception filter
///
/// Maps every recognized error type to one [`ErrorResponse`]. Types are
/// checked most specific first; handlers registered with
/// [`register`](Self::register) are consulted before the built-in ones and
/// anything left over is reported as an unknown 500.
///
/// # Example
/// ```
/// use rest_advice::common::{ErrorResponse, HttpStatus};
/// use rest_advice::exception::EntityNotFound;
/// use rest_advice::exception::http::RestExceptionFilter;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("quota exceeded")]
/// struct QuotaExceeded;
///
/// let filter = RestExceptionFilter::default().register(|_: &QuotaExceeded| {
///     let mut response = ErrorResponse::new(HttpStatus::Forbidden);
///     response.set_message("Quota exceeded");
///     response
/// });
///
/// assert_eq!(filter.translate(&QuotaExceeded).status(), HttpStatus::Forbidden);
/// assert_eq!(
///     filter.translate(&EntityNotFound::with_id("User", 42)).message(),
///     Some("User with id [42] not found")
/// );
/// ```
#[derive(Default)]
pub struct RestExceptionFilter {
    config: FilterConfig,
    handlers: Vec<RegisteredHandler>,
}

impl RestExceptionFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            handlers: Vec::new(),
        }
    }

    /// Handle `E` with `handler`, ahead of every built-in rule.
    ///
    /// Registering the same type again replaces the earlier handler.
    pub fn register<E, F>(mut self, handler: F) -> Self
    where
        E: StdError + 'static,
        F: Fn(&E) -> ErrorResponse + Send + Sync + 'static,
    {
        let entry = RegisteredHandler {
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            handle: Box::new(move |error: &(dyn StdError + 'static)| {
                error.downcast_ref::<E>().map(&handler)
            }),
        };
        match self.handlers.iter_mut().find(|h| h.type_id == entry.type_id) {
            Some(existing) => *existing = entry,
            None => self.handlers.push(entry),
        }
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Translate `error` into the body the client receives.
    pub fn translate(&self, error: &(dyn StdError + 'static)) -> ErrorResponse {
        let mut response = self.dispatch(error);
        if response.status().is_client_error() {
            if self.config.log_client_errors {
                tracing::warn!(status = response.status().code(), error = %error, "Request rejected");
            } else {
                tracing::debug!(status = response.status().code(), error = %error, "Request rejected");
            }
        }
        if !self.config.include_debug_message {
            response.clear_debug_message();
        }
        response
    }

    fn dispatch(&self, error: &(dyn StdError + 'static)) -> ErrorResponse {
        for handler in &self.handlers {
            if let Some(response) = (handler.handle)(error) {
                tracing::trace!(handler = handler.type_name, "Custom exception handler matched");
                return response;
            }
        }

        if let Some(e) = error.downcast_ref::<EntityNotFound>() {
            return self.handle_entity_not_found(e);
        }
        if let Some(e) = error.downcast_ref::<EntityAlreadyExists>() {
            return self.handle_entity_already_exists(e);
        }
        if let Some(e) = error.downcast_ref::<NoHandlerFound>() {
            return self.handle_no_handler_found(e);
        }
        if let Some(e) = error.downcast_ref::<MissingParameter>() {
            return self.handle_missing_parameter(e);
        }
        if let Some(e) = error.downcast_ref::<MethodNotSupported>() {
            return self.handle_method_not_supported(e);
        }
        if let Some(e) = error.downcast_ref::<MediaTypeNotSupported>() {
            return self.handle_media_type_not_supported(e);
        }
        if let Some(e) = error.downcast_ref::<MethodArgumentNotValid>() {
            return self.handle_method_argument_not_valid(e);
        }
        if let Some(e) = error.downcast_ref::<ConstraintViolations>() {
            return self.handle_constraint_violation(e);
        }
        if let Some(e) = error.downcast_ref::<TransactionSystem>() {
            return self.handle_transaction_system(e);
        }
        if let Some(e) = error.downcast_ref::<MessageNotReadable>() {
            return self.handle_message_not_readable(e);
        }
        if let Some(e) = error.downcast_ref::<InvalidFormat>() {
            return self.handle_invalid_format(e);
        }
        if let Some(e) = error.downcast_ref::<serde_json::Error>() {
            return self.handle_json_error(e);
        }
        if let Some(e) = error.downcast_ref::<JsonRejection>() {
            return self.handle_json_rejection(e);
        }
        if let Some(e) = error.downcast_ref::<TypeMismatch>() {
            return self.handle_type_mismatch(e);
        }
        if let Some(e) = error.downcast_ref::<PropertyReference>() {
            return self.handle_property_reference(e);
        }
        if let Some(e) = error.downcast_ref::<ConversionFailed>() {
            return self.handle_conversion_failed(e);
        }
        if let Some(e) = error.downcast_ref::<InternalCallFailed>() {
            return self.handle_internal_call_failed(e);
        }

        self.handle_exception(error)
    }

    /// Fallback for anything not otherwise matched.
    pub fn handle_exception(&self, error: &(dyn StdError + 'static)) -> ErrorResponse {
        let causes: Vec<String> = std::iter::successors(error.source(), |&e| e.source())
            .map(|cause| cause.to_string())
            .collect();
        tracing::error!(
            error = %error,
            causes = ?causes,
            details = ?error,
            "Unhandled exception while processing request"
        );
        ErrorResponse::with_cause(HttpStatus::InternalServerError, "Unknown error", error)
    }

    pub fn handle_entity_not_found(&self, error: &EntityNotFound) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::NotFound);
        response.set_message(error.message());
        response
    }

    pub fn handle_entity_already_exists(&self, error: &EntityAlreadyExists) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message(error.message());
        response
    }

    pub fn handle_no_handler_found(&self, error: &NoHandlerFound) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::NotFound);
        response.set_message(format!("Path '{}' not found", error.path));
        response
    }

    pub fn handle_missing_parameter(&self, error: &MissingParameter) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message(format!(
            "Required query parameter '{}' not present",
            error.name
        ));
        response
    }

    pub fn handle_message_not_readable(&self, error: &MessageNotReadable) -> ErrorResponse {
        if let Some(cause) = error.cause() {
            if let Some(invalid) = cause.downcast_ref::<InvalidFormat>() {
                return self.handle_invalid_format(invalid);
            }
            if let Some(json) = cause.downcast_ref::<serde_json::Error>() {
                return self.handle_json_error(json);
            }
        }

        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message("Message not readable error");
        if let Some(first) = error.message().split(';').next() {
            response.set_debug_message(first);
        }
        response
    }

    pub fn handle_invalid_format(&self, error: &InvalidFormat) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message("Invalid format error");
        if error.path().is_empty() {
            response.set_debug_message(error.original_message());
        } else {
            response.add_sub_error(ValidationSubError {
                object_type: error.target_type().to_string(),
                field: error.field_name().map(str::to_string),
                rejected_value: error.value().cloned(),
                message: Some(error.original_message().to_string()),
            });
        }
        response
    }

    /// serde_json errors are split by category: syntax and premature EOF are
    /// malformed JSON, data errors are value-format errors without a path,
    /// I/O errors are generic JSON processing failures.
    pub fn handle_json_error(&self, error: &serde_json::Error) -> ErrorResponse {
        match error.classify() {
            Category::Syntax | Category::Eof => self.handle_json_parse(error),
            Category::Data => {
                let mut response = ErrorResponse::new(HttpStatus::BadRequest);
                response.set_message("Invalid format error");
                response.set_debug_message(error.to_string());
                response
            }
            Category::Io => self.handle_json_processing(error),
        }
    }

    pub fn handle_json_parse(&self, error: &serde_json::Error) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message("Invalid JSON error");
        response.set_debug_message(error.to_string());
        response
    }

    pub fn handle_json_processing(&self, error: &(dyn StdError + 'static)) -> ErrorResponse {
        ErrorResponse::with_cause(HttpStatus::BadRequest, "JSON processing/parse error", error)
    }

    /// Rejections of axum's own `Json` extractor, for handlers that use it
    /// instead of [`crate::extract::Json`].
    pub fn handle_json_rejection(&self, rejection: &JsonRejection) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        match rejection {
            JsonRejection::JsonSyntaxError(_) => response.set_message("Invalid JSON error"),
            JsonRejection::JsonDataError(_) => response.set_message("Invalid format error"),
            JsonRejection::MissingJsonContentType(_) => {
                response.set_message("Media type not suported")
            }
            _ => response.set_message("Message not readable error"),
        }
        response.set_debug_message(rejection.body_text());
        response
    }

    pub fn handle_method_not_supported(&self, error: &MethodNotSupported) -> ErrorResponse {
        ErrorResponse::with_cause(
            HttpStatus::MethodNotAllowed,
            "Request method not supported in this URI",
            error,
        )
    }

    pub fn handle_media_type_not_supported(&self, error: &MediaTypeNotSupported) -> ErrorResponse {
        ErrorResponse::with_cause(HttpStatus::BadRequest, "Media type not suported", error)
    }

    pub fn handle_method_argument_not_valid(&self, error: &MethodArgumentNotValid) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message("Validation error");
        for field_error in error.field_errors() {
            response.add_sub_error(ValidationSubError {
                object_type: error.target().to_string(),
                field: Some(field_error.field.clone()).filter(|field| !field.is_empty()),
                rejected_value: field_error.rejected_value.clone(),
                message: field_error.default_message.clone(),
            });
        }
        response
    }

    pub fn handle_transaction_system(&self, error: &TransactionSystem) -> ErrorResponse {
        match error.root_cause().downcast_ref::<ConstraintViolations>() {
            Some(violations) => self.handle_constraint_violation(violations),
            None => self.handle_exception(error),
        }
    }

    pub fn handle_constraint_violation(&self, error: &ConstraintViolations) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message("Validation error");
        for violation in error.violations() {
            response.add_sub_error(ValidationSubError {
                object_type: violation.root_bean.clone(),
                field: Some(violation.property_path.clone()).filter(|path| !path.is_empty()),
                rejected_value: violation.invalid_value.clone(),
                message: Some(violation.message.clone()),
            });
        }
        response
    }

    pub fn handle_type_mismatch(&self, error: &TypeMismatch) -> ErrorResponse {
        let mut message = String::from("Type conversion error.");
        if let (Some(value), Some(required_type)) = (&error.value, &error.required_type) {
            message.push_str(&format!(
                " The value {{{}}} can not be converted to the type {{{}}}.",
                value,
                simple_name(required_type)
            ));
        }
        ErrorResponse::with_cause(HttpStatus::BadRequest, message, error)
    }

    pub fn handle_property_reference(&self, error: &PropertyReference) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message(error.to_string());
        response
    }

    pub fn handle_conversion_failed(&self, error: &ConversionFailed) -> ErrorResponse {
        let mut response = ErrorResponse::new(HttpStatus::BadRequest);
        response.set_message(error.to_string());
        response
    }

    pub fn handle_internal_call_failed(&self, error: &InternalCallFailed) -> ErrorResponse {
        let mut response =
            ErrorResponse::with_cause(HttpStatus::BadGateway, "Internal call error", error);
        let mut sub_error = InternalCallSubError::new(error.status, &error.method, &error.url);
        if let Some(body) = &error.body {
            sub_error = sub_error.with_body(body.clone());
        }
        response.add_sub_error(sub_error);
        response
    }
}

impl ExceptionFilter for RestExceptionFilter {
    fn catch(&self, error: &(dyn StdError + 'static)) -> Response {
        self.translate(error).into_response()
    }
}
