use crate::exception::{flatten_validation, root_cause, simple_name};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;
use validator::ValidationErrors;

/// Committing a transaction failed.
///
/// The root cause decides the translation: constraint violations are reported
/// as validation errors, everything else as an unknown failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransactionSystem {
    message: String,
    #[source]
    cause: Box<dyn StdError + Send + Sync>,
}

impl TransactionSystem {
    pub fn new(message: impl Into<String>, cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn commit_failed(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new("Could not commit transaction", cause)
    }

    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        root_cause(&*self.cause)
    }
}

/// A single violated constraint on a validated object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Simple name of the validated root object.
    pub root_bean: String,
    /// Dotted path to the offending property; empty for object-level violations.
    pub property_path: String,
    pub invalid_value: Option<Value>,
    pub message: String,
}

impl ConstraintViolation {
    pub fn new(
        root_bean: impl Into<String>,
        property_path: impl Into<String>,
        invalid_value: Option<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            root_bean: root_bean.into(),
            property_path: property_path.into(),
            invalid_value,
            message: message.into(),
        }
    }
}

/// Programmatic validation failed with one or more violations.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolations {
    violations: Vec<ConstraintViolation>,
}

impl ConstraintViolations {
    pub fn new(violations: Vec<ConstraintViolation>) -> Self {
        Self { violations }
    }

    /// Violations of a `T` instance, sorted by property path.
    ///
    /// ```
    /// use rest_advice::exception::ConstraintViolations;
    /// use validator::Validate;
    ///
    /// #[derive(Validate)]
    /// struct Account {
    ///     #[validate(length(min = 3, message = "too short"))]
    ///     login: String,
    /// }
    ///
    /// let errors = Account { login: "ab".into() }.validate().unwrap_err();
    /// let violations = ConstraintViolations::from_validation::<Account>(&errors);
    /// assert_eq!(violations.violations()[0].property_path, "login");
    /// assert_eq!(violations.violations()[0].root_bean, "Account");
    /// ```
    pub fn from_validation<T: ?Sized>(errors: &ValidationErrors) -> Self {
        let root_bean = simple_name(std::any::type_name::<T>());
        let violations = flatten_validation(errors)
            .into_iter()
            .map(|violation| {
                ConstraintViolation::new(
                    root_bean,
                    violation.path,
                    violation.value,
                    violation.message,
                )
            })
            .collect();
        Self::new(violations)
    }

    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ConstraintViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", violation.property_path, violation.message)?;
        }
        Ok(())
    }
}

impl StdError for ConstraintViolations {}
