use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdviceError>;

/// Errors raised while setting up the translation layer itself.
///
/// Request-time failures are never reported through this type; they are
/// carried by [`Exception`](crate::exception::Exception) and translated.
#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("Invalid value '{value}' for configuration key {key}")]
    InvalidConfig { key: String, value: String },

    #[error("Unsupported HTTP status code: {0}")]
    UnsupportedStatus(u16),
}

impl AdviceError {
    pub fn invalid_config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
        }
    }
}
