use crate::error::{AdviceError, Result};
use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Load every environment variable into a new service.
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Read a boolean flag. Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(AdviceError::invalid_config(key, raw)),
        }
    }
}

/// Knobs for [`RestExceptionFilter`](crate::exception::http::RestExceptionFilter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Keep `debugMessage` in response bodies.
    pub include_debug_message: bool,
    /// Log 4xx translations at `warn` instead of `debug`.
    pub log_client_errors: bool,
}

impl FilterConfig {
    pub const INCLUDE_DEBUG_MESSAGE: &'static str = "ERROR_INCLUDE_DEBUG_MESSAGE";
    pub const LOG_CLIENT_ERRORS: &'static str = "ERROR_LOG_CLIENT_ERRORS";

    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            include_debug_message: config
                .get_bool(Self::INCLUDE_DEBUG_MESSAGE)?
                .unwrap_or(defaults.include_debug_message),
            log_client_errors: config
                .get_bool(Self::LOG_CLIENT_ERRORS)?
                .unwrap_or(defaults.log_client_errors),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(&ConfigService::new())
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_debug_message: true,
            log_client_errors: false,
        }
    }
}
