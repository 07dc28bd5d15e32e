// --- File: crates/autoservice_common/src/error.rs ---
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the spreadsheet backend.
///
/// Every backend call funnels into one of these variants so that callers can decide
/// between retrying, showing the backend's own message, or marking a view as degraded.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (DNS, connection reset, CORS rejection in a browser, ...)
    #[error("Backend request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status and a readable body
    #[error("Backend returned status {status_code}: {body}")]
    Status { status_code: u16, body: String },

    /// The response did not match the expected schema
    #[error("Unexpected backend response: {0}")]
    Parse(String),

    /// The backend answered `result: "error"`; the message is shown verbatim
    #[error("{0}")]
    Rejected(String),

    /// The call did not finish within the configured bound
    #[error("Backend did not answer within {0:?}")]
    Timeout(Duration),

    /// The configured backend URL cannot be used
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Classifies a reqwest failure. A request that ran into the client timeout `bound`
    /// is a `Timeout`, not a transport error.
    pub fn from_transport(err: reqwest::Error, bound: Duration) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(bound)
        } else {
            BackendError::Request(err)
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Request(_) | BackendError::Timeout(_) => true,
            BackendError::Status { status_code, .. } => *status_code >= 500,
            BackendError::Parse(_) | BackendError::Rejected(_) | BackendError::InvalidUrl(_) => {
                false
            }
        }
    }

    /// Short text suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Rejected(message) => message.clone(),
            BackendError::Timeout(_) => {
                "Сервер не ответил вовремя. Проверьте соединение и попробуйте ещё раз.".to_string()
            }
            BackendError::Request(_) => "Ошибка соединения с сервером.".to_string(),
            BackendError::Status { status_code, .. } => {
                format!("Сервер вернул ошибку (код {status_code}).")
            }
            BackendError::Parse(_) => "Сервер вернул некорректный ответ.".to_string(),
            BackendError::InvalidUrl(_) => "Адрес сервера записи настроен неверно.".to_string(),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Parse(err.to_string())
    }
}

/// The base error type shared by all autoservice crates.
///
/// Each crate can extend this by implementing From<SpecificError> for AutoserviceError.
#[derive(Error, Debug)]
pub enum AutoserviceError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The backend refused or failed the operation
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., a submission already in flight)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, AutoserviceError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, AutoserviceError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, AutoserviceError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| AutoserviceError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, AutoserviceError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| AutoserviceError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<BackendError> for AutoserviceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Request(e) => AutoserviceError::HttpError(e.to_string()),
            BackendError::Timeout(after) => {
                AutoserviceError::TimeoutError(format!("backend did not answer within {after:?}"))
            }
            BackendError::Parse(msg) => AutoserviceError::ParseError(msg),
            BackendError::InvalidUrl(msg) => AutoserviceError::ConfigError(msg),
            BackendError::Status { status_code, body } => external_service_error(
                "booking backend",
                format!("Status: {}, Body: {}", status_code, body),
            ),
            BackendError::Rejected(msg) => external_service_error("booking backend", msg),
        }
    }
}

impl From<reqwest::Error> for AutoserviceError {
    fn from(err: reqwest::Error) -> Self {
        AutoserviceError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for AutoserviceError {
    fn from(err: serde_json::Error) -> Self {
        AutoserviceError::ParseError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> AutoserviceError {
    AutoserviceError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> AutoserviceError {
    AutoserviceError::ValidationError(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> AutoserviceError {
    AutoserviceError::AuthError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> AutoserviceError {
    AutoserviceError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> AutoserviceError {
    AutoserviceError::InternalError(message.to_string())
}
