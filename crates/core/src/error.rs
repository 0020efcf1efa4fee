//! Error types for the rolechat domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context has
//! its own error enum; the top-level `Error` is what the orchestrator
//! propagates to callers, together with a stable string code.

use thiserror::Error;

/// Code attached to a failed turn when nothing more specific is known.
pub const RUNTIME_STREAM_ERROR_CODE: &str = "502_RUNTIME_STREAM_ERROR";

/// Code attached when the requested role does not exist.
pub const ROLE_NOT_FOUND_CODE: &str = "404_ROLE_NOT_FOUND";

/// Code attached when caller input fails validation.
pub const VALIDATION_ERROR_CODE: &str = "400_VALIDATION_ERROR";

/// The top-level error type for all rolechat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested role name is not present in the role directory.
    /// Fatal caller input error — never retried.
    #[error("Role not found: {name}")]
    RoleNotFound { name: String },

    /// Caller input failed validation (e.g. empty user message).
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The stable, caller-facing code for this error.
    ///
    /// Provider failures surface the provider's own code where one exists;
    /// everything else falls back to the generic runtime-stream code.
    pub fn code(&self) -> String {
        match self {
            Error::RoleNotFound { .. } => ROLE_NOT_FOUND_CODE.into(),
            Error::Validation { .. } => VALIDATION_ERROR_CODE.into(),
            Error::Provider(e) => e.code(),
            _ => RUNTIME_STREAM_ERROR_CODE.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider")]
    RateLimited { message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether a fresh attempt against the provider may succeed.
    ///
    /// Retryable: rate limiting, connection timeout, connection reset.
    /// Everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Timeout(_)
                | ProviderError::ConnectionReset(_)
        )
    }

    /// The caller-facing code for this provider failure.
    pub fn code(&self) -> String {
        match self {
            ProviderError::ApiError { status_code, .. } => {
                format!("{status_code}_PROVIDER_ERROR")
            }
            ProviderError::RateLimited { .. } => "429_RATE_LIMITED".into(),
            ProviderError::Timeout(_) => "504_PROVIDER_TIMEOUT".into(),
            ProviderError::ConnectionReset(_) => "502_CONNECTION_RESET".into(),
            ProviderError::AuthenticationFailed(_) => "401_PROVIDER_AUTH".into(),
            _ => RUNTIME_STREAM_ERROR_CODE.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_not_found_code() {
        let err = Error::RoleNotFound { name: "张三".into() };
        assert_eq!(err.code(), "404_ROLE_NOT_FOUND");
        assert!(err.to_string().contains("张三"));
    }

    #[test]
    fn provider_error_codes() {
        let rate = ProviderError::RateLimited { message: "slow down".into() };
        assert_eq!(rate.code(), "429_RATE_LIMITED");

        let api = ProviderError::ApiError { status_code: 500, message: "boom".into() };
        assert_eq!(api.code(), "500_PROVIDER_ERROR");

        let interrupted = ProviderError::StreamInterrupted("eof".into());
        assert_eq!(interrupted.code(), "502_RUNTIME_STREAM_ERROR");
    }

    #[test]
    fn retry_classification() {
        assert!(ProviderError::RateLimited { message: String::new() }.is_retryable());
        assert!(ProviderError::Timeout("connect".into()).is_retryable());
        assert!(ProviderError::ConnectionReset("peer".into()).is_retryable());

        assert!(!ProviderError::ApiError { status_code: 400, message: String::new() }
            .is_retryable());
        assert!(!ProviderError::AuthenticationFailed("bad key".into()).is_retryable());
        assert!(!ProviderError::StreamInterrupted("mid-stream".into()).is_retryable());
    }

    #[test]
    fn default_code_falls_back_to_runtime_stream_error() {
        let err = Error::Internal("whatever".into());
        assert_eq!(err.code(), RUNTIME_STREAM_ERROR_CODE);
    }
}
