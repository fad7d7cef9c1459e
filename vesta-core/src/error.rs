//! Error types for the Vesta core library.
//!
//! This module provides a unified error handling system for all conversation
//! engine operations: backend queries, transcript synchronization, session
//! persistence, and chat completion streaming.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Storage | Key-value persistence errors |
//! | E2001-E2099 | Config | Environment and config file errors |
//! | E3001-E3099 | Backend | External API request/response errors |
//! | E4001-E4099 | Session | Session lifecycle errors |
//! | E5001-E5099 | Sync | Transcript synchronization errors |
//! | E9001-E9099 | General | Internal, IO, serialization errors |

use thiserror::Error;

/// The main error type for the Vesta core library.
#[derive(Debug, Error)]
pub enum VestaError {
    // ========================================================================
    // Storage Errors (E1001-E1099)
    // ========================================================================
    /// Key-value store read failed
    #[error("[E1001] Storage read failed for key '{key}': {message}")]
    StorageReadFailed { key: String, message: String },

    /// Key-value store write failed
    #[error("[E1002] Storage write failed for key '{key}': {message}")]
    StorageWriteFailed { key: String, message: String },

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Configuration file parse error
    #[error("[E2001] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2002] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    // ========================================================================
    // Backend Errors (External Services) (E3001-E3099)
    // ========================================================================
    /// API request failed (connection refused, DNS, reset)
    #[error("[E3001] API request failed: {0}")]
    RequestFailed(String),

    /// API service unavailable (5xx, connect errors)
    #[error("[E3002] API service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The server rejected the request with an application-level error
    #[error("[E3003] Server rejected request ({status}): {message}")]
    ServerRejection { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("[E3004] Malformed response: {0}")]
    MalformedResponse(String),

    /// The inquiry record the widget holds an id for no longer exists
    #[error("[E3005] Inquiry record not found: {0}")]
    DeadCorrelation(String),

    // ========================================================================
    // Session Errors (E4001-E4099)
    // ========================================================================
    /// Session not found in the persisted list
    #[error("[E4001] Session not found: {0}")]
    SessionNotFound(String),

    // ========================================================================
    // Sync Errors (E5001-E5099)
    // ========================================================================
    /// An outstanding operation was superseded or timed out.
    /// Expected during normal operation, not a failure.
    #[error("[E5001] Operation cancelled: {0}")]
    Cancelled(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Validation error
    #[error("[E9002] Validation error: {0}")]
    ValidationError(String),

    /// IO error
    #[error("[E9003] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9004] Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for Vesta operations.
pub type VestaResult<T> = Result<T, VestaError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<reqwest::Error> for VestaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VestaError::ServiceUnavailable(format!("request timed out: {}", err))
        } else if err.is_connect() {
            VestaError::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            VestaError::MalformedResponse(err.to_string())
        } else {
            VestaError::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VestaError {
    fn from(err: serde_json::Error) -> Self {
        VestaError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for VestaError {
    fn from(err: std::io::Error) -> Self {
        VestaError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for VestaError {
    fn from(err: config::ConfigError) -> Self {
        VestaError::ConfigParseError(err.to_string())
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl VestaError {
    /// Returns true if this error represents cooperative cancellation
    /// (supersede or timeout), which is expected and never surfaced.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, VestaError::Cancelled(_))
    }

    /// Returns true if this error is transient and the operation might
    /// succeed on a later retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VestaError::RequestFailed(_) | VestaError::ServiceUnavailable(_)
        )
    }

    /// Returns true if the held inquiry correlation id is dead and must be
    /// invalidated locally.
    pub fn is_dead_correlation(&self) -> bool {
        matches!(self, VestaError::DeadCorrelation(_))
    }

    /// Returns true if this error is related to storage operations.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            VestaError::StorageReadFailed { .. } | VestaError::StorageWriteFailed { .. }
        )
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            VestaError::StorageReadFailed { .. } => "E1001",
            VestaError::StorageWriteFailed { .. } => "E1002",
            VestaError::ConfigParseError(_) => "E2001",
            VestaError::InvalidConfigValue { .. } => "E2002",
            VestaError::RequestFailed(_) => "E3001",
            VestaError::ServiceUnavailable(_) => "E3002",
            VestaError::ServerRejection { .. } => "E3003",
            VestaError::MalformedResponse(_) => "E3004",
            VestaError::DeadCorrelation(_) => "E3005",
            VestaError::SessionNotFound(_) => "E4001",
            VestaError::Cancelled(_) => "E5001",
            VestaError::Internal(_) => "E9001",
            VestaError::ValidationError(_) => "E9002",
            VestaError::IoError(_) => "E9003",
            VestaError::SerializationError(_) => "E9004",
        }
    }

    /// Create a storage read error.
    pub fn storage_read(key: impl Into<String>, message: impl Into<String>) -> Self {
        VestaError::StorageReadFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a storage write error.
    pub fn storage_write(key: impl Into<String>, message: impl Into<String>) -> Self {
        VestaError::StorageWriteFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a cancellation marker.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        VestaError::Cancelled(reason.into())
    }
}

// ============================================================================
// Tests
// ============================================================================
