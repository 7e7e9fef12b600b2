//! Error types for the roverctl domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all roverctl operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Device errors ---
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    // --- Reasoning engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

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

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors from the robot device boundary.
///
/// Motor and status failures are recoverable: callers flatten them into a
/// failure-text tool result so the reasoning engine can retry or adapt.
/// Camera failures are hard — there is no meaningful continuation without
/// an image.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Robot returned HTTP {status} for {endpoint}")]
    Http { endpoint: String, status: u16 },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Camera failure: {0}")]
    Camera(String),
}

impl DeviceError {
    /// Whether this failure may be surfaced as a soft failure-text result.
    /// Camera failures always escalate past the tool boundary.
    pub fn is_soft(&self) -> bool {
        !matches!(self, DeviceError::Camera(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by engine, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Engine not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown action: {0}")]
    NotFound(String),

    #[error("Invalid action arguments: {0}")]
    InvalidArguments(String),

    #[error("Action failed: {action} — {reason}")]
    ExecutionFailed { action: String, reason: String },

    #[error("Camera failure during {action}: {source}")]
    Camera {
        action: String,
        #[source]
        source: DeviceError,
    },
}
