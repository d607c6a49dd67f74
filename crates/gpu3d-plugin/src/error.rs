//! Plugin error types.
//!
//! Defines [`PluginError`], the unified error type for request handling,
//! configuration loading and manifest validation. Every variant renders a
//! short message suitable for the `text` block of an error envelope.

use gpu3d_ctl::CtlError;
use thiserror::Error;

/// Errors produced by plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The vendor session could not be opened.
    #[error("ctlInit failed: {0}")]
    SessionInitFailed(String),

    /// Enumeration failed or reported zero adapters.
    #[error("No device found")]
    NoDeviceFound,

    /// The request body is not a JSON object.
    #[error("Invalid JSON request: {0}")]
    InvalidRequestEncoding(String),

    /// A parameter is missing, has the wrong type, or is out of range.
    #[error("{0}")]
    InvalidParameter(String),

    /// A vendor call failed and that failure is the whole result.
    #[error("{0}")]
    OperationFailed(String),

    /// A request arrived before `initialize` or after `shutdown`.
    #[error("plugin is not initialized")]
    NotInitialized,

    /// The request named a tool this plugin does not provide.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Bad manifest or configuration.
    #[error("plugin load failed: {0}")]
    LoadFailed(String),

    /// I/O error during plugin operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CtlError> for PluginError {
    fn from(err: CtlError) -> Self {
        match err {
            CtlError::SessionInitFailed(result) => Self::SessionInitFailed(result.to_string()),
            CtlError::NoDeviceFound => Self::NoDeviceFound,
            other => Self::OperationFailed(other.to_string()),
        }
    }
}
