//! Tool contract.
//!
//! - [`Tool`] -- one schema-described operation exposed to the host
//! - [`ToolContext`] -- what the host hands a tool for one request
//! - [`ToolOutput`] -- the report a tool produces
//!
//! Calls are synchronous: the host thread blocks for the whole request.

use gpu3d_ctl::ControlLibrary;

use crate::error::PluginError;
use crate::invocation::ToolInvocation;

/// A tool that can be invoked by the host orchestrator.
pub trait Tool: Send + Sync {
    /// Unique tool name (e.g., `"set_anisotropic"`).
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema (draft-07) describing the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Validate the invocation, run the operation and build the report.
    ///
    /// Parameters must be validated before any vendor session is opened.
    fn execute(
        &self,
        invocation: &ToolInvocation,
        ctx: &dyn ToolContext,
    ) -> Result<ToolOutput, PluginError>;
}

/// Execution context passed to [`Tool::execute()`].
pub trait ToolContext: Send + Sync {
    /// The vendor control backend for this plugin instance.
    fn control(&self) -> &ControlLibrary;

    /// The name of the plugin that owns this tool.
    fn plugin_id(&self) -> &str;
}

/// Text report produced by a tool.
///
/// `is_error` marks a report that is itself the failure, such as a
/// single-adapter set that the vendor rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}
