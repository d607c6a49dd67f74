//! `set_anisotropic` tool plugin.
//!
//! Applies one anisotropic filtering level (0=App Choice, 1=2X, 2=4X, 3=8X,
//! 4=16X) to every GPU adapter and reports a Success/Failed line per
//! adapter.

pub mod operations;
pub mod types;

use gpu3d_ctl::AnisotropicMode;
use gpu3d_plugin::{PluginError, PluginHost, Tool, ToolContext, ToolInvocation, ToolOutput};

use operations::apply_anisotropic;

pub const PLUGIN_NAME: &str = "set-anisotropic";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sets the anisotropic filtering mode on all adapters.
pub struct SetAnisotropicTool;

impl SetAnisotropicTool {
    fn mode(invocation: &ToolInvocation) -> Result<AnisotropicMode, PluginError> {
        let index = invocation.integer_in("mode", 0..=4)?;
        AnisotropicMode::from_index(index).ok_or_else(|| {
            PluginError::InvalidParameter("Unsupported mode. Mode value must be 0~4.".into())
        })
    }
}

impl Tool for SetAnisotropicTool {
    fn name(&self) -> &str {
        "set_anisotropic"
    }

    fn description(&self) -> &str {
        "Set Anisotropic mode for a device."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "mode": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 4,
                    "description": "Mode value: 0=APP_CHOICE, 1=2X, 2=4X, 3=8X, 4=16X"
                }
            },
            "required": ["mode"],
            "additionalProperties": false
        })
    }

    fn execute(
        &self,
        invocation: &ToolInvocation,
        ctx: &dyn ToolContext,
    ) -> Result<ToolOutput, PluginError> {
        let mode = Self::mode(invocation)?;
        let report = apply_anisotropic(ctx.control(), mode)?;
        Ok(ToolOutput::success(report.render()))
    }
}

pub fn plugin_host() -> Result<PluginHost, PluginError> {
    PluginHost::new(PLUGIN_NAME, PLUGIN_VERSION, vec![Box::new(SetAnisotropicTool)])
}

gpu3d_plugin::export_plugin!(plugin_host);
