//! `get_3d_capabilities` tool plugin.
//!
//! Reports, for every GPU adapter, the 3D features the driver supports
//! together with their value type, custom value size, per-application
//! support, conflicting features and misc support flags. Adapters whose
//! query fails are left out of the report.
//!
//! Built as a `cdylib`; the host loads it through the C ABI generated by
//! [`gpu3d_plugin::export_plugin!`].

pub mod operations;
pub mod types;

use gpu3d_plugin::{PluginError, PluginHost, Tool, ToolContext, ToolInvocation, ToolOutput};

use operations::query_capabilities;

/// Plugin name reported to the host.
pub const PLUGIN_NAME: &str = "get-3d-capabilities";

/// Plugin version reported to the host.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lists supported 3D features for all adapters.
pub struct Get3dCapabilitiesTool;

impl Tool for Get3dCapabilitiesTool {
    fn name(&self) -> &str {
        "get_3d_capabilities"
    }

    fn description(&self) -> &str {
        "Get supported 3D feature capabilities for all devices"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    fn execute(
        &self,
        _invocation: &ToolInvocation,
        ctx: &dyn ToolContext,
    ) -> Result<ToolOutput, PluginError> {
        let report = query_capabilities(ctx.control())?;
        Ok(ToolOutput::success(report.render()))
    }
}

/// Build the plugin instance loaded by the host.
pub fn plugin_host() -> Result<PluginHost, PluginError> {
    PluginHost::new(
        PLUGIN_NAME,
        PLUGIN_VERSION,
        vec![Box::new(Get3dCapabilitiesTool)],
    )
}

gpu3d_plugin::export_plugin!(plugin_host);
