//! `set_endurance_gaming_mode` tool plugin.
//!
//! Updates the endurance gaming control (OFF/ON/AUTO) and mode
//! (BETTER_PERFORMANCE/BALANCED/MAXIMUM_BATTERY) of the first GPU adapter.
//! The previous state is read first and echoed back when available.

pub mod operations;
pub mod types;

use gpu3d_ctl::{EnduranceControl, EnduranceMode};
use gpu3d_plugin::{PluginError, PluginHost, Tool, ToolContext, ToolInvocation, ToolOutput};

use operations::apply_endurance_gaming;
use types::EnduranceRequest;

pub const PLUGIN_NAME: &str = "endurance-gaming-tools";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct SetEnduranceGamingTool;

impl SetEnduranceGamingTool {
    fn request(invocation: &ToolInvocation) -> Result<EnduranceRequest, PluginError> {
        let control = invocation.integer_in("control", 0..=2)?;
        let mode = invocation.integer_in("mode", 0..=2)?;
        Ok(EnduranceRequest {
            control: EnduranceControl::from_code(control).ok_or_else(|| {
                PluginError::InvalidParameter(
                    "Unsupported control. Control value must be 0~2.".into(),
                )
            })?,
            mode: EnduranceMode::from_code(mode).ok_or_else(|| {
                PluginError::InvalidParameter("Unsupported mode. Mode value must be 0~2.".into())
            })?,
        })
    }
}

impl Tool for SetEnduranceGamingTool {
    fn name(&self) -> &str {
        "set_endurance_gaming_mode"
    }

    fn description(&self) -> &str {
        "Set or cycle Endurance Gaming mode and control for a device."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "control": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 2,
                    "description": "Control value: 0=OFF, 1=ON, 2=AUTO"
                },
                "mode": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 2,
                    "description": "Mode value: 0=BETTER_PERFORMANCE, 1=BALANCED, 2=MAXIMUM_BATTERY"
                }
            },
            "required": ["control", "mode"],
            "additionalProperties": false
        })
    }

    fn execute(
        &self,
        invocation: &ToolInvocation,
        ctx: &dyn ToolContext,
    ) -> Result<ToolOutput, PluginError> {
        let request = Self::request(invocation)?;
        let outcome = apply_endurance_gaming(ctx.control(), request)?;
        let text = outcome.render();
        Ok(if outcome.succeeded {
            ToolOutput::success(text)
        } else {
            ToolOutput::failure(text)
        })
    }
}

pub fn plugin_host() -> Result<PluginHost, PluginError> {
    PluginHost::new(
        PLUGIN_NAME,
        PLUGIN_VERSION,
        vec![Box::new(SetEnduranceGamingTool)],
    )
}

gpu3d_plugin::export_plugin!(plugin_host);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gpu3d_ctl::{
        ControlLibrary, CtlResult, EnduranceGamingState, FeatureDetail, FeatureType,
        PropertyValueType, SimulatedAdapter, SimulatedConfig, SimulatedControlApi,
    };
    use serde_json::json;

    use super::*;
    use crate::types::{SET_FAILED, SET_SUCCEEDED};

    struct MockToolContext {
        sim: Arc<SimulatedControlApi>,
        library: ControlLibrary,
    }

    impl ToolContext for MockToolContext {
        fn control(&self) -> &ControlLibrary {
            &self.library
        }
        fn plugin_id(&self) -> &str {
            PLUGIN_NAME
        }
    }

    fn ctx(adapter: SimulatedAdapter) -> MockToolContext {
        let sim = Arc::new(SimulatedControlApi::new(SimulatedConfig {
            adapters: vec![adapter],
            ..SimulatedConfig::default()
        }));
        MockToolContext {
            library: ControlLibrary::new(sim.clone()),
            sim,
        }
    }

    fn gpu() -> SimulatedAdapter {
        SimulatedAdapter::named("gpu").with_features(vec![FeatureDetail {
            feature_type: FeatureType::EnduranceGaming,
            value_type: PropertyValueType::Custom,
            custom_value_size: 8,
            ..FeatureDetail::default()
        }])
    }

    fn run(ctx: &MockToolContext, args: serde_json::Value) -> Result<ToolOutput, PluginError> {
        SetEnduranceGamingTool.execute(&ToolInvocation::from_value(args).unwrap(), ctx)
    }

    #[test]
    fn schema_requires_both_fields() {
        let schema = SetEnduranceGamingTool.parameters_schema();
        assert_eq!(schema["required"], json!(["control", "mode"]));
    }

    #[test]
    fn applies_and_echoes_values() {
        let ctx = ctx(gpu());
        let output = run(&ctx, json!({ "control": 1, "mode": 0 })).unwrap();

        assert!(!output.is_error);
        assert!(output.text.starts_with(SET_SUCCEEDED));
        assert!(output.text.contains("Control: ON (1)"));
        assert!(output.text.contains("Mode: BETTER_PERFORMANCE (0)"));
        assert!(output.text.contains("Previous Control: OFF (0)"));
        assert_eq!(
            ctx.sim.endurance(0),
            Some(EnduranceGamingState {
                control: EnduranceControl::On,
                mode: EnduranceMode::BetterPerformance,
            })
        );
    }

    #[test]
    fn set_failure_is_error_output() {
        let ctx = ctx(SimulatedAdapter {
            fail_set: Some(CtlResult::ERROR_INSUFFICIENT_PERMISSIONS),
            ..gpu()
        });
        let output = run(&ctx, json!({ "control": 2, "mode": 2 })).unwrap();
        assert!(output.is_error);
        assert_eq!(output.text, SET_FAILED);
    }

    #[test]
    fn validation_happens_before_any_vendor_call() {
        let ctx = ctx(gpu());
        for (args, message) in [
            (
                json!({ "control": 3, "mode": 0 }),
                "Unsupported control. Control value must be 0~2.",
            ),
            (
                json!({ "control": 0, "mode": -1 }),
                "Unsupported mode. Mode value must be 0~2.",
            ),
            (json!({ "mode": 1 }), "Missing required parameter 'control'."),
            (json!({ "control": 1 }), "Missing required parameter 'mode'."),
        ] {
            let err = run(&ctx, args).unwrap_err();
            assert!(matches!(err, PluginError::InvalidParameter(_)));
            assert_eq!(err.to_string(), message);
        }
        assert!(ctx.sim.calls().is_empty());
    }
}
