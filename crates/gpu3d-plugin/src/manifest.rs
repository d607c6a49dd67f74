//! Plugin manifest types.
//!
//! A [`PluginManifest`] is the static metadata the host reads before it
//! dispatches anything: plugin name, semver version, plugin kind and the
//! declared tools with their input schemas.

use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::traits::Tool;

/// Plugin kind reported through the C ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    /// Tool provider.
    Tools,
}

impl PluginKind {
    /// Numeric tag returned by `get_type`.
    pub fn code(self) -> i32 {
        match self {
            Self::Tools => 0,
        }
    }
}

/// Definition of one tool as listed to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema", alias = "input_schema")]
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_owned(),
            description: tool.description().to_owned(),
            input_schema: tool.parameters_schema(),
        }
    }
}

/// Plugin metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginManifest {
    /// Plugin name (e.g., `"set-anisotropic"`).
    pub name: String,

    /// Semantic version string (must be valid semver).
    pub version: String,

    pub kind: PluginKind,

    /// Tools in the order the host indexes them.
    pub tools: Vec<ToolDefinition>,
}

impl PluginManifest {
    /// Build and validate a tool-provider manifest from tool instances.
    pub fn for_tools(
        name: impl Into<String>,
        version: impl Into<String>,
        tools: &[Box<dyn Tool>],
    ) -> Result<Self, PluginError> {
        let manifest = Self {
            name: name.into(),
            version: version.into(),
            kind: PluginKind::Tools,
            tools: tools.iter().map(|t| ToolDefinition::from_tool(t.as_ref())).collect(),
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate required fields, semver and tool names.
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.name.is_empty() {
            return Err(PluginError::LoadFailed(
                "manifest: name is required".into(),
            ));
        }
        if semver::Version::parse(&self.version).is_err() {
            return Err(PluginError::LoadFailed(format!(
                "manifest: invalid semver version '{}'",
                self.version
            )));
        }
        if self.tools.is_empty() {
            return Err(PluginError::LoadFailed(
                "manifest: at least one tool is required".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for tool in &self.tools {
            if tool.name.is_empty() {
                return Err(PluginError::LoadFailed(
                    "manifest: tool name is required".into(),
                ));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(PluginError::LoadFailed(format!(
                    "manifest: duplicate tool '{}'",
                    tool.name
                )));
            }
        }
        Ok(())
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PluginError> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Position of a tool by name.
    pub fn tool_index(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.name == name)
    }
}
