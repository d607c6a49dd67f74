//! Inbound request normalization.
//!
//! Hosts send tool arguments either flat (`{"mode": 2}`) or wrapped in an
//! MCP `tools/call` envelope (`{"params": {"arguments": {"mode": 2}}}`).
//! [`ToolInvocation`] accepts both and always looks at the flat form first.

use std::ops::RangeInclusive;

use serde_json::{Map, Value};

use crate::error::PluginError;

/// A parsed request document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInvocation {
    document: Map<String, Value>,
}

impl ToolInvocation {
    /// Parse a raw request body. An empty body is an empty object.
    pub fn parse(raw: &str) -> Result<Self, PluginError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| PluginError::InvalidRequestEncoding(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PluginError> {
        match value {
            Value::Object(document) => Ok(Self { document }),
            other => Err(PluginError::InvalidRequestEncoding(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Look up a parameter: flat form first, then `params.arguments`.
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.document.get(name).or_else(|| {
            self.document
                .get("params")?
                .get("arguments")?
                .get(name)
        })
    }

    /// Tool named by an MCP `tools/call` envelope, if any.
    pub fn tool_name(&self) -> Option<&str> {
        self.document.get("params")?.get("name")?.as_str()
    }

    /// Required integer parameter within `range`.
    pub fn integer_in(&self, name: &str, range: RangeInclusive<i64>) -> Result<i64, PluginError> {
        let value = self.argument(name).ok_or_else(|| {
            PluginError::InvalidParameter(format!("Missing required parameter '{name}'."))
        })?;
        // Integers above `i64::MAX` are still integers, just out of range.
        let number = match value.as_i64() {
            Some(number) => Some(number),
            None if value.is_u64() => None,
            None => {
                return Err(PluginError::InvalidParameter(format!(
                    "Parameter '{name}' must be an integer, got {}.",
                    kind_of(value)
                )));
            }
        };
        let Some(number) = number.filter(|n| range.contains(n)) else {
            return Err(PluginError::InvalidParameter(format!(
                "Unsupported {name}. {} value must be {}~{}.",
                capitalize(name),
                range.start(),
                range.end()
            )));
        };
        Ok(number)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a non-integer number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
