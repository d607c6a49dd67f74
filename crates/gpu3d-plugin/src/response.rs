//! Response envelope returned to the host.
//!
//! Wire form: `{"content":[{"type":"text","text":"..."}],"isError":false}`.
//! Every response carries exactly one text block.

use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::traits::ToolOutput;

/// Envelope used when serialization itself fails.
const FALLBACK_ERROR: &str =
    r#"{"content":[{"type":"text","text":"internal error: response serialization failed"}],"isError":true}"#;

/// A content block within a tool result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Plain text content.
    #[serde(rename = "text")]
    Text { text: String },
}

/// The result of calling a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToolResult {
    /// Content blocks produced by the tool.
    pub content: Vec<ContentBlock>,
    /// Whether the tool execution resulted in an error.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn new(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error,
        }
    }

    /// Convenience constructor for a successful text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    /// Convenience constructor for an error text result.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    /// Body of the first text block.
    pub fn text_content(&self) -> Option<&str> {
        self.content.first().map(|block| match block {
            ContentBlock::Text { text } => text.as_str(),
        })
    }

    /// Serialize to the wire form. Never fails: a serialization error yields
    /// a fixed error envelope.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            tracing::error!(error = %err, "response serialization failed");
            FALLBACK_ERROR.to_owned()
        })
    }

    pub fn from_json(json: &str) -> Result<Self, PluginError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<PluginError> for CallToolResult {
    fn from(err: PluginError) -> Self {
        Self::error(err.to_string())
    }
}

impl From<ToolOutput> for CallToolResult {
    fn from(output: ToolOutput) -> Self {
        Self::new(output.text, output.is_error)
    }
}
