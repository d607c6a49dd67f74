//! Tool plugin contract for the gpu3d plugins.
//!
//! Each gpu3d plugin is a dynamic library exposing a small C function table
//! to a host orchestrator. This crate holds everything the plugins share so
//! that a tool crate only implements [`Tool`] and declares its metadata.
//!
//! # Overview
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Tool`] | One schema-described operation |
//! | [`ToolContext`] | Control backend handed to a tool per request |
//! | [`ToolInvocation`] | Request parsing, flat or `params.arguments` form |
//! | [`CallToolResult`] | The `{"content":[...],"isError":...}` envelope |
//! | [`PluginManifest`] | Name, semver version, kind and tool definitions |
//! | [`PluginConfig`] | TOML configuration (backend, log filter) |
//! | [`PluginHost`] | Lifecycle state machine and request dispatch |
//! | [`export_plugin!`] | Generates the exported C ABI for a tool crate |

pub mod config;
pub mod error;
pub mod ffi;
pub mod host;
pub mod invocation;
pub mod logging;
pub mod manifest;
pub mod response;
pub mod traits;

pub use config::{
    BackendConfig, ConfigOrigin, Discovered, Environment, LogConfig, MapEnvironment,
    NativeEnvironment, PluginConfig,
};
pub use error::PluginError;
pub use host::{BackendFactory, HostState, PluginHost};
pub use invocation::ToolInvocation;
pub use manifest::{PluginKind, PluginManifest, ToolDefinition};
pub use response::{CallToolResult, ContentBlock};
pub use traits::{Tool, ToolContext, ToolOutput};
