//! Plugin facade.
//!
//! [`PluginHost`] implements the lifecycle the host expects from a tool
//! plugin: `initialize`, `handle_request`, `shutdown`, plus static metadata.
//! Configuration is resolved once at initialization and the resulting
//! [`ControlLibrary`] is passed to every dispatch; nothing else survives
//! between requests. Each request opens and closes its own vendor session
//! inside the tool.

use std::fmt;
use std::sync::Arc;

use gpu3d_ctl::{ControlApi, ControlLibrary};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::{Discovered, Environment, NativeEnvironment, PluginConfig};
use crate::error::PluginError;
use crate::invocation::ToolInvocation;
use crate::logging::init_logging;
use crate::manifest::{PluginKind, PluginManifest};
use crate::response::CallToolResult;
use crate::traits::{Tool, ToolContext, ToolOutput};

/// Lifecycle state of a [`PluginHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Unloaded,
    Initialized,
    ShuttingDown,
}

/// Builds the control backend from the resolved configuration.
pub type BackendFactory = Arc<dyn Fn(&PluginConfig) -> Arc<dyn ControlApi> + Send + Sync>;

enum ConfigSource {
    Discover,
    Fixed(PluginConfig),
}

struct Inner {
    state: HostState,
    library: Option<Arc<ControlLibrary>>,
}

/// One loaded plugin: its manifest, its tools and its lifecycle state.
pub struct PluginHost {
    manifest: PluginManifest,
    tools: Vec<Box<dyn Tool>>,
    env: Arc<dyn Environment>,
    config_source: ConfigSource,
    backend_factory: Option<BackendFactory>,
    inner: RwLock<Inner>,
}

impl PluginHost {
    /// Create an unloaded plugin. The manifest is derived from `tools` and
    /// validated here.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        tools: Vec<Box<dyn Tool>>,
    ) -> Result<Self, PluginError> {
        let manifest = PluginManifest::for_tools(name, version, &tools)?;
        Ok(Self {
            manifest,
            tools,
            env: Arc::new(NativeEnvironment),
            config_source: ConfigSource::Discover,
            backend_factory: None,
            inner: RwLock::new(Inner {
                state: HostState::Unloaded,
                library: None,
            }),
        })
    }

    /// Read environment variables from `env` instead of the process.
    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Use `config` instead of discovering a config file.
    pub fn with_config(mut self, config: PluginConfig) -> Self {
        self.config_source = ConfigSource::Fixed(config);
        self
    }

    /// Build the backend with `factory` instead of from `[backend]`.
    pub fn with_backend_factory(mut self, factory: BackendFactory) -> Self {
        self.backend_factory = Some(factory);
        self
    }

    /// Use a ready-made backend.
    pub fn with_backend(self, api: Arc<dyn ControlApi>) -> Self {
        self.with_backend_factory(Arc::new(move |_: &PluginConfig| api.clone()))
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn kind(&self) -> PluginKind {
        self.manifest.kind
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Tool at `index`, `None` when out of range.
    pub fn tool(&self, index: usize) -> Option<&dyn Tool> {
        self.tools.get(index).map(|t| t.as_ref())
    }

    pub fn state(&self) -> HostState {
        self.inner.read().state
    }

    /// Resolve configuration, install logging and build the backend.
    ///
    /// Idempotent; always reports success. Re-initializing after
    /// `shutdown` reuses the backend built the first time.
    pub fn initialize(&self) -> bool {
        let mut inner = self.inner.write();
        if inner.state == HostState::Initialized {
            debug!(plugin = %self.manifest.name, "already initialized");
            return true;
        }

        if inner.library.is_none() {
            let discovered = match &self.config_source {
                ConfigSource::Discover => PluginConfig::discover(self.env.as_ref()),
                ConfigSource::Fixed(config) => Discovered::provided(config.clone()),
            };
            init_logging(&discovered.config.log_filter(self.env.as_ref()));
            discovered.report();
            let config = discovered.config;

            let api = match &self.backend_factory {
                Some(factory) => factory(&config),
                None => config.backend.build(),
            };
            inner.library = Some(Arc::new(ControlLibrary::new(api)));
        }

        inner.state = HostState::Initialized;
        info!(
            plugin = %self.manifest.name,
            version = %self.manifest.version,
            tools = self.tools.len(),
            "plugin initialized"
        );
        true
    }

    /// Enter `ShuttingDown`. Releases nothing; later requests are refused.
    pub fn shutdown(&self) {
        let mut inner = self.inner.write();
        if inner.state != HostState::ShuttingDown {
            inner.state = HostState::ShuttingDown;
            info!(plugin = %self.manifest.name, "plugin shutting down");
        }
    }

    /// Run one request end to end. Never fails: every error becomes an
    /// error envelope.
    pub fn handle_request(&self, raw: &str) -> CallToolResult {
        match self.dispatch(raw) {
            Ok(output) => {
                if output.is_error {
                    warn!(plugin = %self.manifest.name, text = %output.text, "tool reported failure");
                }
                output.into()
            }
            Err(err) => {
                warn!(plugin = %self.manifest.name, error = %err, "request failed");
                err.into()
            }
        }
    }

    fn dispatch(&self, raw: &str) -> Result<ToolOutput, PluginError> {
        let library = self.active_library()?;
        let invocation = ToolInvocation::parse(raw)?;
        let tool = self.select_tool(invocation.tool_name())?;
        debug!(plugin = %self.manifest.name, tool = tool.name(), "dispatching request");

        let ctx = HostContext {
            library: &library,
            plugin_id: &self.manifest.name,
        };
        let output = tool.execute(&invocation, &ctx);
        debug!(
            live_buffers = library.ledger().live(),
            allocations = library.ledger().allocations(),
            "request finished"
        );
        output
    }

    /// The backend, cloned out so concurrent requests do not hold the lock.
    fn active_library(&self) -> Result<Arc<ControlLibrary>, PluginError> {
        let inner = self.inner.read();
        match (&inner.state, &inner.library) {
            (HostState::Initialized, Some(library)) => Ok(library.clone()),
            _ => Err(PluginError::NotInitialized),
        }
    }

    /// The tool named by the request, or the first tool when unnamed.
    fn select_tool(&self, name: Option<&str>) -> Result<&dyn Tool, PluginError> {
        match name {
            Some(name) => self
                .tools
                .iter()
                .find(|t| t.name() == name)
                .map(|t| t.as_ref())
                .ok_or_else(|| PluginError::UnknownTool(name.to_owned())),
            None => self
                .tools
                .first()
                .map(|t| t.as_ref())
                .ok_or_else(|| PluginError::UnknownTool(String::new())),
        }
    }
}

impl fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHost")
            .field("manifest", &self.manifest)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

struct HostContext<'a> {
    library: &'a ControlLibrary,
    plugin_id: &'a str,
}

impl ToolContext for HostContext<'_> {
    fn control(&self) -> &ControlLibrary {
        self.library
    }

    fn plugin_id(&self) -> &str {
        self.plugin_id
    }
}
