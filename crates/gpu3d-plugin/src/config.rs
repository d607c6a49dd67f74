//! Plugin configuration discovery and loading.
//!
//! A plugin reads one optional TOML file, located by the
//! `GPU3D_PLUGIN_CONFIG` environment variable. Without it every field takes
//! its default: a disabled backend and `warn` logging. A disabled backend
//! answers every request with a failed session init.
//!
//! ```toml
//! [log]
//! filter = "gpu3d_ctl=debug,info"
//!
//! [backend]
//! kind = "simulated"
//!
//! [[backend.adapters]]
//! name = "Adapter 0"
//! anisotropic = 4
//!
//! [[backend.adapters.features]]
//! feature_type = 3
//! value_type = 4
//! ```
//!
//! The log filter is taken from `GPU3D_LOG` first, then `log.filter`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gpu3d_ctl::{ControlApi, SimulatedConfig, SimulatedControlApi, UnavailableControlApi};
use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "GPU3D_PLUGIN_CONFIG";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "GPU3D_LOG";

/// Filter used when neither the environment nor the file sets one.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Read access to environment variables.
pub trait Environment: Send + Sync {
    fn get_var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEnvironment;

impl Environment for NativeEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables, for embedders and tests.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment(HashMap<String, String>);

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Logging section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. `"gpu3d_ctl=debug,warn"`.
    pub filter: Option<String>,
}

/// Which control backend the plugin talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-memory adapters.
    Simulated(SimulatedConfig),
    /// No backend: every request reports a failed session init.
    Disabled {
        #[serde(default = "default_disabled_reason")]
        reason: String,
    },
}

/// Reason reported by the backend used when no `[backend]` is configured.
pub const NO_BACKEND_REASON: &str = "no control backend configured";

fn default_disabled_reason() -> String {
    "control backend disabled by configuration".into()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Disabled {
            reason: NO_BACKEND_REASON.into(),
        }
    }
}

impl BackendConfig {
    /// Construct the backend this section describes.
    pub fn build(&self) -> Arc<dyn ControlApi> {
        match self {
            Self::Simulated(config) => Arc::new(SimulatedControlApi::new(config.clone())),
            Self::Disabled { reason } => Arc::new(UnavailableControlApi::new(reason.clone())),
        }
    }
}

/// Full plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub log: LogConfig,
    pub backend: BackendConfig,
}

impl PluginConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, PluginError> {
        toml::from_str(text).map_err(|e| PluginError::LoadFailed(format!("config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, PluginError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Locate and load the configuration.
    ///
    /// Returns defaults when `GPU3D_PLUGIN_CONFIG` is unset. A file that
    /// cannot be read or parsed also yields defaults, so a bad config never
    /// prevents the plugin from loading; the failure is kept in the returned
    /// origin. Nothing is logged here: logging is not installed until the
    /// config has been read, so callers emit [`Discovered::report`] after
    /// installing it.
    pub fn discover(env: &dyn Environment) -> Discovered {
        let Some(path) = env.get_var(CONFIG_ENV).filter(|p| !p.trim().is_empty()) else {
            return Discovered {
                config: Self::default(),
                origin: ConfigOrigin::Defaults,
            };
        };
        let path = PathBuf::from(path);
        match Self::load(&path) {
            Ok(config) => Discovered {
                config,
                origin: ConfigOrigin::File(path),
            },
            Err(error) => Discovered {
                config: Self::default(),
                origin: ConfigOrigin::Fallback { path, error },
            },
        }
    }

    /// Effective log filter: `GPU3D_LOG`, then `log.filter`, then `warn`.
    pub fn log_filter(&self, env: &dyn Environment) -> String {
        env.get_var(LOG_ENV)
            .filter(|f| !f.trim().is_empty())
            .or_else(|| self.log.filter.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
    }
}

/// Where a resolved configuration came from.
#[derive(Debug)]
pub enum ConfigOrigin {
    /// `GPU3D_PLUGIN_CONFIG` unset.
    Defaults,
    /// Loaded from this file.
    File(PathBuf),
    /// The file could not be used; defaults apply.
    Fallback { path: PathBuf, error: PluginError },
    /// Supplied by the embedder.
    Provided,
}

/// Result of [`PluginConfig::discover`].
#[derive(Debug)]
pub struct Discovered {
    pub config: PluginConfig,
    pub origin: ConfigOrigin,
}

impl Discovered {
    pub fn provided(config: PluginConfig) -> Self {
        Self {
            config,
            origin: ConfigOrigin::Provided,
        }
    }

    /// The load failure, if the file was rejected.
    pub fn error(&self) -> Option<&PluginError> {
        match &self.origin {
            ConfigOrigin::Fallback { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Log how the configuration was resolved.
    pub fn report(&self) {
        match &self.origin {
            ConfigOrigin::Defaults => tracing::info!(
                env = CONFIG_ENV,
                "no config file configured, control backend disabled"
            ),
            ConfigOrigin::File(path) => {
                tracing::debug!(path = %path.display(), "config loaded")
            }
            ConfigOrigin::Fallback { path, error } => tracing::warn!(
                path = %path.display(),
                error = %error,
                "config unusable, using defaults"
            ),
            ConfigOrigin::Provided => tracing::debug!("using provided config"),
        }
    }
}
