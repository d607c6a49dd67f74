//! The vendor control API seam.
//!
//! [`ControlApi`] mirrors the five vendor primitives this workspace relies
//! on, keeping their status-code contract: every call returns a
//! [`CtlResult`], and variable-length queries take an in/out count plus an
//! optional buffer. Implementations must never write to a buffer that was
//! not passed in, and must report the required count when called without
//! one.

use crate::types::{AdapterHandle, ApiHandle, CtlResult, FeatureDetail, FeatureProperty};

/// Major version of the control API this crate was written against.
pub const CTL_IMPL_MAJOR_VERSION: u32 = 1;
/// Minor version of the control API this crate was written against.
pub const CTL_IMPL_MINOR_VERSION: u32 = 1;

/// Pack a major/minor pair the way the vendor API expects.
pub const fn make_version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor & 0x0000_ffff)
}

/// Arguments for the session init call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitArgs {
    pub app_version: u32,
    pub flags: u32,
}

impl Default for InitArgs {
    fn default() -> Self {
        Self {
            app_version: make_version(CTL_IMPL_MAJOR_VERSION, CTL_IMPL_MINOR_VERSION),
            flags: 0,
        }
    }
}

/// Primitive calls of the vendor control API.
///
/// Thread-safety of the underlying driver is unspecified; implementations
/// are `Send + Sync` only so a loaded plugin can be shared by its host.
pub trait ControlApi: Send + Sync {
    /// Open a session.
    fn init(&self, args: &InitArgs) -> Result<ApiHandle, CtlResult>;

    /// Close a session opened by [`ControlApi::init`].
    fn close(&self, api: ApiHandle) -> CtlResult;

    /// Enumerate adapters.
    ///
    /// With `devices == None`, stores the adapter count in `count`. With a
    /// buffer, fills at most `count` handles and stores how many were
    /// written.
    fn enumerate_devices(
        &self,
        api: ApiHandle,
        count: &mut u32,
        devices: Option<&mut [AdapterHandle]>,
    ) -> CtlResult;

    /// Query the 3D features an adapter supports.
    ///
    /// Same two-phase contract as [`ControlApi::enumerate_devices`].
    fn supported_3d_capabilities(
        &self,
        adapter: AdapterHandle,
        count: &mut u32,
        details: Option<&mut [FeatureDetail]>,
    ) -> CtlResult;

    /// Get or set one feature. A get writes the current value into
    /// `property.value` (custom payloads are filled in place).
    fn get_set_3d_feature(&self, adapter: AdapterHandle, property: &mut FeatureProperty)
        -> CtlResult;
}

/// Backend used when no vendor library could be made available.
///
/// Every session init fails, so each request reports `SessionInitFailed`
/// instead of the plugin failing to load.
#[derive(Debug, Clone)]
pub struct UnavailableControlApi {
    reason: String,
}

impl UnavailableControlApi {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl ControlApi for UnavailableControlApi {
    fn init(&self, _args: &InitArgs) -> Result<ApiHandle, CtlResult> {
        tracing::debug!(reason = %self.reason, "control API unavailable");
        Err(CtlResult::ERROR_NOT_INITIALIZED)
    }

    fn close(&self, _api: ApiHandle) -> CtlResult {
        CtlResult::ERROR_NOT_INITIALIZED
    }

    fn enumerate_devices(
        &self,
        _api: ApiHandle,
        _count: &mut u32,
        _devices: Option<&mut [AdapterHandle]>,
    ) -> CtlResult {
        CtlResult::ERROR_NOT_INITIALIZED
    }

    fn supported_3d_capabilities(
        &self,
        _adapter: AdapterHandle,
        _count: &mut u32,
        _details: Option<&mut [FeatureDetail]>,
    ) -> CtlResult {
        CtlResult::ERROR_NOT_INITIALIZED
    }

    fn get_set_3d_feature(
        &self,
        _adapter: AdapterHandle,
        _property: &mut FeatureProperty,
    ) -> CtlResult {
        CtlResult::ERROR_NOT_INITIALIZED
    }
}
