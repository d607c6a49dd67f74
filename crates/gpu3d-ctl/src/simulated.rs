//! Deterministic in-memory control backend.
//!
//! [`SimulatedControlApi`] honours the same two-phase contract as the vendor
//! library and keeps per-adapter feature values in memory. It is the default
//! backend of every plugin (configured from TOML) and the test double of the
//! whole workspace: every call is recorded, failures can be injected per
//! adapter and per phase, and open sessions are counted.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::api::{ControlApi, InitArgs};
use crate::types::{
    Access, AdapterHandle, AnisotropicMode, ApiHandle, CtlResult, EnduranceGamingState,
    FeatureDetail, FeatureProperty, FeatureType, FeatureValue,
};

/// Simulated machine: the adapters it exposes and global failure switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    pub adapters: Vec<SimulatedAdapter>,
    /// Status returned by every init call instead of a handle.
    pub fail_init: Option<CtlResult>,
    /// Status returned by the enumeration count probe.
    pub fail_enumerate: Option<CtlResult>,
    /// Status returned by the enumeration call that fills the buffer.
    pub fail_enumerate_fill: Option<CtlResult>,
}

/// One simulated adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedAdapter {
    pub name: String,
    /// Capability records; get/set of a feature not listed here fails with
    /// `ERROR_UNSUPPORTED_FEATURE`.
    pub features: Vec<FeatureDetail>,
    pub endurance: EnduranceGamingState,
    /// Current anisotropic flag (0, 2, 4, 8 or 16).
    pub anisotropic: u32,
    pub fail_probe: Option<CtlResult>,
    pub fail_fill: Option<CtlResult>,
    pub fail_get: Option<CtlResult>,
    pub fail_set: Option<CtlResult>,
}

impl SimulatedAdapter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_features(mut self, features: Vec<FeatureDetail>) -> Self {
        self.features = features;
        self
    }

    pub fn with_endurance(mut self, endurance: EnduranceGamingState) -> Self {
        self.endurance = endurance;
        self
    }

    fn supports(&self, feature: FeatureType) -> bool {
        self.features.iter().any(|d| d.feature_type == feature)
    }
}

/// A call received by the simulated backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecord {
    Init,
    Close,
    /// `buffer_len` is `None` for the count probe.
    EnumerateDevices { buffer_len: Option<usize> },
    SupportedCapabilities {
        adapter: usize,
        buffer_len: Option<usize>,
    },
    GetSet {
        adapter: usize,
        feature: FeatureType,
        access: Access,
    },
}

#[derive(Debug, Default)]
struct SimState {
    adapters: Vec<SimulatedAdapter>,
    /// Values of features without a dedicated slot, keyed by adapter index
    /// and feature code.
    other_values: HashMap<(usize, u32), FeatureValue>,
    calls: Vec<CallRecord>,
    open: HashSet<usize>,
    next_handle: usize,
}

/// In-memory [`ControlApi`] implementation.
#[derive(Debug)]
pub struct SimulatedControlApi {
    fail_init: Option<CtlResult>,
    fail_enumerate: Option<CtlResult>,
    fail_enumerate_fill: Option<CtlResult>,
    state: Mutex<SimState>,
}

impl SimulatedControlApi {
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            fail_init: config.fail_init,
            fail_enumerate: config.fail_enumerate,
            fail_enumerate_fill: config.fail_enumerate_fill,
            state: Mutex::new(SimState {
                adapters: config.adapters,
                ..SimState::default()
            }),
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().calls.clone()
    }

    /// Sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.state.lock().open.len()
    }

    /// Current anisotropic flag of adapter `index`.
    pub fn anisotropic(&self, index: usize) -> Option<u32> {
        self.state.lock().adapters.get(index).map(|a| a.anisotropic)
    }

    /// Current endurance gaming state of adapter `index`.
    pub fn endurance(&self, index: usize) -> Option<EnduranceGamingState> {
        self.state.lock().adapters.get(index).map(|a| a.endurance)
    }

    fn adapter_index(handle: AdapterHandle) -> Option<usize> {
        handle.0.checked_sub(1)
    }
}

/// Copy up to `count` records into `buffer`, reporting how many were written.
fn fill<T: Clone>(source: &[T], count: &mut u32, buffer: Option<&mut [T]>) {
    match buffer {
        None => *count = source.len() as u32,
        Some(buffer) => {
            let n = source.len().min(buffer.len()).min(*count as usize);
            buffer[..n].clone_from_slice(&source[..n]);
            *count = n as u32;
        }
    }
}

impl ControlApi for SimulatedControlApi {
    fn init(&self, _args: &InitArgs) -> Result<ApiHandle, CtlResult> {
        let mut state = self.state.lock();
        state.calls.push(CallRecord::Init);
        if let Some(result) = self.fail_init {
            return Err(result);
        }
        state.next_handle += 1;
        let handle = state.next_handle;
        state.open.insert(handle);
        trace!(handle, "simulated session opened");
        Ok(ApiHandle(handle))
    }

    fn close(&self, api: ApiHandle) -> CtlResult {
        let mut state = self.state.lock();
        state.calls.push(CallRecord::Close);
        if state.open.remove(&api.0) {
            CtlResult::SUCCESS
        } else {
            CtlResult::ERROR_INVALID_ARGUMENT
        }
    }

    fn enumerate_devices(
        &self,
        api: ApiHandle,
        count: &mut u32,
        devices: Option<&mut [AdapterHandle]>,
    ) -> CtlResult {
        let mut state = self.state.lock();
        state.calls.push(CallRecord::EnumerateDevices {
            buffer_len: devices.as_ref().map(|d| d.len()),
        });
        if !state.open.contains(&api.0) {
            return CtlResult::ERROR_NOT_INITIALIZED;
        }
        let injected = if devices.is_none() {
            self.fail_enumerate
        } else {
            self.fail_enumerate_fill
        };
        if let Some(result) = injected {
            return result;
        }
        let handles: Vec<AdapterHandle> = (1..=state.adapters.len()).map(AdapterHandle).collect();
        fill(&handles, count, devices);
        CtlResult::SUCCESS
    }

    fn supported_3d_capabilities(
        &self,
        adapter: AdapterHandle,
        count: &mut u32,
        details: Option<&mut [FeatureDetail]>,
    ) -> CtlResult {
        let mut state = self.state.lock();
        let index = Self::adapter_index(adapter).unwrap_or(usize::MAX);
        state.calls.push(CallRecord::SupportedCapabilities {
            adapter: index,
            buffer_len: details.as_ref().map(|d| d.len()),
        });
        let Some(sim) = state.adapters.get(index) else {
            return CtlResult::ERROR_INVALID_ARGUMENT;
        };
        let injected = if details.is_none() {
            sim.fail_probe
        } else {
            sim.fail_fill
        };
        if let Some(result) = injected {
            return result;
        }
        fill(&sim.features, count, details);
        CtlResult::SUCCESS
    }

    fn get_set_3d_feature(
        &self,
        adapter: AdapterHandle,
        property: &mut FeatureProperty,
    ) -> CtlResult {
        let mut state = self.state.lock();
        let index = Self::adapter_index(adapter).unwrap_or(usize::MAX);
        state.calls.push(CallRecord::GetSet {
            adapter: index,
            feature: property.feature,
            access: property.access,
        });

        let SimState {
            adapters,
            other_values,
            ..
        } = &mut *state;
        let Some(sim) = adapters.get_mut(index) else {
            return CtlResult::ERROR_INVALID_ARGUMENT;
        };
        if !sim.supports(property.feature) {
            return CtlResult::ERROR_UNSUPPORTED_FEATURE;
        }
        let injected = match property.access {
            Access::Get => sim.fail_get,
            Access::Set => sim.fail_set,
        };
        if let Some(result) = injected {
            return result;
        }

        match (property.feature, property.access, &mut property.value) {
            (FeatureType::Anisotropic, Access::Get, FeatureValue::Enumerated(flag)) => {
                *flag = sim.anisotropic;
            }
            (FeatureType::Anisotropic, Access::Set, FeatureValue::Enumerated(flag)) => {
                if AnisotropicMode::from_flag(*flag).is_none() {
                    return CtlResult::ERROR_INVALID_ARGUMENT;
                }
                sim.anisotropic = *flag;
            }
            (FeatureType::EnduranceGaming, Access::Get, FeatureValue::Custom(bytes)) => {
                if bytes.len() < EnduranceGamingState::PAYLOAD_SIZE {
                    return CtlResult::ERROR_INVALID_ARGUMENT;
                }
                bytes[..EnduranceGamingState::PAYLOAD_SIZE]
                    .copy_from_slice(&sim.endurance.to_bytes());
            }
            (FeatureType::EnduranceGaming, Access::Set, FeatureValue::Custom(bytes)) => {
                match EnduranceGamingState::from_bytes(bytes) {
                    Some(state) => sim.endurance = state,
                    None => return CtlResult::ERROR_INVALID_ARGUMENT,
                }
            }
            (FeatureType::Anisotropic | FeatureType::EnduranceGaming, _, _) => {
                return CtlResult::ERROR_INVALID_ARGUMENT;
            }
            (feature, Access::Get, value) => {
                if let Some(stored) = other_values.get(&(index, feature.code())) {
                    if stored.value_type() != value.value_type() {
                        return CtlResult::ERROR_INVALID_ARGUMENT;
                    }
                    *value = stored.clone();
                }
            }
            (feature, Access::Set, value) => {
                other_values.insert((index, feature.code()), value.clone());
            }
        }
        CtlResult::SUCCESS
    }
}
