//! Value types shared with the vendor control API.
//!
//! Numeric codes mirror the vendor's enumerations so that a backend can pass
//! them through unchanged. Codes this crate does not know about are kept
//! rather than rejected, so a newer driver never breaks rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status codes and handles
// ---------------------------------------------------------------------------

/// Status code returned by every vendor control call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CtlResult(pub u32);

impl CtlResult {
    pub const SUCCESS: Self = Self(0x0000_0000);
    pub const ERROR_NOT_INITIALIZED: Self = Self(0x4000_0001);
    pub const ERROR_ALREADY_INITIALIZED: Self = Self(0x4000_0002);
    pub const ERROR_DEVICE_LOST: Self = Self(0x4000_0003);
    pub const ERROR_OUT_OF_HOST_MEMORY: Self = Self(0x4000_0004);
    pub const ERROR_INSUFFICIENT_PERMISSIONS: Self = Self(0x4000_0006);
    pub const ERROR_NOT_AVAILABLE: Self = Self(0x4000_0007);
    pub const ERROR_INVALID_ARGUMENT: Self = Self(0x4000_000B);
    pub const ERROR_UNSUPPORTED_FEATURE: Self = Self(0x4000_0010);
    pub const ERROR_UNKNOWN: Self = Self(0x4000_FFFF);

    /// Whether the call succeeded.
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Symbolic name for the codes this crate knows.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "SUCCESS",
            Self::ERROR_NOT_INITIALIZED => "ERROR_NOT_INITIALIZED",
            Self::ERROR_ALREADY_INITIALIZED => "ERROR_ALREADY_INITIALIZED",
            Self::ERROR_DEVICE_LOST => "ERROR_DEVICE_LOST",
            Self::ERROR_OUT_OF_HOST_MEMORY => "ERROR_OUT_OF_HOST_MEMORY",
            Self::ERROR_INSUFFICIENT_PERMISSIONS => "ERROR_INSUFFICIENT_PERMISSIONS",
            Self::ERROR_NOT_AVAILABLE => "ERROR_NOT_AVAILABLE",
            Self::ERROR_INVALID_ARGUMENT => "ERROR_INVALID_ARGUMENT",
            Self::ERROR_UNSUPPORTED_FEATURE => "ERROR_UNSUPPORTED_FEATURE",
            Self::ERROR_UNKNOWN => "ERROR_UNKNOWN",
            _ => return None,
        })
    }
}

impl fmt::Display for CtlResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({:#010x})", self.0),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

/// Opaque handle to an open vendor API session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ApiHandle(pub usize);

/// Opaque handle to one adapter, valid only inside the session that
/// enumerated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AdapterHandle(pub usize);

// ---------------------------------------------------------------------------
// Feature and value-type codes
// ---------------------------------------------------------------------------

/// 3D feature addressed by a capability record or a get/set call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum FeatureType {
    FramePacing,
    EnduranceGaming,
    FrameLimit,
    Anisotropic,
    Cmaa,
    TextureFilteringQuality,
    AdaptiveTessellation,
    SharpeningFilter,
    Msaa,
    GamingFlipModes,
    AdaptiveSyncPlus,
    AppProfiles,
    AppProfileDetails,
    EmulatedTyped64BitAtomics,
    VrrWindowedBlt,
    GlobalOrPerApp,
    LowLatency,
    /// A code this crate has no name for.
    Other(u32),
}

impl FeatureType {
    const KNOWN: [FeatureType; 17] = [
        Self::FramePacing,
        Self::EnduranceGaming,
        Self::FrameLimit,
        Self::Anisotropic,
        Self::Cmaa,
        Self::TextureFilteringQuality,
        Self::AdaptiveTessellation,
        Self::SharpeningFilter,
        Self::Msaa,
        Self::GamingFlipModes,
        Self::AdaptiveSyncPlus,
        Self::AppProfiles,
        Self::AppProfileDetails,
        Self::EmulatedTyped64BitAtomics,
        Self::VrrWindowedBlt,
        Self::GlobalOrPerApp,
        Self::LowLatency,
    ];

    pub fn from_code(code: u32) -> Self {
        Self::KNOWN
            .get(code as usize)
            .copied()
            .unwrap_or(Self::Other(code))
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Other(code) => code,
            known => Self::KNOWN
                .iter()
                .position(|f| *f == known)
                .map_or(u32::MAX, |i| i as u32),
        }
    }

    /// Display name used in capability reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::FramePacing => "Frame Pacing",
            Self::EnduranceGaming => "Endurance Gaming",
            Self::FrameLimit => "Frame Limit",
            Self::Anisotropic => "Anisotropic Filtering",
            Self::Cmaa => "CMAA",
            Self::TextureFilteringQuality => "Texture Filtering Quality",
            Self::AdaptiveTessellation => "Adaptive Tessellation",
            Self::SharpeningFilter => "Sharpening Filter",
            Self::Msaa => "MSAA",
            Self::GamingFlipModes => "Gaming Flip Modes",
            Self::AdaptiveSyncPlus => "Adaptive Sync Plus",
            Self::AppProfiles => "App Profiles",
            Self::AppProfileDetails => "App Profile Details",
            Self::EmulatedTyped64BitAtomics => "Emulated Typed 64-bit Atomics",
            Self::VrrWindowedBlt => "VRR Windowed BLT",
            Self::GlobalOrPerApp => "Global Or Per App",
            Self::LowLatency => "Low Latency",
            Self::Other(_) => "Unknown",
        }
    }
}

impl From<u32> for FeatureType {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

impl From<FeatureType> for u32 {
    fn from(feature: FeatureType) -> Self {
        feature.code()
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a feature's value is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum PropertyValueType {
    Bool,
    Float,
    Int32,
    Uint32,
    Enum,
    Custom,
    Other(u32),
}

impl PropertyValueType {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Bool,
            1 => Self::Float,
            2 => Self::Int32,
            3 => Self::Uint32,
            4 => Self::Enum,
            5 => Self::Custom,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Bool => 0,
            Self::Float => 1,
            Self::Int32 => 2,
            Self::Uint32 => 3,
            Self::Enum => 4,
            Self::Custom => 5,
            Self::Other(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Float => "FLOAT",
            Self::Int32 => "INT32",
            Self::Uint32 => "UINT32",
            Self::Enum => "ENUM",
            Self::Custom => "CUSTOM",
            Self::Other(_) => "UNKNOWN",
        }
    }
}

impl From<u32> for PropertyValueType {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

impl From<PropertyValueType> for u32 {
    fn from(value_type: PropertyValueType) -> Self {
        value_type.code()
    }
}

// ---------------------------------------------------------------------------
// Capability records
// ---------------------------------------------------------------------------

/// One supported feature as reported by the capability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDetail {
    pub feature_type: FeatureType,
    pub value_type: PropertyValueType,
    #[serde(default)]
    pub custom_value_size: u32,
    #[serde(default)]
    pub per_app_support: bool,
    /// Bitmask of features that cannot be enabled together with this one.
    #[serde(default)]
    pub conflicting_features: u64,
    #[serde(default)]
    pub misc_support: u32,
}

/// The zeroed record a detail buffer starts out with.
impl Default for FeatureDetail {
    fn default() -> Self {
        Self {
            feature_type: FeatureType::from_code(0),
            value_type: PropertyValueType::from_code(0),
            custom_value_size: 0,
            per_app_support: false,
            conflicting_features: 0,
            misc_support: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Feature values
// ---------------------------------------------------------------------------

/// Payload carried by a feature get/set call.
///
/// The value type and custom size sent to the vendor are derived from the
/// variant, so they can never disagree with the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureValue {
    /// Inline enumerated value (for example an anisotropic flag).
    Enumerated(u32),
    /// Caller-allocated binary blob; filled in place by a get.
    Custom(Vec<u8>),
}

impl FeatureValue {
    pub fn value_type(&self) -> PropertyValueType {
        match self {
            Self::Enumerated(_) => PropertyValueType::Enum,
            Self::Custom(_) => PropertyValueType::Custom,
        }
    }

    pub fn custom_size(&self) -> usize {
        match self {
            Self::Enumerated(_) => 0,
            Self::Custom(bytes) => bytes.len(),
        }
    }
}

/// Direction of a feature property call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Get,
    Set,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::Set => "set",
        })
    }
}

/// Request/response structure for a get or set of one feature on one
/// adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureProperty {
    pub feature: FeatureType,
    pub access: Access,
    pub value: FeatureValue,
}

// ---------------------------------------------------------------------------
// Anisotropic filtering
// ---------------------------------------------------------------------------

/// Anisotropic filtering level, indexed 0..=4 by tool callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnisotropicMode {
    AppChoice,
    X2,
    X4,
    X8,
    X16,
}

impl AnisotropicMode {
    pub const ALL: [AnisotropicMode; 5] =
        [Self::AppChoice, Self::X2, Self::X4, Self::X8, Self::X16];

    /// Map a caller-facing index to a mode. `None` outside 0..=4.
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> u32 {
        match self {
            Self::AppChoice => 0,
            Self::X2 => 1,
            Self::X4 => 2,
            Self::X8 => 3,
            Self::X16 => 4,
        }
    }

    /// Vendor enumerated flag.
    pub fn flag(self) -> u32 {
        match self {
            Self::AppChoice => 0,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
        }
    }

    pub fn from_flag(flag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.flag() == flag)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AppChoice => "App Choice",
            Self::X2 => "2X",
            Self::X4 => "4X",
            Self::X8 => "8X",
            Self::X16 => "16X",
        }
    }
}

impl fmt::Display for AnisotropicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Endurance gaming
// ---------------------------------------------------------------------------

/// Endurance gaming control setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnduranceControl {
    #[default]
    Off,
    On,
    Auto,
}

impl EnduranceControl {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            2 => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Auto => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for EnduranceControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Endurance gaming power/quality trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnduranceMode {
    #[default]
    BetterPerformance,
    Balanced,
    MaximumBattery,
}

impl EnduranceMode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::BetterPerformance),
            1 => Some(Self::Balanced),
            2 => Some(Self::MaximumBattery),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::BetterPerformance => 0,
            Self::Balanced => 1,
            Self::MaximumBattery => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BetterPerformance => "BETTER_PERFORMANCE",
            Self::Balanced => "BALANCED",
            Self::MaximumBattery => "MAXIMUM_BATTERY",
        }
    }
}

impl fmt::Display for EnduranceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Custom payload of the endurance gaming feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnduranceGamingState {
    #[serde(default)]
    pub control: EnduranceControl,
    #[serde(default)]
    pub mode: EnduranceMode,
}

impl EnduranceGamingState {
    /// Size of the vendor payload: two little-endian `u32` fields.
    pub const PAYLOAD_SIZE: usize = 8;

    pub fn to_bytes(self) -> [u8; Self::PAYLOAD_SIZE] {
        let mut bytes = [0u8; Self::PAYLOAD_SIZE];
        bytes[..4].copy_from_slice(&self.control.code().to_le_bytes());
        bytes[4..].copy_from_slice(&self.mode.code().to_le_bytes());
        bytes
    }

    /// Decode a payload; `None` if it is short or holds unknown codes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let control = u32::from_le_bytes(bytes.get(..4)?.try_into().ok()?);
        let mode = u32::from_le_bytes(bytes.get(4..8)?.try_into().ok()?);
        Some(Self {
            control: EnduranceControl::from_code(i64::from(control))?,
            mode: EnduranceMode::from_code(i64::from(mode))?,
        })
    }

    /// A zeroed payload buffer ready for a get call.
    pub fn empty_payload() -> FeatureValue {
        FeatureValue::Custom(vec![0; Self::PAYLOAD_SIZE])
    }
}

impl From<EnduranceGamingState> for FeatureValue {
    fn from(state: EnduranceGamingState) -> Self {
        FeatureValue::Custom(state.to_bytes().to_vec())
    }
}
