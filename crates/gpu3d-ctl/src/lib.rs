//! GPU vendor control primitives for the gpu3d plugins.
//!
//! This crate wraps the small part of a GPU vendor's device-control API that
//! the tool plugins need: opening a session, enumerating adapters, querying
//! supported 3D features, and getting or setting one feature value.
//!
//! # Layers
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`ControlApi`] | Status-returning vendor primitives (the backend seam) |
//! | [`ControlLibrary`] | One backend plus its [`BufferLedger`] |
//! | [`Session`] | One open vendor session, closed on drop |
//! | [`AdapterList`] | Adapters of a session, released on drop |
//! | [`FeatureCapabilitySet`] | Supported features of one adapter |
//! | [`SimulatedControlApi`] | In-memory backend for dry runs and tests |
//!
//! Every variable-length query goes through [`sized_fetch`]: probe for the
//! count, allocate a zeroed buffer of exactly that size, then fill it.

pub mod adapter;
pub mod api;
pub mod error;
pub mod feature;
pub mod session;
pub mod simulated;
pub mod sized;
pub mod types;

pub use adapter::AdapterList;
pub use api::{ControlApi, InitArgs, UnavailableControlApi};
pub use error::CtlError;
pub use feature::FeatureCapabilitySet;
pub use session::{BestEffort, ControlLibrary, Session};
pub use simulated::{CallRecord, SimulatedAdapter, SimulatedConfig, SimulatedControlApi};
pub use sized::{BufferLedger, SizedBuffer, SizedFetchError, sized_fetch};
pub use types::{
    Access, AdapterHandle, AnisotropicMode, ApiHandle, CtlResult, EnduranceControl,
    EnduranceGamingState, EnduranceMode, FeatureDetail, FeatureProperty, FeatureType,
    FeatureValue, PropertyValueType,
};
