//! Errors produced by vendor control operations.

use thiserror::Error;

use crate::sized::SizedFetchError;
use crate::types::{Access, CtlResult, FeatureType};

/// Errors produced by sessions, enumeration and feature calls.
#[derive(Debug, Error)]
pub enum CtlError {
    /// The vendor API could not be initialized. Terminal for the request.
    #[error("ctlInit failed: {0}")]
    SessionInitFailed(CtlResult),

    /// Enumeration failed or reported zero adapters.
    #[error("No device found")]
    NoDeviceFound,

    /// The capability probe or fill call failed for one adapter.
    #[error("capability query failed: {0}")]
    CapabilityQuery(#[from] SizedFetchError),

    /// A feature get or set call failed for one adapter.
    #[error("{access} of {feature} failed: {result}")]
    FeatureCall {
        feature: FeatureType,
        access: Access,
        result: CtlResult,
    },

    /// A get returned a payload that does not decode.
    #[error("unexpected {feature} payload: {reason}")]
    UnexpectedPayload {
        feature: FeatureType,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_session_init_failed() {
        let err = CtlError::SessionInitFailed(CtlResult::ERROR_NOT_INITIALIZED);
        assert_eq!(
            err.to_string(),
            "ctlInit failed: ERROR_NOT_INITIALIZED (0x40000001)"
        );
    }

    #[test]
    fn display_no_device_found() {
        assert_eq!(CtlError::NoDeviceFound.to_string(), "No device found");
    }

    #[test]
    fn display_feature_call() {
        let err = CtlError::FeatureCall {
            feature: FeatureType::Anisotropic,
            access: Access::Set,
            result: CtlResult(0x4000_0abc),
        };
        assert_eq!(
            err.to_string(),
            "set of Anisotropic Filtering failed: 0x40000abc"
        );
    }

    #[test]
    fn from_sized_fetch_error() {
        let err = CtlError::from(SizedFetchError::Probe(CtlResult::ERROR_DEVICE_LOST));
        assert!(matches!(err, CtlError::CapabilityQuery(SizedFetchError::Probe(_))));
    }
}
