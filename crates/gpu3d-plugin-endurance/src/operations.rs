//! Read-modify-write of the endurance gaming state on the first adapter.

use gpu3d_ctl::{ControlLibrary, CtlError, EnduranceGamingState, FeatureType, FeatureValue};
use tracing::{debug, info, warn};

use crate::types::{EnduranceOutcome, EnduranceRequest};

/// Apply `request` to adapter 0.
///
/// The current state is read first on a best-effort basis; a failed read is
/// logged and the write still goes ahead. A failed write is reported in the
/// outcome, not as an error.
pub fn apply_endurance_gaming(
    library: &ControlLibrary,
    request: EnduranceRequest,
) -> Result<EnduranceOutcome, CtlError> {
    let session = library.open()?;
    let adapters = session.enumerate_adapters()?;
    let adapter = adapters.first().ok_or(CtlError::NoDeviceFound)?;

    let read = session
        .read_best_effort(
            adapter,
            FeatureType::EnduranceGaming,
            EnduranceGamingState::empty_payload(),
        )
        .map(|value| match value {
            FeatureValue::Custom(bytes) => EnduranceGamingState::from_bytes(&bytes),
            FeatureValue::Enumerated(_) => None,
        });
    if !read.succeeded() {
        debug!("current endurance gaming state unavailable");
    }
    let previous = read.value().flatten();

    let mut state = previous.unwrap_or_default();
    state.control = request.control;
    state.mode = request.mode;

    let succeeded = match session.set_feature(adapter, FeatureType::EnduranceGaming, state.into()) {
        Ok(()) => {
            info!(control = %state.control, mode = %state.mode, "endurance gaming updated");
            true
        }
        Err(err) => {
            warn!(error = %err, "endurance gaming update failed");
            false
        }
    };

    drop(adapters);
    session.close();
    Ok(EnduranceOutcome {
        applied: state,
        previous,
        succeeded,
    })
}
