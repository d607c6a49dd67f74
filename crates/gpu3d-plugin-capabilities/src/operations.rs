//! Capability query across all adapters.

use gpu3d_ctl::{ControlLibrary, CtlError};
use tracing::{debug, warn};

use crate::types::{AdapterCapabilities, CapabilityReport};

/// Query the supported 3D features of every adapter.
///
/// Session and enumeration failures abort the request. A failed capability
/// probe or fill only drops that adapter from the report.
pub fn query_capabilities(library: &ControlLibrary) -> Result<CapabilityReport, CtlError> {
    let session = library.open()?;
    let adapters = session.enumerate_adapters()?;

    let mut report = CapabilityReport::default();
    for (index, adapter) in adapters.iter() {
        match session.capabilities(adapter) {
            Ok(capabilities) => {
                debug!(adapter = index, features = capabilities.len(), "capabilities rendered");
                report.sections.push(AdapterCapabilities {
                    index,
                    feature_count: capabilities.len(),
                    text: capabilities.render(index),
                });
            }
            Err(err) => {
                warn!(adapter = index, error = %err, "skipping adapter");
                report.skipped.push(index);
            }
        }
    }

    drop(adapters);
    session.close();
    Ok(report)
}
