//! Apply an anisotropic filtering level to every adapter.

use gpu3d_ctl::{AnisotropicMode, ControlLibrary, CtlError, FeatureType, FeatureValue};
use tracing::{info, warn};

use crate::types::{AdapterOutcome, AnisotropicReport};

/// Set `mode` on each enumerated adapter.
///
/// A failed set is recorded for that adapter and the loop continues.
pub fn apply_anisotropic(
    library: &ControlLibrary,
    mode: AnisotropicMode,
) -> Result<AnisotropicReport, CtlError> {
    let session = library.open()?;
    let adapters = session.enumerate_adapters()?;

    let mut report = AnisotropicReport::new(mode);
    for (index, adapter) in adapters.iter() {
        let result = session.set_feature(
            adapter,
            FeatureType::Anisotropic,
            FeatureValue::Enumerated(mode.flag()),
        );
        let outcome = match result {
            Ok(()) => AdapterOutcome {
                index,
                succeeded: true,
                error: None,
            },
            Err(err) => {
                warn!(adapter = index, %mode, error = %err, "anisotropic set failed");
                AdapterOutcome {
                    index,
                    succeeded: false,
                    error: Some(err.to_string()),
                }
            }
        };
        report.outcomes.push(outcome);
    }

    info!(
        %mode,
        adapters = report.outcomes.len(),
        failed = report.failures(),
        "anisotropic mode applied"
    );
    drop(adapters);
    session.close();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gpu3d_ctl::{
        CallRecord, CtlResult, FeatureDetail, PropertyValueType, SimulatedAdapter,
        SimulatedConfig, SimulatedControlApi,
    };

    use super::*;

    fn supporting(name: &str) -> SimulatedAdapter {
        SimulatedAdapter::named(name).with_features(vec![FeatureDetail {
            feature_type: FeatureType::Anisotropic,
            value_type: PropertyValueType::Enum,
            ..FeatureDetail::default()
        }])
    }

    fn setup(adapters: Vec<SimulatedAdapter>) -> (Arc<SimulatedControlApi>, ControlLibrary) {
        let sim = Arc::new(SimulatedControlApi::new(SimulatedConfig {
            adapters,
            ..SimulatedConfig::default()
        }));
        (sim.clone(), ControlLibrary::new(sim))
    }

    #[test]
    fn sets_every_adapter() {
        let (sim, library) = setup(vec![supporting("a"), supporting("b")]);
        let report = apply_anisotropic(&library, AnisotropicMode::X16).unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failures(), 0);
        assert_eq!(sim.anisotropic(0), Some(16));
        assert_eq!(sim.anisotropic(1), Some(16));
        assert_eq!(sim.open_sessions(), 0);
        assert_eq!(library.ledger().live(), 0);
    }

    #[test]
    fn one_failure_does_not_block_others() {
        let (sim, library) = setup(vec![
            SimulatedAdapter {
                fail_set: Some(CtlResult::ERROR_INSUFFICIENT_PERMISSIONS),
                ..supporting("a")
            },
            supporting("b"),
            SimulatedAdapter::named("no-feature"),
        ]);
        let report = apply_anisotropic(&library, AnisotropicMode::X4).unwrap();

        let succeeded: Vec<bool> = report.outcomes.iter().map(|o| o.succeeded).collect();
        assert_eq!(succeeded, vec![false, true, false]);
        assert_eq!(sim.anisotropic(1), Some(4));
        assert_eq!(sim.anisotropic(0), Some(0));
        assert_eq!(report.render().matches("Status: Failed").count(), 2);
    }

    #[test]
    fn one_set_call_per_adapter() {
        let (sim, library) = setup(vec![supporting("a"), supporting("b"), supporting("c")]);
        apply_anisotropic(&library, AnisotropicMode::X2).unwrap();

        let sets = sim
            .calls()
            .into_iter()
            .filter(|c| matches!(c, CallRecord::GetSet { .. }))
            .count();
        assert_eq!(sets, 3);
    }

    #[test]
    fn no_adapters_is_no_device_found() {
        let (_sim, library) = setup(vec![]);
        assert!(matches!(
            apply_anisotropic(&library, AnisotropicMode::AppChoice),
            Err(CtlError::NoDeviceFound)
        ));
    }
}
