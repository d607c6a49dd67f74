//! Outcome of an endurance gaming update.

use std::fmt::Write;

use gpu3d_ctl::{EnduranceControl, EnduranceGamingState, EnduranceMode};
use serde::Serialize;

pub const SET_SUCCEEDED: &str = "Endurance Gaming mode/control set successfully.";
pub const SET_FAILED: &str = "Failed to set Endurance Gaming mode/control.";

/// Validated request values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnduranceRequest {
    pub control: EnduranceControl,
    pub mode: EnduranceMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnduranceOutcome {
    pub applied: EnduranceGamingState,
    /// State read before the update; absent when the read failed.
    pub previous: Option<EnduranceGamingState>,
    pub succeeded: bool,
}

impl EnduranceOutcome {
    pub fn render(&self) -> String {
        if !self.succeeded {
            return SET_FAILED.to_owned();
        }
        let mut out = String::from(SET_SUCCEEDED);
        let _ = write!(
            out,
            "\n  Control: {} ({})\n  Mode: {} ({})",
            self.applied.control,
            self.applied.control.code(),
            self.applied.mode,
            self.applied.mode.code(),
        );
        if let Some(previous) = self.previous {
            let _ = write!(
                out,
                "\n  Previous Control: {} ({})\n  Previous Mode: {} ({})",
                previous.control,
                previous.control.code(),
                previous.mode,
                previous.mode.code(),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(control: EnduranceControl, mode: EnduranceMode) -> EnduranceGamingState {
        EnduranceGamingState { control, mode }
    }

    #[test]
    fn success_with_previous() {
        let outcome = EnduranceOutcome {
            applied: state(EnduranceControl::Auto, EnduranceMode::MaximumBattery),
            previous: Some(state(EnduranceControl::Off, EnduranceMode::Balanced)),
            succeeded: true,
        };
        assert_eq!(
            outcome.render(),
            "Endurance Gaming mode/control set successfully.\n  \
             Control: AUTO (2)\n  Mode: MAXIMUM_BATTERY (2)\n  \
             Previous Control: OFF (0)\n  Previous Mode: BALANCED (1)"
        );
    }

    #[test]
    fn success_without_previous() {
        let outcome = EnduranceOutcome {
            applied: state(EnduranceControl::On, EnduranceMode::BetterPerformance),
            previous: None,
            succeeded: true,
        };
        let text = outcome.render();
        assert!(text.starts_with(SET_SUCCEEDED));
        assert!(!text.contains("Previous"));
    }

    #[test]
    fn failure_is_fixed_text() {
        let outcome = EnduranceOutcome {
            applied: EnduranceGamingState::default(),
            previous: None,
            succeeded: false,
        };
        assert_eq!(outcome.render(), SET_FAILED);
    }
}
