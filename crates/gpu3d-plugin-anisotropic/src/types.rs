//! Per-adapter outcomes of an anisotropic filtering change.

use std::fmt::Write;

use gpu3d_ctl::AnisotropicMode;
use serde::Serialize;

/// Text returned when no adapter was processed.
pub const NO_DEVICE_PROCESSED: &str = "No device processed.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterOutcome {
    pub index: usize,
    pub succeeded: bool,
    /// Failure reason, logged but not part of the rendered text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnisotropicReport {
    pub mode: AnisotropicMode,
    pub outcomes: Vec<AdapterOutcome>,
}

impl AnisotropicReport {
    pub fn new(mode: AnisotropicMode) -> Self {
        Self {
            mode,
            outcomes: Vec::new(),
        }
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    /// One block per adapter, or [`NO_DEVICE_PROCESSED`].
    pub fn render(&self) -> String {
        if self.outcomes.is_empty() {
            return NO_DEVICE_PROCESSED.to_owned();
        }
        let mut out = String::new();
        for outcome in &self.outcomes {
            let _ = write!(
                out,
                "Device Index: {}\n  Set Anisotropic Mode: {} (Flag: {})\n  Status: {}\n\n",
                outcome.index,
                self.mode.name(),
                self.mode.flag(),
                if outcome.succeeded { "Success" } else { "Failed" },
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_block_per_adapter() {
        let report = AnisotropicReport {
            mode: AnisotropicMode::X8,
            outcomes: vec![
                AdapterOutcome {
                    index: 0,
                    succeeded: true,
                    error: None,
                },
                AdapterOutcome {
                    index: 1,
                    succeeded: false,
                    error: Some("device lost".into()),
                },
            ],
        };
        assert_eq!(
            report.render(),
            "Device Index: 0\n  Set Anisotropic Mode: 8X (Flag: 8)\n  Status: Success\n\n\
             Device Index: 1\n  Set Anisotropic Mode: 8X (Flag: 8)\n  Status: Failed\n\n"
        );
        assert_eq!(report.failures(), 1);
    }

    #[test]
    fn empty_report_is_sentinel() {
        assert_eq!(
            AnisotropicReport::new(AnisotropicMode::AppChoice).render(),
            NO_DEVICE_PROCESSED
        );
    }
}
