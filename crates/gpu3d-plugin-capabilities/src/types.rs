//! Types for the capability report.

use serde::Serialize;

/// Text returned when no adapter contributed a section.
pub const NO_CAPABILITIES: &str = "No 3D feature capabilities found.";

/// Rendered capabilities of one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterCapabilities {
    pub index: usize,
    pub feature_count: usize,
    pub text: String,
}

/// Aggregate report over every enumerated adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    pub sections: Vec<AdapterCapabilities>,
    /// Adapters whose capability query failed.
    pub skipped: Vec<usize>,
}

impl CapabilityReport {
    /// Concatenated sections, or [`NO_CAPABILITIES`] when there are none.
    pub fn render(&self) -> String {
        let text: String = self.sections.iter().map(|s| s.text.as_str()).collect();
        if text.is_empty() {
            NO_CAPABILITIES.to_owned()
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_renders_sentinel() {
        let report = CapabilityReport {
            sections: vec![],
            skipped: vec![0, 1],
        };
        assert_eq!(report.render(), NO_CAPABILITIES);
    }

    #[test]
    fn sections_concatenate_in_order() {
        let report = CapabilityReport {
            sections: vec![
                AdapterCapabilities {
                    index: 0,
                    feature_count: 0,
                    text: "Device Index: 0\n\n".into(),
                },
                AdapterCapabilities {
                    index: 2,
                    feature_count: 0,
                    text: "Device Index: 2\n\n".into(),
                },
            ],
            skipped: vec![1],
        };
        assert_eq!(report.render(), "Device Index: 0\n\nDevice Index: 2\n\n");
    }
}
