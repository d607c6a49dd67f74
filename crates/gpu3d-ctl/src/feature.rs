//! Feature descriptor calls: capability queries and feature get/set.

use std::fmt::Write as _;

use tracing::debug;

use crate::error::CtlError;
use crate::session::{BestEffort, Session};
use crate::sized::{SizedBuffer, sized_fetch};
use crate::types::{
    Access, AdapterHandle, FeatureDetail, FeatureProperty, FeatureType, FeatureValue,
};

/// Supported 3D features of one adapter.
#[derive(Debug)]
pub struct FeatureCapabilitySet<'s> {
    details: SizedBuffer<'s, FeatureDetail>,
}

impl FeatureCapabilitySet<'_> {
    pub fn details(&self) -> &[FeatureDetail] {
        &self.details
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Render the section for the adapter at `index`. An empty set renders
    /// the header only.
    pub fn render(&self, index: usize) -> String {
        let mut out = format!("Device Index: {index}\n");
        for detail in self.details() {
            out.push_str(&detail.render());
        }
        out.push('\n');
        out
    }
}

impl FeatureDetail {
    /// Six-attribute summary of one capability record.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "  Feature: {} (Type: {})",
            self.feature_type.name(),
            self.feature_type.code()
        );
        let _ = writeln!(
            out,
            "    Value Type: {} ({})",
            self.value_type.name(),
            self.value_type.code()
        );
        let _ = writeln!(out, "    Custom Value Size: {}", self.custom_value_size);
        let _ = writeln!(
            out,
            "    Per App Support: {}",
            if self.per_app_support { "Yes" } else { "No" }
        );
        let _ = writeln!(out, "    Conflicting Features: {}", self.conflicting_features);
        let _ = writeln!(out, "    Misc Support: {}", self.misc_support);
        out
    }
}

impl<'a> Session<'a> {
    /// Probe, allocate and fetch the capability records of one adapter.
    pub fn capabilities(
        &self,
        adapter: AdapterHandle,
    ) -> Result<FeatureCapabilitySet<'_>, CtlError> {
        let api = self.api();
        let details = sized_fetch::<FeatureDetail, _>(self.ledger(), |count, details| {
            api.supported_3d_capabilities(adapter, count, details)
        })?;
        debug!(adapter = adapter.0, features = details.len(), "capabilities fetched");
        Ok(FeatureCapabilitySet { details })
    }

    /// Write one feature value.
    pub fn set_feature(
        &self,
        adapter: AdapterHandle,
        feature: FeatureType,
        value: FeatureValue,
    ) -> Result<(), CtlError> {
        self.call_feature(adapter, feature, Access::Set, value)
            .map(|_| ())
    }

    /// Read one feature value. `template` selects the payload shape; custom
    /// payloads must already be sized.
    pub fn get_feature(
        &self,
        adapter: AdapterHandle,
        feature: FeatureType,
        template: FeatureValue,
    ) -> Result<FeatureValue, CtlError> {
        self.call_feature(adapter, feature, Access::Get, template)
    }

    /// Read one feature value without treating failure as an error.
    pub fn read_best_effort(
        &self,
        adapter: AdapterHandle,
        feature: FeatureType,
        template: FeatureValue,
    ) -> BestEffort<FeatureValue> {
        match self.get_feature(adapter, feature, template) {
            Ok(value) => BestEffort::Read(value),
            Err(CtlError::FeatureCall { result, .. }) => {
                debug!(adapter = adapter.0, %feature, %result, "best-effort read skipped");
                BestEffort::Skipped(result)
            }
            Err(other) => {
                debug!(adapter = adapter.0, %feature, error = %other, "best-effort read skipped");
                BestEffort::Skipped(crate::types::CtlResult::ERROR_UNKNOWN)
            }
        }
    }

    fn call_feature(
        &self,
        adapter: AdapterHandle,
        feature: FeatureType,
        access: Access,
        value: FeatureValue,
    ) -> Result<FeatureValue, CtlError> {
        let mut property = FeatureProperty {
            feature,
            access,
            value,
        };
        let result = self.api().get_set_3d_feature(adapter, &mut property);
        debug!(
            adapter = adapter.0,
            %feature,
            %access,
            value_type = property.value.value_type().name(),
            %result,
            "feature call"
        );
        if result.is_success() {
            Ok(property.value)
        } else {
            Err(CtlError::FeatureCall {
                feature,
                access,
                result,
            })
        }
    }
}
