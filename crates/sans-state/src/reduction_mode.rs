//! Which banks are reduced and how LAB and HAB are merged.

use std::collections::BTreeMap;

use sans_model::{
    DetectorType, FitModeForMerge, Issue, ReductionDimensionality, ReductionMode, ValidationReport,
};

use crate::checks::check_optional_range;
use crate::state::{Leaf, state_leaf};

state_leaf! {
    /// Reduction mode and merge settings.
    pub struct StateReductionMode as "StateReductionMode" {
        reduction_mode / set_reduction_mode: ReductionMode = ReductionMode::Lab,
        reduction_dimensionality / set_reduction_dimensionality: ReductionDimensionality =
            ReductionDimensionality::OneDim,
        merge_fit_mode / set_merge_fit_mode: FitModeForMerge = FitModeForMerge::NoFit,
        merge_shift / set_merge_shift: f64 = 0.0,
        merge_scale / set_merge_scale: f64 = 1.0,
        /// Q range used when fitting the LAB/HAB overlap.
        merge_range_min / set_merge_range_min: Option<f64> = None,
        merge_range_max / set_merge_range_max: Option<f64> = None,
        /// Restrict the merged output to `merge_min..merge_max`.
        merge_mask / set_merge_mask: bool = false,
        merge_min / set_merge_min: Option<f64> = None,
        merge_max / set_merge_max: Option<f64> = None,
        /// Component name per bank ("LAB"/"HAB"), filled by the builder factory.
        detector_names: BTreeMap<String, String> = BTreeMap::new(),
    }
}

impl StateReductionMode {
    /// Banks the configured mode reduces.
    pub fn banks(&self) -> &'static [DetectorType] {
        match self.reduction_mode {
            ReductionMode::Lab => &[DetectorType::Lab],
            ReductionMode::Hab => &[DetectorType::Hab],
            ReductionMode::Merged | ReductionMode::All => &[DetectorType::Lab, DetectorType::Hab],
        }
    }

    pub fn detector_name(&self, detector: DetectorType) -> Option<&str> {
        self.detector_names.get(detector.as_str()).map(String::as_str)
    }
}

impl Leaf for StateReductionMode {
    fn check(&self, report: &mut ValidationReport) {
        check_optional_range(
            report,
            "merge_range",
            ("merge_range_min", self.merge_range_min),
            ("merge_range_max", self.merge_range_max),
        );

        if self.merge_mask {
            for (field, value) in [("merge_min", self.merge_min), ("merge_max", self.merge_max)] {
                if value.is_none() {
                    report.push(Issue::missing("merge_mask_bounds_required", field));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.merge_min, self.merge_max)
            && min >= max
        {
            report.push(Issue::bounds_order(
                "merge_mask_order",
                "merge_min",
                "merge_max",
                min,
                max,
            ));
        }

        if self.reduction_mode == ReductionMode::Merged && self.merge_scale <= 0.0 {
            report.push(Issue::non_positive(
                "merge_scale_positive",
                "merge_scale",
                self.merge_scale,
            ));
        }

        if !self.detector_names.is_empty() {
            for bank in self.banks() {
                if self.detector_name(*bank).is_none_or(|name| name.trim().is_empty()) {
                    report.push(Issue::inconsistent(
                        "reduction_mode_detector_names",
                        &["reduction_mode", "detector_names"],
                        vec![
                            self.reduction_mode.to_string(),
                            self.detector_names.keys().cloned().collect::<Vec<_>>().join(","),
                        ],
                        format!("no detector name for bank {bank}"),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;

    #[test]
    fn test_default_validates() {
        assert!(StateReductionMode::default().validate().is_ok());
    }

    #[test]
    fn test_merge_range_pairing_and_order() {
        let half = StateReductionMode {
            merge_range_min: Some(0.1),
            ..StateReductionMode::default()
        };
        assert_eq!(
            half.validate().unwrap_err().rules(),
            vec!["merge_range_pairing"]
        );

        let equal = StateReductionMode {
            merge_range_min: Some(0.1),
            merge_range_max: Some(0.1),
            ..StateReductionMode::default()
        };
        assert_eq!(
            equal.validate().unwrap_err().rules(),
            vec!["merge_range_order"]
        );
    }

    #[test]
    fn test_merge_mask_requires_bounds() {
        let state = StateReductionMode {
            merge_mask: true,
            merge_max: Some(0.2),
            ..StateReductionMode::default()
        };
        let err = state.validate().unwrap_err();
        assert_eq!(err.rules(), vec!["merge_mask_bounds_required"]);
    }

    #[test]
    fn test_detector_names_cover_used_banks() {
        let mut names = BTreeMap::new();
        names.insert("LAB".to_string(), "rear-detector".to_string());
        let state = StateReductionMode {
            reduction_mode: ReductionMode::Merged,
            detector_names: names,
            ..StateReductionMode::default()
        };
        let err = state.validate().unwrap_err();
        assert!(err.has_rule("reduction_mode_detector_names"));
        assert_eq!(state.detector_name(DetectorType::Lab), Some("rear-detector"));
    }
}
