//! Detector masking.

use sans_model::{Issue, ValidationReport};

use crate::checks::{check_optional_range, check_paired_lists};
use crate::state::{Leaf, state_leaf};

state_leaf! {
    /// Geometric, time-of-flight and file-based masks.
    pub struct StateMask as "StateMask" {
        /// Radial mask around the beam centre (m). Either bound may be given alone.
        radius_min / set_radius_min: Option<f64> = None,
        radius_max / set_radius_max: Option<f64> = None,
        phi_min / set_phi_min: f64 = -90.0,
        phi_max / set_phi_max: f64 = 90.0,
        use_mask_phi_mirror / set_use_mask_phi_mirror: bool = true,
        beam_stop_arm_width / set_beam_stop_arm_width: Option<f64> = None,
        beam_stop_arm_angle / set_beam_stop_arm_angle: Option<f64> = None,
        beam_stop_arm_pos1 / set_beam_stop_arm_pos1: Option<f64> = None,
        beam_stop_arm_pos2 / set_beam_stop_arm_pos2: Option<f64> = None,
        /// Time-of-flight windows masked on every spectrum (us).
        bin_mask_general_start / set_bin_mask_general_start: Vec<f64> = Vec::new(),
        bin_mask_general_stop / set_bin_mask_general_stop: Vec<f64> = Vec::new(),
        mask_files / set_mask_files: Vec<String> = Vec::new(),
        single_spectra / set_single_spectra: Vec<i64> = Vec::new(),
    }
}

impl Leaf for StateMask {
    fn check(&self, report: &mut ValidationReport) {
        if let (Some(min), Some(max)) = (self.radius_min, self.radius_max) {
            check_optional_range(
                report,
                "radius",
                ("radius_min", Some(min)),
                ("radius_max", Some(max)),
            );
        }
        if self.phi_min >= self.phi_max {
            report.push(Issue::bounds_order(
                "phi_order",
                "phi_min",
                "phi_max",
                self.phi_min,
                self.phi_max,
            ));
        }

        let arm = [
            ("beam_stop_arm_width", self.beam_stop_arm_width),
            ("beam_stop_arm_angle", self.beam_stop_arm_angle),
            ("beam_stop_arm_pos1", self.beam_stop_arm_pos1),
            ("beam_stop_arm_pos2", self.beam_stop_arm_pos2),
        ];
        let provided: Vec<&str> = arm
            .iter()
            .filter(|(_, value)| value.is_some())
            .map(|(field, _)| *field)
            .collect();
        if !provided.is_empty() && provided.len() < arm.len() {
            let fields: Vec<&str> = arm.iter().map(|(field, _)| *field).collect();
            report.push(Issue::incomplete_group("beam_stop_arm_group", &fields, &provided));
        }

        check_paired_lists(
            report,
            "bin_mask_general",
            ("bin_mask_general_start", &self.bin_mask_general_start),
            ("bin_mask_general_stop", &self.bin_mask_general_stop),
        );

        for (index, file) in self.mask_files.iter().enumerate() {
            if file.trim().is_empty() {
                report.push(Issue::empty_name("mask_file_name", &format!("mask_files[{index}]")));
            }
        }
        for (index, spectrum) in self.single_spectra.iter().enumerate() {
            if *spectrum < 0 {
                report.push(Issue::negative(
                    "spectrum_non_negative",
                    &format!("single_spectra[{index}]"),
                    *spectrum as f64,
                ));
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
        assert!(StateMask::default().validate().is_ok());
    }

    #[test]
    fn test_radius_bounds_alone_are_fine() {
        let state = StateMask {
            radius_min: Some(0.038),
            ..StateMask::default()
        };
        assert!(state.validate().is_ok());

        let state = StateMask {
            radius_min: Some(0.5),
            radius_max: Some(0.5),
            ..StateMask::default()
        };
        assert_eq!(state.validate().unwrap_err().rules(), vec!["radius_order"]);
    }

    #[test]
    fn test_beam_stop_arm_all_or_nothing() {
        let partial = StateMask {
            beam_stop_arm_width: Some(0.03),
            beam_stop_arm_angle: Some(180.0),
            ..StateMask::default()
        };
        let err = partial.validate().unwrap_err();
        let (_, issue) = err.issues().next().unwrap();
        assert_eq!(issue.rule, "beam_stop_arm_group");
        let values = issue.values();
        assert_eq!(values["beam_stop_arm_width"], "set");
        assert_eq!(values["beam_stop_arm_pos1"], "None");

        let full = StateMask {
            beam_stop_arm_pos1: Some(0.0),
            beam_stop_arm_pos2: Some(0.0),
            ..partial
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_time_bins_and_files() {
        let state = StateMask {
            bin_mask_general_start: vec![17500.0],
            bin_mask_general_stop: vec![17000.0],
            mask_files: vec![String::new()],
            ..StateMask::default()
        };
        assert_eq!(
            state.validate().unwrap_err().rules(),
            vec!["bin_mask_general_order", "mask_file_name"]
        );
    }
}
