//! Conversion from wavelength to momentum transfer.

use sans_model::{Issue, RangeStepType, ReductionDimensionality, ValidationReport};

use crate::checks::check_optional_range;
use crate::state::{Leaf, is_set, state_leaf};

state_leaf! {
    /// Q binning, gravity correction and Q resolution settings.
    pub struct StateConvertToQ as "StateConvertToQ" {
        reduction_dimensionality / set_reduction_dimensionality: ReductionDimensionality =
            ReductionDimensionality::OneDim,
        use_gravity / set_use_gravity: bool = false,
        gravity_extra_length / set_gravity_extra_length: f64 = 0.0,
        radius_cutoff / set_radius_cutoff: f64 = 0.0,
        wavelength_cutoff / set_wavelength_cutoff: f64 = 0.0,

        // 1D binning
        q_min / set_q_min: Option<f64> = None,
        q_max / set_q_max: Option<f64> = None,
        q_1d_rebin_string / set_q_1d_rebin_string: Option<String> = None,

        // 2D binning
        q_xy_max / set_q_xy_max: Option<f64> = None,
        q_xy_step / set_q_xy_step: Option<f64> = None,
        q_xy_step_type / set_q_xy_step_type: Option<RangeStepType> = None,

        use_q_resolution / set_use_q_resolution: bool = false,
        q_resolution_collimation_length / set_q_resolution_collimation_length: Option<f64> = None,
        q_resolution_delta_r / set_q_resolution_delta_r: Option<f64> = None,
        moderator_file / set_moderator_file: Option<String> = None,
        /// Circular apertures (diameters, m).
        q_resolution_a1 / set_q_resolution_a1: Option<f64> = None,
        q_resolution_a2 / set_q_resolution_a2: Option<f64> = None,
        /// Rectangular apertures (heights and widths, m).
        q_resolution_h1 / set_q_resolution_h1: Option<f64> = None,
        q_resolution_w1 / set_q_resolution_w1: Option<f64> = None,
        q_resolution_h2 / set_q_resolution_h2: Option<f64> = None,
        q_resolution_w2 / set_q_resolution_w2: Option<f64> = None,
    }
}

/// Reports a partly given aperture family; returns true if it is complete.
fn check_aperture_family(
    report: &mut ValidationReport,
    rule: &str,
    members: &[(&str, Option<f64>)],
) -> bool {
    let fields: Vec<&str> = members.iter().map(|(field, _)| *field).collect();
    let provided: Vec<&str> = members
        .iter()
        .filter(|(_, value)| value.is_some())
        .map(|(field, _)| *field)
        .collect();
    if !provided.is_empty() && provided.len() < members.len() {
        report.push(Issue::incomplete_group(rule, &fields, &provided));
    }
    provided.len() == members.len()
}

impl StateConvertToQ {
    fn check_q_resolution(&self, report: &mut ValidationReport) {
        let circular = check_aperture_family(
            report,
            "q_resolution_circular_aperture",
            &[
                ("q_resolution_a1", self.q_resolution_a1),
                ("q_resolution_a2", self.q_resolution_a2),
            ],
        );
        let rectangular = check_aperture_family(
            report,
            "q_resolution_rectangular_aperture",
            &[
                ("q_resolution_h1", self.q_resolution_h1),
                ("q_resolution_w1", self.q_resolution_w1),
                ("q_resolution_h2", self.q_resolution_h2),
                ("q_resolution_w2", self.q_resolution_w2),
            ],
        );
        if !self.use_q_resolution {
            return;
        }

        if !circular && !rectangular {
            report.push(Issue::inconsistent(
                "q_resolution_aperture_required",
                &["use_q_resolution"],
                vec!["true".to_string()],
                "give either a1/a2 or h1/w1/h2/w2",
            ));
        }
        if !is_set(self.moderator_file.as_ref()) {
            report.push(Issue::missing(
                "q_resolution_moderator_file_required",
                "moderator_file",
            ));
        }
        for (field, value) in [
            (
                "q_resolution_collimation_length",
                self.q_resolution_collimation_length,
            ),
            ("q_resolution_delta_r", self.q_resolution_delta_r),
        ] {
            match value {
                None => report.push(Issue::missing("q_resolution_geometry_required", field)),
                Some(value) if value <= 0.0 => {
                    report.push(Issue::non_positive(
                        "q_resolution_geometry_positive",
                        field,
                        value,
                    ));
                }
                Some(_) => {}
            }
        }
    }
}

impl Leaf for StateConvertToQ {
    fn check(&self, report: &mut ValidationReport) {
        match self.reduction_dimensionality {
            ReductionDimensionality::OneDim => {
                for (field, value) in [("q_min", self.q_min), ("q_max", self.q_max)] {
                    if value.is_none() {
                        report.push(Issue::missing("q_1d_bounds_required", field));
                    }
                }
            }
            ReductionDimensionality::TwoDim => {
                for (field, value) in [("q_xy_max", self.q_xy_max), ("q_xy_step", self.q_xy_step)] {
                    match value {
                        None => report.push(Issue::missing("q_xy_bounds_required", field)),
                        Some(value) if value <= 0.0 => {
                            report.push(Issue::non_positive("q_xy_bounds_positive", field, value));
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        // Either dimensionality may carry a 1D range; it must be ordered.
        if let (Some(min), Some(max)) = (self.q_min, self.q_max) {
            check_optional_range(report, "q_range", ("q_min", Some(min)), ("q_max", Some(max)));
        }

        if !self.use_gravity && self.gravity_extra_length != 0.0 {
            report.push(Issue::inconsistent(
                "gravity_extra_length_without_gravity",
                &["use_gravity", "gravity_extra_length"],
                vec!["false".to_string(), self.gravity_extra_length.to_string()],
                "extra length only applies with the gravity correction",
            ));
        }
        for (field, value) in [
            ("radius_cutoff", self.radius_cutoff),
            ("wavelength_cutoff", self.wavelength_cutoff),
        ] {
            if value < 0.0 {
                report.push(Issue::negative("cutoff_non_negative", field, value));
            }
        }

        self.check_q_resolution(report);
    }
}
