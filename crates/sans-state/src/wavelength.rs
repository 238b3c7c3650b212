//! Wavelength binning of the reduced data.

use sans_model::{Issue, RangeStepType, RebinType, ValidationReport};

use crate::checks::check_paired_lists;
use crate::state::{Leaf, state_leaf};

state_leaf! {
    /// Wavelength ranges to reduce. Each `wavelength_low[i]..wavelength_high[i]`
    /// pair produces one reduced output.
    pub struct StateWavelength as "StateWavelength" {
        wavelength_low / set_wavelength_low: Vec<f64> = Vec::new(),
        wavelength_high / set_wavelength_high: Vec<f64> = Vec::new(),
        wavelength_step / set_wavelength_step: Option<f64> = None,
        wavelength_step_type / set_wavelength_step_type: RangeStepType = RangeStepType::Lin,
        rebin_type / set_rebin_type: RebinType = RebinType::Rebin,
    }
}

impl StateWavelength {
    /// Smallest lower and largest upper bound over all ranges.
    pub fn full_range(&self) -> Option<(f64, f64)> {
        let low = self.wavelength_low.iter().copied().reduce(f64::min)?;
        let high = self.wavelength_high.iter().copied().reduce(f64::max)?;
        Some((low, high))
    }

    /// Sets a single wavelength range.
    #[must_use]
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.wavelength_low = vec![low];
        self.wavelength_high = vec![high];
        self
    }
}

impl Leaf for StateWavelength {
    fn check(&self, report: &mut ValidationReport) {
        for (field, values) in [
            ("wavelength_low", &self.wavelength_low),
            ("wavelength_high", &self.wavelength_high),
        ] {
            if values.is_empty() {
                report.push(Issue::missing("wavelength_range_required", field));
            }
        }
        check_paired_lists(
            report,
            "wavelength_range",
            ("wavelength_low", &self.wavelength_low),
            ("wavelength_high", &self.wavelength_high),
        );
        match self.wavelength_step {
            None => report.push(Issue::missing("wavelength_step_required", "wavelength_step")),
            Some(step) if step <= 0.0 => {
                report.push(Issue::non_positive(
                    "wavelength_step_positive",
                    "wavelength_step",
                    step,
                ));
            }
            Some(_) => {}
        }
    }
}
