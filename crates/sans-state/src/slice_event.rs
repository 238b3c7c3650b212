//! Time slicing of event-mode data.

use sans_model::{Issue, ValidationReport};

use crate::checks::check_paired_lists;
use crate::state::{Leaf, state_leaf};

state_leaf! {
    /// Time slices (s, relative to run start). Empty lists reduce the whole run.
    pub struct StateSliceEvent as "StateSliceEvent" {
        start_time / set_start_time: Vec<f64> = Vec::new(),
        end_time / set_end_time: Vec<f64> = Vec::new(),
    }
}

impl StateSliceEvent {
    pub fn is_sliced(&self) -> bool {
        !self.start_time.is_empty()
    }

    /// Slices as `(start, end)` pairs.
    pub fn slices(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.start_time
            .iter()
            .copied()
            .zip(self.end_time.iter().copied())
    }
}

impl Leaf for StateSliceEvent {
    fn check(&self, report: &mut ValidationReport) {
        check_paired_lists(
            report,
            "slice",
            ("start_time", &self.start_time),
            ("end_time", &self.end_time),
        );
        for (index, start) in self.start_time.iter().enumerate() {
            if *start < 0.0 {
                report.push(Issue::negative(
                    "slice_start_non_negative",
                    &format!("start_time[{index}]"),
                    *start,
                ));
            }
        }
    }
}
