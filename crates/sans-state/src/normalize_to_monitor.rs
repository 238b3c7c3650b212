//! Normalisation of the data to an incident-beam monitor.
//!
//! LOQ differs from the other ISIS instruments only in that its prompt-peak
//! correction is on by default, with a fixed time-of-flight window.

use std::collections::BTreeMap;

use sans_model::{Issue, RangeStepType, RebinType, ValidationReport};

use crate::checks::check_optional_range;
use crate::state::{Leaf, state_family, state_leaf};

/// Declares a normalisation variant with the shared monitor settings.
macro_rules! normalize_leaf {
    (
        $(#[$meta:meta])*
        pub struct $name:ident as $state_name:literal { $($rest:tt)* }
    ) => {
        state_leaf! {
            $(#[$meta])*
            pub struct $name as $state_name {
                $($rest)*
                rebin_type / set_rebin_type: RebinType = RebinType::Rebin,
                wavelength_low / set_wavelength_low: Option<f64> = None,
                wavelength_high / set_wavelength_high: Option<f64> = None,
                wavelength_step / set_wavelength_step: Option<f64> = None,
                wavelength_step_type / set_wavelength_step_type: RangeStepType = RangeStepType::Lin,
                /// Flat background window applied to every monitor (us).
                background_tof_general_start / set_background_tof_general_start: Option<f64> = None,
                background_tof_general_stop / set_background_tof_general_stop: Option<f64> = None,
                /// Per-monitor background windows, keyed by spectrum number.
                background_tof_monitor_start / set_background_tof_monitor_start:
                    BTreeMap<i64, f64> = BTreeMap::new(),
                background_tof_monitor_stop / set_background_tof_monitor_stop:
                    BTreeMap<i64, f64> = BTreeMap::new(),
                incident_monitor / set_incident_monitor: Option<i64> = None,
            }
        }

        impl Leaf for $name {
            fn check(&self, report: &mut ValidationReport) {
                check_prompt_peak(
                    report,
                    self.prompt_peak_correction_enabled,
                    self.prompt_peak_correction_min,
                    self.prompt_peak_correction_max,
                );
                check_optional_range(
                    report,
                    "background_tof_general",
                    ("background_tof_general_start", self.background_tof_general_start),
                    ("background_tof_general_stop", self.background_tof_general_stop),
                );
                check_monitor_windows(
                    report,
                    &self.background_tof_monitor_start,
                    &self.background_tof_monitor_stop,
                );
                check_wavelength(
                    report,
                    self.wavelength_low,
                    self.wavelength_high,
                    self.wavelength_step,
                );
                if self.incident_monitor.is_none() {
                    report.push(Issue::missing("incident_monitor_required", "incident_monitor"));
                }
            }
        }
    };
}

fn check_prompt_peak(
    report: &mut ValidationReport,
    enabled: bool,
    min: Option<f64>,
    max: Option<f64>,
) {
    if enabled && min.is_none() && max.is_none() {
        report.push(Issue::incomplete_group(
            "prompt_peak_correction_bounds_required",
            &["prompt_peak_correction_min", "prompt_peak_correction_max"],
            &[],
        ));
    }
    check_optional_range(
        report,
        "prompt_peak_correction",
        ("prompt_peak_correction_min", min),
        ("prompt_peak_correction_max", max),
    );
}

fn check_monitor_windows(
    report: &mut ValidationReport,
    start: &BTreeMap<i64, f64>,
    stop: &BTreeMap<i64, f64>,
) {
    if !start.keys().eq(stop.keys()) {
        report.push(Issue::key_mismatch(
            "background_tof_monitor_keys",
            "background_tof_monitor_start",
            "background_tof_monitor_stop",
            start.keys().map(ToString::to_string).collect(),
            stop.keys().map(ToString::to_string).collect(),
        ));
    }
    for (monitor, start_value) in start {
        if let Some(stop_value) = stop.get(monitor)
            && start_value >= stop_value
        {
            report.push(Issue::bounds_order(
                "background_tof_monitor_order",
                &format!("background_tof_monitor_start[{monitor}]"),
                &format!("background_tof_monitor_stop[{monitor}]"),
                *start_value,
                *stop_value,
            ));
        }
    }
}

fn check_wavelength(
    report: &mut ValidationReport,
    low: Option<f64>,
    high: Option<f64>,
    step: Option<f64>,
) {
    check_optional_range(
        report,
        "wavelength_range",
        ("wavelength_low", low),
        ("wavelength_high", high),
    );
    if let Some(step) = step
        && step <= 0.0
    {
        report.push(Issue::non_positive("wavelength_step_positive", "wavelength_step", step));
    }
}

normalize_leaf! {
    /// Monitor normalisation for ISIS instruments other than LOQ.
    pub struct StateNormalizeToMonitorIsis as "StateNormalizeToMonitor" {
        prompt_peak_correction_min / set_prompt_peak_correction_min: Option<f64> = None,
        prompt_peak_correction_max / set_prompt_peak_correction_max: Option<f64> = None,
        prompt_peak_correction_enabled / set_prompt_peak_correction_enabled: bool = false,
    }
}

/// Default LOQ prompt-peak window start (us).
pub const LOQ_PROMPT_PEAK_MIN: f64 = 19000.0;
/// Default LOQ prompt-peak window stop (us).
pub const LOQ_PROMPT_PEAK_MAX: f64 = 20500.0;

normalize_leaf! {
    /// Monitor normalisation for LOQ.
    pub struct StateNormalizeToMonitorLoq as "StateNormalizeToMonitorLOQ" {
        prompt_peak_correction_min / set_prompt_peak_correction_min: Option<f64> =
            Some(LOQ_PROMPT_PEAK_MIN),
        prompt_peak_correction_max / set_prompt_peak_correction_max: Option<f64> =
            Some(LOQ_PROMPT_PEAK_MAX),
        prompt_peak_correction_enabled / set_prompt_peak_correction_enabled: bool = true,
    }
}

state_family! {
    /// Monitor normalisation of whichever instrument recorded the data.
    pub enum StateNormalizeToMonitor as "StateNormalizeToMonitor",
        builder NormalizeToMonitorBuilder
    {
        Isis(StateNormalizeToMonitorIsis),
        Loq(StateNormalizeToMonitorLoq),
    }
}

impl StateNormalizeToMonitor {
    /// Normalisation wavelength range, if both bounds are set.
    pub fn wavelength_range(&self) -> Option<(f64, f64)> {
        let (low, high) = match self {
            StateNormalizeToMonitor::Isis(state) => (state.wavelength_low, state.wavelength_high),
            StateNormalizeToMonitor::Loq(state) => (state.wavelength_low, state.wavelength_high),
        };
        low.zip(high)
    }

    pub fn incident_monitor(&self) -> Option<i64> {
        match self {
            StateNormalizeToMonitor::Isis(state) => state.incident_monitor,
            StateNormalizeToMonitor::Loq(state) => state.incident_monitor,
        }
    }
}
