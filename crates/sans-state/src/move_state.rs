//! Detector and sample movement, one variant per instrument.
//!
//! Every variant shares the sample offset, the detector banks and the
//! monitor names; each instrument adds its own geometry parameters.

use std::collections::BTreeMap;

use sans_model::{CanonicalCoordinates, DetectorType, Instrument, Issue, ValidationReport};

use crate::state::{Leaf, Schema, state_family, state_leaf};

state_leaf! {
    /// Position corrections for one detector bank.
    pub struct StateMoveDetector as "StateMoveDetector" {
        x_translation_correction / set_x_translation_correction: f64 = 0.0,
        y_translation_correction / set_y_translation_correction: f64 = 0.0,
        z_translation_correction / set_z_translation_correction: f64 = 0.0,
        rotation_correction / set_rotation_correction: f64 = 0.0,
        side_correction / set_side_correction: f64 = 0.0,
        radius_correction / set_radius_correction: f64 = 0.0,
        x_tilt_correction / set_x_tilt_correction: f64 = 0.0,
        y_tilt_correction / set_y_tilt_correction: f64 = 0.0,
        z_tilt_correction / set_z_tilt_correction: f64 = 0.0,
        sample_centre_pos1 / set_sample_centre_pos1: f64 = 0.0,
        sample_centre_pos2 / set_sample_centre_pos2: f64 = 0.0,
        detector_name / set_detector_name: String = String::new(),
        detector_name_short / set_detector_name_short: String = String::new(),
    }
}

impl StateMoveDetector {
    /// Detector with the given full and short component names.
    pub fn named(name: &str, short_name: &str) -> Self {
        Self {
            detector_name: name.to_string(),
            detector_name_short: short_name.to_string(),
            ..Self::default()
        }
    }

    /// Appends issues for this bank, prefixing field names with `bank`.
    fn check_bank(&self, bank: &str, report: &mut ValidationReport) {
        if self.detector_name.trim().is_empty() {
            report.push(Issue::empty_name(
                "detector_name_required",
                &format!("{bank}.detector_name"),
            ));
        }
        if self.detector_name_short.trim().is_empty() {
            report.push(Issue::empty_name(
                "detector_name_required",
                &format!("{bank}.detector_name_short"),
            ));
        }
    }
}

impl Leaf for StateMoveDetector {
    fn check(&self, report: &mut ValidationReport) {
        self.check_bank("detector", report);
    }
}

fn monitor_names(monitors: &[(i64, &str)]) -> BTreeMap<i64, String> {
    monitors
        .iter()
        .map(|(spectrum, name)| (*spectrum, (*name).to_string()))
        .collect()
}

/// Accessors shared by every move variant.
pub trait MoveCommon {
    const INSTRUMENT: Instrument;

    fn detector(&self, detector: DetectorType) -> Option<&StateMoveDetector>;

    fn detector_mut(&mut self, detector: DetectorType) -> Option<&mut StateMoveDetector>;

    fn monitor_names(&self) -> &BTreeMap<i64, String>;
}

fn check_common<S: MoveCommon>(state: &S, report: &mut ValidationReport) {
    if let Some(lab) = state.detector(DetectorType::Lab) {
        lab.check_bank("lab_detector", report);
    }
    if let Some(hab) = state.detector(DetectorType::Hab) {
        hab.check_bank("hab_detector", report);
    }
    for (spectrum, name) in state.monitor_names() {
        if name.trim().is_empty() {
            report.push(Issue::empty_name(
                "monitor_name_required",
                &format!("monitor_names[{spectrum}]"),
            ));
        }
    }
}

/// Declares a move variant: the shared fields first, then the
/// instrument-specific ones.
macro_rules! move_leaf {
    (
        $(#[$meta:meta])*
        pub struct $name:ident as $state_name:literal for $instrument:path {
            lab_detector = $lab:expr,
            hab_detector = $hab:expr,
            monitor_names = $monitors:expr,
        }
        { $($rest:tt)* }
    ) => {
        state_leaf! {
            $(#[$meta])*
            pub struct $name as $state_name {
                /// Sample displacement along `sample_offset_direction` (m).
                sample_offset / set_sample_offset: f64 = 0.0,
                sample_offset_direction / set_sample_offset_direction: CanonicalCoordinates =
                    CanonicalCoordinates::Z,
                lab_detector / set_lab_detector: StateMoveDetector = $lab,
                /// `None` on instruments without a high-angle bank.
                hab_detector / set_hab_detector: Option<StateMoveDetector> = $hab,
                monitor_names / set_monitor_names: BTreeMap<i64, String> = $monitors,
                $($rest)*
            }
        }

        impl MoveCommon for $name {
            const INSTRUMENT: Instrument = $instrument;

            fn detector(&self, detector: DetectorType) -> Option<&StateMoveDetector> {
                match detector {
                    DetectorType::Lab => Some(&self.lab_detector),
                    DetectorType::Hab => self.hab_detector.as_ref(),
                }
            }

            fn detector_mut(&mut self, detector: DetectorType) -> Option<&mut StateMoveDetector> {
                match detector {
                    DetectorType::Lab => Some(&mut self.lab_detector),
                    DetectorType::Hab => self.hab_detector.as_mut(),
                }
            }

            fn monitor_names(&self) -> &BTreeMap<i64, String> {
                &self.monitor_names
            }
        }
    };
}

/// LOQ beam-centre position offset (m).
pub const LOQ_CENTRE_POSITION: f64 = 0.3175;

move_leaf! {
    /// Movement state for LOQ.
    pub struct StateMoveLoq as "StateMoveLOQ" for Instrument::Loq {
        lab_detector = StateMoveDetector::named("main-detector-bank", "main"),
        hab_detector = Some(StateMoveDetector::named("HAB", "HAB")),
        monitor_names = monitor_names(&[(2, "monitor2"), (3, "monitor3")]),
    }
    {
        center_position / set_center_position: f64 = LOQ_CENTRE_POSITION,
    }
}

impl Leaf for StateMoveLoq {
    fn check(&self, report: &mut ValidationReport) {
        check_common(self, report);
    }
}

move_leaf! {
    /// Movement state for SANS2D, whose banks sit on moveable carriages.
    pub struct StateMoveSans2d as "StateMoveSANS2D" for Instrument::Sans2d {
        lab_detector = StateMoveDetector::named("rear-detector", "rear"),
        hab_detector = Some(StateMoveDetector::named("front-detector", "front")),
        monitor_names = monitor_names(&[
            (1, "monitor1"),
            (2, "monitor2"),
            (3, "monitor3"),
            (4, "monitor4"),
        ]),
    }
    {
        hab_detector_radius / set_hab_detector_radius: f64 = 0.306,
        hab_detector_default_sd_m / set_hab_detector_default_sd_m: f64 = 4.0,
        hab_detector_default_x_m / set_hab_detector_default_x_m: f64 = 1.1,
        lab_detector_default_sd_m / set_lab_detector_default_sd_m: f64 = 4.0,
        hab_detector_x / set_hab_detector_x: f64 = 0.0,
        hab_detector_z / set_hab_detector_z: f64 = 0.0,
        hab_detector_rotation / set_hab_detector_rotation: f64 = 0.0,
        lab_detector_x / set_lab_detector_x: f64 = 0.0,
        lab_detector_z / set_lab_detector_z: f64 = 0.0,
        monitor_4_offset / set_monitor_4_offset: f64 = 0.0,
    }
}

impl Leaf for StateMoveSans2d {
    fn check(&self, report: &mut ValidationReport) {
        check_common(self, report);
        for (field, value) in [
            ("hab_detector_radius", self.hab_detector_radius),
            ("hab_detector_default_sd_m", self.hab_detector_default_sd_m),
            ("lab_detector_default_sd_m", self.lab_detector_default_sd_m),
        ] {
            if value <= 0.0 {
                report.push(Issue::non_positive("detector_geometry_positive", field, value));
            }
        }
    }
}

move_leaf! {
    /// Movement state for LARMOR. The single bank sits on a rotating bench.
    pub struct StateMoveLarmor as "StateMoveLARMOR" for Instrument::Larmor {
        lab_detector = StateMoveDetector::named("DetectorBench", "DetectorBench"),
        hab_detector = None,
        monitor_names = monitor_names(&[
            (1, "monitor1"),
            (2, "monitor2"),
            (3, "monitor3"),
            (4, "monitor4"),
            (5, "monitor5"),
        ]),
    }
    {
        bench_rotation / set_bench_rotation: f64 = 0.0,
    }
}

impl Leaf for StateMoveLarmor {
    fn check(&self, report: &mut ValidationReport) {
        check_common(self, report);
    }
}

move_leaf! {
    /// Movement state for ZOOM.
    pub struct StateMoveZoom as "StateMoveZOOM" for Instrument::Zoom {
        lab_detector = StateMoveDetector::named("rear-detector", "rear"),
        hab_detector = None,
        monitor_names = monitor_names(&[
            (1, "monitor1"),
            (2, "monitor2"),
            (3, "monitor3"),
            (4, "monitor4"),
            (5, "monitor5"),
        ]),
    }
    {
        lab_detector_default_sd_m / set_lab_detector_default_sd_m: f64 = 4.0,
        monitor_4_offset / set_monitor_4_offset: f64 = 0.0,
        monitor_5_offset / set_monitor_5_offset: f64 = 0.0,
    }
}

impl Leaf for StateMoveZoom {
    fn check(&self, report: &mut ValidationReport) {
        check_common(self, report);
        if self.lab_detector_default_sd_m <= 0.0 {
            report.push(Issue::non_positive(
                "detector_geometry_positive",
                "lab_detector_default_sd_m",
                self.lab_detector_default_sd_m,
            ));
        }
    }
}

state_family! {
    /// Movement state of whichever instrument recorded the data.
    pub enum StateMove as "StateMove", builder MoveBuilder {
        Loq(StateMoveLoq),
        Sans2d(StateMoveSans2d),
        Larmor(StateMoveLarmor),
        Zoom(StateMoveZoom),
    }
}

impl StateMove {
    pub fn instrument(&self) -> Instrument {
        match self {
            StateMove::Loq(_) => StateMoveLoq::INSTRUMENT,
            StateMove::Sans2d(_) => StateMoveSans2d::INSTRUMENT,
            StateMove::Larmor(_) => StateMoveLarmor::INSTRUMENT,
            StateMove::Zoom(_) => StateMoveZoom::INSTRUMENT,
        }
    }

    pub fn detector(&self, detector: DetectorType) -> Option<&StateMoveDetector> {
        match self {
            StateMove::Loq(state) => state.detector(detector),
            StateMove::Sans2d(state) => state.detector(detector),
            StateMove::Larmor(state) => state.detector(detector),
            StateMove::Zoom(state) => state.detector(detector),
        }
    }

    /// Returns true if the instrument has a high-angle bank configured.
    pub fn has_hab(&self) -> bool {
        self.detector(DetectorType::Hab).is_some()
    }
}

impl<S: Schema + MoveCommon> crate::builder::StateBuilder<S> {
    /// Mutable access to a bank's corrections; `None` if the instrument
    /// has no such bank.
    pub fn detector_mut(&mut self, detector: DetectorType) -> Option<&mut StateMoveDetector> {
        self.state_mut().detector_mut(detector)
    }
}

impl MoveBuilder {
    /// Mutable access to a bank's corrections on the selected variant.
    pub fn detector_mut(&mut self, detector: DetectorType) -> Option<&mut StateMoveDetector> {
        match self {
            MoveBuilder::Loq(builder) => builder.detector_mut(detector),
            MoveBuilder::Sans2d(builder) => builder.detector_mut(detector),
            MoveBuilder::Larmor(builder) => builder.detector_mut(detector),
            MoveBuilder::Zoom(builder) => builder.detector_mut(detector),
        }
    }
}
