//! The composite state handed to the reduction engine.

use sans_model::{Instrument, Issue, ValidationError, ValidationReport};
use serde_json::Value;
use tracing::{debug, info_span};

use crate::convert_to_q::StateConvertToQ;
use crate::data::StateData;
use crate::error::{Result, StateError};
use crate::factory::{BuilderFactory, registration};
use crate::mask::StateMask;
use crate::move_state::StateMove;
use crate::normalize_to_monitor::StateNormalizeToMonitor;
use crate::param::PropertyBag;
use crate::reduction_mode::StateReductionMode;
use crate::slice_event::StateSliceEvent;
use crate::state::State;
use crate::wavelength::StateWavelength;

/// Name under which cross-leaf issues are reported.
pub const ALL_STATES: &str = "AllStates";

/// Every leaf needed for one reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct AllStates {
    pub data: StateData,
    pub move_state: StateMove,
    pub reduction: StateReductionMode,
    pub convert_to_q: StateConvertToQ,
    pub normalize_to_monitor: StateNormalizeToMonitor,
    pub wavelength: StateWavelength,
    pub mask: StateMask,
    pub slice_event: StateSliceEvent,
}

/// Property-bag section names, in encoding order.
pub const SECTIONS: [&str; 8] = [
    "data",
    "move",
    "reduction",
    "convert_to_q",
    "normalize_to_monitor",
    "wavelength",
    "mask",
    "slice_event",
];

fn section<S: State>(bag: &PropertyBag, key: &str) -> Result<S> {
    match bag.get(key) {
        Some(Value::Object(inner)) => S::from_dict(inner),
        Some(other) => Err(StateError::invalid_value(key, "an object", other)),
        None => Err(StateError::MissingKey {
            state: ALL_STATES,
            key: key.to_string(),
        }),
    }
}

impl AllStates {
    /// Leaf reports in section order, each possibly empty.
    fn leaf_reports(&self) -> Vec<ValidationReport> {
        fn report_of(state: &impl State) -> ValidationReport {
            let mut report = ValidationReport::new(state.state_name());
            state.collect_issues(&mut report);
            report
        }
        vec![
            report_of(&self.data),
            report_of(&self.move_state),
            report_of(&self.reduction),
            report_of(&self.convert_to_q),
            report_of(&self.normalize_to_monitor),
            report_of(&self.wavelength),
            report_of(&self.mask),
            report_of(&self.slice_event),
        ]
    }

    /// Rules spanning more than one leaf.
    fn check_cross_leaf(&self, report: &mut ValidationReport) {
        let data_dim = self.reduction.reduction_dimensionality;
        let q_dim = self.convert_to_q.reduction_dimensionality;
        if data_dim != q_dim {
            report.push(Issue::inconsistent(
                "dimensionality_consistent",
                &[
                    "reduction.reduction_dimensionality",
                    "convert_to_q.reduction_dimensionality",
                ],
                vec![data_dim.to_string(), q_dim.to_string()],
                "reduction and Q conversion must agree on dimensionality",
            ));
        }

        if self.data.instrument != Instrument::NoInstrument {
            match registration(self.data.facility, self.data.instrument) {
                Ok(registration) => {
                    if self.move_state.state_type() != registration.move_state_type {
                        report.push(Issue::inconsistent(
                            "move_matches_instrument",
                            &["data.instrument", "move.state_type"],
                            vec![
                                self.data.instrument.to_string(),
                                self.move_state.state_type().to_string(),
                            ],
                            format!("expected {}", registration.move_state_type),
                        ));
                    }
                    if self.normalize_to_monitor.state_type() != registration.normalize_state_type
                    {
                        report.push(Issue::inconsistent(
                            "normalize_to_monitor_matches_instrument",
                            &["data.instrument", "normalize_to_monitor.state_type"],
                            vec![
                                self.data.instrument.to_string(),
                                self.normalize_to_monitor.state_type().to_string(),
                            ],
                            format!("expected {}", registration.normalize_state_type),
                        ));
                    }
                }
                Err(_) => report.push(Issue::inconsistent(
                    "instrument_supported",
                    &["data.facility", "data.instrument"],
                    vec![
                        self.data.facility.to_string(),
                        self.data.instrument.to_string(),
                    ],
                    "no states are registered for this facility and instrument",
                )),
            }
        }

        if self.reduction.reduction_mode.uses_hab() && !self.move_state.has_hab() {
            report.push(Issue::inconsistent(
                "reduction_mode_requires_hab",
                &["reduction.reduction_mode", "move.hab_detector"],
                vec![
                    self.reduction.reduction_mode.to_string(),
                    "None".to_string(),
                ],
                format!("{} has no high-angle bank", self.move_state.instrument()),
            ));
        }

        if let (Some((low, high)), Some((full_low, full_high))) = (
            self.normalize_to_monitor.wavelength_range(),
            self.wavelength.full_range(),
        ) && (low != full_low || high != full_high)
        {
            report.push(Issue::inconsistent(
                "normalize_wavelength_matches_wavelength",
                &[
                    "normalize_to_monitor.wavelength_low",
                    "normalize_to_monitor.wavelength_high",
                    "wavelength.wavelength_low",
                    "wavelength.wavelength_high",
                ],
                vec![
                    low.to_string(),
                    high.to_string(),
                    full_low.to_string(),
                    full_high.to_string(),
                ],
                "monitor normalisation must cover the full wavelength range",
            ));
        }
    }

    /// Validates every leaf and the cross-leaf rules, reporting all
    /// problems at once.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let _span = info_span!("validate_all_states").entered();
        let mut reports = self.leaf_reports();
        let mut cross = ValidationReport::new(ALL_STATES);
        self.check_cross_leaf(&mut cross);
        reports.push(cross);
        let result = ValidationError::from_reports(reports);
        if let Err(err) = &result {
            debug!(issues = err.issue_count(), "states failed validation");
        }
        result
    }

    /// Nested property bag with one section per leaf.
    pub fn to_dict(&self) -> PropertyBag {
        let sections = [
            self.data.to_dict(),
            self.move_state.to_dict(),
            self.reduction.to_dict(),
            self.convert_to_q.to_dict(),
            self.normalize_to_monitor.to_dict(),
            self.wavelength.to_dict(),
            self.mask.to_dict(),
            self.slice_event.to_dict(),
        ];
        SECTIONS
            .iter()
            .zip(sections)
            .map(|(key, bag)| ((*key).to_string(), Value::Object(bag)))
            .collect()
    }

    /// Non-finite floats of every section, with section-qualified paths.
    pub fn non_finite_values(&self) -> Vec<(String, f64)> {
        let sections = [
            self.data.non_finite_values(),
            self.move_state.non_finite_values(),
            self.reduction.non_finite_values(),
            self.convert_to_q.non_finite_values(),
            self.normalize_to_monitor.non_finite_values(),
            self.wavelength.non_finite_values(),
            self.mask.non_finite_values(),
            self.slice_event.non_finite_values(),
        ];
        SECTIONS
            .iter()
            .zip(sections)
            .flat_map(|(key, found)| {
                found
                    .into_iter()
                    .map(move |(path, value)| (format!("{key}.{path}"), value))
            })
            .collect()
    }

    /// Rebuilds the composite; every section must be present.
    pub fn from_dict(bag: &PropertyBag) -> Result<Self> {
        if let Some(key) = bag.keys().find(|key| !SECTIONS.contains(&key.as_str())) {
            return Err(StateError::UnknownField {
                state: ALL_STATES,
                field: key.clone(),
            });
        }
        Ok(Self {
            data: section(bag, "data")?,
            move_state: section(bag, "move")?,
            reduction: section(bag, "reduction")?,
            convert_to_q: section(bag, "convert_to_q")?,
            normalize_to_monitor: section(bag, "normalize_to_monitor")?,
            wavelength: section(bag, "wavelength")?,
            mask: section(bag, "mask")?,
            slice_event: section(bag, "slice_event")?,
        })
    }
}

/// Assembles [`AllStates`] from a factory's builders.
///
/// Leaves not replaced explicitly are built from the factory defaults.
#[derive(Debug, Clone)]
pub struct AllStatesBuilder {
    states: AllStates,
}

impl AllStatesBuilder {
    pub fn new(factory: &BuilderFactory) -> Self {
        Self {
            states: AllStates {
                data: factory.data_builder().build(),
                move_state: factory.move_builder().build(),
                reduction: factory.reduction_builder().build(),
                convert_to_q: factory.convert_to_q_builder().build(),
                normalize_to_monitor: factory.normalize_to_monitor_builder().build(),
                wavelength: factory.wavelength_builder().build(),
                mask: factory.mask_builder().build(),
                slice_event: factory.slice_event_builder().build(),
            },
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: StateData) -> Self {
        self.states.data = data;
        self
    }

    #[must_use]
    pub fn with_move(mut self, move_state: StateMove) -> Self {
        self.states.move_state = move_state;
        self
    }

    #[must_use]
    pub fn with_reduction(mut self, reduction: StateReductionMode) -> Self {
        self.states.reduction = reduction;
        self
    }

    #[must_use]
    pub fn with_convert_to_q(mut self, convert_to_q: StateConvertToQ) -> Self {
        self.states.convert_to_q = convert_to_q;
        self
    }

    #[must_use]
    pub fn with_normalize_to_monitor(mut self, normalize: StateNormalizeToMonitor) -> Self {
        self.states.normalize_to_monitor = normalize;
        self
    }

    #[must_use]
    pub fn with_wavelength(mut self, wavelength: StateWavelength) -> Self {
        self.states.wavelength = wavelength;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: StateMask) -> Self {
        self.states.mask = mask;
        self
    }

    #[must_use]
    pub fn with_slice_event(mut self, slice_event: StateSliceEvent) -> Self {
        self.states.slice_event = slice_event;
        self
    }

    /// Returns the composite without validating it.
    pub fn build_unchecked(self) -> AllStates {
        self.states
    }

    /// Validates and returns the composite.
    pub fn build(self) -> std::result::Result<AllStates, ValidationError> {
        self.states.validate()?;
        Ok(self.states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_state::StateMoveLarmor;
    use sans_model::{ReductionDimensionality, ReductionMode, RunFileInformation};
    use std::sync::Arc;

    fn factory(instrument: Instrument) -> BuilderFactory {
        let info = RunFileInformation::new(format!("{}00001", instrument.as_str()), instrument, 1);
        BuilderFactory::for_file(Arc::new(info)).unwrap()
    }

    fn valid_states(instrument: Instrument) -> AllStates {
        let factory = factory(instrument);
        let mut data = factory.data_builder();
        data.set_sample_scatter(format!("{}00001", instrument.as_str()));
        let mut q = factory.convert_to_q_builder();
        q.set_q_min(Some(0.001)).set_q_max(Some(0.3));
        let mut wavelength = factory.wavelength_builder();
        wavelength
            .set_wavelength_low(vec![1.75])
            .set_wavelength_high(vec![16.5])
            .set_wavelength_step(Some(0.125));
        AllStatesBuilder::new(&factory)
            .with_data(data.build())
            .with_convert_to_q(q.build())
            .with_wavelength(wavelength.build())
            .build()
            .unwrap()
    }

    #[test]
    fn test_factory_defaults_plus_mandatory_fields_validate() {
        for instrument in Instrument::KNOWN {
            let states = valid_states(*instrument);
            assert_eq!(states.data.instrument, *instrument);
        }
    }

    #[test]
    fn test_dimensionality_must_agree() {
        let mut states = valid_states(Instrument::Sans2d);
        states.convert_to_q.reduction_dimensionality = ReductionDimensionality::TwoDim;
        states.convert_to_q.q_xy_max = Some(0.2);
        states.convert_to_q.q_xy_step = Some(0.002);
        let err = states.validate().unwrap_err();
        assert_eq!(err.rules(), vec!["dimensionality_consistent"]);
        assert!(err.report(ALL_STATES).is_some());
    }

    #[test]
    fn test_move_variant_must_match_instrument() {
        let mut states = valid_states(Instrument::Sans2d);
        states.move_state = StateMove::from(StateMoveLarmor::default());
        let err = states.validate().unwrap_err();
        assert!(err.has_rule("move_matches_instrument"));
    }

    #[test]
    fn test_merged_mode_needs_hab() {
        let mut states = valid_states(Instrument::Larmor);
        states.reduction.reduction_mode = ReductionMode::Merged;
        let err = states.validate().unwrap_err();
        assert!(err.has_rule("reduction_mode_requires_hab"));
    }

    #[test]
    fn test_leaf_and_cross_issues_reported_together() {
        let mut states = valid_states(Instrument::Loq);
        states.data.sample_scatter = None;
        states.convert_to_q.reduction_dimensionality = ReductionDimensionality::TwoDim;
        let err = states.validate().unwrap_err();
        assert!(err.report("StateData").is_some());
        assert!(err.report("StateConvertToQ").is_some());
        assert!(err.report(ALL_STATES).is_some());
    }

    #[test]
    fn test_dict_sections_and_round_trip() {
        let states = valid_states(Instrument::Zoom);
        let bag = states.to_dict();
        let keys: Vec<&str> = bag.keys().map(String::as_str).collect();
        let mut expected = SECTIONS.to_vec();
        expected.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, expected);
        assert_eq!(AllStates::from_dict(&bag).unwrap(), states);
    }

    #[test]
    fn test_from_dict_requires_every_section() {
        let mut bag = valid_states(Instrument::Loq).to_dict();
        bag.remove("mask");
        let err = AllStates::from_dict(&bag).unwrap_err();
        assert!(matches!(err, StateError::MissingKey { ref key, .. } if key == "mask"));
    }
}
