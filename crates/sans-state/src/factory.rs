//! Selection of builders by facility and instrument.
//!
//! A static registration table maps each supported (facility, instrument)
//! pair to the variant constructors and instrument defaults it needs.
//! Dispatch happens once, when the [`BuilderFactory`] is created; adding an
//! instrument means adding one [`Registration`].

use std::collections::BTreeMap;
use std::sync::Arc;

use sans_model::{DetectorType, Facility, FileInformation, Instrument};
use tracing::{debug, info_span};

use crate::builder::StateBuilder;
use crate::convert_to_q::StateConvertToQ;
use crate::data::StateData;
use crate::error::{Result, StateError};
use crate::mask::StateMask;
use crate::move_state::{
    MoveBuilder, StateMoveLarmor, StateMoveLoq, StateMoveSans2d, StateMoveZoom,
};
use crate::normalize_to_monitor::{
    NormalizeToMonitorBuilder, StateNormalizeToMonitorIsis, StateNormalizeToMonitorLoq,
};
use crate::reduction_mode::StateReductionMode;
use crate::slice_event::StateSliceEvent;
use crate::state::Schema;
use crate::wavelength::StateWavelength;

type MoveConstructor = fn(Arc<dyn FileInformation>) -> MoveBuilder;
type NormalizeConstructor = fn(Arc<dyn FileInformation>) -> NormalizeToMonitorBuilder;

/// Everything the factory needs to know about one instrument.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub facility: Facility,
    pub instrument: Instrument,
    /// `state_type` of the move variant.
    pub move_state_type: &'static str,
    /// `state_type` of the normalisation variant.
    pub normalize_state_type: &'static str,
    /// Monitor used for normalisation unless configured otherwise.
    pub default_incident_monitor: i64,
    new_move: MoveConstructor,
    new_normalize: NormalizeConstructor,
}

fn seeded_builder<S>(info: Arc<dyn FileInformation>) -> StateBuilder<S>
where
    S: Schema,
{
    StateBuilder::with_file_information(S::default(), info)
}

const REGISTRY: &[Registration] = &[
    Registration {
        facility: Facility::Isis,
        instrument: Instrument::Loq,
        move_state_type: StateMoveLoq::NAME,
        normalize_state_type: StateNormalizeToMonitorLoq::NAME,
        default_incident_monitor: 2,
        new_move: |info| MoveBuilder::Loq(seeded_builder(info)),
        new_normalize: |info| NormalizeToMonitorBuilder::Loq(seeded_builder(info)),
    },
    Registration {
        facility: Facility::Isis,
        instrument: Instrument::Sans2d,
        move_state_type: StateMoveSans2d::NAME,
        normalize_state_type: StateNormalizeToMonitorIsis::NAME,
        default_incident_monitor: 1,
        new_move: |info| MoveBuilder::Sans2d(seeded_builder(info)),
        new_normalize: |info| NormalizeToMonitorBuilder::Isis(seeded_builder(info)),
    },
    Registration {
        facility: Facility::Isis,
        instrument: Instrument::Larmor,
        move_state_type: StateMoveLarmor::NAME,
        normalize_state_type: StateNormalizeToMonitorIsis::NAME,
        default_incident_monitor: 1,
        new_move: |info| MoveBuilder::Larmor(seeded_builder(info)),
        new_normalize: |info| NormalizeToMonitorBuilder::Isis(seeded_builder(info)),
    },
    Registration {
        facility: Facility::Isis,
        instrument: Instrument::Zoom,
        move_state_type: StateMoveZoom::NAME,
        normalize_state_type: StateNormalizeToMonitorIsis::NAME,
        default_incident_monitor: 3,
        new_move: |info| MoveBuilder::Zoom(seeded_builder(info)),
        new_normalize: |info| NormalizeToMonitorBuilder::Isis(seeded_builder(info)),
    },
];

/// Looks up the registration for a facility/instrument pair.
pub fn registration(facility: Facility, instrument: Instrument) -> Result<&'static Registration> {
    REGISTRY
        .iter()
        .find(|entry| entry.facility == facility && entry.instrument == instrument)
        .ok_or(StateError::NotImplemented {
            facility,
            instrument,
        })
}

/// Every supported registration, in table order.
pub fn registrations() -> &'static [Registration] {
    REGISTRY
}

/// Hands out builders for one run, seeded with that run's file information.
#[derive(Debug, Clone)]
pub struct BuilderFactory {
    registration: &'static Registration,
    file_information: Arc<dyn FileInformation>,
}

impl BuilderFactory {
    /// Selects builders for `facility` and the instrument of `file_information`.
    ///
    /// Fails with [`StateError::NotImplemented`] for unsupported pairs.
    pub fn get_builder(
        facility: Facility,
        file_information: Arc<dyn FileInformation>,
    ) -> Result<Self> {
        let instrument = file_information.instrument();
        let _span = info_span!(
            "builder_factory",
            facility = %facility,
            instrument = %instrument
        )
        .entered();
        let registration = registration(facility, instrument)?;
        debug!(
            move_state = registration.move_state_type,
            normalize_state = registration.normalize_state_type,
            "selected state variants"
        );
        Ok(Self {
            registration,
            file_information,
        })
    }

    /// Selects builders using the facility reported by the file information.
    pub fn for_file(file_information: Arc<dyn FileInformation>) -> Result<Self> {
        let facility = file_information.facility();
        Self::get_builder(facility, file_information)
    }

    pub fn registration(&self) -> &'static Registration {
        self.registration
    }

    pub fn instrument(&self) -> Instrument {
        self.registration.instrument
    }

    pub fn file_information(&self) -> &Arc<dyn FileInformation> {
        &self.file_information
    }

    fn seeded<S: Schema>(&self, initial: S) -> StateBuilder<S> {
        StateBuilder::with_file_information(initial, Arc::clone(&self.file_information))
    }

    pub fn data_builder(&self) -> StateBuilder<StateData> {
        self.seeded(StateData::default())
    }

    pub fn move_builder(&self) -> MoveBuilder {
        (self.registration.new_move)(Arc::clone(&self.file_information))
    }

    /// Reduction-mode builder with the instrument's bank names filled in.
    pub fn reduction_builder(&self) -> StateBuilder<StateReductionMode> {
        let moved = self.move_builder().build();
        let detector_names: BTreeMap<String, String> = DetectorType::ALL
            .iter()
            .filter_map(|bank| {
                moved
                    .detector(*bank)
                    .map(|detector| (bank.as_str().to_string(), detector.detector_name.clone()))
            })
            .collect();
        self.seeded(StateReductionMode {
            detector_names,
            ..StateReductionMode::default()
        })
    }

    pub fn convert_to_q_builder(&self) -> StateBuilder<StateConvertToQ> {
        self.seeded(StateConvertToQ::default())
    }

    /// Normalisation builder with the instrument's default incident monitor.
    pub fn normalize_to_monitor_builder(&self) -> NormalizeToMonitorBuilder {
        let mut builder = (self.registration.new_normalize)(Arc::clone(&self.file_information));
        let monitor = Some(self.registration.default_incident_monitor);
        match &mut builder {
            NormalizeToMonitorBuilder::Isis(inner) => {
                inner.set_incident_monitor(monitor);
            }
            NormalizeToMonitorBuilder::Loq(inner) => {
                inner.set_incident_monitor(monitor);
            }
        }
        builder
    }

    pub fn wavelength_builder(&self) -> StateBuilder<StateWavelength> {
        self.seeded(StateWavelength::default())
    }

    pub fn mask_builder(&self) -> StateBuilder<StateMask> {
        self.seeded(StateMask::default())
    }

    pub fn slice_event_builder(&self) -> StateBuilder<StateSliceEvent> {
        self.seeded(StateSliceEvent::default())
    }
}
