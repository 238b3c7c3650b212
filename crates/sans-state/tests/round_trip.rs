use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use sans_model::{
    CanonicalCoordinates, Facility, FitModeForMerge, Instrument, RangeStepType, RebinType,
    ReductionDimensionality, ReductionMode, RunFileInformation,
};
use sans_state::{
    AllStates, AllStatesBuilder, BuilderFactory, PropertyBag, State, StateConvertToQ, StateData,
    StateMask, StateMove, StateMoveDetector, StateMoveLoq, StateMoveSans2d, StateNormalizeToMonitor,
    StateNormalizeToMonitorIsis, StateNormalizeToMonitorLoq, StateReductionMode, StateSliceEvent,
    StateWavelength, from_json, to_json,
};

fn check_round_trip<S: State>(state: &S) -> Result<(), TestCaseError> {
    let bag = state.to_dict();
    prop_assert_eq!(&S::from_dict(&bag).unwrap(), state);

    let json = serde_json::to_string(&bag).unwrap();
    let parsed: PropertyBag = serde_json::from_str(&json).unwrap();
    prop_assert_eq!(&parsed, &bag);
    prop_assert_eq!(&S::from_dict(&parsed).unwrap(), state);
    Ok(())
}

fn name() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,12}"
}

fn opt_name() -> impl Strategy<Value = Option<String>> {
    prop::option::of(name())
}

fn value() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

fn opt_value() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(value())
}

prop_compose! {
    fn data_state()(
        runs in prop::array::uniform6(opt_name()),
        periods in prop::array::uniform6(-2i64..8),
        calibration in opt_name(),
        run_number in prop::option::of(0i64..1_000_000),
        multi_period in any::<bool>(),
        instrument in prop::sample::select(Instrument::ALL.to_vec()),
    ) -> StateData {
        let [sample_scatter, sample_transmission, sample_direct, can_scatter, can_transmission, can_direct] = runs;
        StateData {
            sample_scatter,
            sample_scatter_period: periods[0],
            sample_transmission,
            sample_transmission_period: periods[1],
            sample_direct,
            sample_direct_period: periods[2],
            can_scatter,
            can_scatter_period: periods[3],
            can_transmission,
            can_transmission_period: periods[4],
            can_direct,
            can_direct_period: periods[5],
            calibration,
            sample_scatter_run_number: run_number,
            sample_scatter_is_multi_period: multi_period,
            instrument,
            facility: instrument.facility(),
            ..StateData::default()
        }
    }
}

prop_compose! {
    fn detector()(
        corrections in prop::array::uniform11(value()),
        names in (name(), name()),
    ) -> StateMoveDetector {
        StateMoveDetector {
            x_translation_correction: corrections[0],
            y_translation_correction: corrections[1],
            z_translation_correction: corrections[2],
            rotation_correction: corrections[3],
            side_correction: corrections[4],
            radius_correction: corrections[5],
            x_tilt_correction: corrections[6],
            y_tilt_correction: corrections[7],
            z_tilt_correction: corrections[8],
            sample_centre_pos1: corrections[9],
            sample_centre_pos2: corrections[10],
            detector_name: names.0,
            detector_name_short: names.1,
        }
    }
}

prop_compose! {
    fn sans2d_move()(
        lab in detector(),
        hab in prop::option::of(detector()),
        offset in value(),
        direction in prop::sample::select(CanonicalCoordinates::ALL.to_vec()),
        monitors in prop::collection::btree_map(1i64..10, name(), 0..5),
        geometry in prop::array::uniform4(value()),
    ) -> StateMove {
        StateMove::Sans2d(StateMoveSans2d {
            sample_offset: offset,
            sample_offset_direction: direction,
            lab_detector: lab,
            hab_detector: hab,
            monitor_names: monitors,
            hab_detector_radius: geometry[0],
            hab_detector_x: geometry[1],
            lab_detector_z: geometry[2],
            monitor_4_offset: geometry[3],
            ..StateMoveSans2d::default()
        })
    }
}

prop_compose! {
    fn loq_move()(lab in detector(), centre in value()) -> StateMove {
        StateMove::Loq(StateMoveLoq {
            lab_detector: lab,
            center_position: centre,
            ..StateMoveLoq::default()
        })
    }
}

fn move_state() -> impl Strategy<Value = StateMove> {
    prop_oneof![sans2d_move(), loq_move()]
}

prop_compose! {
    fn reduction_state()(
        mode in prop::sample::select(ReductionMode::ALL.to_vec()),
        dimensionality in prop::sample::select(ReductionDimensionality::ALL.to_vec()),
        fit in prop::sample::select(FitModeForMerge::ALL.to_vec()),
        shift_scale in (value(), value()),
        merge_range in (opt_value(), opt_value()),
        merge_mask in any::<bool>(),
        detector_names in prop::collection::btree_map("LAB|HAB", name(), 0..3),
    ) -> StateReductionMode {
        StateReductionMode {
            reduction_mode: mode,
            reduction_dimensionality: dimensionality,
            merge_fit_mode: fit,
            merge_shift: shift_scale.0,
            merge_scale: shift_scale.1,
            merge_range_min: merge_range.0,
            merge_range_max: merge_range.1,
            merge_mask,
            detector_names,
            ..StateReductionMode::default()
        }
    }
}

prop_compose! {
    fn convert_to_q_state()(
        dimensionality in prop::sample::select(ReductionDimensionality::ALL.to_vec()),
        flags in (any::<bool>(), any::<bool>()),
        q_range in (opt_value(), opt_value(), opt_value(), opt_value()),
        step_type in prop::option::of(prop::sample::select(RangeStepType::ALL.to_vec())),
        rebin_string in opt_name(),
        apertures in prop::array::uniform6(opt_value()),
        moderator in opt_name(),
    ) -> StateConvertToQ {
        StateConvertToQ {
            reduction_dimensionality: dimensionality,
            use_gravity: flags.0,
            use_q_resolution: flags.1,
            q_min: q_range.0,
            q_max: q_range.1,
            q_xy_max: q_range.2,
            q_xy_step: q_range.3,
            q_xy_step_type: step_type,
            q_1d_rebin_string: rebin_string,
            q_resolution_a1: apertures[0],
            q_resolution_a2: apertures[1],
            q_resolution_h1: apertures[2],
            q_resolution_w1: apertures[3],
            q_resolution_h2: apertures[4],
            q_resolution_w2: apertures[5],
            moderator_file: moderator,
            ..StateConvertToQ::default()
        }
    }
}

fn tof_map() -> impl Strategy<Value = BTreeMap<i64, f64>> {
    prop::collection::btree_map(1i64..10, value(), 0..4)
}

prop_compose! {
    fn normalize_state()(
        loq in any::<bool>(),
        prompt_peak in (opt_value(), opt_value(), any::<bool>()),
        wavelength in (opt_value(), opt_value(), opt_value()),
        rebin in prop::sample::select(RebinType::ALL.to_vec()),
        windows in (tof_map(), tof_map()),
        monitor in prop::option::of(1i64..10),
    ) -> StateNormalizeToMonitor {
        if loq {
            StateNormalizeToMonitor::Loq(StateNormalizeToMonitorLoq {
                prompt_peak_correction_min: prompt_peak.0,
                prompt_peak_correction_max: prompt_peak.1,
                prompt_peak_correction_enabled: prompt_peak.2,
                wavelength_low: wavelength.0,
                wavelength_high: wavelength.1,
                wavelength_step: wavelength.2,
                rebin_type: rebin,
                background_tof_monitor_start: windows.0,
                background_tof_monitor_stop: windows.1,
                incident_monitor: monitor,
                ..StateNormalizeToMonitorLoq::default()
            })
        } else {
            StateNormalizeToMonitor::Isis(StateNormalizeToMonitorIsis {
                prompt_peak_correction_min: prompt_peak.0,
                prompt_peak_correction_max: prompt_peak.1,
                prompt_peak_correction_enabled: prompt_peak.2,
                wavelength_low: wavelength.0,
                wavelength_high: wavelength.1,
                wavelength_step: wavelength.2,
                rebin_type: rebin,
                background_tof_monitor_start: windows.0,
                background_tof_monitor_stop: windows.1,
                incident_monitor: monitor,
                ..StateNormalizeToMonitorIsis::default()
            })
        }
    }
}

prop_compose! {
    fn wavelength_state()(
        low in prop::collection::vec(value(), 0..4),
        high in prop::collection::vec(value(), 0..4),
        step in opt_value(),
        step_type in prop::sample::select(RangeStepType::ALL.to_vec()),
    ) -> StateWavelength {
        StateWavelength {
            wavelength_low: low,
            wavelength_high: high,
            wavelength_step: step,
            wavelength_step_type: step_type,
            ..StateWavelength::default()
        }
    }
}

prop_compose! {
    fn mask_state()(
        radius in (opt_value(), opt_value()),
        phi in (value(), value(), any::<bool>()),
        arm in prop::array::uniform4(opt_value()),
        bins in (prop::collection::vec(value(), 0..3), prop::collection::vec(value(), 0..3)),
        files in prop::collection::vec(name(), 0..3),
        spectra in prop::collection::vec(-5i64..100_000, 0..5),
    ) -> StateMask {
        StateMask {
            radius_min: radius.0,
            radius_max: radius.1,
            phi_min: phi.0,
            phi_max: phi.1,
            use_mask_phi_mirror: phi.2,
            beam_stop_arm_width: arm[0],
            beam_stop_arm_angle: arm[1],
            beam_stop_arm_pos1: arm[2],
            beam_stop_arm_pos2: arm[3],
            bin_mask_general_start: bins.0,
            bin_mask_general_stop: bins.1,
            mask_files: files,
            single_spectra: spectra,
        }
    }
}

prop_compose! {
    fn slice_state()(
        start in prop::collection::vec(value(), 0..4),
        end in prop::collection::vec(value(), 0..4),
    ) -> StateSliceEvent {
        StateSliceEvent { start_time: start, end_time: end }
    }
}

prop_compose! {
    fn all_states()(
        data in data_state(),
        move_state in move_state(),
        reduction in reduction_state(),
        convert_to_q in convert_to_q_state(),
        normalize_to_monitor in normalize_state(),
        wavelength in wavelength_state(),
        mask in mask_state(),
        slice_event in slice_state(),
    ) -> AllStates {
        AllStates {
            data,
            move_state,
            reduction,
            convert_to_q,
            normalize_to_monitor,
            wavelength,
            mask,
            slice_event,
        }
    }
}

proptest! {
    #[test]
    fn data_round_trips(state in data_state()) {
        check_round_trip(&state)?;
    }

    #[test]
    fn move_round_trips(state in move_state()) {
        check_round_trip(&state)?;
    }

    #[test]
    fn reduction_round_trips(state in reduction_state()) {
        check_round_trip(&state)?;
    }

    #[test]
    fn convert_to_q_round_trips(state in convert_to_q_state()) {
        check_round_trip(&state)?;
    }

    #[test]
    fn normalize_round_trips(state in normalize_state()) {
        check_round_trip(&state)?;
    }

    #[test]
    fn wavelength_mask_and_slices_round_trip(
        wavelength in wavelength_state(),
        mask in mask_state(),
        slices in slice_state(),
    ) {
        check_round_trip(&wavelength)?;
        check_round_trip(&mask)?;
        check_round_trip(&slices)?;
    }

    #[test]
    fn composite_round_trips_through_json(states in all_states()) {
        prop_assert_eq!(AllStates::from_dict(&states.to_dict()).unwrap(), states.clone());
        let json = to_json(&states).unwrap();
        prop_assert_eq!(from_json(&json).unwrap(), states);
    }
}

#[test]
fn factory_built_states_round_trip() {
    for instrument in Instrument::KNOWN {
        let name = format!("{}1000", instrument.as_str());
        let info = RunFileInformation::new(name, *instrument, 1000)
            .with_periods(3)
            .with_idf_file_path(format!("/defs/{}_Definition.xml", instrument.as_str()));
        let factory = BuilderFactory::get_builder(Facility::Isis, Arc::new(info)).unwrap();
        let states = AllStatesBuilder::new(&factory).build_unchecked();
        assert!(states.data.sample_scatter_is_multi_period);
        assert_eq!(sans_state::decode(&sans_state::encode(&states).unwrap()).unwrap(), states);
    }
}

#[test]
fn decoded_bag_encodes_to_same_bag() {
    let info = RunFileInformation::new("LOQ74044", Instrument::Loq, 74044);
    let factory = BuilderFactory::for_file(Arc::new(info)).unwrap();
    let bag = sans_state::encode(&AllStatesBuilder::new(&factory).build_unchecked()).unwrap();
    let again = sans_state::encode(&sans_state::decode(&bag).unwrap()).unwrap();
    assert_eq!(again, bag);
}
