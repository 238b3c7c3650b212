//! Typed reduction-state configuration for SANS data reduction.
//!
//! A reduction is described by a set of state leaves (`StateData`,
//! `StateMove`, `StateConvertToQ`, ...). Each leaf
//! - declares its parameters with types and defaults,
//! - validates itself, reporting every violated invariant at once,
//! - flattens to and rebuilds from a JSON property bag.
//!
//! Leaves are produced by builders obtained from a [`BuilderFactory`],
//! which picks the instrument-specific variants once from the run's
//! [`FileInformation`](sans_model::FileInformation).
//!
//! ```
//! use std::sync::Arc;
//! use sans_model::{Instrument, RunFileInformation};
//! use sans_state::{BuilderFactory, State};
//!
//! let info = RunFileInformation::new("LOQ74044", Instrument::Loq, 74044);
//! let factory = BuilderFactory::for_file(Arc::new(info)).unwrap();
//!
//! let mut data = factory.data_builder();
//! data.set_sample_scatter("LOQ74044".to_string());
//! let state = data.build();
//!
//! assert!(state.validate().is_ok());
//! assert_eq!(state.sample_scatter_run_number, Some(74044));
//! ```

pub mod all_states;
pub mod builder;
mod checks;
pub mod codec;
pub mod convert_to_q;
pub mod data;
pub mod error;
pub mod factory;
pub mod mask;
pub mod move_state;
pub mod normalize_to_monitor;
pub mod param;
pub mod reduction_mode;
pub mod slice_event;
pub mod state;
pub mod wavelength;

pub use all_states::{ALL_STATES, AllStates, AllStatesBuilder, SECTIONS};
pub use builder::StateBuilder;
pub use codec::{
    PROPERTY_BAG_VERSION, VERSION_KEY, decode, decode_state, encode, encode_state, from_json,
    to_json,
};
pub use convert_to_q::StateConvertToQ;
pub use data::{ALL_PERIODS, StateData};
pub use error::{Result, StateError};
pub use factory::{BuilderFactory, Registration, registration, registrations};
pub use mask::StateMask;
pub use move_state::{
    MoveBuilder, MoveCommon, StateMove, StateMoveDetector, StateMoveLarmor, StateMoveLoq,
    StateMoveSans2d, StateMoveZoom,
};
pub use normalize_to_monitor::{
    NormalizeToMonitorBuilder, StateNormalizeToMonitor, StateNormalizeToMonitorIsis,
    StateNormalizeToMonitorLoq,
};
pub use param::{Param, ParamDescriptor, ParamKind, PropertyBag};
pub use reduction_mode::StateReductionMode;
pub use slice_event::StateSliceEvent;
pub use state::{Leaf, STATE_TYPE_KEY, Schema, State, VALUE_FINITE_RULE};
pub use wavelength::StateWavelength;
