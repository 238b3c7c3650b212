//! Shared model types for SANS reduction states.
//!
//! This crate holds everything the state system needs that is not itself a
//! state: the closed enumerations used as field values and dispatch keys,
//! the read-only [`FileInformation`] boundary, and the validation issue
//! types reported by `validate()`.

pub mod enums;
pub mod error;
pub mod file_information;
pub mod issue;

pub use enums::{
    CanonicalCoordinates, DetectorType, Facility, FitModeForMerge, Instrument, NamedEnum,
    RangeStepType, RebinType, ReductionDimensionality, ReductionMode,
};
pub use error::{FileInformationError, Result};
pub use file_information::{
    DataSearchDirectoryProvider, FileInformation, FileInformationFactory, RunFileInformation,
    StaticSearchDirectories, parse_run_file_name,
};
pub use issue::{Issue, IssueKind, ValidationError, ValidationReport};
