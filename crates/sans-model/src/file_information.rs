//! Read-only facts about a run file.
//!
//! Builders never look at data files themselves. They receive a
//! [`FileInformation`] that was resolved once, up front, and copy the facts
//! they need (instrument, facility, run number, ...) into the state they
//! produce.
//!
//! Search directories are an injected collaborator
//! ([`DataSearchDirectoryProvider`]) rather than process-wide configuration,
//! so resolution is deterministic under test.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::enums::{Facility, Instrument};
use crate::error::{FileInformationError, Result};

/// Facts derived from a concrete data file.
pub trait FileInformation: fmt::Debug + Send + Sync {
    /// File name as supplied by the user.
    fn file_name(&self) -> &str;

    /// Instrument that recorded the run.
    fn instrument(&self) -> Instrument;

    /// Facility operating the instrument.
    fn facility(&self) -> Facility {
        self.instrument().facility()
    }

    /// Run number parsed from the file.
    fn run_number(&self) -> u32;

    /// Number of periods in the run (1 for single-period data).
    fn number_of_periods(&self) -> u32;

    /// Instrument definition file used for the run, if known.
    fn idf_file_path(&self) -> Option<&Path>;

    /// Instrument parameter file used for the run, if known.
    fn ipf_file_path(&self) -> Option<&Path>;

    /// Returns true if the run holds more than one period.
    fn is_multi_period(&self) -> bool {
        self.number_of_periods() > 1
    }
}

/// Immutable [`FileInformation`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFileInformation {
    file_name: String,
    instrument: Instrument,
    run_number: u32,
    number_of_periods: u32,
    idf_file_path: Option<PathBuf>,
    ipf_file_path: Option<PathBuf>,
}

impl RunFileInformation {
    /// Creates single-period file information without definition files.
    pub fn new(file_name: impl Into<String>, instrument: Instrument, run_number: u32) -> Self {
        Self {
            file_name: file_name.into(),
            instrument,
            run_number,
            number_of_periods: 1,
            idf_file_path: None,
            ipf_file_path: None,
        }
    }

    /// Sets the number of periods.
    #[must_use]
    pub fn with_periods(mut self, periods: u32) -> Self {
        self.number_of_periods = periods;
        self
    }

    /// Sets the instrument definition file path.
    #[must_use]
    pub fn with_idf_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.idf_file_path = Some(path.into());
        self
    }

    /// Sets the instrument parameter file path.
    #[must_use]
    pub fn with_ipf_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ipf_file_path = Some(path.into());
        self
    }
}

impl FileInformation for RunFileInformation {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn instrument(&self) -> Instrument {
        self.instrument
    }

    fn run_number(&self) -> u32 {
        self.run_number
    }

    fn number_of_periods(&self) -> u32 {
        self.number_of_periods
    }

    fn idf_file_path(&self) -> Option<&Path> {
        self.idf_file_path.as_deref()
    }

    fn ipf_file_path(&self) -> Option<&Path> {
        self.ipf_file_path.as_deref()
    }
}

/// Source of the directories used to resolve run files and definitions.
pub trait DataSearchDirectoryProvider: Send + Sync {
    /// Directories searched for run files, in priority order.
    fn search_directories(&self) -> Vec<PathBuf>;

    /// Directory holding `<INSTR>_Definition.xml` / `<INSTR>_Parameters.xml`.
    fn instrument_definition_directory(&self) -> Option<PathBuf>;
}

/// Fixed list of search directories.
#[derive(Debug, Clone, Default)]
pub struct StaticSearchDirectories {
    directories: Vec<PathBuf>,
    definition_directory: Option<PathBuf>,
}

impl StaticSearchDirectories {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self {
            directories,
            definition_directory: None,
        }
    }

    #[must_use]
    pub fn with_definition_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.definition_directory = Some(directory.into());
        self
    }
}

impl DataSearchDirectoryProvider for StaticSearchDirectories {
    fn search_directories(&self) -> Vec<PathBuf> {
        self.directories.clone()
    }

    fn instrument_definition_directory(&self) -> Option<PathBuf> {
        self.definition_directory.clone()
    }
}

/// Resolves run file references into [`RunFileInformation`].
#[derive(Debug, Clone)]
pub struct FileInformationFactory<P> {
    provider: P,
}

impl<P: DataSearchDirectoryProvider> FileInformationFactory<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Resolves `file_name` and derives single-period file information.
    pub fn create(&self, file_name: &str) -> Result<RunFileInformation> {
        self.create_with_periods(file_name, 1)
    }

    /// Resolves `file_name` and derives file information with `periods` periods.
    pub fn create_with_periods(&self, file_name: &str, periods: u32) -> Result<RunFileInformation> {
        if periods == 0 {
            return Err(FileInformationError::InvalidPeriods {
                file_name: file_name.to_string(),
                periods,
            });
        }
        let (instrument, run_number) = parse_run_file_name(file_name)?;
        let path = self.locate(file_name)?;
        debug!(
            file_name,
            path = %path.display(),
            instrument = %instrument,
            run_number,
            "resolved run file"
        );

        let mut info = RunFileInformation::new(file_name, instrument, run_number)
            .with_periods(periods);
        if let Some(dir) = self.provider.instrument_definition_directory() {
            info = info
                .with_idf_file_path(dir.join(format!("{}_Definition.xml", instrument.as_str())))
                .with_ipf_file_path(dir.join(format!("{}_Parameters.xml", instrument.as_str())));
        }
        Ok(info)
    }

    fn locate(&self, file_name: &str) -> Result<PathBuf> {
        let direct = Path::new(file_name);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        let searched = self.provider.search_directories();
        let with_extension = format!("{file_name}.nxs");
        for dir in &searched {
            for candidate in [file_name, with_extension.as_str()] {
                let path = dir.join(candidate);
                if path.is_file() {
                    return Ok(path);
                }
            }
        }
        Err(FileInformationError::FileNotFound {
            file_name: file_name.to_string(),
            searched,
        })
    }
}

/// Parses the instrument and run number out of a run file name.
///
/// Accepts bare names (`LOQ74044`), names with an extension
/// (`SANS2D00022024.nxs`) and paths.
pub fn parse_run_file_name(file_name: &str) -> Result<(Instrument, u32)> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name);
    let (instrument, rest) = Instrument::split_file_stem(stem).ok_or_else(|| {
        FileInformationError::UnrecognisedFileName {
            file_name: file_name.to_string(),
        }
    })?;
    let digits = rest.trim_start_matches('_');
    let run_number = digits
        .parse::<u32>()
        .map_err(|_| FileInformationError::InvalidRunNumber {
            file_name: file_name.to_string(),
            value: digits.to_string(),
        })?;
    Ok((instrument, run_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_zero_padded_run_number() {
        let (instrument, run) = parse_run_file_name("SANS2D00022024.nxs").unwrap();
        assert_eq!(instrument, Instrument::Sans2d);
        assert_eq!(run, 22024);
    }

    #[test]
    fn parse_rejects_unknown_prefix() {
        let err = parse_run_file_name("D22_000123.nxs").unwrap_err();
        assert!(matches!(err, FileInformationError::UnrecognisedFileName { .. }));
    }

    #[test]
    fn parse_rejects_non_numeric_run() {
        let err = parse_run_file_name("LOQ74044a").unwrap_err();
        assert!(matches!(err, FileInformationError::InvalidRunNumber { .. }));
    }

    #[test]
    fn run_file_information_defaults() {
        let info = RunFileInformation::new("LOQ74044", Instrument::Loq, 74044);
        assert_eq!(info.facility(), Facility::Isis);
        assert_eq!(info.number_of_periods(), 1);
        assert!(!info.is_multi_period());
        assert!(info.idf_file_path().is_none());
    }
}
