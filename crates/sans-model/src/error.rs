//! Error types for file information resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while deriving [`FileInformation`](crate::FileInformation)
/// from a data file reference.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FileInformationError {
    /// The file name does not start with a known instrument prefix.
    #[error("Unrecognised run file name '{file_name}'")]
    UnrecognisedFileName { file_name: String },

    /// The instrument prefix was found but the run number is not numeric.
    #[error("Invalid run number '{value}' in '{file_name}'")]
    InvalidRunNumber { file_name: String, value: String },

    /// The file could not be found on any data search directory.
    #[error("File '{file_name}' not found in {} search directories", .searched.len())]
    FileNotFound {
        file_name: String,
        searched: Vec<PathBuf>,
    },

    /// The number of periods must be at least one.
    #[error("Invalid number of periods {periods} for '{file_name}'")]
    InvalidPeriods { file_name: String, periods: u32 },
}

impl FileInformationError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnrecognisedFileName { file_name } => format!(
                "'{file_name}' is not a run file name of a supported instrument."
            ),
            Self::InvalidRunNumber { file_name, value } => format!(
                "The run number '{value}' in '{file_name}' is not a number."
            ),
            Self::FileNotFound {
                file_name,
                searched,
            } => {
                let dirs: Vec<String> = searched
                    .iter()
                    .map(|dir| dir.display().to_string())
                    .collect();
                format!(
                    "Could not find '{file_name}' in: {}",
                    if dirs.is_empty() {
                        "(no search directories)".to_string()
                    } else {
                        dirs.join(", ")
                    }
                )
            }
            Self::InvalidPeriods { file_name, periods } => format!(
                "'{file_name}' reports {periods} periods; at least one is required."
            ),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UnrecognisedFileName { .. } | Self::InvalidRunNumber { .. } => Some(
                "Use a file name such as SANS2D00022024.nxs or LOQ74044.nxs.".into(),
            ),
            Self::FileNotFound { .. } => {
                Some("Add the folder holding the run to the data search directories.".into())
            }
            Self::InvalidPeriods { .. } => None,
        }
    }
}

/// Result type for file information operations.
pub type Result<T> = std::result::Result<T, FileInformationError>;
