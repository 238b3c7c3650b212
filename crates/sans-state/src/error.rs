//! Error types for building, coercing and decoding states.

use sans_model::{Facility, Instrument};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while setting parameters or decoding property bags.
///
/// Invariant violations are not errors of this type; they are reported
/// through [`ValidationError`](sans_model::ValidationError) by `validate()`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StateError {
    /// A value could not be coerced to the declared parameter type.
    #[error("Invalid value {value} for '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
        value: String,
    },

    /// A string did not name a member of the declared enumeration.
    #[error("Invalid {enum_type} value {value} for '{field}'")]
    InvalidEnumValue {
        field: String,
        enum_type: &'static str,
        value: String,
    },

    /// The state declares no parameter with this name.
    #[error("Unknown field '{field}' for {state}")]
    UnknownField { state: &'static str, field: String },

    /// The parameter exists but is derived from file information.
    #[error("Field '{field}' of {state} is derived from file information and cannot be set")]
    ReadOnlyField { state: &'static str, field: String },

    /// A property bag carries a missing or unknown variant discriminator.
    #[error("Unknown state type '{state_type}' for {family}")]
    UnknownStateType {
        family: &'static str,
        state_type: String,
    },

    /// A property bag is missing a mandatory section.
    #[error("Missing '{key}' in property bag of {state}")]
    MissingKey { state: &'static str, key: String },

    /// No builder is registered for the facility/instrument pair.
    #[error("No builder for facility {facility} and instrument {instrument}")]
    NotImplemented {
        facility: Facility,
        instrument: Instrument,
    },

    /// The property bag was written by a newer encoder.
    #[error("Property bag version {found} is not supported (maximum {supported})")]
    UnsupportedVersion { found: String, supported: u64 },

    /// A float is NaN or infinite and has no property-bag form.
    #[error("Cannot encode non-finite value {value} for '{field}'")]
    NonFiniteValue { field: String, value: f64 },

    /// The serialized form is not valid JSON.
    #[error("Failed to parse property bag")]
    Json(#[from] serde_json::Error),
}

impl StateError {
    pub(crate) fn invalid_value(field: &str, expected: &'static str, value: &Value) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            expected,
            value: value.to_string(),
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidValue {
                field,
                expected,
                value,
            } => format!("'{field}' needs {expected}, but got {value}."),
            Self::InvalidEnumValue {
                field,
                enum_type,
                value,
            } => format!("{value} is not a valid {enum_type} for '{field}'."),
            Self::UnknownField { state, field } => {
                format!("{state} has no setting called '{field}'.")
            }
            Self::ReadOnlyField { state, field } => {
                format!("'{field}' of {state} comes from the run file and cannot be changed.")
            }
            Self::UnknownStateType { family, state_type } => {
                format!("'{state_type}' is not a known kind of {family}.")
            }
            Self::MissingKey { state, key } => {
                format!("The saved {state} has no '{key}' section.")
            }
            Self::NotImplemented {
                facility,
                instrument,
            } => format!("Instrument {instrument} at facility {facility} is not supported."),
            Self::UnsupportedVersion { found, supported } => format!(
                "The saved settings use format version {found}; this build reads up to {supported}."
            ),
            Self::NonFiniteValue { field, value } => {
                format!("'{field}' is {value}, which cannot be saved; use a finite number.")
            }
            Self::Json(e) => format!("The saved settings are not valid JSON: {e}"),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidEnumValue { .. } => {
                Some("Enum values are matched by name, ignoring case.".into())
            }
            Self::UnknownField { .. } => Some("Check the setting name for typos.".into()),
            Self::NotImplemented { .. } => {
                Some("Run `sans instruments` to list supported instruments.".into())
            }
            Self::UnsupportedVersion { .. } => {
                Some("Re-export the settings with a matching version of the tool.".into())
            }
            _ => None,
        }
    }
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
