//! Mutable builders that produce state leaves.
//!
//! A builder owns a private working copy of its leaf and a handle to the
//! run's [`FileInformation`]. Every `build()` returns an independent copy
//! with file-derived facts applied; later setter calls never reach a state
//! that was already built. Builders do not validate.

use std::fmt;
use std::sync::Arc;

use sans_model::FileInformation;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StateError};
use crate::state::{Schema, State};

/// Builder for a single leaf type.
#[derive(Clone)]
pub struct StateBuilder<S> {
    state: S,
    file_information: Option<Arc<dyn FileInformation>>,
}

impl<S: fmt::Debug> fmt::Debug for StateBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBuilder")
            .field("state", &self.state)
            .field(
                "file_name",
                &self.file_information.as_ref().map(|info| info.file_name()),
            )
            .finish()
    }
}

impl<S: Schema> StateBuilder<S> {
    /// Starts from `initial` without file information.
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            file_information: None,
        }
    }

    /// Starts from `initial`, applying `file_information` on every build.
    pub fn with_file_information(initial: S, file_information: Arc<dyn FileInformation>) -> Self {
        Self {
            state: initial,
            file_information: Some(file_information),
        }
    }

    /// Current working copy, without file information applied.
    pub fn state(&self) -> &S {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn file_information(&self) -> Option<&dyn FileInformation> {
        self.file_information.as_deref()
    }

    /// Assigns a parameter by name, coercing `value` to its declared type.
    ///
    /// Fields derived from file information are rejected.
    pub fn set(&mut self, field: &str, value: &Value) -> Result<&mut Self> {
        let descriptor = S::descriptor(field).ok_or_else(|| StateError::UnknownField {
            state: S::NAME,
            field: field.to_string(),
        })?;
        if !descriptor.is_settable() {
            return Err(StateError::ReadOnlyField {
                state: S::NAME,
                field: field.to_string(),
            });
        }
        self.state.set_param(field, value)?;
        Ok(self)
    }

    /// Produces an independent state with file information applied.
    pub fn build(&self) -> S {
        let mut state = self.state.clone();
        if let Some(info) = &self.file_information {
            State::apply_file_information(&mut state, info.as_ref());
        }
        debug!(state = S::NAME, "built state");
        state
    }
}
