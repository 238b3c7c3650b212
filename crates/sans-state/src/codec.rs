//! Versioned property-bag encoding of states.
//!
//! The encoded form is what crosses process and language boundaries. It is
//! plain JSON: scalars, lists, string-keyed objects and null. Decoding
//! followed by encoding reproduces the same bag, and encoding followed by
//! decoding reproduces an equal state. NaN and infinite floats have no JSON
//! form, so states holding them are refused.

use serde_json::Value;
use tracing::{debug, warn};

use crate::all_states::AllStates;
use crate::error::{Result, StateError};
use crate::param::PropertyBag;
use crate::state::State;

/// Key holding the encoding version in a composite bag.
pub const VERSION_KEY: &str = "version";

/// Version written by [`encode`].
pub const PROPERTY_BAG_VERSION: u64 = 1;

fn refuse_non_finite(found: Vec<(String, f64)>) -> Result<()> {
    match found.into_iter().next() {
        Some((field, value)) => Err(StateError::NonFiniteValue { field, value }),
        None => Ok(()),
    }
}

/// Encodes the composite state, stamping the format version.
pub fn encode(states: &AllStates) -> Result<PropertyBag> {
    refuse_non_finite(states.non_finite_values())?;
    let mut bag = PropertyBag::new();
    bag.insert(VERSION_KEY.to_string(), Value::from(PROPERTY_BAG_VERSION));
    bag.extend(states.to_dict());
    Ok(bag)
}

/// Decodes a composite bag written by [`encode`].
///
/// A bag without a version is read as the current version.
pub fn decode(bag: &PropertyBag) -> Result<AllStates> {
    let mut sections = bag.clone();
    match sections.remove(VERSION_KEY) {
        None => warn!("property bag has no version; assuming {PROPERTY_BAG_VERSION}"),
        Some(version) => match version.as_u64() {
            Some(found) if found <= PROPERTY_BAG_VERSION => {}
            _ => {
                return Err(StateError::UnsupportedVersion {
                    found: version.to_string(),
                    supported: PROPERTY_BAG_VERSION,
                });
            }
        },
    }
    let states = AllStates::from_dict(&sections)?;
    debug!(instrument = %states.data.instrument, "decoded property bag");
    Ok(states)
}

/// Encodes a single leaf or family.
pub fn encode_state<S: State>(state: &S) -> Result<PropertyBag> {
    refuse_non_finite(state.non_finite_values())?;
    Ok(state.to_dict())
}

/// Decodes a single leaf or family.
pub fn decode_state<S: State>(bag: &PropertyBag) -> Result<S> {
    S::from_dict(bag)
}

/// Encodes the composite state as pretty-printed JSON.
pub fn to_json(states: &AllStates) -> Result<String> {
    Ok(serde_json::to_string_pretty(&encode(states)?)?)
}

/// Parses JSON written by [`to_json`].
pub fn from_json(json: &str) -> Result<AllStates> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Object(bag) => decode(&bag),
        other => Err(StateError::invalid_value("property bag", "an object", &other)),
    }
}
