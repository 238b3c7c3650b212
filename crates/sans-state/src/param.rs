//! Typed parameter descriptors and value coercion.
//!
//! Every field of a state is declared with a Rust type implementing
//! [`Param`]. The type decides the wire kind, whether `None` is allowed and
//! how a loosely typed property-bag value is coerced on assignment.

use std::collections::BTreeMap;

use sans_model::{
    CanonicalCoordinates, DetectorType, Facility, FitModeForMerge, Instrument, NamedEnum,
    RangeStepType, RebinType, ReductionDimensionality, ReductionMode,
};
use serde_json::{Map, Number, Value};

use crate::error::{Result, StateError};

/// Serialized form of a state: a string-keyed tree of plain values.
pub type PropertyBag = Map<String, Value>;

/// Wire kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
    String,
    Dict,
    List,
    /// Member of the named enumeration.
    Enum(&'static str),
    /// Nested state with the given state name.
    State(&'static str),
}

impl ParamKind {
    /// Short label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::Float => "float",
            ParamKind::Int => "int",
            ParamKind::Bool => "bool",
            ParamKind::String => "string",
            ParamKind::Dict => "dict",
            ParamKind::List => "list",
            ParamKind::Enum(name) | ParamKind::State(name) => *name,
        }
    }
}

/// Declared shape of a single state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub kind: ParamKind,
    pub nullable: bool,
    /// Builder setter for the field; `None` for fields derived from file
    /// information or owned by the builder factory.
    pub setter: Option<&'static str>,
}

impl ParamDescriptor {
    pub const fn of<T: Param>(name: &'static str) -> Self {
        Self {
            name,
            kind: T::KIND,
            nullable: T::NULLABLE,
            setter: None,
        }
    }

    #[must_use]
    pub const fn with_setter(mut self, setter: &'static str) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Returns true if builders may assign the field.
    pub fn is_settable(&self) -> bool {
        self.setter.is_some()
    }
}

/// A value type that can live in a state field.
pub trait Param: Sized {
    const KIND: ParamKind;
    const NULLABLE: bool = false;

    /// Converts the value to its property-bag form.
    fn to_value(&self) -> Value;

    /// Coerces a property-bag value, naming `field` in errors.
    fn from_value(field: &str, value: &Value) -> Result<Self>;

    /// Assigns `value` in place. Nested states override this to update
    /// only the keys that are present.
    fn merge_value(&mut self, field: &str, value: &Value) -> Result<()> {
        *self = Self::from_value(field, value)?;
        Ok(())
    }

    /// Appends `(path, value)` for every NaN or infinite float held by the
    /// value. JSON cannot carry them.
    fn non_finite(&self, _path: &str, _found: &mut Vec<(String, f64)>) {}
}

/// Path of `child` below `parent`; the root path is empty.
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

impl Param for f64 {
    const KIND: ParamKind = ParamKind::Float;

    /// Non-finite values have no JSON form and become null; `encode`
    /// refuses such states.
    fn to_value(&self) -> Value {
        Number::from_f64(*self).map_or(Value::Null, Value::Number)
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| StateError::invalid_value(field, "a float", value))
    }

    fn non_finite(&self, path: &str, found: &mut Vec<(String, f64)>) {
        if !self.is_finite() {
            found.push((path.to_string(), *self));
        }
    }
}

impl Param for i64 {
    const KIND: ParamKind = ParamKind::Int;

    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        if let Some(int) = value.as_i64() {
            return Ok(int);
        }
        // Integral floats such as 3.0 are accepted.
        match value.as_f64() {
            Some(float)
                if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 =>
            {
                Ok(float as i64)
            }
            _ => Err(StateError::invalid_value(field, "an integer", value)),
        }
    }
}

impl Param for bool {
    const KIND: ParamKind = ParamKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| StateError::invalid_value(field, "a boolean", value))
    }
}

impl Param for String {
    const KIND: ParamKind = ParamKind::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    /// Any non-null value is accepted; lists and dicts keep their JSON text.
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Err(StateError::invalid_value(field, "a string", value)),
            other => Ok(other.to_string()),
        }
    }
}

impl<T: Param> Param for Option<T> {
    const KIND: ParamKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Param::to_value)
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(field, value).map(Some)
        }
    }

    fn merge_value(&mut self, field: &str, value: &Value) -> Result<()> {
        match self {
            Some(inner) if !value.is_null() => inner.merge_value(field, value),
            _ => {
                *self = Self::from_value(field, value)?;
                Ok(())
            }
        }
    }

    fn non_finite(&self, path: &str, found: &mut Vec<(String, f64)>) {
        if let Some(inner) = self {
            inner.non_finite(path, found);
        }
    }
}

impl<T: Param> Param for Vec<T> {
    const KIND: ParamKind = ParamKind::List;

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Param::to_value).collect())
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| StateError::invalid_value(field, "a list", value))?;
        items.iter().map(|item| T::from_value(field, item)).collect()
    }

    fn non_finite(&self, path: &str, found: &mut Vec<(String, f64)>) {
        for (index, item) in self.iter().enumerate() {
            item.non_finite(&format!("{path}[{index}]"), found);
        }
    }
}

impl<T: Param> Param for BTreeMap<String, T> {
    const KIND: ParamKind = ParamKind::Dict;

    fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        )
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| StateError::invalid_value(field, "a dict", value))?;
        object
            .iter()
            .map(|(key, item)| Ok((key.clone(), T::from_value(field, item)?)))
            .collect()
    }

    fn non_finite(&self, path: &str, found: &mut Vec<(String, f64)>) {
        for (key, item) in self {
            item.non_finite(&format!("{path}[{key}]"), found);
        }
    }
}

/// Integer-keyed maps (monitor spectrum numbers). Keys are strings on the wire.
impl<T: Param> Param for BTreeMap<i64, T> {
    const KIND: ParamKind = ParamKind::Dict;

    fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.to_value()))
                .collect(),
        )
    }

    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| StateError::invalid_value(field, "a dict", value))?;
        object
            .iter()
            .map(|(key, item)| {
                let key = key.trim().parse::<i64>().map_err(|_| {
                    StateError::invalid_value(field, "integer keys", &Value::String(key.clone()))
                })?;
                Ok((key, T::from_value(field, item)?))
            })
            .collect()
    }

    fn non_finite(&self, path: &str, found: &mut Vec<(String, f64)>) {
        for (key, item) in self {
            item.non_finite(&format!("{path}[{key}]"), found);
        }
    }
}

fn enum_from_value<E: NamedEnum>(field: &str, value: &Value) -> Result<E> {
    value
        .as_str()
        .and_then(E::from_name)
        .ok_or_else(|| StateError::InvalidEnumValue {
            field: field.to_string(),
            enum_type: E::TYPE_NAME,
            value: value.to_string(),
        })
}

macro_rules! enum_param {
    ($($enum:ty),+ $(,)?) => {
        $(
            impl Param for $enum {
                const KIND: ParamKind = ParamKind::Enum(<$enum as NamedEnum>::TYPE_NAME);

                fn to_value(&self) -> Value {
                    Value::String(self.name().to_string())
                }

                fn from_value(field: &str, value: &Value) -> Result<Self> {
                    enum_from_value(field, value)
                }
            }
        )+
    };
}

enum_param!(
    Facility,
    Instrument,
    ReductionDimensionality,
    RangeStepType,
    RebinType,
    DetectorType,
    ReductionMode,
    CanonicalCoordinates,
    FitModeForMerge,
);
