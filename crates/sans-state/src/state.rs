//! State base: the traits every reduction state implements and the macros
//! that declare leaves and variant families.

use std::fmt;

use sans_model::{FileInformation, Issue, ValidationError, ValidationReport};
use serde_json::Value;

use crate::error::{Result, StateError};
use crate::param::{ParamDescriptor, PropertyBag};

/// Property-bag key carrying the concrete variant of a state family.
pub const STATE_TYPE_KEY: &str = "state_type";

/// A typed, self-validating, serializable reduction state.
pub trait State: Clone + PartialEq + fmt::Debug {
    /// Name used in reports and as the variant discriminator.
    fn state_name(&self) -> &'static str;

    /// Appends every invariant violation to `report`.
    fn collect_issues(&self, report: &mut ValidationReport);

    /// Checks all invariants, reporting every violation at once.
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut report = ValidationReport::new(self.state_name());
        self.collect_issues(&mut report);
        report.into_result()
    }

    /// Flattens the state into a property bag with one entry per declared
    /// parameter, `None` becoming null.
    fn to_dict(&self) -> PropertyBag;

    /// Rebuilds a state from a property bag. Absent keys keep their
    /// defaults; unknown keys are rejected.
    fn from_dict(bag: &PropertyBag) -> Result<Self>
    where
        Self: Sized;

    /// Copies facts derived from the run file into the state.
    fn apply_file_information(&mut self, _info: &dyn FileInformation) {}

    /// Paths and values of every NaN or infinite float in the state.
    fn non_finite_values(&self) -> Vec<(String, f64)>;
}

/// Rule reported for floats without a JSON form.
pub const VALUE_FINITE_RULE: &str = "value_finite";

/// Declared parameter table of a leaf, with name-based access.
pub trait Schema: State + Default {
    const NAME: &'static str;

    fn schema() -> &'static [ParamDescriptor];

    fn get_param(&self, name: &str) -> Option<Value>;

    /// Coerces and assigns `value`. Nested states are updated key by key.
    fn set_param(&mut self, name: &str, value: &Value) -> Result<()>;

    fn descriptor(name: &str) -> Option<&'static ParamDescriptor> {
        Self::schema().iter().find(|descriptor| descriptor.name == name)
    }
}

/// Rules of a leaf that its parameter table cannot express.
pub trait Leaf {
    fn check(&self, report: &mut ValidationReport);

    fn apply_file_information(&mut self, _info: &dyn FileInformation) {}
}

pub(crate) fn schema_to_dict<S: Schema>(state: &S) -> PropertyBag {
    S::schema()
        .iter()
        .map(|descriptor| {
            let value = state.get_param(descriptor.name).unwrap_or(Value::Null);
            (descriptor.name.to_string(), value)
        })
        .collect()
}

pub(crate) fn schema_from_dict<S: Schema>(bag: &PropertyBag) -> Result<S> {
    let mut state = S::default();
    for (key, value) in bag {
        if key == STATE_TYPE_KEY {
            continue;
        }
        state.set_param(key, value)?;
    }
    Ok(state)
}

pub(crate) fn merge_object<S: Schema>(state: &mut S, field: &str, value: &Value) -> Result<()> {
    let object = value
        .as_object()
        .ok_or_else(|| StateError::invalid_value(field, "an object", value))?;
    for (key, item) in object {
        if key != STATE_TYPE_KEY {
            state.set_param(key, item)?;
        }
    }
    Ok(())
}

pub(crate) fn check_finite<S: State>(state: &S, report: &mut ValidationReport) {
    for (path, value) in state.non_finite_values() {
        report.push(Issue::non_finite(VALUE_FINITE_RULE, &path, value));
    }
}

/// Returns true if an optional name is present and not blank.
pub(crate) fn is_set(value: Option<&String>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

/// Declares a state leaf.
///
/// Each field is `name [/ setter]: Type = default`. Fields with a setter get
/// a typed method on `StateBuilder<Leaf>`; fields without one are filled from
/// file information or by the builder factory. The leaf must implement
/// [`Leaf`] for its cross-field rules.
macro_rules! state_leaf {
    (
        $(#[$meta:meta])*
        pub struct $name:ident as $state_name:literal {
            $(
                $(#[$fmeta:meta])*
                $field:ident $(/ $setter:ident)? : $ty:ty = $default:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )+
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default,)+
                }
            }
        }

        impl $crate::state::Schema for $name {
            const NAME: &'static str = $state_name;

            fn schema() -> &'static [$crate::param::ParamDescriptor] {
                const SCHEMA: &[$crate::param::ParamDescriptor] = &[
                    $(
                        $crate::param::ParamDescriptor::of::<$ty>(stringify!($field))
                            $(.with_setter(stringify!($setter)))?,
                    )+
                ];
                SCHEMA
            }

            fn get_param(&self, name: &str) -> Option<::serde_json::Value> {
                match name {
                    $(stringify!($field) => Some($crate::param::Param::to_value(&self.$field)),)+
                    _ => None,
                }
            }

            fn set_param(
                &mut self,
                name: &str,
                value: &::serde_json::Value,
            ) -> $crate::error::Result<()> {
                match name {
                    $(
                        stringify!($field) => {
                            $crate::param::Param::merge_value(&mut self.$field, name, value)
                        }
                    )+
                    _ => Err($crate::error::StateError::UnknownField {
                        state: $state_name,
                        field: name.to_string(),
                    }),
                }
            }
        }

        impl $crate::state::State for $name {
            fn state_name(&self) -> &'static str {
                $state_name
            }

            fn collect_issues(&self, report: &mut ::sans_model::ValidationReport) {
                $crate::state::check_finite(self, report);
                $crate::state::Leaf::check(self, report);
            }

            fn to_dict(&self) -> $crate::param::PropertyBag {
                $crate::state::schema_to_dict(self)
            }

            fn from_dict(bag: &$crate::param::PropertyBag) -> $crate::error::Result<Self> {
                $crate::state::schema_from_dict(bag)
            }

            fn apply_file_information(&mut self, info: &dyn ::sans_model::FileInformation) {
                $crate::state::Leaf::apply_file_information(self, info);
            }

            fn non_finite_values(&self) -> Vec<(String, f64)> {
                let mut found = Vec::new();
                $crate::param::Param::non_finite(self, "", &mut found);
                found
            }
        }

        impl $crate::param::Param for $name {
            const KIND: $crate::param::ParamKind = $crate::param::ParamKind::State($state_name);

            fn to_value(&self) -> ::serde_json::Value {
                ::serde_json::Value::Object($crate::state::State::to_dict(self))
            }

            fn from_value(field: &str, value: &::serde_json::Value) -> $crate::error::Result<Self> {
                let mut state = Self::default();
                $crate::state::merge_object(&mut state, field, value)?;
                Ok(state)
            }

            fn merge_value(
                &mut self,
                field: &str,
                value: &::serde_json::Value,
            ) -> $crate::error::Result<()> {
                $crate::state::merge_object(self, field, value)
            }

            fn non_finite(&self, path: &str, found: &mut Vec<(String, f64)>) {
                $(
                    $crate::param::Param::non_finite(
                        &self.$field,
                        &$crate::param::join_path(path, stringify!($field)),
                        found,
                    );
                )+
            }
        }

        impl $crate::builder::StateBuilder<$name> {
            $(
                $(
                    #[doc = concat!("Sets `", stringify!($field), "`.")]
                    pub fn $setter(&mut self, value: impl Into<$ty>) -> &mut Self {
                        self.state_mut().$field = value.into();
                        self
                    }
                )?
            )+
        }
    };
}

pub(crate) use state_leaf;

/// Declares a closed family of leaf variants and its builder.
///
/// The family serializes as the active variant's bag plus a
/// [`STATE_TYPE_KEY`] entry naming the variant.
macro_rules! state_family {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $family:literal, builder $builder:ident {
            $($variant:ident($leaf:ty),)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $($variant($leaf),)+
        }

        impl $name {
            /// Discriminator written under `state_type`.
            pub fn state_type(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$leaf as $crate::state::Schema>::NAME,)+
                }
            }

            /// Discriminators of every variant.
            pub fn state_types() -> &'static [&'static str] {
                &[$(<$leaf as $crate::state::Schema>::NAME,)+]
            }

            /// Reads a single parameter of the active variant.
            pub fn get_param(&self, name: &str) -> Option<::serde_json::Value> {
                match self {
                    $(Self::$variant(state) => $crate::state::Schema::get_param(state, name),)+
                }
            }

            /// Descriptor table of the active variant.
            pub fn schema(&self) -> &'static [$crate::param::ParamDescriptor] {
                match self {
                    $(Self::$variant(_) => <$leaf as $crate::state::Schema>::schema(),)+
                }
            }
        }

        $(
            impl From<$leaf> for $name {
                fn from(state: $leaf) -> Self {
                    Self::$variant(state)
                }
            }
        )+

        impl $crate::state::State for $name {
            fn state_name(&self) -> &'static str {
                self.state_type()
            }

            fn collect_issues(&self, report: &mut ::sans_model::ValidationReport) {
                match self {
                    $(Self::$variant(state) => $crate::state::State::collect_issues(state, report),)+
                }
            }

            fn to_dict(&self) -> $crate::param::PropertyBag {
                let mut bag = $crate::param::PropertyBag::new();
                bag.insert(
                    $crate::state::STATE_TYPE_KEY.to_string(),
                    ::serde_json::Value::String(self.state_type().to_string()),
                );
                let inner = match self {
                    $(Self::$variant(state) => $crate::state::State::to_dict(state),)+
                };
                bag.extend(inner);
                bag
            }

            fn from_dict(bag: &$crate::param::PropertyBag) -> $crate::error::Result<Self> {
                let state_type = bag
                    .get($crate::state::STATE_TYPE_KEY)
                    .and_then(::serde_json::Value::as_str)
                    .ok_or_else(|| $crate::error::StateError::MissingKey {
                        state: $family,
                        key: $crate::state::STATE_TYPE_KEY.to_string(),
                    })?;
                $(
                    if state_type == <$leaf as $crate::state::Schema>::NAME {
                        return Ok(Self::$variant(<$leaf as $crate::state::State>::from_dict(bag)?));
                    }
                )+
                Err($crate::error::StateError::UnknownStateType {
                    family: $family,
                    state_type: state_type.to_string(),
                })
            }

            fn apply_file_information(&mut self, info: &dyn ::sans_model::FileInformation) {
                match self {
                    $(Self::$variant(state) => {
                        $crate::state::State::apply_file_information(state, info);
                    })+
                }
            }

            fn non_finite_values(&self) -> Vec<(String, f64)> {
                match self {
                    $(Self::$variant(state) => $crate::state::State::non_finite_values(state),)+
                }
            }
        }

        #[doc = concat!("Builder for whichever [`", stringify!($name), "`] variant the factory selected.")]
        #[derive(Debug, Clone)]
        pub enum $builder {
            $($variant($crate::builder::StateBuilder<$leaf>),)+
        }

        impl $builder {
            /// Produces a fresh copy of the configured state.
            pub fn build(&self) -> $name {
                match self {
                    $(Self::$variant(builder) => $name::$variant(builder.build()),)+
                }
            }

            /// Assigns a parameter of the selected variant by name.
            pub fn set(
                &mut self,
                field: &str,
                value: &::serde_json::Value,
            ) -> $crate::error::Result<&mut Self> {
                match self {
                    $(Self::$variant(builder) => {
                        builder.set(field, value)?;
                    })+
                }
                Ok(self)
            }

            /// Discriminator of the variant this builder produces.
            pub fn state_type(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$leaf as $crate::state::Schema>::NAME,)+
                }
            }
        }
    };
}

pub(crate) use state_family;
