//! Closed enumerations used as field values and dispatch keys.
//!
//! Every enum serializes to its canonical name (the same string the
//! reduction engine's parameter system expects) and parses back from it
//! case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shared surface of the closed enumerations.
///
/// The state crate relies on this to coerce property-bag strings into
/// enum-typed fields without knowing each enum individually.
pub trait NamedEnum: Copy + Eq + fmt::Debug + 'static {
    /// Type name used in coercion errors (e.g. "RangeStepType").
    const TYPE_NAME: &'static str;

    /// Every member, in declaration order.
    fn members() -> &'static [Self];

    /// Canonical wire name of this member.
    fn name(&self) -> &'static str;

    /// Looks up a member by wire name (case-insensitive, trimmed).
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::members()
            .iter()
            .copied()
            .find(|member| member.name().eq_ignore_ascii_case(name))
    }
}

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $text:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Returns the canonical wire name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl NamedEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn members() -> &'static [Self] {
                Self::ALL
            }

            fn name(&self) -> &'static str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as NamedEnum>::from_name(s)
                    .ok_or_else(|| format!("Unknown {}: {s}", stringify!($name)))
            }
        }
    };
}

named_enum! {
    /// Facility operating the instrument.
    pub enum Facility {
        /// ISIS Neutron and Muon Source.
        Isis => "ISIS",
        /// Placeholder before file information is known.
        NoFacility => "NoFacility",
    }
}

named_enum! {
    /// SANS instrument that produced the data.
    pub enum Instrument {
        Loq => "LOQ",
        Sans2d => "SANS2D",
        Larmor => "LARMOR",
        Zoom => "ZOOM",
        /// Placeholder before file information is known.
        NoInstrument => "NoInstrument",
    }
}

impl Instrument {
    /// Instruments that can appear in a run file name.
    pub const KNOWN: &'static [Instrument] = &[
        Instrument::Sans2d,
        Instrument::Larmor,
        Instrument::Zoom,
        Instrument::Loq,
    ];

    /// Facility hosting this instrument.
    pub fn facility(&self) -> Facility {
        match self {
            Instrument::Loq | Instrument::Sans2d | Instrument::Larmor | Instrument::Zoom => {
                Facility::Isis
            }
            Instrument::NoInstrument => Facility::NoFacility,
        }
    }

    /// Returns true if the instrument carries a high-angle bank.
    pub fn has_hab(&self) -> bool {
        matches!(self, Instrument::Loq | Instrument::Sans2d)
    }

    /// Matches the instrument prefix of a run file stem (e.g. "SANS2D00022024").
    ///
    /// Returns the instrument and the remainder of the stem.
    pub fn split_file_stem(stem: &str) -> Option<(Instrument, &str)> {
        Self::KNOWN.iter().copied().find_map(|instrument| {
            let prefix = instrument.as_str();
            let head = stem.get(..prefix.len())?;
            if head.eq_ignore_ascii_case(prefix) {
                Some((instrument, &stem[prefix.len()..]))
            } else {
                None
            }
        })
    }
}

named_enum! {
    /// Dimensionality of the reduced output.
    pub enum ReductionDimensionality {
        /// I(Q) with Q binned along one axis.
        OneDim => "OneDim",
        /// I(Qx, Qy).
        TwoDim => "TwoDim",
    }
}

named_enum! {
    /// Step interpretation for binning ranges.
    pub enum RangeStepType {
        Lin => "Lin",
        Log => "Log",
        RangeLin => "RangeLin",
        RangeLog => "RangeLog",
    }
}

impl RangeStepType {
    /// Returns true for logarithmic stepping.
    pub fn is_logarithmic(&self) -> bool {
        matches!(self, RangeStepType::Log | RangeStepType::RangeLog)
    }
}

named_enum! {
    /// Rebinning algorithm used when bringing spectra onto a common grid.
    pub enum RebinType {
        Rebin => "Rebin",
        InterpolatingRebin => "InterpolatingRebin",
    }
}

named_enum! {
    /// Detector bank.
    pub enum DetectorType {
        /// Low-angle bank (main detector).
        Lab => "LAB",
        /// High-angle bank.
        Hab => "HAB",
    }
}

named_enum! {
    /// Which banks are reduced and how their outputs are combined.
    pub enum ReductionMode {
        Lab => "LAB",
        Hab => "HAB",
        /// LAB and HAB stitched into one output.
        Merged => "Merged",
        /// LAB and HAB reduced independently.
        All => "All",
    }
}

impl ReductionMode {
    /// Returns true if the mode needs a high-angle bank.
    pub fn uses_hab(&self) -> bool {
        !matches!(self, ReductionMode::Lab)
    }
}

named_enum! {
    /// Beam-line coordinate axis.
    pub enum CanonicalCoordinates {
        X => "X",
        Y => "Y",
        Z => "Z",
    }
}

named_enum! {
    /// Free parameters when fitting the LAB/HAB overlap in merged mode.
    pub enum FitModeForMerge {
        ScaleOnly => "ScaleOnly",
        ShiftOnly => "ShiftOnly",
        Both => "Both",
        NoFit => "NoFit",
    }
}
