//! Closed option sets for the essence system.
//!
//! Each enum has:
//! - a wire string matching the dose-calculation service (`as_str()`)
//! - a short ASCII key for command-line input (`key()`)
//! - an English display label (`label()`, also used by `Display`)
//! - Serialize/Deserialize through the wire string, rejecting unknown values
//! - `FromStr` accepting either the wire string or the key

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string names no variant of a closed option set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    /// The option set that was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated list of accepted keys.
    pub expected: String,
}

// ---------------------------------------------------------------------------
// Macro: defines a closed enum with wire strings, keys and labels.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, kind = $kind:expr, default = $default:ident,
        variants: [
            $( ($variant:ident, $wire:literal, $key:literal, $label:literal) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[ $( Self::$variant, )+ ];

            const WIRE_VALUES: &'static [&'static str] = &[ $( $wire, )+ ];

            /// Returns the wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }

            /// Returns the command-line key.
            pub fn key(&self) -> &'static str {
                match self {
                    $( Self::$variant => $key, )+
                }
            }

            /// Returns the display label.
            pub fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Parses a wire string only.
            pub fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $( $wire => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_wire(&s)
                    .ok_or_else(|| serde::de::Error::unknown_variant(&s, Self::WIRE_VALUES))
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if let Some(v) = Self::from_wire(s) {
                    return Ok(v);
                }
                let lowered = s.trim().to_ascii_lowercase();
                match lowered.as_str() {
                    $( $key => Ok(Self::$variant), )+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                        expected: [$( $key ),+].join(", "),
                    }),
                }
            }
        }
    };
}

define_enum!(
    /// Age band of the exposed subject.
    AgeCategory, kind = "age category", default = Adult,
    variants: [
        (Infant, "< 30 mois", "infant", "Infant (under 30 months)"),
        (Child2To6, "enfant 2-6 ans", "child-2-6", "Child (2-6 years)"),
        (Child6To12, "enfant 6-12 ans", "child-6-12", "Child (6-12 years)"),
        (Adult, "adulte", "adult", "Adult"),
        (Elderly, "sujet âgé", "elderly", "Elderly"),
    ]
);

impl AgeCategory {
    /// Returns `true` for the two child bands.
    pub fn is_child(&self) -> bool {
        matches!(self, Self::Child2To6 | Self::Child6To12)
    }
}

define_enum!(
    /// Biological sex of the exposed subject.
    Sex, kind = "sex", default = Female,
    variants: [
        (Male, "male", "male", "Male"),
        (Female, "female", "female", "Female"),
    ]
);

define_enum!(
    /// Physiological state of the exposed subject.
    PhysiologicalState, kind = "physiological state", default = Normal,
    variants: [
        (Normal, "normal", "normal", "Normal"),
        (Pregnant, "grossesse", "pregnant", "Pregnant"),
        (Lactating, "allaitement", "lactating", "Breastfeeding"),
    ]
);

define_enum!(
    /// Administration route.
    Route, kind = "route", default = Topical,
    variants: [
        (Topical, "topique", "topical", "Topical"),
        (Oral, "orale", "oral", "Oral"),
        (Inhalation, "inhalation", "inhalation", "Inhalation"),
    ]
);

impl Route {
    /// Unit of the daily amount for this route.
    pub fn amount_unit(&self) -> &'static str {
        match self {
            Self::Topical => "mg of finished product",
            Self::Oral => "mg",
            Self::Inhalation => "drops",
        }
    }
}

define_enum!(
    /// Dominant biochemical family of an essential oil.
    BiochemicalFamily, kind = "biochemical family", default = MonoterpeneHydrocarbons,
    variants: [
        (MonoterpeneHydrocarbons, "monoterpènes hydrocarbures", "monoterpenes", "Monoterpene hydrocarbons"),
        (Monoterpenols, "monoterpénols", "monoterpenols", "Monoterpenols"),
        (Phenols, "phénols", "phenols", "Phenols"),
        (AromaticAldehydes, "aldéhydes aromatiques", "aromatic-aldehydes", "Aromatic aldehydes"),
        (ToxicKetones, "cétones toxiques", "toxic-ketones", "Toxic ketones"),
        (Oxides, "oxydes", "oxides", "Oxides"),
        (Furocoumarins, "furocoumarines", "furocoumarins", "Furocoumarins"),
    ]
);

define_enum!(
    /// Severity of a contraindication in a calculation report.
    ContraindicationKind, kind = "contraindication type", default = Relative,
    variants: [
        (Absolute, "absolute", "absolute", "Absolute"),
        (Relative, "relative", "relative", "Relative"),
    ]
);
