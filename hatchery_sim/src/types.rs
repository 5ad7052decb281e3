// Core types shared across the hatchery.
//
// Defines creature identifiers (`CreatureId`), string-backed definition keys
// (`ModelKey`, `EnvironmentKey`), the evolution stage and lineage enums, and
// the single color value type (`Color`) together with the one function that
// turns loosely-shaped color input into a concrete `Color`
// (`Color::resolve`). Nothing past that gate ever branches on how a color
// was originally written.
//
// All types derive or implement `Serialize`/`Deserialize` so they can flow
// through the save payload (see `save.rs`) unchanged.
//
// **Critical constraint: determinism.** Keys are compared lexicographically
// and kept in `BTreeMap`s elsewhere; nothing here depends on hash order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

// ---------------------------------------------------------------------------
// Creature IDs
// ---------------------------------------------------------------------------

/// Unique identifier for a creature. Allocated monotonically by
/// `IdAllocator` (see `creature.rs`) and never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub u64);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-backed keys
// ---------------------------------------------------------------------------

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_key!(/// Unique key of a model definition, e.g. `MIREFIN_BASE` or
/// `ANCIENT_MIREFIN_EV1`.
ModelKey);
string_key!(/// Unique key of an environment, e.g. `ABYSSAL_MARSH`.
EnvironmentKey);

/// Upper-snake a display name into a definition key: spaces become `_`,
/// letters are upper-cased, and anything outside `[A-Z0-9_]` is dropped.
pub fn key_from_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c.to_ascii_uppercase() })
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

// ---------------------------------------------------------------------------
// Evolution stage and lineage
// ---------------------------------------------------------------------------

/// Evolutionary stage of a creature or definition. Serialized as the bare
/// integer 0, 1 or 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EvolutionStage {
    #[default]
    Base,
    Ev1,
    Ev2,
}

impl EvolutionStage {
    pub fn as_u8(self) -> u8 {
        match self {
            EvolutionStage::Base => 0,
            EvolutionStage::Ev1 => 1,
            EvolutionStage::Ev2 => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(EvolutionStage::Base),
            1 => Some(EvolutionStage::Ev1),
            2 => Some(EvolutionStage::Ev2),
            _ => None,
        }
    }

    /// The following stage, or `None` at EV2.
    pub fn next(self) -> Option<Self> {
        Self::from_u8(self.as_u8() + 1)
    }
}

impl fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolutionStage::Base => f.write_str("Base"),
            EvolutionStage::Ev1 => f.write_str("EV1"),
            EvolutionStage::Ev2 => f.write_str("EV2"),
        }
    }
}

impl Serialize for EvolutionStage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for EvolutionStage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        EvolutionStage::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid evolution stage {value}")))
    }
}

/// Whether a creature belongs to a purebred line or is a hybrid. A creature
/// is always exactly one of the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lineage {
    Purebred,
    Hybrid,
}

impl Lineage {
    /// Highest stage this lineage can reach. Purebreds go Base -> EV1 ->
    /// EV2; hybrids have a single "sheen" evolution to stage 1.
    pub fn max_stage(self) -> EvolutionStage {
        match self {
            Lineage::Purebred => EvolutionStage::Ev2,
            Lineage::Hybrid => EvolutionStage::Ev1,
        }
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An opaque RGB color. Serialized as a six-digit lowercase hex string with
/// no leading `#` (e.g. `"c0c0c0"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value. Bits above 24 are ignored.
    pub const fn from_rgb_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
        }
    }

    /// Parse `RRGGBB` or `RGB`, with or without a leading `#`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let rgb = u32::from_str_radix(hex, 16).ok()?;
                Some(Self::from_rgb_u32(rgb))
            }
            3 => {
                // Short form: each nibble is doubled ("abc" -> "aabbcc").
                let mut channels = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let nibble = c.to_digit(16)? as u8;
                    channels[i] = nibble * 17;
                }
                Some(Self::new(channels[0], channels[1], channels[2]))
            }
            _ => None,
        }
    }

    /// Six lowercase hex digits, no `#`.
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The color-normalization gate. Every color that enters the hatchery
    /// from outside (factory params, save data, egg overrides) goes through
    /// here. Malformed or missing input is replaced by `fallback` with a
    /// warning; this never fails.
    pub fn resolve(input: Option<&ColorInput>, fallback: Color) -> Color {
        match input {
            Some(ColorInput::Hex(s)) => Color::from_hex(s).unwrap_or_else(|| {
                log::warn!("Invalid color string {s:?}; using #{}", fallback.to_hex());
                fallback
            }),
            Some(ColorInput::Components { r, g, b }) => {
                match (unit_channel(*r), unit_channel(*g), unit_channel(*b)) {
                    (Some(r), Some(g), Some(b)) => Color::new(r, g, b),
                    _ => {
                        log::warn!(
                            "Color components out of range ({r}, {g}, {b}); using #{}",
                            fallback.to_hex()
                        );
                        fallback
                    }
                }
            }
            Some(ColorInput::Malformed(value)) => {
                log::warn!("Unrecognized color value {value}; using #{}", fallback.to_hex());
                fallback
            }
            None => {
                log::warn!("Missing color; using #{}", fallback.to_hex());
                fallback
            }
        }
    }
}

/// Convert a `0.0..=1.0` channel to a byte. `None` for NaN or out-of-range.
fn unit_channel(value: f64) -> Option<u8> {
    if (0.0..=1.0).contains(&value) {
        Some((value * 255.0).round() as u8)
    } else {
        None
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid hex color"))
    }
}

impl From<Color> for ColorInput {
    fn from(color: Color) -> Self {
        ColorInput::Hex(color.to_hex())
    }
}

/// A color as it arrives at the boundary, before normalization: a hex
/// string, an object of unit-range float channels, or anything else.
/// Only `Color::resolve` looks inside this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    Hex(String),
    Components { r: f64, g: f64, b: f64 },
    Malformed(serde_json::Value),
}

// ---------------------------------------------------------------------------
// Time formatting
// ---------------------------------------------------------------------------

/// Format a second count as `MM:SS`. Minutes are not capped, so an hour
/// renders as `60:00`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
