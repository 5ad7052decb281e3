// Data-driven game configuration.
//
// All tunable hatchery parameters live in `GameConfig`, loadable from JSON.
// The lifecycle, evolution and breeding code never hard-code a limit,
// duration or fallback color; they read it from here. Every field has a
// default (`#[serde(default)]` on the struct), so a config file only needs
// to name the values it changes.
//
// See also: `session.rs` which owns the `GameConfig`, `breeding.rs` for how
// `CompatibilityPolicy` is applied.

use crate::error::LoadError;
use crate::types::{Color, EnvironmentKey, ModelKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How two stage-0 creatures with no matching hybrid rule are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompatibilityPolicy {
    /// Only identical purebreds or an explicit hybrid rule make a pair
    /// compatible.
    #[default]
    RuleRequired,
    /// Additionally accept pairs whose origin environments have overlapping
    /// temperature ranges. Such pairs resolve through the rule-miss
    /// fallback at hatch time.
    TemperatureOverlap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Level at which level-gated evolutions fire. Levels never exceed it.
    pub max_level: u32,
    /// Capacity of the stored-creature collection.
    pub max_stored_creatures: usize,
    /// Countdown for natural (timer-based) Base -> EV1 evolution.
    pub evolution_time_seconds: u32,
    /// Countdown from incubation start to hatch.
    pub incubation_time_seconds: u32,
    /// Display tint for hybrids that have gained their silver sheen. The
    /// stored creature color is left alone; see `Creature::display_color`.
    pub silver_sheen_color: Color,
    /// Substituted for malformed or missing color input.
    pub neutral_color: Color,
    /// Hatchling color when the incubation environment has no creature
    /// color.
    pub hatch_fallback_color: Color,
    pub standard_egg_color: Color,
    pub hybrid_egg_color: Color,
    pub compatibility_policy: CompatibilityPolicy,
    /// Environment selected when a session starts or a save names an
    /// unknown one.
    pub default_environment: EnvironmentKey,
    /// Model used for a hatch when no purebred definition exists at all.
    pub fallback_model_key: ModelKey,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_level: 10,
            max_stored_creatures: 10,
            evolution_time_seconds: 30,
            incubation_time_seconds: 30,
            silver_sheen_color: Color::from_rgb_u32(0xC0C0C0),
            neutral_color: Color::from_rgb_u32(0xCCCCCC),
            hatch_fallback_color: Color::from_rgb_u32(0x999999),
            standard_egg_color: Color::from_rgb_u32(0xFFFFFF),
            hybrid_egg_color: Color::from_rgb_u32(0xDA70D6),
            compatibility_policy: CompatibilityPolicy::RuleRequired,
            default_environment: EnvironmentKey::from("ABYSSAL_MARSH"),
            fallback_model_key: ModelKey::from("MIREFIN_BASE"),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = GameConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
        // Colors go out as bare hex.
        assert!(json.contains("\"c0c0c0\""));
    }

    #[test]
    fn config_loads_from_json_string() {
        let json = r##"{
            "max_level": 5,
            "incubation_time_seconds": 3,
            "hybrid_egg_color": "#00ff00",
            "compatibility_policy": "TemperatureOverlap"
        }"##;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.max_level, 5);
        assert_eq!(config.incubation_time_seconds, 3);
        assert_eq!(config.hybrid_egg_color, Color::new(0, 255, 0));
        assert_eq!(config.compatibility_policy, CompatibilityPolicy::TemperatureOverlap);
        // Unnamed fields keep their defaults.
        assert_eq!(config.max_stored_creatures, 10);
        assert_eq!(config.evolution_time_seconds, 30);
        assert_eq!(config.default_environment.as_str(), "ABYSSAL_MARSH");
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(LoadError::Json(_))
        ));
        assert!(GameConfig::from_json(r#"{"neutral_color": "nope"}"#).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::load("/nonexistent/hatchery-config.json").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
