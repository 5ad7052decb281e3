// Creature records and the creature factory.
//
// `Creature` is the one mutable entity in the hatchery. It is created by
// hatching or by reconstruction from save data, mutated by the evolution
// engine (`evolution.rs`) and the game clock (`clock.rs`), and destroyed
// only by an explicit discard (`session.rs`).
//
// `CreatureParams` is the partial, loosely-typed shape a creature arrives
// in: every field optional, colors not yet normalized, both lineage flags
// present independently. `create_creature` is the only way to turn one into
// a `Creature`. It fills defaults from the matching `ModelDefinition`,
// normalizes the color through `Color::resolve`, reconciles the lineage
// flags into a single `Lineage`, clamps stage and level into range, and
// recomputes `can_evolve`. It never fails; an unknown model key just means
// fewer definition-derived defaults. `CreatureParams` is also the save
// payload's creature shape (`Creature::to_params`), so loading a save and
// hatching share the same path.
//
// Ids come from `IdAllocator`, a monotonic counter owned by the session.
//
// **Critical constraint: determinism.** Creation consumes no randomness; the
// only state it touches is the id counter.

use crate::config::GameConfig;
use crate::definitions::{DefinitionTables, ModelDefinition};
use crate::evolution::update_can_evolve_status;
use crate::types::{
    Color, ColorInput, CreatureId, EnvironmentKey, EvolutionStage, Lineage, ModelKey,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct Creature {
    pub unique_id: CreatureId,
    pub name: String,
    pub model_key: ModelKey,
    /// Stage-0 definition of this creature's purebred line. Always `None`
    /// for hybrids.
    pub base_species_model_key: Option<ModelKey>,
    pub color: Color,
    pub current_evolution_stage: EvolutionStage,
    /// `0..=max_level`. Reset to 0 whenever the stage advances.
    pub level: u32,
    pub lineage: Lineage,
    /// Derived; see `evolution::update_can_evolve_status`.
    pub can_evolve: bool,
    /// Seconds left before natural evolution. Only counts down for
    /// purebreds at Base.
    pub time_to_next_evolution: u32,
    pub origin_environment_key: EnvironmentKey,
    pub incubated_environment_key: Option<EnvironmentKey>,
    pub evolved_in_environment_key: Option<EnvironmentKey>,
    pub has_silver_sheen: bool,
    pub species_name: String,
    /// Set when the player deliberately activates the creature from
    /// storage. A freshly hatched creature is displayed without it, and
    /// evolution and training require it.
    pub allow_active_panel_actions: bool,
}

impl Creature {
    pub fn is_purebred(&self) -> bool {
        self.lineage == Lineage::Purebred
    }

    pub fn is_hybrid(&self) -> bool {
        self.lineage == Lineage::Hybrid
    }

    pub fn is_base_stage(&self) -> bool {
        self.current_evolution_stage == EvolutionStage::Base
    }

    /// Color a presentation layer should draw: the sheen tint once a hybrid
    /// has it, the creature's own color otherwise.
    pub fn display_color(&self, config: &GameConfig) -> Color {
        if self.has_silver_sheen {
            config.silver_sheen_color
        } else {
            self.color
        }
    }

    /// The fully-populated params that recreate this creature.
    pub fn to_params(&self) -> CreatureParams {
        CreatureParams {
            unique_id: Some(self.unique_id),
            name: Some(self.name.clone()),
            model_key: Some(self.model_key.clone()),
            base_species_model_key: self.base_species_model_key.clone(),
            color: Some(ColorInput::from(self.color)),
            current_evolution_stage: Some(self.current_evolution_stage),
            level: Some(self.level),
            is_purebred: Some(self.is_purebred()),
            is_hybrid: Some(self.is_hybrid()),
            can_evolve: Some(self.can_evolve),
            time_to_next_evolution: Some(i64::from(self.time_to_next_evolution)),
            origin_environment_key: Some(self.origin_environment_key.clone()),
            incubated_environment_key: self.incubated_environment_key.clone(),
            evolved_in_environment_key: self.evolved_in_environment_key.clone(),
            has_silver_sheen: Some(self.has_silver_sheen),
            species_name: Some(self.species_name.clone()),
            allow_active_panel_actions: Some(self.allow_active_panel_actions),
        }
    }
}

/// Partial creature record. Missing fields are defaulted by
/// `create_creature`. Serialized field names are camelCase to match the
/// save payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatureParams {
    pub unique_id: Option<CreatureId>,
    pub name: Option<String>,
    pub model_key: Option<ModelKey>,
    pub base_species_model_key: Option<ModelKey>,
    pub color: Option<ColorInput>,
    pub current_evolution_stage: Option<EvolutionStage>,
    pub level: Option<u32>,
    pub is_purebred: Option<bool>,
    pub is_hybrid: Option<bool>,
    /// Accepted for payload compatibility; always recomputed.
    pub can_evolve: Option<bool>,
    /// Signed so that an overdue timer (`<= 0`) from older saves still
    /// loads; clamped to zero.
    pub time_to_next_evolution: Option<i64>,
    pub origin_environment_key: Option<EnvironmentKey>,
    pub incubated_environment_key: Option<EnvironmentKey>,
    pub evolved_in_environment_key: Option<EnvironmentKey>,
    pub has_silver_sheen: Option<bool>,
    pub species_name: Option<String>,
    pub allow_active_panel_actions: Option<bool>,
}

// ---------------------------------------------------------------------------
// Id allocation
// ---------------------------------------------------------------------------

/// Largest id a save may carry. Loaded ids above it are reassigned, which
/// keeps the counter far from `u64::MAX`.
pub const MAX_CREATURE_ID: u64 = (1 << 53) - 1;

/// Monotonic creature id counter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> CreatureId {
        let id = CreatureId(self.next);
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => log::error!("Creature id space exhausted; id {id} will be reused"),
        }
        id
    }

    /// The id the next allocation will return.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Make sure future ids are strictly greater than `id`.
    pub fn observe(&mut self, id: CreatureId) {
        self.next = self.next.max(id.0.saturating_add(1));
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build a canonical `Creature` from partial params.
///
/// `current_environment` is the default origin when the params name none.
/// Only draws from `ids` when `params.unique_id` is absent.
pub fn create_creature(
    params: CreatureParams,
    tables: &DefinitionTables,
    config: &GameConfig,
    ids: &mut IdAllocator,
    current_environment: &EnvironmentKey,
) -> Creature {
    let unique_id = params.unique_id.unwrap_or_else(|| ids.next_id());

    let model_key = params.model_key.unwrap_or_else(|| {
        log::warn!(
            "Creature {unique_id} has no model key; using {}",
            config.fallback_model_key
        );
        config.fallback_model_key.clone()
    });
    let definition = tables.model(model_key.as_str());

    let lineage = resolve_lineage(params.is_purebred, params.is_hybrid, definition);

    let base_species_model_key = match lineage {
        Lineage::Hybrid => None,
        Lineage::Purebred => match definition {
            Some(def) if def.evolution_stage == EvolutionStage::Base => Some(model_key.clone()),
            _ => params.base_species_model_key.or_else(|| {
                definition
                    .and_then(|def| tables.evolution_of(def, EvolutionStage::Base))
                    .map(|base| base.model_key.clone())
            }),
        },
    };

    let requested_stage = params
        .current_evolution_stage
        .or(definition.map(|d| d.evolution_stage))
        .unwrap_or_default();
    let current_evolution_stage = if requested_stage > lineage.max_stage() {
        log::warn!(
            "Creature {unique_id} stage {requested_stage} exceeds the {lineage:?} maximum; clamping"
        );
        lineage.max_stage()
    } else {
        requested_stage
    };

    let fallback_name = || format!("Creature {}", unique_id.0);
    let name = params
        .name
        .filter(|n| !n.is_empty())
        .or_else(|| definition.map(|d| d.species_name.clone()))
        .unwrap_or_else(fallback_name);
    let species_name = params
        .species_name
        .filter(|n| !n.is_empty())
        .or_else(|| definition.map(|d| d.species_name.clone()))
        .unwrap_or_else(fallback_name);

    let time_to_next_evolution = params
        .time_to_next_evolution
        .map(|t| t.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(config.evolution_time_seconds);

    let mut creature = Creature {
        unique_id,
        name,
        model_key,
        base_species_model_key,
        color: Color::resolve(params.color.as_ref(), config.neutral_color),
        current_evolution_stage,
        level: params.level.unwrap_or(0).min(config.max_level),
        lineage,
        can_evolve: false,
        time_to_next_evolution,
        origin_environment_key: params
            .origin_environment_key
            .unwrap_or_else(|| current_environment.clone()),
        incubated_environment_key: params.incubated_environment_key,
        evolved_in_environment_key: params.evolved_in_environment_key,
        has_silver_sheen: lineage == Lineage::Hybrid && params.has_silver_sheen.unwrap_or(false),
        species_name,
        allow_active_panel_actions: params.allow_active_panel_actions.unwrap_or(false),
    };
    update_can_evolve_status(&mut creature, config);
    creature
}

/// Reconcile the two independent lineage flags. Exactly one set wins;
/// otherwise the definition decides, and with no definition the creature is
/// treated as purebred.
fn resolve_lineage(
    is_purebred: Option<bool>,
    is_hybrid: Option<bool>,
    definition: Option<&ModelDefinition>,
) -> Lineage {
    match (is_purebred.unwrap_or(false), is_hybrid.unwrap_or(false)) {
        (true, false) => Lineage::Purebred,
        (false, true) => Lineage::Hybrid,
        (both, _) => {
            let derived = match definition {
                Some(def) if def.is_specific_hybrid => Lineage::Hybrid,
                _ => Lineage::Purebred,
            };
            if both {
                log::warn!("Creature flagged both purebred and hybrid; using {derived:?}");
            }
            derived
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (DefinitionTables, GameConfig, IdAllocator, EnvironmentKey) {
        (
            DefinitionTables::default_catalog(),
            GameConfig::default(),
            IdAllocator::default(),
            EnvironmentKey::from("ABYSSAL_MARSH"),
        )
    }

    #[test]
    fn purebred_base_defaults() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("ROOTFANG_BASE".into()),
            is_purebred: Some(true),
            color: Some(ColorInput::Hex("#334433".into())),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert_eq!(c.unique_id, CreatureId(0));
        assert_eq!(c.name, "Rootfang");
        assert_eq!(c.species_name, "Rootfang");
        assert_eq!(c.base_species_model_key.as_ref().map(ModelKey::as_str), Some("ROOTFANG_BASE"));
        assert_eq!(c.current_evolution_stage, EvolutionStage::Base);
        assert_eq!(c.level, 0);
        assert_eq!(c.time_to_next_evolution, 30);
        assert_eq!(c.color, Color::from_rgb_u32(0x334433));
        assert_eq!(c.origin_environment_key, env);
        assert!(!c.can_evolve);
        assert!(!c.allow_active_panel_actions);
        assert_eq!(ids.peek(), 1);
    }

    #[test]
    fn supplied_id_does_not_advance_counter() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            unique_id: Some(CreatureId(41)),
            model_key: Some("MIREFIN_BASE".into()),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert_eq!(c.unique_id, CreatureId(41));
        assert_eq!(ids.peek(), 0);
    }

    #[test]
    fn bad_color_becomes_neutral() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("MIREFIN_BASE".into()),
            color: Some(ColorInput::Hex("purple-ish".into())),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert_eq!(c.color, config.neutral_color);

        let missing = create_creature(CreatureParams::default(), &tables, &config, &mut ids, &env);
        assert_eq!(missing.color, config.neutral_color);
    }

    #[test]
    fn unknown_model_key_still_builds() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("NOT_A_REAL_KEY".into()),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert_eq!(c.name, "Creature 0");
        assert_eq!(c.species_name, "Creature 0");
        assert_eq!(c.current_evolution_stage, EvolutionStage::Base);
        assert!(c.is_purebred());
        assert!(c.base_species_model_key.is_none());
    }

    #[test]
    fn hybrid_has_no_base_key_and_lineage_from_definition() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("MIREFANG_HYBRID_BASE".into()),
            base_species_model_key: Some("MIREFIN_BASE".into()),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert!(c.is_hybrid());
        assert!(!c.is_purebred());
        assert!(c.base_species_model_key.is_none());
    }

    #[test]
    fn conflicting_flags_resolve_to_one_lineage() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("MIREFIN_BASE".into()),
            is_purebred: Some(true),
            is_hybrid: Some(true),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert!(c.is_purebred() ^ c.is_hybrid());
        assert!(c.is_purebred());
    }

    #[test]
    fn evolved_purebred_recovers_base_key() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("ANCIENT_MIREFIN_EV1".into()),
            is_purebred: Some(true),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert_eq!(c.current_evolution_stage, EvolutionStage::Ev1);
        assert_eq!(c.base_species_model_key.as_ref().map(ModelKey::as_str), Some("MIREFIN_BASE"));
    }

    #[test]
    fn stage_and_level_are_clamped() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("MIREFANG_HYBRID_BASE".into()),
            is_hybrid: Some(true),
            current_evolution_stage: Some(EvolutionStage::Ev2),
            level: Some(99),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert_eq!(c.current_evolution_stage, EvolutionStage::Ev1);
        assert_eq!(c.level, config.max_level);
        assert!(!c.can_evolve);
    }

    #[test]
    fn purebred_never_has_sheen() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("MIREFIN_BASE".into()),
            is_purebred: Some(true),
            has_silver_sheen: Some(true),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert!(!c.has_silver_sheen);
        assert_eq!(c.display_color(&config), c.color);
    }

    #[test]
    fn overdue_timer_clamps_to_zero_and_can_evolve() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("MIREFIN_BASE".into()),
            is_purebred: Some(true),
            time_to_next_evolution: Some(-4),
            can_evolve: Some(false),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        assert_eq!(c.time_to_next_evolution, 0);
        assert!(c.can_evolve, "can_evolve is recomputed, not trusted");
    }

    #[test]
    fn params_roundtrip_preserves_creature() {
        let (tables, config, mut ids, env) = fixtures();
        let params = CreatureParams {
            model_key: Some("PYRECLAW_BASE".into()),
            is_purebred: Some(true),
            incubated_environment_key: Some("SCORCHING_BASIN".into()),
            color: Some(ColorInput::Hex("8b4513".into())),
            level: Some(3),
            ..Default::default()
        };
        let c = create_creature(params, &tables, &config, &mut ids, &env);
        let json = serde_json::to_string(&c.to_params()).unwrap();
        assert!(json.contains("\"uniqueId\":0"));
        assert!(json.contains("\"color\":\"8b4513\""));
        let back: CreatureParams = serde_json::from_str(&json).unwrap();
        let rebuilt = create_creature(back, &tables, &config, &mut ids, &env);
        assert_eq!(rebuilt, c);
    }

    #[test]
    fn id_allocator_observe_only_moves_forward() {
        let mut ids = IdAllocator::starting_at(5);
        ids.observe(CreatureId(2));
        assert_eq!(ids.peek(), 5);
        ids.observe(CreatureId(9));
        assert_eq!(ids.next_id(), CreatureId(10));
    }
}
