// Evolution engine.
//
// Each creature's evolution state is keyed by (lineage, stage):
//
//   Purebred Base  --timer reaches 0, player evolves-->  EV1
//   Purebred EV1   --level reaches max_level------------>  EV2
//   Hybrid   Base  --level reaches max_level------------>  stage 1 (sheen)
//   Purebred EV2, Hybrid stage 1: terminal.
//
// `update_can_evolve_status` recomputes the derived `can_evolve` flag from
// that table and must run after any change to timer, level or stage.
// `evolve_naturally` performs the timer-gated transition, `level_up` trains
// a creature and fires the level-gated transition in the same call once the
// level hits the cap. Both look up the next definition through the
// creature's `base_species_model_key`; a missing definition is a data fault:
// it is logged as an error, `can_evolve` is forced false, and the creature is
// otherwise left untouched.
//
// Every transition resets `level` to 0, records the current environment in
// `evolved_in_environment_key`, and tints the creature with that
// environment's creature color when it has one.
//
// The activation gate (active, stored, `allow_active_panel_actions`) is the
// session's job; see `Session::evolve_naturally` and `Session::level_up`.
//
// `describe_evolution_status` renders the same table as player-facing text.
//
// **Critical constraint: determinism.** No randomness, no wall-clock time.

use crate::config::GameConfig;
use crate::creature::Creature;
use crate::definitions::DefinitionTables;
use crate::error::{ActionError, Result};
use crate::types::{EnvironmentKey, EvolutionStage, Lineage, ModelKey, format_time};
use std::fmt;

/// Read-only inputs an evolution needs.
#[derive(Clone, Copy)]
pub struct EvolutionContext<'a> {
    pub tables: &'a DefinitionTables,
    pub config: &'a GameConfig,
    /// Where the evolution happens.
    pub environment: &'a EnvironmentKey,
}

/// What a successful transition did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvolutionOutcome {
    pub from: EvolutionStage,
    pub to: EvolutionStage,
    pub model_key: ModelKey,
    pub gained_sheen: bool,
}

/// Result of one training step. `level` is the level reached before any
/// evolution reset it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelUpOutcome {
    pub level: u32,
    pub evolution: Option<EvolutionOutcome>,
}

/// Recompute `can_evolve` from lineage, stage, timer and level.
pub fn update_can_evolve_status(creature: &mut Creature, config: &GameConfig) {
    creature.can_evolve = match (creature.lineage, creature.current_evolution_stage) {
        (Lineage::Purebred, EvolutionStage::Base) => creature.time_to_next_evolution == 0,
        (Lineage::Purebred, EvolutionStage::Ev1) | (Lineage::Hybrid, EvolutionStage::Base) => {
            creature.level >= config.max_level
        }
        _ => false,
    };
}

/// True if the creature is at a level-gated stage and has hit the cap.
pub fn can_trigger_evolution_by_level(creature: &Creature, config: &GameConfig) -> bool {
    matches!(
        (creature.lineage, creature.current_evolution_stage),
        (Lineage::Purebred, EvolutionStage::Ev1) | (Lineage::Hybrid, EvolutionStage::Base)
    ) && creature.level >= config.max_level
}

/// Timer-gated Base -> EV1 for purebreds.
pub fn evolve_naturally(creature: &mut Creature, ctx: EvolutionContext<'_>) -> Result<EvolutionOutcome> {
    if !creature.is_purebred() || creature.current_evolution_stage != EvolutionStage::Base {
        return Err(ActionError::NotEligibleForNaturalEvolution);
    }
    if creature.time_to_next_evolution > 0 {
        return Err(ActionError::EvolutionTimerRunning {
            remaining: creature.time_to_next_evolution,
        });
    }

    let target = line_definition(creature, ctx.tables, EvolutionStage::Ev1)?;
    let outcome = apply_transition(creature, ctx, EvolutionStage::Ev1, target, false);
    creature.time_to_next_evolution = ctx.config.evolution_time_seconds;
    update_can_evolve_status(creature, ctx.config);
    Ok(outcome)
}

/// Level-gated transition: purebred EV1 -> EV2, or hybrid Base -> sheen.
/// Callers check `can_trigger_evolution_by_level` first; anything else is
/// reported as `MaxEvolutionReached`.
pub fn evolve_by_level(creature: &mut Creature, ctx: EvolutionContext<'_>) -> Result<EvolutionOutcome> {
    let outcome = match (creature.lineage, creature.current_evolution_stage) {
        (Lineage::Purebred, EvolutionStage::Ev1) => {
            let target = line_definition(creature, ctx.tables, EvolutionStage::Ev2)?;
            apply_transition(creature, ctx, EvolutionStage::Ev2, target, false)
        }
        (Lineage::Hybrid, EvolutionStage::Base) => {
            let unchanged = creature.model_key.clone();
            apply_transition(creature, ctx, EvolutionStage::Ev1, unchanged, true)
        }
        _ => return Err(ActionError::MaxEvolutionReached),
    };
    update_can_evolve_status(creature, ctx.config);
    Ok(outcome)
}

/// Train the creature one level.
///
/// At the lineage's final stage this fails. At the level cap it fires a
/// pending level-gated evolution, or fails if there is none. Otherwise the
/// level goes up by one, and reaching the cap fires the evolution right
/// away. A data fault during that automatic evolution keeps the new level,
/// logs, and returns `evolution: None`.
pub fn level_up(creature: &mut Creature, ctx: EvolutionContext<'_>) -> Result<LevelUpOutcome> {
    let config = ctx.config;
    if creature.current_evolution_stage >= creature.lineage.max_stage() {
        return Err(ActionError::MaxEvolutionReached);
    }

    if creature.level >= config.max_level {
        if !can_trigger_evolution_by_level(creature, config) {
            return Err(ActionError::MaxLevelReached);
        }
        let level = creature.level;
        let evolution = evolve_by_level(creature, ctx)?;
        return Ok(LevelUpOutcome {
            level,
            evolution: Some(evolution),
        });
    }

    creature.level += 1;
    let level = creature.level;
    if !can_trigger_evolution_by_level(creature, config) {
        update_can_evolve_status(creature, config);
        return Ok(LevelUpOutcome {
            level,
            evolution: None,
        });
    }
    // Data faults are already logged and `can_evolve` forced false.
    let evolution = evolve_by_level(creature, ctx).ok();
    Ok(LevelUpOutcome { level, evolution })
}

/// Find the `stage` definition of the creature's purebred line. On a miss,
/// logs, forces `can_evolve = false` and returns `EvolutionDataMissing`.
fn line_definition(
    creature: &mut Creature,
    tables: &DefinitionTables,
    stage: EvolutionStage,
) -> Result<ModelKey> {
    let base = creature
        .base_species_model_key
        .as_ref()
        .and_then(|key| tables.model(key.as_str()));
    let Some(base) = base else {
        log::error!(
            "Creature {} ({}) has no base definition (base key {:?}); cannot evolve",
            creature.unique_id,
            creature.model_key,
            creature.base_species_model_key
        );
        creature.can_evolve = false;
        return Err(ActionError::EvolutionDataMissing);
    };
    match tables.evolution_of(base, stage) {
        Some(def) => Ok(def.model_key.clone()),
        None => {
            log::error!(
                "No {stage} definition for {} from {:?}; cannot evolve creature {}",
                base.species_name,
                base.origin_environment_name,
                creature.unique_id
            );
            creature.can_evolve = false;
            Err(ActionError::EvolutionDataMissing)
        }
    }
}

fn apply_transition(
    creature: &mut Creature,
    ctx: EvolutionContext<'_>,
    to: EvolutionStage,
    model_key: ModelKey,
    gains_sheen: bool,
) -> EvolutionOutcome {
    let from = creature.current_evolution_stage;
    creature.model_key = model_key.clone();
    creature.current_evolution_stage = to;
    creature.level = 0;
    creature.evolved_in_environment_key = Some(ctx.environment.clone());
    if let Some(tint) = ctx.tables.creature_color(ctx.environment.as_str()) {
        creature.color = tint;
    }
    if gains_sheen {
        creature.has_silver_sheen = true;
    }
    log::info!(
        "Creature {} evolved {from} -> {to} as {model_key} in {}",
        creature.unique_id,
        ctx.environment
    );
    EvolutionOutcome {
        from,
        to,
        model_key,
        gained_sheen: gains_sheen,
    }
}

// ---------------------------------------------------------------------------
// Status text
// ---------------------------------------------------------------------------

/// Player-facing summary of where a creature stands on its evolution path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolutionStatus {
    NaturalCountdown { remaining: u32 },
    ReadyForNaturalEv1,
    TrainForEv2 { target_level: u32 },
    ReadyForEv2,
    MaxPurebred,
    TrainForSheen { target_level: u32 },
    ReadyForSheen,
    MaxHybrid,
}

impl fmt::Display for EvolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolutionStatus::NaturalCountdown { remaining } => {
                write!(f, "Evolves (Nat.): {}", format_time(*remaining))
            }
            EvolutionStatus::ReadyForNaturalEv1 => f.write_str("Ready for Nat. EV1"),
            EvolutionStatus::TrainForEv2 { target_level } => {
                write!(f, "Train to Lvl {target_level} for EV2")
            }
            EvolutionStatus::ReadyForEv2 => f.write_str("Ready for EV2 (Lvl Up)"),
            EvolutionStatus::MaxPurebred => f.write_str("Max Evolution (Purebred EV2)"),
            EvolutionStatus::TrainForSheen { target_level } => {
                write!(f, "Train to Lvl {target_level} for Sheen")
            }
            EvolutionStatus::ReadyForSheen => f.write_str("Ready for Sheen (Lvl Up)"),
            EvolutionStatus::MaxHybrid => f.write_str("Max Evolution (Hybrid Sheen)"),
        }
    }
}

pub fn describe_evolution_status(creature: &Creature, config: &GameConfig) -> EvolutionStatus {
    let at_cap = creature.level >= config.max_level;
    match (creature.lineage, creature.current_evolution_stage) {
        (Lineage::Purebred, EvolutionStage::Base) => {
            if creature.time_to_next_evolution > 0 {
                EvolutionStatus::NaturalCountdown {
                    remaining: creature.time_to_next_evolution,
                }
            } else {
                EvolutionStatus::ReadyForNaturalEv1
            }
        }
        (Lineage::Purebred, EvolutionStage::Ev1) if at_cap => EvolutionStatus::ReadyForEv2,
        (Lineage::Purebred, EvolutionStage::Ev1) => EvolutionStatus::TrainForEv2 {
            target_level: config.max_level,
        },
        (Lineage::Purebred, EvolutionStage::Ev2) => EvolutionStatus::MaxPurebred,
        (Lineage::Hybrid, EvolutionStage::Base) if at_cap => EvolutionStatus::ReadyForSheen,
        (Lineage::Hybrid, EvolutionStage::Base) => EvolutionStatus::TrainForSheen {
            target_level: config.max_level,
        },
        (Lineage::Hybrid, _) => EvolutionStatus::MaxHybrid,
    }
}
