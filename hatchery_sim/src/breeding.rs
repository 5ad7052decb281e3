// Compatibility and hybridization.
//
// Two stage-0 creatures can mate along exactly two paths:
// 1. Identical purebreds: both purebred, same model key. The offspring is
//    another of that species.
// 2. A hybrid rule: the sorted pair of parent model keys appears in the
//    intra-environment table (same origin environment) or the
//    inter-environment table for the sorted pair of origin environments.
//    The offspring is the hybrid the rule names.
// Under `CompatibilityPolicy::TemperatureOverlap` a third path accepts any
// other stage-0 pair whose origin environments' temperature ranges overlap;
// those pairs have no rule, so their offspring goes through the rule-miss
// fallback below.
//
// `resolve_offspring` never fails. A compatible pair with no rule, or
// parents in an unexpected state, produce a hybrid carrying parent 1's model
// key, and the miss is logged as an error since it means the rule tables
// have a gap. Hybrid offspring never carry a `base_species_model_key`.
//
// `pick_hatchling_species` covers unmated eggs: a random purebred base
// species of the incubation environment, or of any environment if that one
// has none.
//
// See also: `definitions.rs` for `HybridRuleTables`, `session.rs` for
// `setup_mating` and `hatch`.
//
// **Critical constraint: determinism.** The only randomness is the
// session's `GameRng`, passed in explicitly.

use crate::config::CompatibilityPolicy;
use crate::creature::Creature;
use crate::definitions::DefinitionTables;
use crate::types::{EvolutionStage, Lineage, ModelKey};
use hatchery_prng::GameRng;

/// How an offspring's model key was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    IdenticalPurebred,
    RuleMatch,
    /// Stage-0 parents with no rule; parent 1's key is reused.
    RuleMiss,
    /// Parents were not both at stage 0; parent 1's key is reused.
    UnexpectedParents,
}

/// What a mated egg will hatch into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffspringPlan {
    pub model_key: ModelKey,
    pub lineage: Lineage,
    pub base_species_model_key: Option<ModelKey>,
    pub resolution: Resolution,
}

/// Both purebred, both Base, same model key.
pub fn is_purebred_pairing(c1: &Creature, c2: &Creature) -> bool {
    c1.is_purebred()
        && c2.is_purebred()
        && c1.is_base_stage()
        && c2.is_base_stage()
        && c1.model_key == c2.model_key
}

/// Whether two creatures can mate. Symmetric in its arguments.
pub fn are_compatible(
    c1: &Creature,
    c2: &Creature,
    tables: &DefinitionTables,
    policy: CompatibilityPolicy,
) -> bool {
    let (Some(def1), Some(def2)) = (
        tables.model(c1.model_key.as_str()),
        tables.model(c2.model_key.as_str()),
    ) else {
        log::warn!(
            "Definitions not found for compatibility check of {} ({}) and {} ({})",
            c1.unique_id,
            c1.model_key,
            c2.unique_id,
            c2.model_key
        );
        return false;
    };

    if !c1.is_base_stage()
        || !c2.is_base_stage()
        || def1.evolution_stage != EvolutionStage::Base
        || def2.evolution_stage != EvolutionStage::Base
    {
        return false;
    }

    if def1.is_purebred_line && def2.is_purebred_line && is_purebred_pairing(c1, c2) {
        return true;
    }

    let rule = tables.rules().lookup(
        &c1.origin_environment_key,
        &c2.origin_environment_key,
        &c1.model_key,
        &c2.model_key,
    );
    if rule.is_some() {
        return true;
    }

    match policy {
        CompatibilityPolicy::RuleRequired => false,
        CompatibilityPolicy::TemperatureOverlap => {
            match (
                tables.environment(c1.origin_environment_key.as_str()),
                tables.environment(c2.origin_environment_key.as_str()),
            ) {
                (Some(e1), Some(e2)) => e1.temperature_overlaps(e2),
                _ => false,
            }
        }
    }
}

/// Decide the offspring of a mated pair. Never fails.
pub fn resolve_offspring(
    parent1: &Creature,
    parent2: &Creature,
    tables: &DefinitionTables,
) -> OffspringPlan {
    if is_purebred_pairing(parent1, parent2) {
        return OffspringPlan {
            model_key: parent1.model_key.clone(),
            lineage: Lineage::Purebred,
            base_species_model_key: Some(parent1.model_key.clone()),
            resolution: Resolution::IdenticalPurebred,
        };
    }

    let fallback = |resolution: Resolution| OffspringPlan {
        model_key: parent1.model_key.clone(),
        lineage: Lineage::Hybrid,
        base_species_model_key: None,
        resolution,
    };

    if !parent1.is_base_stage() || !parent2.is_base_stage() {
        log::error!(
            "Unexpected parent state for mating ({} stage {}, {} stage {}); defaulting to {}",
            parent1.unique_id,
            parent1.current_evolution_stage,
            parent2.unique_id,
            parent2.current_evolution_stage,
            parent1.model_key
        );
        return fallback(Resolution::UnexpectedParents);
    }

    match tables.rules().lookup(
        &parent1.origin_environment_key,
        &parent2.origin_environment_key,
        &parent1.model_key,
        &parent2.model_key,
    ) {
        Some(hybrid) => OffspringPlan {
            model_key: hybrid.clone(),
            lineage: Lineage::Hybrid,
            base_species_model_key: None,
            resolution: Resolution::RuleMatch,
        },
        None => {
            log::error!(
                "Hybrid mating has no rule for {} & {}; defaulting to {}",
                parent1.model_key,
                parent2.model_key,
                parent1.model_key
            );
            fallback(Resolution::RuleMiss)
        }
    }
}

/// Random purebred base species for an unmated egg. Candidates come from
/// `environment_name` when it has any, otherwise from every environment.
/// `None` only if the tables hold no purebred base definitions at all.
pub fn pick_hatchling_species(
    tables: &DefinitionTables,
    environment_name: Option<&str>,
    rng: &mut GameRng,
) -> Option<ModelKey> {
    let local = environment_name
        .map(|name| tables.base_purebreds_in(name))
        .unwrap_or_default();
    let candidates = if local.is_empty() {
        tables.base_purebreds()
    } else {
        local
    };
    rng.pick(&candidates).map(|def| def.model_key.clone())
}
