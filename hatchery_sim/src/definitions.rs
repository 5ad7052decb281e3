// Definition tables: the static, read-only data every other module consults.
//
// Holds three collections:
// - `ModelDefinition`: one per purebred species-stage (Base/EV1/EV2, tied
//   to an origin environment) and one per specific hybrid (stage 0 only, no
//   origin environment).
// - `EnvironmentDefinition`: key, display name, Fahrenheit temperature
//   range, and ambiance colors. The ambiance's `creature_color` is what
//   evolving and hatching creatures are tinted with.
// - `HybridRuleTables`: intra-environment rules (one environment key ->
//   parent pair -> hybrid key) and inter-environment rules (environment pair
//   -> parent pair -> hybrid key). Both pair keys are built by sorting the
//   two participants and joining with `+`, so lookup order never matters.
//
// Tables are normally built once at startup, either from the built-in
// catalog (`catalog.rs`, via `DefinitionTables::default_catalog()`) or from
// JSON (`DefinitionTables::from_json`). `DefinitionTablesBuilder` is the
// shared construction path: it assigns ids, derives model keys from names,
// and resolves rules by species and hybrid name, logging and skipping any
// rule whose participants cannot be found.
//
// See also: `breeding.rs` (rule lookup for compatibility and offspring),
// `evolution.rs` (EV1/EV2 lookup), `creature.rs` (factory defaults).
//
// **Critical constraint: determinism.** All maps are `BTreeMap`s and
// candidate lists are returned in definition order, so random picks over
// them (`hatchery_prng::GameRng::pick`) are reproducible.

use crate::types::{Color, EnvironmentKey, EvolutionStage, ModelKey, key_from_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Model and environment definitions
// ---------------------------------------------------------------------------

/// Whether a specific hybrid crosses two species of one environment or of
/// two different environments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridType {
    Intra,
    Inter,
}

/// A static species-stage or hybrid definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub id: u32,
    pub full_name: String,
    pub model_key: ModelKey,
    pub expected_asset_name: String,
    pub species_name: String,
    pub evolution_stage: EvolutionStage,
    /// Display name of the origin environment. `None` for hybrids.
    pub origin_environment_name: Option<String>,
    pub is_purebred_line: bool,
    pub is_specific_hybrid: bool,
    pub hybrid_type: Option<HybridType>,
}

/// Ambient colors of an environment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambiance {
    pub background_color: Color,
    pub fog_color: Color,
    pub light_color: Color,
    /// Tint applied to creatures hatching or evolving here. Optional in
    /// hand-written tables; callers fall back to a configured color.
    pub creature_color: Option<Color>,
}

impl Ambiance {
    /// Ambiance used for environments whose name has no known palette.
    pub const UNKNOWN: Ambiance = Ambiance {
        background_color: Color::from_rgb_u32(0x555555),
        fog_color: Color::from_rgb_u32(0x666666),
        light_color: Color::from_rgb_u32(0xFFFFFF),
        creature_color: Some(Color::from_rgb_u32(0x888888)),
    };
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDefinition {
    pub id: u32,
    pub key: EnvironmentKey,
    pub name: String,
    /// Degrees Fahrenheit, inclusive.
    pub temp_min: i32,
    pub temp_max: i32,
    pub ambiance: Ambiance,
}

impl EnvironmentDefinition {
    /// True if the two inclusive temperature ranges share at least one
    /// degree.
    pub fn temperature_overlaps(&self, other: &EnvironmentDefinition) -> bool {
        self.temp_min <= other.temp_max && other.temp_min <= self.temp_max
    }
}

// ---------------------------------------------------------------------------
// Hybrid rules
// ---------------------------------------------------------------------------

/// Intra- and inter-environment hybrid rule maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HybridRuleTables {
    pub intra: BTreeMap<EnvironmentKey, BTreeMap<String, ModelKey>>,
    pub inter: BTreeMap<String, BTreeMap<String, ModelKey>>,
}

impl HybridRuleTables {
    /// Order-independent key for a pair: the two parts sorted
    /// lexicographically and joined with `+`.
    pub fn pair_key(a: &str, b: &str) -> String {
        if a <= b {
            format!("{a}+{b}")
        } else {
            format!("{b}+{a}")
        }
    }

    pub fn insert_intra(
        &mut self,
        env: &EnvironmentKey,
        parent1: &ModelKey,
        parent2: &ModelKey,
        hybrid: ModelKey,
    ) {
        self.intra
            .entry(env.clone())
            .or_default()
            .insert(Self::pair_key(parent1.as_str(), parent2.as_str()), hybrid);
    }

    pub fn insert_inter(
        &mut self,
        env1: &EnvironmentKey,
        env2: &EnvironmentKey,
        parent1: &ModelKey,
        parent2: &ModelKey,
        hybrid: ModelKey,
    ) {
        self.inter
            .entry(Self::pair_key(env1.as_str(), env2.as_str()))
            .or_default()
            .insert(Self::pair_key(parent1.as_str(), parent2.as_str()), hybrid);
    }

    /// Find the hybrid produced by two parents from the given origin
    /// environments. Uses the intra table when both environments are the
    /// same, the inter table otherwise. Argument order does not matter.
    pub fn lookup(
        &self,
        env1: &EnvironmentKey,
        env2: &EnvironmentKey,
        parent1: &ModelKey,
        parent2: &ModelKey,
    ) -> Option<&ModelKey> {
        let parents = Self::pair_key(parent1.as_str(), parent2.as_str());
        if env1 == env2 {
            self.intra.get(env1)?.get(&parents)
        } else {
            self.inter
                .get(&Self::pair_key(env1.as_str(), env2.as_str()))?
                .get(&parents)
        }
    }

    /// Total number of rules across both maps.
    pub fn len(&self) -> usize {
        self.intra.values().map(BTreeMap::len).sum::<usize>()
            + self.inter.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// DefinitionTables
// ---------------------------------------------------------------------------

/// All static definition data, queryable by key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DefinitionTables {
    models: Vec<ModelDefinition>,
    environments: Vec<EnvironmentDefinition>,
    rules: HybridRuleTables,
    /// Model key -> index into `models`. Rebuilt after deserialization.
    #[serde(skip)]
    model_index: BTreeMap<ModelKey, usize>,
}

impl DefinitionTables {
    pub fn new(
        models: Vec<ModelDefinition>,
        environments: Vec<EnvironmentDefinition>,
        rules: HybridRuleTables,
    ) -> Self {
        let mut tables = Self {
            models,
            environments,
            rules,
            model_index: BTreeMap::new(),
        };
        tables.rebuild_index();
        tables
    }

    pub fn builder() -> DefinitionTablesBuilder {
        DefinitionTablesBuilder::default()
    }

    /// Deserialize tables from JSON and rebuild the key index.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut tables: DefinitionTables = serde_json::from_str(json)?;
        tables.rebuild_index();
        Ok(tables)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn rebuild_index(&mut self) {
        self.model_index.clear();
        for (i, def) in self.models.iter().enumerate() {
            if self.model_index.contains_key(&def.model_key) {
                log::warn!("Duplicate model key {}; keeping the first definition", def.model_key);
                continue;
            }
            self.model_index.insert(def.model_key.clone(), i);
        }
    }

    pub fn models(&self) -> &[ModelDefinition] {
        &self.models
    }

    pub fn environments(&self) -> &[EnvironmentDefinition] {
        &self.environments
    }

    pub fn rules(&self) -> &HybridRuleTables {
        &self.rules
    }

    pub fn model(&self, key: &str) -> Option<&ModelDefinition> {
        self.model_index.get(key).and_then(|&i| self.models.get(i))
    }

    pub fn environment(&self, key: &str) -> Option<&EnvironmentDefinition> {
        self.environments.iter().find(|e| e.key.as_str() == key)
    }

    pub fn environment_by_name(&self, name: &str) -> Option<&EnvironmentDefinition> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// Every purebred stage-0 definition, in definition order.
    pub fn base_purebreds(&self) -> Vec<&ModelDefinition> {
        self.models
            .iter()
            .filter(|m| m.is_purebred_line && m.evolution_stage == EvolutionStage::Base)
            .collect()
    }

    /// Purebred stage-0 definitions whose origin is the named environment.
    pub fn base_purebreds_in(&self, environment_name: &str) -> Vec<&ModelDefinition> {
        self.models
            .iter()
            .filter(|m| {
                m.is_purebred_line
                    && m.evolution_stage == EvolutionStage::Base
                    && m.origin_environment_name.as_deref() == Some(environment_name)
            })
            .collect()
    }

    /// The definition at `stage` on the same purebred line as `base` (same
    /// species, same origin environment).
    pub fn evolution_of(
        &self,
        base: &ModelDefinition,
        stage: EvolutionStage,
    ) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| {
            m.is_purebred_line
                && m.evolution_stage == stage
                && m.species_name == base.species_name
                && m.origin_environment_name == base.origin_environment_name
        })
    }

    /// Creature tint for an environment, if the environment exists and
    /// defines one.
    pub fn creature_color(&self, key: &str) -> Option<Color> {
        self.environment(key).and_then(|e| e.ambiance.creature_color)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

struct PendingIntraRule {
    environment: String,
    species1: String,
    species2: String,
    hybrid: String,
}

struct PendingInterRule {
    environment1: String,
    environment2: String,
    species1: String,
    species2: String,
    hybrid: String,
}

/// Assembles `DefinitionTables` from names. Ids are assigned in insertion
/// order (environments and models counted separately, both from 1), model
/// keys and environment keys are derived from names, and rules are resolved
/// in `build()`.
#[derive(Default)]
pub struct DefinitionTablesBuilder {
    models: Vec<ModelDefinition>,
    environments: Vec<EnvironmentDefinition>,
    intra_rules: Vec<PendingIntraRule>,
    inter_rules: Vec<PendingInterRule>,
}

impl DefinitionTablesBuilder {
    pub fn environment(
        mut self,
        name: &str,
        temp_min: i32,
        temp_max: i32,
        ambiance: Ambiance,
    ) -> Self {
        let id = self.environments.len() as u32 + 1;
        self.environments.push(EnvironmentDefinition {
            id,
            key: EnvironmentKey::new(key_from_name(name)),
            name: name.to_owned(),
            temp_min,
            temp_max,
            ambiance,
        });
        self
    }

    /// Add the three definitions of a purebred line: the base species and
    /// its two evolved forms, named `"{ev1_moniker} {species}"` and
    /// `"{ev2_moniker} {species}"`.
    pub fn purebred_line(
        mut self,
        environment_name: &str,
        species: &str,
        ev1_moniker: &str,
        ev2_moniker: &str,
    ) -> Self {
        let species_key = key_from_name(species);
        let forms = [
            (EvolutionStage::Base, species.to_owned(), format!("{species_key}_BASE")),
            (
                EvolutionStage::Ev1,
                format!("{ev1_moniker} {species}"),
                format!("{}_{species_key}_EV1", key_from_name(ev1_moniker)),
            ),
            (
                EvolutionStage::Ev2,
                format!("{ev2_moniker} {species}"),
                format!("{}_{species_key}_EV2", key_from_name(ev2_moniker)),
            ),
        ];
        for (stage, full_name, key) in forms {
            let id = self.models.len() as u32 + 1;
            self.models.push(ModelDefinition {
                id,
                expected_asset_name: format!("{full_name}.glb"),
                full_name,
                model_key: ModelKey::new(key),
                species_name: species.to_owned(),
                evolution_stage: stage,
                origin_environment_name: Some(environment_name.to_owned()),
                is_purebred_line: true,
                is_specific_hybrid: false,
                hybrid_type: None,
            });
        }
        self
    }

    pub fn hybrid(mut self, name: &str, hybrid_type: HybridType) -> Self {
        let id = self.models.len() as u32 + 1;
        self.models.push(ModelDefinition {
            id,
            full_name: name.to_owned(),
            model_key: ModelKey::new(format!("{}_HYBRID_BASE", key_from_name(name))),
            expected_asset_name: format!("{name}.glb"),
            species_name: name.to_owned(),
            evolution_stage: EvolutionStage::Base,
            origin_environment_name: None,
            is_purebred_line: false,
            is_specific_hybrid: true,
            hybrid_type: Some(hybrid_type),
        });
        self
    }

    /// Rule: two species of one environment produce the named hybrid.
    pub fn intra_rule(mut self, environment: &str, species1: &str, species2: &str, hybrid: &str) -> Self {
        self.intra_rules.push(PendingIntraRule {
            environment: environment.to_owned(),
            species1: species1.to_owned(),
            species2: species2.to_owned(),
            hybrid: hybrid.to_owned(),
        });
        self
    }

    /// Rule: a species of `environment1` and a species of `environment2`
    /// produce the named hybrid.
    pub fn inter_rule(
        mut self,
        environment1: &str,
        environment2: &str,
        species1: &str,
        species2: &str,
        hybrid: &str,
    ) -> Self {
        self.inter_rules.push(PendingInterRule {
            environment1: environment1.to_owned(),
            environment2: environment2.to_owned(),
            species1: species1.to_owned(),
            species2: species2.to_owned(),
            hybrid: hybrid.to_owned(),
        });
        self
    }

    pub fn build(self) -> DefinitionTables {
        let mut rules = HybridRuleTables::default();

        for rule in &self.intra_rules {
            let Some(env) = self.environment_key(&rule.environment) else {
                log::error!("Intra hybrid rule names unknown environment {:?}", rule.environment);
                continue;
            };
            let p1 = self.base_key(&rule.species1, &rule.environment);
            let p2 = self.base_key(&rule.species2, &rule.environment);
            let hybrid = self.hybrid_key(&rule.hybrid);
            match (p1, p2, hybrid) {
                (Some(p1), Some(p2), Some(hybrid)) => rules.insert_intra(&env, &p1, &p2, hybrid),
                _ => log::warn!(
                    "Could not establish intra hybrid rule {}/{} -> {} in {}",
                    rule.species1,
                    rule.species2,
                    rule.hybrid,
                    rule.environment
                ),
            }
        }

        for rule in &self.inter_rules {
            let (Some(env1), Some(env2)) = (
                self.environment_key(&rule.environment1),
                self.environment_key(&rule.environment2),
            ) else {
                log::error!(
                    "Inter hybrid rule names unknown environments {:?}/{:?}",
                    rule.environment1,
                    rule.environment2
                );
                continue;
            };
            let p1 = self
                .base_key(&rule.species1, &rule.environment1)
                .or_else(|| self.base_key(&rule.species1, &rule.environment2));
            let p2 = self
                .base_key(&rule.species2, &rule.environment2)
                .or_else(|| self.base_key(&rule.species2, &rule.environment1));
            let hybrid = self.hybrid_key(&rule.hybrid);
            match (p1, p2, hybrid) {
                (Some(p1), Some(p2), Some(hybrid)) => {
                    rules.insert_inter(&env1, &env2, &p1, &p2, hybrid)
                }
                _ => log::warn!(
                    "Could not establish inter hybrid rule {}/{} -> {} between {}/{}",
                    rule.species1,
                    rule.species2,
                    rule.hybrid,
                    rule.environment1,
                    rule.environment2
                ),
            }
        }

        DefinitionTables::new(self.models, self.environments, rules)
    }

    fn environment_key(&self, name: &str) -> Option<EnvironmentKey> {
        self.environments
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.key.clone())
    }

    fn base_key(&self, species: &str, environment_name: &str) -> Option<ModelKey> {
        self.models
            .iter()
            .find(|m| {
                m.is_purebred_line
                    && m.evolution_stage == EvolutionStage::Base
                    && m.species_name == species
                    && m.origin_environment_name.as_deref() == Some(environment_name)
            })
            .map(|m| m.model_key.clone())
    }

    fn hybrid_key(&self, name: &str) -> Option<ModelKey> {
        self.models
            .iter()
            .find(|m| m.is_specific_hybrid && m.full_name == name)
            .map(|m| m.model_key.clone())
    }
}
