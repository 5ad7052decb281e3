// Save and load of a whole session.
//
// `SaveState` is the persistent payload: the id counter, the incubation
// flag and remaining time, whether the pending egg is a mating egg, stored
// creatures, the active creature, the egg, both mating parents and the
// current environment. Field names are camelCase so payloads written by
// older front ends still load. Creatures are stored as `CreatureParams`, so
// loading goes through the same factory as hatching and every field is
// normalized again (colors through the color gate, lineage flags
// reconciled, stage/level clamped, `can_evolve` recomputed).
//
// The mating selection and the session clock are transient and not saved.
//
// Loading is lenient: missing fields default, an unknown environment falls
// back to the configured default, an egg and an active creature together
// keep the egg. Only malformed JSON is an error (`LoadError::Json`).
//
// See also: `session.rs`, `creature.rs` (`CreatureParams`,
// `create_creature`).

use crate::creature::{Creature, CreatureParams, IdAllocator, MAX_CREATURE_ID};
use crate::error::LoadError;
use crate::session::{Egg, MatingSetup, Session};
use crate::types::{Color, ColorInput, EnvironmentKey};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveState {
    pub next_creature_unique_id: u64,
    pub is_incubating: bool,
    /// Signed for compatibility with payloads that stored negative values.
    pub time_left_for_incubation: i64,
    pub is_hybrid_incubation_setup: bool,
    pub stored_creatures: Vec<CreatureParams>,
    pub active_creature_data: Option<CreatureParams>,
    pub egg_data: Option<EggData>,
    pub parent1_for_mating_data: Option<CreatureParams>,
    pub parent2_for_mating_data: Option<CreatureParams>,
    pub current_environment_key: Option<EnvironmentKey>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EggData {
    pub is_hybrid: bool,
    pub color: Option<ColorInput>,
}

impl SaveState {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Session {
    /// Snapshot everything that persists.
    pub fn to_save(&self) -> SaveState {
        let mating = self.mating.as_ref();
        SaveState {
            next_creature_unique_id: self.ids.peek(),
            is_incubating: self.incubation.is_running(),
            time_left_for_incubation: i64::from(self.incubation.remaining()),
            is_hybrid_incubation_setup: mating.is_some() && self.egg.is_some(),
            stored_creatures: self.stored.iter().map(Creature::to_params).collect(),
            active_creature_data: self.active.as_ref().map(Creature::to_params),
            egg_data: self.egg.map(|egg| EggData {
                is_hybrid: egg.is_hybrid,
                color: Some(ColorInput::from(egg.color)),
            }),
            parent1_for_mating_data: mating.map(|m| m.parent1.to_params()),
            parent2_for_mating_data: mating.map(|m| m.parent2.to_params()),
            current_environment_key: Some(self.current_environment.clone()),
        }
    }

    /// Replace this session's state with a save. Timers are cancelled
    /// first; the session is running afterwards. Creatures come back with
    /// panel actions disabled, including the active one.
    pub fn load_save(&mut self, save: SaveState) {
        self.incubation.stop();
        self.selected_for_mating.clear();
        self.mating = None;
        self.egg = None;
        self.active = None;
        self.stored.clear();

        self.current_environment = match save.current_environment_key {
            Some(key) if self.tables.environment(key.as_str()).is_some() => key,
            Some(key) => {
                log::warn!(
                    "Saved environment {key} is unknown; using {}",
                    self.config.default_environment
                );
                self.config.default_environment.clone()
            }
            None => self.config.default_environment.clone(),
        };

        let mut next_id = save.next_creature_unique_id;
        if next_id > MAX_CREATURE_ID {
            log::warn!("Saved id counter {next_id} is out of range; clamping");
            next_id = MAX_CREATURE_ID;
        }
        self.ids = IdAllocator::starting_at(next_id);
        // Rebuild everything before observing ids, so creatures saved
        // without an id still get fresh ones above the saved counter.
        let stored: Vec<Creature> = save
            .stored_creatures
            .into_iter()
            .map(|params| self.restore_creature(params))
            .collect();
        let active = save.active_creature_data.map(|params| self.restore_creature(params));
        let parents = (
            save.parent1_for_mating_data.map(|params| self.restore_creature(params)),
            save.parent2_for_mating_data.map(|params| self.restore_creature(params)),
        );
        for creature in stored.iter().chain(active.iter()) {
            self.ids.observe(creature.unique_id);
        }
        self.stored = stored;
        if self.stored.len() > self.config.max_stored_creatures {
            log::warn!(
                "Save holds {} stored creatures, more than the configured {}",
                self.stored.len(),
                self.config.max_stored_creatures
            );
        }

        let egg = save.egg_data.map(|data| {
            let default = if data.is_hybrid {
                self.config.hybrid_egg_color
            } else {
                self.config.standard_egg_color
            };
            Egg {
                is_hybrid: data.is_hybrid,
                color: Color::resolve(data.color.as_ref(), default),
            }
        });

        match (egg, active) {
            (Some(egg), active) => {
                if active.is_some() {
                    log::warn!("Save holds both an egg and an active creature; keeping the egg");
                }
                self.egg = Some(egg);
                if save.is_hybrid_incubation_setup {
                    if let (Some(parent1), Some(parent2)) = parents {
                        self.mating = Some(MatingSetup { parent1, parent2 });
                    } else {
                        log::warn!("Save marks a mating egg but a parent is missing");
                    }
                }
                if save.is_incubating {
                    if save.time_left_for_incubation > 0 {
                        let remaining = save.time_left_for_incubation.min(i64::from(u32::MAX)) as u32;
                        self.incubation.resume(remaining);
                    } else {
                        log::warn!("Save marks incubation with no time left; egg is idle");
                    }
                }
            }
            (None, active) => {
                if save.is_incubating {
                    log::warn!("Save marks incubation without an egg; ignoring");
                }
                self.active = active;
            }
        }

        self.running = true;
        log::info!(
            "Loaded save: {} stored, active {}, egg {}, environment {}",
            self.stored.len(),
            self.active.as_ref().map_or("none".to_string(), |c| c.unique_id.to_string()),
            self.egg.is_some(),
            self.current_environment
        );
    }

    /// Parse and load a JSON save. On a parse error the session is left
    /// untouched.
    pub fn load_json(&mut self, json: &str) -> Result<(), LoadError> {
        let save = SaveState::from_json(json)?;
        self.load_save(save);
        Ok(())
    }

    fn restore_creature(&mut self, mut params: CreatureParams) -> Creature {
        if let Some(id) = params.unique_id.filter(|id| id.0 > MAX_CREATURE_ID) {
            log::warn!("Saved creature id {id} is out of range; assigning a new one");
            params.unique_id = None;
        }
        let mut creature = self.create_creature(params);
        creature.allow_active_panel_actions = false;
        creature
    }
}
