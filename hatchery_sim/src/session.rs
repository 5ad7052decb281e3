// Session state and the incubation/lifecycle controller.
//
// `Session` is the single owner of one game: configuration, definition
// tables, PRNG, id counter, the bounded storage collection, the single
// active slot, the egg, the mating setup and selection, both timers, and the
// simulated clock. Nothing lives in globals, so any number of sessions can
// coexist (tests create dozens).
//
// ## Lifecycle state machine
//
//   Empty -> EggSpawned -> Incubating -> Hatched (active creature) -> Empty
//
// with a parallel mating sub-state: once `setup_mating` succeeds the egg is
// already spawned (hybrid-colored unless the parents are identical
// purebreds) and the next `start_new_egg_incubation` starts it instead of a
// fresh egg. At hatch the mating setup and selection are cleared. Spawning
// any other egg drops the setup.
//
// Invariants enforced at every entry point:
// - At most one of {egg, active creature} exists. `spawn_egg` clears the
//   active slot; `start_incubation`, `activate` and `setup_mating` refuse to
//   run while the other slot is occupied.
// - At most one egg incubates. Spawning a new egg stops the countdown.
// - The active creature is authoritative. Whenever it changes it is written
//   back over its stored copy (`sync_active_to_storage`).
// - A failed operation mutates nothing and returns an `ActionError`.
//
// ## Clock
//
// `tick()` advances one simulated second. While the session is running it
// first runs the game clock (every stored creature except the active one,
// then the active one, then the sync), then the incubation countdown, which
// hatches at zero. `step()` interleaves a sorted command batch with ticks, in
// the manner of a deterministic sim loop. `stop()` and `reset()` cancel both
// timers before touching any other state.
//
// See also: `creature.rs` (factory), `evolution.rs`, `breeding.rs`,
// `clock.rs`, `save.rs` (save/load of this struct), `command.rs`,
// `event.rs`.
//
// **Critical constraint: determinism.** Given the same seed, config, tables
// and command sequence, a session produces identical state and events.

use crate::breeding::{are_compatible, is_purebred_pairing, pick_hatchling_species, resolve_offspring};
use crate::clock::{Timer, tick_creature};
use crate::command::{SessionAction, SessionCommand};
use crate::config::GameConfig;
use crate::creature::{Creature, CreatureParams, IdAllocator, create_creature};
use crate::definitions::DefinitionTables;
use crate::error::{ActionError, Result};
use crate::event::{SessionEvent, SessionEventKind, StepResult};
use crate::evolution::{
    self, EvolutionContext, EvolutionOutcome, LevelUpOutcome, update_can_evolve_status,
};
use crate::types::{Color, ColorInput, CreatureId, EnvironmentKey, EvolutionStage, Lineage};
use hatchery_prng::GameRng;
use smallvec::SmallVec;

/// An egg waiting to hatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Egg {
    pub is_hybrid: bool,
    pub color: Color,
}

/// Snapshots of the two stored parents taken when mating was set up.
#[derive(Clone, Debug, PartialEq)]
pub struct MatingSetup {
    pub parent1: Creature,
    pub parent2: Creature,
}

pub struct Session {
    pub(crate) config: GameConfig,
    pub(crate) tables: DefinitionTables,
    pub(crate) rng: GameRng,
    pub(crate) ids: IdAllocator,
    pub(crate) current_environment: EnvironmentKey,
    pub(crate) stored: Vec<Creature>,
    pub(crate) active: Option<Creature>,
    pub(crate) egg: Option<Egg>,
    pub(crate) incubation: Timer,
    pub(crate) mating: Option<MatingSetup>,
    /// Transient; never saved.
    pub(crate) selected_for_mating: SmallVec<[CreatureId; 2]>,
    pub(crate) running: bool,
    pub(crate) second: u64,
    pub(crate) events: Vec<SessionEvent>,
}

impl Session {
    /// A running session on the built-in catalog and default config.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GameConfig::default(), DefinitionTables::default_catalog())
    }

    pub fn with_config(seed: u64, config: GameConfig, tables: DefinitionTables) -> Self {
        if tables.environment(config.default_environment.as_str()).is_none() {
            log::warn!(
                "Default environment {} is not in the definition tables",
                config.default_environment
            );
        }
        let current_environment = config.default_environment.clone();
        log::info!("Session started (seed {seed})");
        Self {
            config,
            tables,
            rng: GameRng::new(seed),
            ids: IdAllocator::default(),
            current_environment,
            stored: Vec::new(),
            active: None,
            egg: None,
            incubation: Timer::default(),
            mating: None,
            selected_for_mating: SmallVec::new(),
            running: true,
            second: 0,
            events: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tables(&self) -> &DefinitionTables {
        &self.tables
    }

    pub fn current_environment(&self) -> &EnvironmentKey {
        &self.current_environment
    }

    pub fn stored(&self) -> &[Creature] {
        &self.stored
    }

    pub fn stored_creature(&self, id: CreatureId) -> Option<&Creature> {
        self.stored.iter().find(|c| c.unique_id == id)
    }

    pub fn active(&self) -> Option<&Creature> {
        self.active.as_ref()
    }

    pub fn egg(&self) -> Option<&Egg> {
        self.egg.as_ref()
    }

    pub fn is_incubating(&self) -> bool {
        self.incubation.is_running()
    }

    pub fn incubation_remaining(&self) -> u32 {
        self.incubation.remaining()
    }

    pub fn mating(&self) -> Option<&MatingSetup> {
        self.mating.as_ref()
    }

    pub fn selected_for_mating(&self) -> &[CreatureId] {
        &self.selected_for_mating
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Simulated seconds since the session was created.
    pub fn second(&self) -> u64 {
        self.second
    }

    /// The id the next created creature will get.
    pub fn next_creature_id(&self) -> u64 {
        self.ids.peek()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, kind: SessionEventKind) {
        self.events.push(SessionEvent {
            second: self.second,
            kind,
        });
    }

    fn storage_full(&self) -> bool {
        self.stored.len() >= self.config.max_stored_creatures
    }

    fn is_stored(&self, id: CreatureId) -> bool {
        self.stored.iter().any(|c| c.unique_id == id)
    }

    /// Build a creature with this session's tables, config, id counter and
    /// current environment. Does not place it anywhere.
    pub fn create_creature(&mut self, params: CreatureParams) -> Creature {
        create_creature(
            params,
            &self.tables,
            &self.config,
            &mut self.ids,
            &self.current_environment,
        )
    }

    /// Write the active creature over its stored copy, if it has one.
    fn sync_active_to_storage(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        if let Some(slot) = self.stored.iter_mut().find(|c| c.unique_id == active.unique_id) {
            *slot = active.clone();
        }
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            log::info!("Session resumed at second {}", self.second);
            self.emit(SessionEventKind::SessionStarted);
        }
    }

    /// Cancel both timers and stop the clock. An egg keeps existing but its
    /// countdown is gone; incubate it again after `start()`.
    pub fn stop(&mut self) {
        self.incubation.stop();
        if self.running {
            self.running = false;
            log::info!("Session stopped at second {}", self.second);
            self.emit(SessionEventKind::SessionStopped);
        }
    }

    /// Start a new game: cancel timers, drop every creature, the egg, the
    /// mating state and the selection, return to the default environment,
    /// and restart ids from 0. The PRNG stream continues.
    pub fn reset(&mut self) {
        self.incubation.stop();
        self.stored.clear();
        self.active = None;
        self.egg = None;
        self.mating = None;
        self.selected_for_mating.clear();
        self.ids = IdAllocator::default();
        self.current_environment = self.config.default_environment.clone();
        self.running = true;
        log::info!("Session reset at second {}", self.second);
        self.emit(SessionEventKind::SessionReset);
    }

    pub fn set_current_environment(&mut self, key: &EnvironmentKey) -> Result<()> {
        if self.tables.environment(key.as_str()).is_none() {
            return Err(ActionError::UnknownEnvironment(key.to_string()));
        }
        if &self.current_environment != key {
            self.current_environment = key.clone();
            self.emit(SessionEventKind::EnvironmentChanged { key: key.clone() });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Eggs and incubation
    // -----------------------------------------------------------------------

    /// Put a new egg in the viewer, clearing the active creature, any
    /// previous egg and any mating setup first and cancelling a running
    /// countdown. The color override goes through the color gate; without
    /// one the configured hybrid or standard egg color is used.
    pub fn spawn_egg(&mut self, is_hybrid: bool, color: Option<&ColorInput>) -> Color {
        self.incubation.stop();
        if self.mating.take().is_some() {
            log::info!("Mating setup dropped for a new egg");
        }
        if let Some(mut previous) = self.active.take() {
            previous.allow_active_panel_actions = false;
            if let Some(slot) = self.stored.iter_mut().find(|c| c.unique_id == previous.unique_id) {
                *slot = previous;
            } else {
                log::info!("Unstored creature {} released from the viewer", previous.unique_id);
            }
        }
        let default = if is_hybrid {
            self.config.hybrid_egg_color
        } else {
            self.config.standard_egg_color
        };
        let color = match color {
            Some(input) => Color::resolve(Some(input), default),
            None => default,
        };
        self.egg = Some(Egg { is_hybrid, color });
        log::info!("Spawned {} egg {color}", if is_hybrid { "hybrid" } else { "standard" });
        self.emit(SessionEventKind::EggSpawned { is_hybrid, color });
        color
    }

    /// Start the countdown on the egg that is present.
    pub fn start_incubation(&mut self) -> Result<()> {
        if !self.running {
            return Err(ActionError::SessionInactive);
        }
        if self.egg.is_none() {
            return Err(ActionError::NoEgg);
        }
        if self.incubation.is_running() {
            return Err(ActionError::EggAlreadyIncubating);
        }
        if self.active.is_some() {
            return Err(ActionError::ActiveCreaturePresent);
        }
        let seconds = self.config.incubation_time_seconds;
        self.incubation.start(seconds);
        log::info!("Incubation started ({seconds}s) in {}", self.current_environment);
        self.emit(SessionEventKind::IncubationStarted { seconds });
        Ok(())
    }

    /// Incubate: start the pending mated egg if there is one, otherwise
    /// spawn a standard egg and start it.
    pub fn start_new_egg_incubation(&mut self) -> Result<()> {
        if self.incubation.is_running() {
            return Err(ActionError::EggAlreadyIncubating);
        }
        if self.mating.is_some() && self.egg.is_some() {
            return self.start_incubation();
        }
        if self.active.is_some() {
            return Err(ActionError::ActiveCreaturePresent);
        }
        if !self.running {
            return Err(ActionError::SessionInactive);
        }
        self.spawn_egg(false, None);
        self.start_incubation()
    }

    /// Turn the egg into a creature. Normally fired by the incubation
    /// countdown reaching zero.
    pub fn hatch(&mut self) -> Result<CreatureId> {
        let Some(egg) = self.egg.take() else {
            return Err(ActionError::NoEgg);
        };
        self.incubation.stop();

        let env_key = self.current_environment.clone();
        let env = self.tables.environment(env_key.as_str());
        let env_name = env.map(|e| e.name.clone());
        let hatch_color = env
            .and_then(|e| e.ambiance.creature_color)
            .unwrap_or(self.config.hatch_fallback_color);

        let mut params = CreatureParams {
            color: Some(ColorInput::from(hatch_color)),
            incubated_environment_key: Some(env_key.clone()),
            level: Some(0),
            ..Default::default()
        };

        match self.mating.take() {
            Some(setup) => {
                let plan = resolve_offspring(&setup.parent1, &setup.parent2, &self.tables);
                let origin = match plan.lineage {
                    Lineage::Purebred => env_key.clone(),
                    Lineage::Hybrid => setup.parent1.origin_environment_key.clone(),
                };
                params.is_purebred = Some(plan.lineage == Lineage::Purebred);
                params.is_hybrid = Some(plan.lineage == Lineage::Hybrid);
                params.model_key = Some(plan.model_key);
                params.base_species_model_key = plan.base_species_model_key;
                params.origin_environment_key = Some(origin);
            }
            None => {
                if egg.is_hybrid {
                    log::warn!("Hybrid egg hatched without a mating setup; hatching a purebred");
                }
                let model_key = pick_hatchling_species(&self.tables, env_name.as_deref(), &mut self.rng)
                    .unwrap_or_else(|| {
                        log::error!(
                            "No purebred base definitions; hatching {}",
                            self.config.fallback_model_key
                        );
                        self.config.fallback_model_key.clone()
                    });
                params.is_purebred = Some(true);
                params.is_hybrid = Some(false);
                params.base_species_model_key = Some(model_key.clone());
                params.model_key = Some(model_key);
                params.origin_environment_key = Some(env_key.clone());
            }
        }

        let mut creature = self.create_creature(params);
        creature.allow_active_panel_actions = false;
        let id = creature.unique_id;
        log::info!(
            "Hatched {} ({}, {:?}) in {}",
            id,
            creature.model_key,
            creature.lineage,
            env_key
        );
        self.emit(SessionEventKind::Hatched {
            creature_id: id,
            model_key: creature.model_key.clone(),
            lineage: creature.lineage,
        });

        if self.storage_full() {
            self.emit(SessionEventKind::StoredOverflow { creature_id: id });
            self.emit(SessionEventKind::Notice {
                message: ActionError::StorageFull.to_string(),
            });
        } else {
            self.stored.push(creature.clone());
        }
        self.active = Some(creature);
        self.selected_for_mating.clear();
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Active slot and storage
    // -----------------------------------------------------------------------

    /// Make a stored creature the active one, with its panel actions
    /// enabled. The previously active creature loses that flag and is
    /// written back to storage.
    pub fn activate(&mut self, id: CreatureId) -> Result<()> {
        if self.active.as_ref().is_some_and(|a| a.unique_id == id) && self.is_stored(id) {
            if let Some(active) = self.active.as_mut() {
                active.allow_active_panel_actions = true;
            }
            self.sync_active_to_storage();
            self.selected_for_mating.clear();
            return Ok(());
        }
        if self.incubation.is_running() {
            return Err(ActionError::IncubationInProgress);
        }
        if self.egg.is_some() {
            return Err(ActionError::MatedEggPending);
        }
        let Some(found) = self.stored_creature(id) else {
            return Err(ActionError::CreatureNotFound(id));
        };
        let mut next = found.clone();

        if let Some(mut previous) = self.active.take() {
            previous.allow_active_panel_actions = false;
            if let Some(slot) = self.stored.iter_mut().find(|c| c.unique_id == previous.unique_id) {
                *slot = previous;
            } else {
                log::info!("Unstored creature {} released from the viewer", previous.unique_id);
            }
        }

        next.allow_active_panel_actions = true;
        update_can_evolve_status(&mut next, &self.config);
        self.active = Some(next);
        self.sync_active_to_storage();
        self.selected_for_mating.clear();
        self.emit(SessionEventKind::Activated { creature_id: id });
        Ok(())
    }

    /// Move the active creature into storage (or refresh its stored copy).
    pub fn store_active(&mut self) -> Result<CreatureId> {
        let Some(active) = &self.active else {
            return Err(ActionError::NoActiveCreature);
        };
        let id = active.unique_id;
        let already_stored = self.is_stored(id);
        if !already_stored && self.storage_full() {
            return Err(ActionError::StorageFull);
        }
        let Some(mut creature) = self.active.take() else {
            return Err(ActionError::NoActiveCreature);
        };
        creature.allow_active_panel_actions = false;
        update_can_evolve_status(&mut creature, &self.config);
        match self.stored.iter_mut().find(|c| c.unique_id == id) {
            Some(slot) => *slot = creature,
            None => self.stored.push(creature),
        }
        self.emit(SessionEventKind::Stored { creature_id: id });
        Ok(id)
    }

    /// Remove the active creature from the viewer and from storage for
    /// good, dropping it from the mating selection.
    pub fn discard_active(&mut self) -> Result<CreatureId> {
        if self.active.is_none() {
            return Err(ActionError::NoActiveCreature);
        }
        if self.incubation.is_running() {
            return Err(ActionError::IncubationInProgress);
        }
        let Some(creature) = self.active.take() else {
            return Err(ActionError::NoActiveCreature);
        };
        let id = creature.unique_id;
        self.stored.retain(|c| c.unique_id != id);
        self.selected_for_mating.retain(|s| *s != id);

        // A mating setup implies an egg, and an egg excludes an active creature.
        debug_assert!(self.mating.is_none(), "mating setup alongside an active creature");
        log::info!("Discarded creature {id}");
        self.emit(SessionEventKind::Discarded { creature_id: id });
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Mating
    // -----------------------------------------------------------------------

    /// Select or deselect a stored Base creature for mating. Holds at most
    /// two; a third valid pick replaces the oldest.
    pub fn toggle_mating_selection(&mut self, id: CreatureId) -> Result<()> {
        if self.incubation.is_running() {
            return Err(ActionError::IncubationInProgress);
        }
        if self.mating.is_some() && self.egg.is_some() {
            return Err(ActionError::MatedEggPending);
        }
        let Some(stage) = self.stored_creature(id).map(|c| c.current_evolution_stage) else {
            return Err(ActionError::CreatureNotFound(id));
        };
        if self.active.as_ref().is_some_and(|a| a.unique_id == id) {
            return Err(ActionError::CannotSelectActive);
        }

        if let Some(pos) = self.selected_for_mating.iter().position(|s| *s == id) {
            self.selected_for_mating.remove(pos);
        } else {
            if stage != EvolutionStage::Base {
                return Err(ActionError::NotBaseStage);
            }
            if self.selected_for_mating.len() >= 2 {
                self.selected_for_mating.remove(0);
            }
            self.selected_for_mating.push(id);
        }
        let selected = self.selected_for_mating.to_vec();
        self.emit(SessionEventKind::MatingSelectionChanged { selected });
        Ok(())
    }

    /// Pair two stored Base creatures and spawn their egg (without starting
    /// it). The egg is hybrid-colored unless they are identical purebreds.
    pub fn setup_mating(&mut self, first: CreatureId, second: CreatureId) -> Result<()> {
        if self.incubation.is_running() {
            return Err(ActionError::IncubationInProgress);
        }
        if first == second {
            return Err(ActionError::MatingSelectionInvalid);
        }
        let parent1 = self
            .stored_creature(first)
            .ok_or(ActionError::CreatureNotFound(first))?;
        let parent2 = self
            .stored_creature(second)
            .ok_or(ActionError::CreatureNotFound(second))?;
        if !parent1.is_base_stage() || !parent2.is_base_stage() {
            return Err(ActionError::NotBaseStage);
        }
        if self.active.is_some() {
            return Err(ActionError::ActiveCreaturePresent);
        }
        if !are_compatible(parent1, parent2, &self.tables, self.config.compatibility_policy) {
            return Err(ActionError::Incompatible);
        }

        let hybrid_egg = !is_purebred_pairing(parent1, parent2);
        let setup = MatingSetup {
            parent1: parent1.clone(),
            parent2: parent2.clone(),
        };
        self.spawn_egg(hybrid_egg, None);
        self.mating = Some(setup);
        log::info!("Mating set up: {first} x {second} (hybrid egg: {hybrid_egg})");
        self.emit(SessionEventKind::MatingSetUp {
            parent1: first,
            parent2: second,
            hybrid_egg,
        });
        Ok(())
    }

    /// `setup_mating` on the current selection.
    pub fn setup_mating_from_selection(&mut self) -> Result<()> {
        let [first, second] = self.selected_for_mating[..] else {
            return Err(ActionError::MatingSelectionInvalid);
        };
        self.setup_mating(first, second)
    }

    // -----------------------------------------------------------------------
    // Evolution and training
    // -----------------------------------------------------------------------

    /// The active creature, if it was deliberately activated from storage.
    fn check_activation_gate(&self) -> Result<()> {
        let Some(active) = &self.active else {
            return Err(ActionError::NoActiveCreature);
        };
        if !active.allow_active_panel_actions || !self.is_stored(active.unique_id) {
            return Err(ActionError::NotActivatedFromStorage);
        }
        Ok(())
    }

    pub fn evolve_naturally(&mut self) -> Result<EvolutionOutcome> {
        self.check_activation_gate()?;
        let ctx = EvolutionContext {
            tables: &self.tables,
            config: &self.config,
            environment: &self.current_environment,
        };
        let Some(active) = self.active.as_mut() else {
            return Err(ActionError::NoActiveCreature);
        };
        let id = active.unique_id;
        let result = evolution::evolve_naturally(active, ctx);
        // The data-fault path changes `can_evolve`, so sync either way.
        self.sync_active_to_storage();
        let outcome = result?;
        self.emit_evolved(id, &outcome);
        Ok(outcome)
    }

    pub fn level_up(&mut self) -> Result<LevelUpOutcome> {
        self.check_activation_gate()?;
        let ctx = EvolutionContext {
            tables: &self.tables,
            config: &self.config,
            environment: &self.current_environment,
        };
        let Some(active) = self.active.as_mut() else {
            return Err(ActionError::NoActiveCreature);
        };
        let id = active.unique_id;
        let result = evolution::level_up(active, ctx);
        self.sync_active_to_storage();
        let outcome = result?;
        self.emit(SessionEventKind::LeveledUp {
            creature_id: id,
            level: outcome.level,
        });
        if let Some(evolved) = &outcome.evolution {
            self.emit_evolved(id, evolved);
        }
        Ok(outcome)
    }

    fn emit_evolved(&mut self, id: CreatureId, outcome: &EvolutionOutcome) {
        self.emit(SessionEventKind::Evolved {
            creature_id: id,
            from: outcome.from,
            to: outcome.to,
            model_key: outcome.model_key.clone(),
            gained_sheen: outcome.gained_sheen,
        });
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advance one simulated second.
    pub fn tick(&mut self) {
        self.second += 1;
        if !self.running {
            return;
        }

        let active_id = self.active.as_ref().map(|a| a.unique_id);
        let mut ready: SmallVec<[CreatureId; 4]> = SmallVec::new();
        for creature in self.stored.iter_mut().filter(|c| Some(c.unique_id) != active_id) {
            if tick_creature(creature, &self.config) {
                ready.push(creature.unique_id);
            }
        }
        if let Some(active) = self.active.as_mut() {
            if tick_creature(active, &self.config) {
                ready.push(active.unique_id);
            }
        }
        self.sync_active_to_storage();
        for creature_id in ready {
            self.emit(SessionEventKind::EvolutionReady { creature_id });
        }

        if self.incubation.tick() {
            if let Err(e) = self.hatch() {
                log::error!("Incubation finished but hatch failed: {e}");
            }
        }
    }

    /// Apply `commands` (sorted by second) and advance the clock to
    /// `target_second`. Commands past the target are ignored.
    pub fn step(&mut self, commands: &[SessionCommand], target_second: u64) -> StepResult {
        debug_assert!(
            commands.is_sorted_by_key(|c| c.second),
            "step commands must be sorted by second"
        );
        let mut idx = 0;
        loop {
            while let Some(cmd) = commands.get(idx).filter(|c| c.second <= self.second) {
                idx += 1;
                self.apply_command(cmd);
            }
            if self.second >= target_second {
                break;
            }
            self.tick();
        }
        StepResult {
            events: self.drain_events(),
        }
    }

    fn apply_command(&mut self, cmd: &SessionCommand) {
        let result = match &cmd.action {
            SessionAction::SetEnvironment { key } => self.set_current_environment(key),
            SessionAction::StartNewEggIncubation => self.start_new_egg_incubation(),
            SessionAction::SpawnEgg { is_hybrid, color } => {
                self.spawn_egg(*is_hybrid, color.as_ref());
                Ok(())
            }
            SessionAction::StartIncubation => self.start_incubation(),
            SessionAction::ToggleMatingSelection { creature_id } => {
                self.toggle_mating_selection(*creature_id)
            }
            SessionAction::SetupMating => self.setup_mating_from_selection(),
            SessionAction::Activate { creature_id } => self.activate(*creature_id),
            SessionAction::StoreActive => self.store_active().map(|_| ()),
            SessionAction::DiscardActive => self.discard_active().map(|_| ()),
            SessionAction::EvolveNaturally => self.evolve_naturally().map(|_| ()),
            SessionAction::LevelUp => self.level_up().map(|_| ()),
            SessionAction::StartSession => {
                self.start();
                Ok(())
            }
            SessionAction::StopSession => {
                self.stop();
                Ok(())
            }
            SessionAction::ResetSession => {
                self.reset();
                Ok(())
            }
        };
        if let Err(e) = result {
            log::debug!("Command {:?} at second {} rejected: {e}", cmd.action, cmd.second);
            self.emit(SessionEventKind::Notice {
                message: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hatch_one(session: &mut Session) -> CreatureId {
        session.start_new_egg_incubation().unwrap();
        for _ in 0..session.config.incubation_time_seconds {
            session.tick();
        }
        session.active().unwrap().unique_id
    }

    #[test]
    fn incubation_hatches_after_configured_time() {
        let mut session = Session::new(42);
        session.start_new_egg_incubation().unwrap();
        assert!(session.is_incubating());
        assert!(session.egg().is_some());
        for _ in 0..29 {
            session.tick();
        }
        assert!(session.active().is_none());
        session.tick();
        let active = session.active().unwrap();
        assert!(session.egg().is_none());
        assert!(!session.is_incubating());
        assert!(active.is_purebred());
        assert!(!active.allow_active_panel_actions);
        assert_eq!(active.origin_environment_key.as_str(), "ABYSSAL_MARSH");
        assert_eq!(active.incubated_environment_key.as_ref().map(|k| k.as_str()), Some("ABYSSAL_MARSH"));
        assert_eq!(active.color.to_hex(), "334433");
        let def = session.tables().model(active.model_key.as_str()).unwrap();
        assert_eq!(def.origin_environment_name.as_deref(), Some("Abyssal Marsh"));
        assert_eq!(session.stored().len(), 1);
    }

    #[test]
    fn plain_egg_drops_mating_setup() {
        let mut session = Session::new(5);
        let first = hatch_one(&mut session);
        session.store_active().unwrap();
        let second = hatch_one(&mut session);
        session.store_active().unwrap();
        // Identical purebreds always mate.
        let model = session.stored_creature(first).unwrap().model_key.clone();
        session
            .stored
            .iter_mut()
            .filter(|c| c.unique_id == second)
            .for_each(|c| c.model_key = model.clone());
        session.setup_mating(first, second).unwrap();
        assert!(session.mating().is_some());

        session.apply_command(&SessionCommand {
            second: 0,
            action: SessionAction::SpawnEgg {
                is_hybrid: false,
                color: None,
            },
        });
        assert!(session.mating().is_none());
        assert!(session.egg().is_some());
        session.start_incubation().unwrap();
        for _ in 0..session.config.incubation_time_seconds {
            session.tick();
        }
        let hatchling = session.active().unwrap();
        assert_eq!(hatchling.lineage, Lineage::Purebred);
        assert_eq!(
            hatchling.origin_environment_key,
            session.current_environment().clone()
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "sorted by second")]
    fn step_rejects_unsorted_commands() {
        let mut session = Session::new(6);
        let commands = vec![
            SessionCommand {
                second: 5,
                action: SessionAction::StartNewEggIncubation,
            },
            SessionCommand {
                second: 1,
                action: SessionAction::StopSession,
            },
        ];
        session.step(&commands, 10);
    }

    #[test]
    fn spawn_egg_clears_active() {
        let mut session = Session::new(1);
        let id = hatch_one(&mut session);
        session.spawn_egg(true, None);
        assert!(session.active().is_none());
        let egg = session.egg().unwrap();
        assert!(egg.is_hybrid);
        assert_eq!(egg.color, session.config().hybrid_egg_color);
        // The hatchling is still in storage.
        assert!(session.stored_creature(id).is_some());
    }

    #[test]
    fn egg_color_override_goes_through_gate() {
        let mut session = Session::new(1);
        let color = session.spawn_egg(false, Some(&ColorInput::Hex("#123456".into())));
        assert_eq!(color.to_hex(), "123456");
        let bad = session.spawn_egg(false, Some(&ColorInput::Hex("nope".into())));
        assert_eq!(bad, session.config().standard_egg_color);
    }

    #[test]
    fn cannot_incubate_with_active_creature() {
        let mut session = Session::new(2);
        hatch_one(&mut session);
        assert_eq!(
            session.start_new_egg_incubation(),
            Err(ActionError::ActiveCreaturePresent)
        );
        session.store_active().unwrap();
        assert!(session.start_new_egg_incubation().is_ok());
        assert_eq!(
            session.start_new_egg_incubation(),
            Err(ActionError::EggAlreadyIncubating)
        );
        assert_eq!(session.start_incubation(), Err(ActionError::EggAlreadyIncubating));
    }

    #[test]
    fn activation_enables_panel_actions_and_swaps() {
        let mut session = Session::new(3);
        let a = hatch_one(&mut session);
        session.store_active().unwrap();
        let b = hatch_one(&mut session);
        assert_eq!(session.level_up(), Err(ActionError::NotActivatedFromStorage));

        session.activate(a).unwrap();
        assert_eq!(session.active().unwrap().unique_id, a);
        assert!(session.active().unwrap().allow_active_panel_actions);
        let b_stored = session.stored_creature(b).unwrap();
        assert!(!b_stored.allow_active_panel_actions);

        let outcome = session.level_up().unwrap();
        assert_eq!(outcome.level, 1);
        assert_eq!(session.stored_creature(a).unwrap().level, 1);
    }

    #[test]
    fn activation_blocked_during_incubation() {
        let mut session = Session::new(4);
        let a = hatch_one(&mut session);
        session.store_active().unwrap();
        session.start_new_egg_incubation().unwrap();
        assert_eq!(session.activate(a), Err(ActionError::IncubationInProgress));
        assert_eq!(
            session.activate(CreatureId(999)),
            Err(ActionError::IncubationInProgress)
        );
    }

    #[test]
    fn store_full_is_rejected_without_mutation() {
        let config = GameConfig {
            max_stored_creatures: 1,
            ..GameConfig::default()
        };
        let mut session = Session::with_config(5, config, DefinitionTables::default_catalog());
        hatch_one(&mut session);
        session.store_active().unwrap();
        let second = hatch_one(&mut session);
        assert!(session.stored_creature(second).is_none());
        assert_eq!(session.store_active(), Err(ActionError::StorageFull));
        assert_eq!(session.active().unwrap().unique_id, second);
    }

    #[test]
    fn discard_removes_everywhere() {
        let mut session = Session::new(6);
        let id = hatch_one(&mut session);
        assert_eq!(session.discard_active(), Ok(id));
        assert!(session.active().is_none());
        assert!(session.stored_creature(id).is_none());
        assert_eq!(session.discard_active(), Err(ActionError::NoActiveCreature));
    }

    #[test]
    fn selection_rules() {
        let mut session = Session::new(7);
        let a = hatch_one(&mut session);
        session.store_active().unwrap();
        let b = hatch_one(&mut session);
        session.store_active().unwrap();
        let c = hatch_one(&mut session);
        assert_eq!(session.toggle_mating_selection(c), Err(ActionError::CannotSelectActive));
        session.store_active().unwrap();

        session.toggle_mating_selection(a).unwrap();
        session.toggle_mating_selection(b).unwrap();
        assert_eq!(session.selected_for_mating(), &[a, b]);
        session.toggle_mating_selection(c).unwrap();
        assert_eq!(session.selected_for_mating(), &[b, c]);
        session.toggle_mating_selection(b).unwrap();
        assert_eq!(session.selected_for_mating(), &[c]);
        assert_eq!(
            session.toggle_mating_selection(CreatureId(77)),
            Err(ActionError::CreatureNotFound(CreatureId(77)))
        );
    }

    #[test]
    fn evolved_creatures_cannot_be_selected() {
        let mut session = Session::new(8);
        let evolved = session.create_creature(CreatureParams {
            model_key: Some("ANCIENT_MIREFIN_EV1".into()),
            is_purebred: Some(true),
            ..Default::default()
        });
        let id = evolved.unique_id;
        session.stored.push(evolved);
        assert_eq!(session.toggle_mating_selection(id), Err(ActionError::NotBaseStage));
        assert!(session.selected_for_mating().is_empty());
    }

    #[test]
    fn stopped_session_does_not_tick_timers() {
        let mut session = Session::new(9);
        session.start_new_egg_incubation().unwrap();
        session.stop();
        assert!(!session.is_incubating());
        for _ in 0..100 {
            session.tick();
        }
        assert!(session.active().is_none());
        assert!(session.egg().is_some());
        assert_eq!(session.start_incubation(), Err(ActionError::SessionInactive));
        session.start();
        session.start_incubation().unwrap();
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = Session::new(10);
        hatch_one(&mut session);
        session.store_active().unwrap();
        session.start_new_egg_incubation().unwrap();
        session
            .set_current_environment(&EnvironmentKey::from("ALPINE_BLOOM"))
            .unwrap();
        session.reset();
        assert!(session.stored().is_empty());
        assert!(session.active().is_none());
        assert!(session.egg().is_none());
        assert!(!session.is_incubating());
        assert_eq!(session.next_creature_id(), 0);
        assert_eq!(session.current_environment().as_str(), "ABYSSAL_MARSH");
        assert!(session.is_running());
    }

    #[test]
    fn unknown_environment_rejected() {
        let mut session = Session::new(11);
        assert_eq!(
            session.set_current_environment(&EnvironmentKey::from("MOON")),
            Err(ActionError::UnknownEnvironment("MOON".into()))
        );
        assert_eq!(session.current_environment().as_str(), "ABYSSAL_MARSH");
    }

    #[test]
    fn step_turns_failures_into_notices() {
        let mut session = Session::new(12);
        let commands = vec![
            SessionCommand {
                second: 0,
                action: SessionAction::StoreActive,
            },
            SessionCommand {
                second: 1,
                action: SessionAction::StartNewEggIncubation,
            },
        ];
        let result = session.step(&commands, 31);
        assert_eq!(session.second(), 31);
        let kinds: Vec<_> = result.events.iter().map(|e| &e.kind).collect();
        assert!(matches!(kinds[0], SessionEventKind::Notice { message } if message == "No active creature."));
        assert!(kinds.iter().any(|k| matches!(k, SessionEventKind::Hatched { .. })));
        let hatched = result
            .events
            .iter()
            .find(|e| matches!(e.kind, SessionEventKind::Hatched { .. }))
            .unwrap();
        assert_eq!(hatched.second, 31);
    }
}
