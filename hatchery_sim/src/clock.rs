// Logical clock primitives.
//
// The hatchery has two countdowns: the per-egg incubation timer and the
// per-creature natural-evolution timer. Both advance only when the session
// ticks (`Session::tick`, once per simulated second), never from wall-clock
// time, so tests drive them by stepping.
//
// `Timer` is the incubation countdown. `tick_creature` is the game clock's
// per-creature body: decrement a purebred Base creature's evolution timer
// and refresh `can_evolve`. The ordering across creatures (stored first,
// then the active one, then syncing the active copy back into storage) is
// the session's job.
//
// **Critical constraint: determinism.** Timers are plain counters.

use crate::config::GameConfig;
use crate::creature::Creature;
use crate::evolution::update_can_evolve_status;
use crate::types::{EvolutionStage, Lineage};
use serde::{Deserialize, Serialize};

/// A one-shot countdown in whole seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    remaining: u32,
    running: bool,
}

impl Timer {
    /// Restart from `seconds`. A zero-length timer fires on the next tick.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.running = true;
    }

    /// Resume with a specific remaining time, as when loading a save.
    pub fn resume(&mut self, remaining: u32) {
        self.start(remaining);
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.remaining = 0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advance one second. Returns true on the tick the timer fires; it is
    /// stopped afterwards.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }
}

/// One game-clock second for one creature. Returns true if its natural
/// evolution timer reached zero on this tick.
pub fn tick_creature(creature: &mut Creature, config: &GameConfig) -> bool {
    let mut reached_zero = false;
    if creature.lineage == Lineage::Purebred
        && creature.current_evolution_stage == EvolutionStage::Base
        && creature.time_to_next_evolution > 0
    {
        creature.time_to_next_evolution -= 1;
        reached_zero = creature.time_to_next_evolution == 0;
        if reached_zero {
            log::debug!("Creature {} is ready for natural evolution", creature.unique_id);
        }
    }
    update_can_evolve_status(creature, config);
    reached_zero
}
