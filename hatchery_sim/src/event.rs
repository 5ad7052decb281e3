// Player-visible narrative events.
//
// Sessions record what happened as `SessionEvent`s, stamped with the
// simulated second. `Session::step` returns them in its `StepResult`;
// callers driving the session through direct method calls collect them with
// `Session::drain_events`. There is no per-second countdown event; timer
// state is read from the session when a presentation layer needs it.
//
// `Notice` carries a user-actionable message (a failed command, or the
// storage-full warning at hatch).

use crate::types::{Color, CreatureId, EnvironmentKey, EvolutionStage, Lineage, ModelKey};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub second: u64,
    pub kind: SessionEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionEventKind {
    EggSpawned { is_hybrid: bool, color: Color },
    IncubationStarted { seconds: u32 },
    Hatched {
        creature_id: CreatureId,
        model_key: ModelKey,
        lineage: Lineage,
    },
    /// A hatchling could not be stored; it stays active only.
    StoredOverflow { creature_id: CreatureId },
    Activated { creature_id: CreatureId },
    Stored { creature_id: CreatureId },
    Discarded { creature_id: CreatureId },
    MatingSelectionChanged { selected: Vec<CreatureId> },
    MatingSetUp {
        parent1: CreatureId,
        parent2: CreatureId,
        hybrid_egg: bool,
    },
    Evolved {
        creature_id: CreatureId,
        from: EvolutionStage,
        to: EvolutionStage,
        model_key: ModelKey,
        gained_sheen: bool,
    },
    LeveledUp { creature_id: CreatureId, level: u32 },
    EnvironmentChanged { key: EnvironmentKey },
    /// A purebred's natural-evolution timer reached zero.
    EvolutionReady { creature_id: CreatureId },
    SessionStarted,
    SessionStopped,
    SessionReset,
    Notice { message: String },
}

/// Output of `Session::step`.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    pub events: Vec<SessionEvent>,
}
