// Error types for the hatchery.
//
// `ActionError` covers every user-actionable failure of a lifecycle,
// evolution or breeding operation. Its `Display` text is the notice shown
// to the player, and an operation that returns one has not mutated any
// state (natural evolution's missing-definition path is the one exception,
// see `evolution.rs`). When operations run through `Session::step`, errors
// become `SessionEventKind::Notice` events instead of propagating.
//
// `LoadError` covers reading configuration and save data.

use crate::types::{CreatureId, format_time};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("No active creature.")]
    NoActiveCreature,
    #[error("Storage full! Cannot store more creatures.")]
    StorageFull,
    #[error("An egg is already incubating.")]
    EggAlreadyIncubating,
    #[error("Store or discard the active creature first.")]
    ActiveCreaturePresent,
    #[error("Activate the creature from storage to use its actions.")]
    NotActivatedFromStorage,
    #[error("Only Base-stage purebreds can evolve naturally.")]
    NotEligibleForNaturalEvolution,
    #[error("Not ready to evolve yet. Time left: {}", clock(.remaining))]
    EvolutionTimerRunning { remaining: u32 },
    #[error("Creature is already at its maximum evolution.")]
    MaxEvolutionReached,
    #[error("Creature is at max level for this stage.")]
    MaxLevelReached,
    #[error("Cannot do that while an egg is incubating.")]
    IncubationInProgress,
    #[error("Creature {0} not found in storage.")]
    CreatureNotFound(CreatureId),
    #[error("Select exactly two different stored creatures to mate.")]
    MatingSelectionInvalid,
    #[error("Only Base-stage creatures can mate.")]
    NotBaseStage,
    #[error("These creatures are not compatible.")]
    Incompatible,
    #[error("There is no egg to incubate.")]
    NoEgg,
    #[error("Incubate the mated egg first.")]
    MatedEggPending,
    #[error("The active creature cannot be selected for mating.")]
    CannotSelectActive,
    #[error("The game session is not running.")]
    SessionInactive,
    #[error("Unknown environment {0}.")]
    UnknownEnvironment(String),
    #[error("Evolution data missing for this creature.")]
    EvolutionDataMissing,
}

pub type Result<T> = std::result::Result<T, ActionError>;

fn clock(seconds: &u32) -> String {
    format_time(*seconds)
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_read_as_player_text() {
        assert_eq!(
            ActionError::EvolutionTimerRunning { remaining: 75 }.to_string(),
            "Not ready to evolve yet. Time left: 01:15"
        );
        assert_eq!(
            ActionError::CreatureNotFound(CreatureId(4)).to_string(),
            "Creature #4 not found in storage."
        );
    }

    #[test]
    fn json_errors_convert() {
        let err: LoadError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(err.to_string().starts_with("malformed JSON"));
    }
}
