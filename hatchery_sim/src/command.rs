// Commands that drive a session.
//
// Every player action can be expressed as a `SessionCommand`: the simulated
// second it applies at plus a `SessionAction`. `Session::step` takes a
// sorted batch of them, applies each when the clock reaches its second, and
// ticks the clock in between. A command that fails is not an error for the
// caller; it becomes a `Notice` event carrying the player-facing message.
//
// The same operations are also available as direct `Session` methods
// returning `Result`, which is what tests mostly use.
//
// See also: `session.rs` for `apply_command`, `event.rs` for the output.

use crate::types::{ColorInput, CreatureId, EnvironmentKey};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionCommand {
    pub second: u64,
    pub action: SessionAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionAction {
    /// Choose the incubation/evolution environment.
    SetEnvironment { key: EnvironmentKey },
    /// The "incubate" button: start the pending mated egg, or spawn and
    /// start a fresh standard egg.
    StartNewEggIncubation,
    /// Spawn an egg without starting it.
    SpawnEgg {
        is_hybrid: bool,
        color: Option<ColorInput>,
    },
    /// Start the countdown of the egg already present.
    StartIncubation,
    ToggleMatingSelection { creature_id: CreatureId },
    /// Mate the two currently selected creatures.
    SetupMating,
    Activate { creature_id: CreatureId },
    StoreActive,
    DiscardActive,
    EvolveNaturally,
    LevelUp,
    StartSession,
    StopSession,
    ResetSession,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize() {
        let cmd = SessionCommand {
            second: 4,
            action: SessionAction::Activate {
                creature_id: CreatureId(2),
            },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: SessionCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
