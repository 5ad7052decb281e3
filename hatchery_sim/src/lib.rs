// hatchery_sim: pure Rust core of the creature hatchery.
//
// This crate holds all game logic for the hatchery: the definition catalog
// (creature models, environments, hybrid rules), the creature factory, the
// evolution engine, breeding compatibility and offspring resolution, the
// incubation/lifecycle controller, the logical clock, and save/load. It has
// no rendering, audio or UI dependencies and runs headless; a presentation
// layer reads `Session` state and the events it emits.
//
// Module overview:
// - `session.rs`:     Session: owns all state; lifecycle operations, tick/step loop.
// - `save.rs`:        SaveState payload + Session::to_save / load_save / load_json.
// - `creature.rs`:    Creature, CreatureParams, IdAllocator, create_creature factory.
// - `evolution.rs`:   Natural, level-gated and training transitions; evolution status text.
// - `breeding.rs`:    Compatibility, offspring resolution, random hatchling species.
// - `clock.rs`:       Incubation Timer + per-creature evolution countdown.
// - `definitions.rs`: ModelDefinition, EnvironmentDefinition, hybrid rule tables, builder.
// - `catalog.rs`:     The built-in 8-environment catalog.
// - `command.rs`:     SessionCommand / SessionAction: every player action.
// - `event.rs`:       Narrative SessionEvents.
// - `config.rs`:      GameConfig: all tunable parameters.
// - `error.rs`:       ActionError (player-facing) and LoadError.
// - `types.rs`:       Ids, keys, EvolutionStage, Lineage, Color and the color gate.
// - `prng`:           Re-exported from `hatchery_prng`.
//
// **Critical constraint: determinism.** A session is a pure function of
// `(seed, config, tables, commands)`. All randomness comes from the seeded
// `GameRng`. No `HashMap`, no system time, no OS entropy. Use `BTreeMap` for
// ordered collections.

pub mod breeding;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod creature;
pub mod definitions;
pub mod error;
pub mod event;
pub mod evolution;
pub use hatchery_prng as prng;
pub mod save;
pub mod session;
pub mod types;
