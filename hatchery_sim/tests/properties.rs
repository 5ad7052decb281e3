// Property tests: random player action sequences never break the session's
// structural invariants.

use hatchery_sim::breeding::are_compatible;
use hatchery_sim::config::{CompatibilityPolicy, GameConfig};
use hatchery_sim::creature::{CreatureParams, IdAllocator, create_creature};
use hatchery_sim::definitions::DefinitionTables;
use hatchery_sim::session::Session;
use hatchery_sim::types::{CreatureId, EnvironmentKey, EvolutionStage, Lineage};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
enum Op {
    Incubate,
    Toggle(u64),
    Mate,
    Activate(u64),
    Store,
    Discard,
    Evolve,
    LevelUp,
    SetEnvironment(usize),
    Wait(u32),
    Reset,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Incubate),
        3 => (0u64..8).prop_map(Op::Toggle),
        2 => Just(Op::Mate),
        3 => (0u64..8).prop_map(Op::Activate),
        2 => Just(Op::Store),
        1 => Just(Op::Discard),
        2 => Just(Op::Evolve),
        4 => Just(Op::LevelUp),
        1 => (0usize..8).prop_map(Op::SetEnvironment),
        4 => (0u32..40).prop_map(Op::Wait),
        1 => Just(Op::Reset),
    ]
}

fn apply(session: &mut Session, op: &Op) {
    // Rejections are expected; only the invariants matter here.
    let _ = match op {
        Op::Incubate => session.start_new_egg_incubation(),
        Op::Toggle(id) => session.toggle_mating_selection(CreatureId(*id)),
        Op::Mate => session.setup_mating_from_selection(),
        Op::Activate(id) => session.activate(CreatureId(*id)),
        Op::Store => session.store_active().map(|_| ()),
        Op::Discard => session.discard_active().map(|_| ()),
        Op::Evolve => session.evolve_naturally().map(|_| ()),
        Op::LevelUp => session.level_up().map(|_| ()),
        Op::SetEnvironment(i) => {
            let key = session.tables().environments()[*i].key.clone();
            session.set_current_environment(&key)
        }
        Op::Wait(seconds) => {
            for _ in 0..*seconds {
                session.tick();
            }
            Ok(())
        }
        Op::Reset => {
            session.reset();
            Ok(())
        }
    };
}

fn check_invariants(session: &Session) -> Result<(), TestCaseError> {
    let config = session.config();
    prop_assert!(
        !(session.egg().is_some() && session.active().is_some()),
        "egg and active creature coexist"
    );
    prop_assert!(session.stored().len() <= config.max_stored_creatures);

    let ids: BTreeSet<CreatureId> = session.stored().iter().map(|c| c.unique_id).collect();
    prop_assert_eq!(ids.len(), session.stored().len(), "duplicate stored ids");
    for id in &ids {
        prop_assert!(id.0 < session.next_creature_id());
    }

    for c in session.stored().iter().chain(session.active()) {
        prop_assert!(c.level <= config.max_level);
        prop_assert!(c.current_evolution_stage <= c.lineage.max_stage());
        match c.lineage {
            Lineage::Hybrid => prop_assert!(c.base_species_model_key.is_none()),
            Lineage::Purebred => prop_assert!(!c.has_silver_sheen),
        }
    }

    if let Some(active) = session.active() {
        if let Some(stored) = session.stored_creature(active.unique_id) {
            prop_assert_eq!(stored, active, "stored copy out of sync with active");
        }
    }

    let selected = session.selected_for_mating();
    prop_assert!(selected.len() <= 2);
    for id in selected {
        let c = session.stored_creature(*id);
        prop_assert!(c.is_some_and(|c| c.current_evolution_stage == EvolutionStage::Base));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_play_keeps_invariants(
        seed in any::<u64>(),
        ops in prop::collection::vec(arb_op(), 1..80),
    ) {
        let config = GameConfig {
            max_stored_creatures: 4,
            incubation_time_seconds: 5,
            evolution_time_seconds: 8,
            max_level: 3,
            ..GameConfig::default()
        };
        let mut session = Session::with_config(seed, config, DefinitionTables::default_catalog());
        let mut max_stage: BTreeMap<CreatureId, EvolutionStage> = BTreeMap::new();

        for op in &ops {
            if matches!(op, Op::Reset) {
                max_stage.clear();
            }
            let before: BTreeMap<CreatureId, EvolutionStage> = session
                .stored()
                .iter()
                .chain(session.active())
                .map(|c| (c.unique_id, c.current_evolution_stage))
                .collect();
            apply(&mut session, op);
            check_invariants(&session)?;

            for c in session.stored().iter().chain(session.active()) {
                let seen = max_stage.entry(c.unique_id).or_insert(c.current_evolution_stage);
                prop_assert!(c.current_evolution_stage >= *seen, "stage went backwards");
                *seen = c.current_evolution_stage;

                if before.get(&c.unique_id).is_some_and(|stage| *stage != c.current_evolution_stage) {
                    prop_assert_eq!(c.level, 0, "level kept across a stage change");
                }
            }
        }
    }

    #[test]
    fn same_seed_same_play(
        seed in any::<u64>(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut a = Session::new(seed);
        let mut b = Session::new(seed);
        for op in &ops {
            apply(&mut a, op);
            apply(&mut b, op);
        }
        prop_assert_eq!(a.drain_events(), b.drain_events());
        prop_assert_eq!(a.to_save(), b.to_save());
    }

    #[test]
    fn compatibility_is_symmetric(
        i in 0usize..24,
        j in 0usize..24,
        hybrid_i in any::<bool>(),
        overlap in any::<bool>(),
    ) {
        let tables = DefinitionTables::default_catalog();
        let config = GameConfig::default();
        let mut ids = IdAllocator::default();
        let bases = tables.base_purebreds();
        let make = |index: usize, hybrid: bool, ids: &mut IdAllocator| {
            let def = bases[index];
            let origin = tables
                .environment_by_name(def.origin_environment_name.as_deref().unwrap_or_default())
                .map(|e| e.key.clone())
                .unwrap_or_else(|| EnvironmentKey::from("ABYSSAL_MARSH"));
            let params = CreatureParams {
                model_key: Some(def.model_key.clone()),
                is_purebred: Some(!hybrid),
                is_hybrid: Some(hybrid),
                origin_environment_key: Some(origin.clone()),
                ..Default::default()
            };
            create_creature(params, &tables, &config, ids, &origin)
        };
        let a = make(i, hybrid_i, &mut ids);
        let b = make(j, false, &mut ids);
        let policy = if overlap {
            CompatibilityPolicy::TemperatureOverlap
        } else {
            CompatibilityPolicy::RuleRequired
        };
        prop_assert_eq!(
            are_compatible(&a, &b, &tables, policy),
            are_compatible(&b, &a, &tables, policy)
        );
        if i == j && !hybrid_i {
            prop_assert!(are_compatible(&a, &b, &tables, policy));
        }
    }
}
