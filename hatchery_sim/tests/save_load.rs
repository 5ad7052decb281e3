// Save/load round trips through JSON, including a pending mating egg.

use hatchery_sim::save::SaveState;
use hatchery_sim::session::Session;
use hatchery_sim::types::{CreatureId, Lineage};
use serde_json::json;

fn two_marsh_parents() -> Session {
    let mut session = Session::new(17);
    let save = json!({
        "nextCreatureUniqueId": 2,
        "storedCreatures": [
            {"uniqueId": 0, "modelKey": "MIREFIN_BASE", "isPurebred": true,
             "originEnvironmentKey": "ABYSSAL_MARSH", "color": "#334433"},
            {"uniqueId": 1, "modelKey": "GLOOMLEECH_BASE", "isPurebred": true,
             "originEnvironmentKey": "ABYSSAL_MARSH", "color": "#334433"}
        ]
    });
    session.load_json(&save.to_string()).unwrap();
    session
}

#[test]
fn pending_mating_egg_survives_reload() {
    let mut session = two_marsh_parents();
    session.setup_mating(CreatureId(0), CreatureId(1)).unwrap();
    let save = session.to_save();
    assert!(save.is_hybrid_incubation_setup);
    assert!(!save.is_incubating);
    assert!(save.parent1_for_mating_data.is_some());

    let json = save.to_json().unwrap();
    assert!(json.contains("\"isHybridIncubationSetup\":true"));
    assert!(json.contains("\"parent2ForMatingData\""));

    let mut restored = Session::new(0);
    restored.load_json(&json).unwrap();
    let setup = restored.mating().unwrap();
    assert_eq!(setup.parent1.unique_id, CreatureId(0));
    assert_eq!(setup.parent2.unique_id, CreatureId(1));
    assert!(restored.egg().unwrap().is_hybrid);

    restored.start_new_egg_incubation().unwrap();
    for _ in 0..30 {
        restored.tick();
    }
    let child = restored.active().unwrap();
    assert_eq!(child.model_key.as_str(), "MIRELEECH_HYBRID_BASE");
    assert_eq!(child.lineage, Lineage::Hybrid);
    assert_eq!(child.unique_id, CreatureId(2));
}

#[test]
fn incubation_resumes_with_remaining_time() {
    let mut session = Session::new(18);
    session.start_new_egg_incubation().unwrap();
    for _ in 0..20 {
        session.tick();
    }
    let json = session.to_save().to_json_pretty().unwrap();

    let mut restored = Session::new(18);
    restored.load_json(&json).unwrap();
    assert!(restored.is_incubating());
    assert_eq!(restored.incubation_remaining(), 10);
    for _ in 0..9 {
        restored.tick();
    }
    assert!(restored.active().is_none());
    restored.tick();
    assert!(restored.active().is_some());
}

#[test]
fn overdue_incubation_is_not_resumed() {
    let json = json!({
        "isIncubating": true,
        "timeLeftForIncubation": -3,
        "eggData": {"isHybrid": false, "color": "ffffff"}
    });
    let mut session = Session::new(19);
    session.load_json(&json.to_string()).unwrap();
    assert!(session.egg().is_some());
    assert!(!session.is_incubating());
    // The idle egg can be started again.
    session.start_incubation().unwrap();
}

#[test]
fn active_creature_comes_back_without_panel_actions() {
    let mut session = two_marsh_parents();
    session.activate(CreatureId(0)).unwrap();
    assert!(session.active().unwrap().allow_active_panel_actions);
    let save = session.to_save();

    let mut restored = Session::new(0);
    restored.load_save(save.clone());
    let active = restored.active().unwrap();
    assert_eq!(active.unique_id, CreatureId(0));
    assert!(!active.allow_active_panel_actions);
    assert!(restored.stored().iter().all(|c| !c.allow_active_panel_actions));

    let reparsed = SaveState::from_json(&save.to_json().unwrap()).unwrap();
    assert_eq!(reparsed, save);
}

#[test]
fn loading_discards_selection_and_previous_state() {
    let mut session = two_marsh_parents();
    session.toggle_mating_selection(CreatureId(0)).unwrap();
    session.start_new_egg_incubation().unwrap();
    session.load_json("{}").unwrap();
    assert!(session.selected_for_mating().is_empty());
    assert!(session.stored().is_empty());
    assert!(session.egg().is_none());
    assert!(!session.is_incubating());
}
