// Built-in definition catalog.
//
// Eight environments, each with three purebred species (Base/EV1/EV2 for
// 72 purebred definitions), 24 intra-environment hybrids (every pair of
// species within an environment) and 90 inter-environment hybrids (the full
// 3x3 species grid of ten environment pairings). Ids follow insertion order:
// purebreds 1-72 grouped by environment then species then stage, intra
// hybrids 73-96, inter hybrids 97-186.
//
// Everything is declared as const seed data and fed through
// `DefinitionTablesBuilder` (see `definitions.rs`), which derives the keys
// and resolves the rules. Hybrid names are kept exactly as listed,
// including the irregular ones.
//
// **Critical constraint: determinism.** Seed order defines ids and the
// order of random purebred candidates. Do not reorder.

use crate::definitions::{Ambiance, DefinitionTables, HybridType};
use crate::types::Color;

struct EnvironmentSeed {
    name: &'static str,
    temp_min: i32,
    temp_max: i32,
    ev1_moniker: &'static str,
    ev2_moniker: &'static str,
    species: [&'static str; 3],
    /// background, fog, light, creature
    palette: [u32; 4],
    /// Hybrids of species pairs (0,1), (0,2), (1,2).
    intra_hybrids: [&'static str; 3],
}

/// An environment pairing and its 3x3 hybrid grid. `hybrids[i * 3 + j]` is
/// the child of species `i` of the first environment and species `j` of
/// the second.
struct InterSeed {
    first: usize,
    second: usize,
    hybrids: [&'static str; 9],
}

const ABYSSAL_MARSH: usize = 0;
const SCORCHING_BASIN: usize = 1;
const CLOUDSPINE_PLATEAU: usize = 2;
const VERDANT_LOWLANDS: usize = 3;
const OBSIDIAN_WASTES: usize = 5;
const TWILIGHT_FENLANDS: usize = 6;
const ALPINE_BLOOM: usize = 7;

const ENVIRONMENTS: [EnvironmentSeed; 8] = [
    EnvironmentSeed {
        name: "Abyssal Marsh",
        temp_min: 60,
        temp_max: 90,
        ev1_moniker: "Ancient",
        ev2_moniker: "Legendary",
        species: ["Mirefin", "Rootfang", "Gloomleech"],
        palette: [0x101810, 0x182818, 0x405040, 0x334433],
        intra_hybrids: ["Mirefang", "Mireleech", "Rootleech"],
    },
    EnvironmentSeed {
        name: "Scorching Basin",
        temp_min: 150,
        temp_max: 200,
        ev1_moniker: "Volcanic",
        ev2_moniker: "Solarflare",
        species: ["Pyreclaw", "Solhound", "Ashwing"],
        palette: [0xD2691E, 0xFFB732, 0xFFFACD, 0x8B4513],
        intra_hybrids: ["Pyrehound", "Pyrewing", "Solwing"],
    },
    EnvironmentSeed {
        name: "Cloudspine Plateau",
        temp_min: -10,
        temp_max: 40,
        ev1_moniker: "Skycrest",
        ev2_moniker: "Summitlord",
        species: ["Aerowing", "Cragbeak", "Zephyrion"],
        palette: [0xADD8E6, 0xF0F8FF, 0xFFFFFF, 0xB0C4DE],
        intra_hybrids: ["Aerobeak", "Aeroion", "Cragion"],
    },
    EnvironmentSeed {
        name: "Verdant Lowlands",
        temp_min: 70,
        temp_max: 100,
        ev1_moniker: "Primal",
        ev2_moniker: "Elderwood",
        species: ["Bloomtail", "Riveraptor", "Vinetooth"],
        palette: [0x228B22, 0x3CB371, 0xFFFFE0, 0x006400],
        intra_hybrids: ["Bloomraptor", "Bloomtooth", "Rivertooth"],
    },
    EnvironmentSeed {
        name: "Frozen Stratoscape",
        temp_min: -150,
        temp_max: -80,
        ev1_moniker: "Crystalline",
        ev2_moniker: "Xenoform",
        species: ["Glaciore", "Rimescale", "Cometail"],
        palette: [0x4A708B, 0xCAE1FF, 0xFFFFFF, 0x7AC5CD],
        intra_hybrids: ["Glacioscale", "Glaciotail", "Rimetail"],
    },
    EnvironmentSeed {
        name: "Obsidian Wastes",
        temp_min: 100,
        temp_max: 160,
        ev1_moniker: "Tempered",
        ev2_moniker: "Dreadwaste",
        species: ["Basaltmane", "Ashstrider", "Flintfang"],
        palette: [0x282828, 0x383838, 0xA9A9A9, 0x483D8B],
        intra_hybrids: ["Basaltstrider", "Basaltfang", "Ashfang"],
    },
    EnvironmentSeed {
        name: "Twilight Fenlands",
        temp_min: 50,
        temp_max: 70,
        ev1_moniker: "Luminous",
        ev2_moniker: "Enigmatic",
        species: ["Luminwing", "Reedskipper", "Vesperwisp"],
        palette: [0x191970, 0x2F2F8F, 0x00FFFF, 0x505090],
        intra_hybrids: ["Luminskipper", "Luminwisp", "Reedwisp"],
    },
    EnvironmentSeed {
        name: "Alpine Bloom",
        temp_min: 30,
        temp_max: 60,
        ev1_moniker: "Wildbloom",
        ev2_moniker: "Serenepeak",
        species: ["Floracorn", "Gladehorn", "Sunpetal"],
        palette: [0xE6E6FA, 0xFFFFFF, 0xFFFFF0, 0xFFB6C1],
        intra_hybrids: ["Florahorn", "Florapetal", "Gladepetal"],
    },
];

const INTER_PAIRINGS: [InterSeed; 10] = [
    InterSeed {
        first: ABYSSAL_MARSH,
        second: VERDANT_LOWLANDS,
        hybrids: [
            "Miretail", "Mireraptor", "Miretooth",
            "Roottail", "Rootraptor", "Roottooth",
            "Gloomtail", "Gloomraptor", "Gloomtooth",
        ],
    },
    InterSeed {
        first: ABYSSAL_MARSH,
        second: TWILIGHT_FENLANDS,
        hybrids: [
            "Mirewing", "Mireskip", "Mirewisp",
            "Rootwing", "Rootskip", "Rootwisp",
            "Gloomwing", "Gloomskip", "Gloomwisp",
        ],
    },
    InterSeed {
        first: ABYSSAL_MARSH,
        second: OBSIDIAN_WASTES,
        hybrids: [
            "Miremane", "Mirestride", "Mireflint",
            "Rootmane", "Rootstride", "Rootflint",
            "Gloommane", "Gloomstride", "Gloomflint",
        ],
    },
    InterSeed {
        first: ABYSSAL_MARSH,
        second: ALPINE_BLOOM,
        hybrids: [
            "Mirecorn", "Mirehorn", "Mirepetal",
            "Rootcorn", "Roothorn", "Rootpetal",
            "Gloomcorn", "Gloomhorn", "Gloompetal",
        ],
    },
    InterSeed {
        first: SCORCHING_BASIN,
        second: OBSIDIAN_WASTES,
        hybrids: [
            "Pyremane", "Pyrestride", "Pyreflint",
            "Solmane", "Solstride", "Solflint",
            "Wingmane", "Wingstride", "Wingflint",
        ],
    },
    InterSeed {
        first: CLOUDSPINE_PLATEAU,
        second: ALPINE_BLOOM,
        hybrids: [
            "Aerocorn", "Aerohorn", "Aeropetal",
            "Cragcorn", "Craghorn", "Cragpetal",
            "Zephyrcorn", "Zephyrhorn", "Zephyrpetal",
        ],
    },
    InterSeed {
        first: VERDANT_LOWLANDS,
        second: OBSIDIAN_WASTES,
        hybrids: [
            "Bloomane", "Bloomstride", "Bloomflint",
            "Rivermane", "Riverstride", "Riverflint",
            "Vinemane", "Vinestride", "Vineflint",
        ],
    },
    InterSeed {
        first: VERDANT_LOWLANDS,
        second: TWILIGHT_FENLANDS,
        hybrids: [
            "Bloomwing", "Bloomskip", "Bloomwisp",
            "Riverwing", "Riverskip", "Riverwisp",
            "Vinewing", "Vineskip", "Vinewisp",
        ],
    },
    InterSeed {
        first: VERDANT_LOWLANDS,
        second: ALPINE_BLOOM,
        hybrids: [
            "Bloomcorn", "Bloomhorn", "Bloompeta",
            "Rivercorn", "Riverhorn", "Riverpetal",
            "Vinecorn", "Vinehorn", "Vinepetal",
        ],
    },
    InterSeed {
        first: TWILIGHT_FENLANDS,
        second: ALPINE_BLOOM,
        hybrids: [
            "Lumicorn", "Lumihorn", "Lumipetal",
            "Reedcorn", "Reedhorn", "Reedpetal",
            "Vespercorn", "Vesperhorn", "Vesperpetal",
        ],
    },
];

/// Index pairs matching `EnvironmentSeed::intra_hybrids`.
const INTRA_PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

fn ambiance(palette: [u32; 4]) -> Ambiance {
    Ambiance {
        background_color: Color::from_rgb_u32(palette[0]),
        fog_color: Color::from_rgb_u32(palette[1]),
        light_color: Color::from_rgb_u32(palette[2]),
        creature_color: Some(Color::from_rgb_u32(palette[3])),
    }
}

impl DefinitionTables {
    /// The built-in tables shipped with the game.
    pub fn default_catalog() -> DefinitionTables {
        let mut builder = DefinitionTables::builder();

        for env in &ENVIRONMENTS {
            builder = builder.environment(env.name, env.temp_min, env.temp_max, ambiance(env.palette));
        }
        for env in &ENVIRONMENTS {
            for species in env.species {
                builder = builder.purebred_line(env.name, species, env.ev1_moniker, env.ev2_moniker);
            }
        }

        for env in &ENVIRONMENTS {
            for (hybrid, (i, j)) in env.intra_hybrids.iter().zip(INTRA_PAIRS) {
                builder = builder
                    .hybrid(hybrid, HybridType::Intra)
                    .intra_rule(env.name, env.species[i], env.species[j], hybrid);
            }
        }

        for pairing in &INTER_PAIRINGS {
            let first = &ENVIRONMENTS[pairing.first];
            let second = &ENVIRONMENTS[pairing.second];
            for (cell, hybrid) in pairing.hybrids.iter().enumerate() {
                builder = builder.hybrid(hybrid, HybridType::Inter).inter_rule(
                    first.name,
                    second.name,
                    first.species[cell / 3],
                    second.species[cell % 3],
                    hybrid,
                );
            }
        }

        builder.build()
    }
}
