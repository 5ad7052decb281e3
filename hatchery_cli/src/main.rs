// Headless driver for the hatchery simulation.
//
// Runs a session for a number of simulated seconds against a command script,
// prints each narrative event, and prints (or writes) the resulting save
// payload. Useful for reproducing a playthrough from a seed and for
// inspecting save files outside the game.
//
// Usage:
//   hatchery [OPTIONS]
//     --seed <N>              PRNG seed (default: 1)
//     --seconds <N>           Simulated seconds to run (default: 120)
//     --config <FILE>         GameConfig JSON (default: built-in values)
//     --load <FILE>           Save payload to start from
//     --script <FILE>         JSON array of SessionCommands (default: a demo script)
//     --environment <KEY>     Starting environment key
//     --save <FILE>           Write the final save here instead of stdout
//
// Log verbosity follows `RUST_LOG` (default: info).

use std::path::{Path, PathBuf};

use hatchery_sim::command::{SessionAction, SessionCommand};
use hatchery_sim::config::GameConfig;
use hatchery_sim::definitions::DefinitionTables;
use hatchery_sim::session::Session;
use hatchery_sim::types::{CreatureId, EnvironmentKey, format_time};

struct CliOptions {
    seed: u64,
    seconds: u64,
    config: Option<PathBuf>,
    load: Option<PathBuf>,
    script: Option<PathBuf>,
    environment: Option<String>,
    save: Option<PathBuf>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            seconds: 120,
            config: None,
            load: None,
            script: None,
            environment: None,
            save: None,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args();

    let config = match &options.config {
        Some(path) => GameConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }),
        None => GameConfig::default(),
    };
    let mut session =
        Session::with_config(options.seed, config, DefinitionTables::default_catalog());

    if let Some(path) = &options.load {
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| session.load_json(&json).map_err(|e| e.to_string()));
        if let Err(e) = loaded {
            eprintln!("Failed to load save {}: {e}", path.display());
            std::process::exit(1);
        }
    }

    if let Some(key) = &options.environment {
        if let Err(e) = session.set_current_environment(&EnvironmentKey::from(key.as_str())) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    let mut commands = match &options.script {
        Some(path) => read_script(path),
        None => demo_script(),
    };
    commands.sort_by_key(|c| c.second);
    log::info!(
        "Running {} commands over {} seconds (seed {})",
        commands.len(),
        options.seconds,
        options.seed
    );

    let target = session.second() + options.seconds;
    let result = session.step(&commands, target);
    for event in &result.events {
        let clock = u32::try_from(event.second).map_or_else(|_| event.second.to_string(), format_time);
        println!("[{clock}] {:?}", event.kind);
    }

    println!();
    println!(
        "Stored: {}/{}  Active: {}  Egg: {}  Environment: {}",
        session.stored().len(),
        session.config().max_stored_creatures,
        session
            .active()
            .map_or("none".to_string(), |c| format!("{} {}", c.unique_id, c.model_key)),
        session.egg().map_or("none".to_string(), |e| e.color.to_string()),
        session.current_environment()
    );

    let json = match session.to_save().to_json_pretty() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize save: {e}");
            std::process::exit(1);
        }
    };
    match &options.save {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json) {
                eprintln!("Failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
            log::info!("Save written to {}", path.display());
        }
        None => println!("{json}"),
    }
}

fn read_script(path: &Path) -> Vec<SessionCommand> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()));
    parsed.unwrap_or_else(|e| {
        eprintln!("Failed to read script {}: {e}", path.display());
        std::process::exit(1);
    })
}

/// Hatch two creatures, mate them, and hatch their offspring. Ids assume a
/// fresh session.
fn demo_script() -> Vec<SessionCommand> {
    let at = |second, action| SessionCommand { second, action };
    vec![
        at(0, SessionAction::StartNewEggIncubation),
        at(31, SessionAction::StoreActive),
        at(32, SessionAction::StartNewEggIncubation),
        at(63, SessionAction::StoreActive),
        at(64, SessionAction::ToggleMatingSelection {
            creature_id: CreatureId(0),
        }),
        at(64, SessionAction::ToggleMatingSelection {
            creature_id: CreatureId(1),
        }),
        at(65, SessionAction::SetupMating),
        at(66, SessionAction::StartNewEggIncubation),
        at(97, SessionAction::Activate {
            creature_id: CreatureId(0),
        }),
        at(98, SessionAction::LevelUp),
    ]
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> CliOptions {
    let mut options = CliOptions::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                options.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a number");
                    std::process::exit(1);
                });
            }
            "--seconds" => {
                i += 1;
                options.seconds = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seconds requires a number");
                    std::process::exit(1);
                });
            }
            "--config" => {
                i += 1;
                options.config = Some(path_arg(&args, i, "--config"));
            }
            "--load" => {
                i += 1;
                options.load = Some(path_arg(&args, i, "--load"));
            }
            "--script" => {
                i += 1;
                options.script = Some(path_arg(&args, i, "--script"));
            }
            "--save" => {
                i += 1;
                options.save = Some(path_arg(&args, i, "--save"));
            }
            "--environment" => {
                i += 1;
                options.environment = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--environment requires a key");
                    std::process::exit(1);
                }));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn path_arg(args: &[String], i: usize, flag: &str) -> PathBuf {
    args.get(i).map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("{flag} requires a file path");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: hatchery [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --seed <N>              PRNG seed (default: 1)");
    println!("  --seconds <N>           Simulated seconds to run (default: 120)");
    println!("  --config <FILE>         GameConfig JSON (default: built-in values)");
    println!("  --load <FILE>           Save payload to start from");
    println!("  --script <FILE>         JSON array of SessionCommands (default: demo script)");
    println!("  --environment <KEY>     Starting environment key");
    println!("  --save <FILE>           Write the final save here instead of stdout");
    println!("  --help, -h              Show this help");
}
