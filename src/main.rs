//! Duel Stage main entry point.
//!
//! A two-player arena brawler written in Rust using:
//! - **bevy_ecs** for the fighters, the round state machine and scheduling
//! - **raylib** for windowing, sprites and audio (`render` feature)
//! - flat **JSON** files for characters, users, missions and battle history
//!
//! # Main Loop
//!
//! 1. Load `config.ini` and open the JSON repositories
//! 2. Build the ECS world, register state hooks and observers
//! 3. Enter `Setup`, which spawns both fighters
//! 4. Tick the schedule: input, countdown, fighters, KO detection, round-over
//!    menu, stat persistence, rendering
//!
//! # Running
//!
//! ```sh
//! cargo run --release --features render -- --user alice
//! cargo run --release -- --simulate --rounds 5 --seed 7
//! ```

// Do not create console on Windows
#![cfg_attr(
    all(target_os = "windows", feature = "render"),
    windows_subsystem = "windows"
)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use duelstage::game::{build_schedule, build_world, run_headless, start};
use duelstage::resources::gameconfig::GameConfig;
use duelstage::resources::matchstate::{AutoPilot, MatchRequest, Pilot, SessionSummary};
use duelstage::resources::storage::Storage;
use duelstage::storage::JsonRepository;

/// Upper bound on simulated time per round before a headless run gives up.
const MAX_SECONDS_PER_ROUND: u64 = 300;

/// Duel Stage
#[derive(Parser, Debug)]
#[command(version, about = "Two fighters, one stage.")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Directory of the JSON data files; overrides `[data] dir`.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Logged-in user playing slot one.
    #[arg(long)]
    user: Option<String>,

    /// Character of player one.
    #[arg(long)]
    character: Option<String>,

    /// Character of player two; random when omitted.
    #[arg(long)]
    opponent: Option<String>,

    /// Ranked match: one round, league points at stake.
    #[arg(long)]
    ranked: bool,

    /// Player two is a second human (arrows, attacks on 1..9) instead of the CPU.
    #[arg(long)]
    two_players: bool,

    /// Run a headless CPU-vs-CPU session and exit.
    #[arg(long)]
    simulate: bool,

    /// Rounds to play in a headless session.
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Seed for opponent selection and CPU decisions.
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(cli: &Cli) -> GameConfig {
    let mut config = GameConfig::with_path(cli.config.clone());
    if let Err(e) = config.load_from_file() {
        warn!("Config file not usable, using defaults: {}", e);
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config
}

fn match_request(cli: &Cli, headless: bool) -> MatchRequest {
    MatchRequest {
        user: cli.user.clone(),
        character: cli.character.clone(),
        opponent: cli.opponent.clone(),
        ranked: cli.ranked,
        player_one: if headless { Pilot::Cpu } else { Pilot::Human },
        player_two: if cli.two_players && !headless {
            Pilot::Human
        } else {
            Pilot::Cpu
        },
        seed: cli.seed,
    }
}

fn run_simulation(config: GameConfig, storage: Storage, request: MatchRequest, rounds: u32) {
    let rounds = rounds.max(1);
    let max_ticks = rounds as u64 * MAX_SECONDS_PER_ROUND * config.target_fps.max(1) as u64;

    let mut world = build_world(config, storage, request);
    world.insert_resource(AutoPilot { rounds });
    start(&mut world);
    let mut schedule = build_schedule();
    let ticks = run_headless(&mut world, &mut schedule, max_ticks);

    match world.get_resource::<SessionSummary>() {
        Some(summary) => info!(
            "Simulation finished after {} ticks: {} round(s), score {} - {}",
            ticks, summary.rounds, summary.score[0], summary.score[1]
        ),
        None => {
            error!("Simulation ended without finishing a session");
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "render")]
fn run_window(config: GameConfig, storage: Storage, request: MatchRequest) {
    use bevy_ecs::prelude::*;
    use duelstage::game::is_quitting;
    use duelstage::resources::audio::{setup_audio, shutdown_audio};
    use duelstage::systems::audio::{
        forward_audio_cmds, poll_audio_messages, report_audio_messages, update_bevy_audio_cmds,
        update_bevy_audio_messages,
    };
    use duelstage::systems::fighter::persist_fighter_stats;
    use duelstage::systems::gamestate::check_pending_state;
    use duelstage::systems::input::update_input_state;
    use duelstage::systems::menu::main_menu_system;
    use duelstage::systems::render::{load_character_sheets, render_system};
    use duelstage::systems::time::update_world_time;

    let (width, height) = config.window_size();
    let mut builder = raylib::init();
    builder
        .size(width as i32, height as i32)
        .title("Duel Stage");
    if config.vsync {
        builder.vsync();
    }
    let (mut rl, thread) = builder.build();
    rl.set_target_fps(config.target_fps);
    // Escape belongs to the menus
    rl.set_exit_key(None);
    if config.fullscreen {
        rl.toggle_fullscreen();
    }

    let mut world = build_world(config, storage, request);
    load_character_sheets(&mut world, &mut rl, &thread);
    setup_audio(&mut world);
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);
    start(&mut world);

    let mut update = build_schedule();
    update.add_systems(update_input_state.before(check_pending_state));
    update.add_systems(forward_audio_cmds.before(update_bevy_audio_cmds));
    update.add_systems(
        (
            poll_audio_messages,
            report_audio_messages,
            update_bevy_audio_messages,
        )
            .chain(),
    );
    update.add_systems(
        render_system
            .after(persist_fighter_stats)
            .after(main_menu_system),
    );

    while !world
        .non_send_resource::<raylib::RaylibHandle>()
        .window_should_close()
        && !is_quitting(&world)
    {
        let dt = world
            .non_send_resource::<raylib::RaylibHandle>()
            .get_frame_time();
        update_world_time(&mut world, dt);
        update.run(&mut world);
        world.clear_trackers();
    }
    shutdown_audio(&mut world);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli);
    info!("Data directory: {}", config.data_dir.display());
    let storage = Storage::from_store(Arc::new(JsonRepository::new(config.data_dir.clone())));

    let headless = cli.simulate || cfg!(not(feature = "render"));
    let request = match_request(&cli, headless);

    if headless {
        run_simulation(config, storage, request, cli.rounds);
        return;
    }

    #[cfg(feature = "render")]
    run_window(config, storage, request);
}
