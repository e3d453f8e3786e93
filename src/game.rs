//! Match setup, state hooks and the per-tick schedule.
//!
//! The game moves through [`GameStates`]:
//!
//! ```text
//! None -> Setup -> Playing -> Menu -> { Setup, Quitting }
//! ```
//!
//! Each state has an enter hook registered in [`StateHooks`]:
//! - [`setup`] – pick both characters and spawn the fighters
//! - [`enter_play`] – start a fresh match session
//! - [`enter_menu`] – despawn the fighters and close the session
//! - [`quit_game`] – release audio before the loop stops
//!
//! [`build_world`] wires resources, observers and hooks. [`build_schedule`]
//! returns the tick schedule shared by the windowed and headless front ends,
//! and [`run_headless`] drives it at a fixed step.

use bevy_ecs::message::Messages;
use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use log::{error, info, warn};
use thiserror::Error;

use crate::components::fighter::{Fighter, PlayerSlot};
use crate::components::inputcontrolled::{Controller, PlayerBindings, RandomMovePolicy};
use crate::events::audio::AudioCmd;
use crate::events::gamestate::{GameStateChangedEvent, observe_gamestate_change_event};
use crate::events::round::observe_round_ended;
use crate::resources::animationstore::AnimationStore;
use crate::resources::characters::CharacterDefinition;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::input::InputState;
use crate::resources::matchstate::{ArenaSize, MatchRequest, MatchState, Pilot};
use crate::resources::storage::Storage;
use crate::resources::statehooks::StateHooks;
use crate::resources::worldtime::WorldTime;
use crate::storage::StoreError;
use crate::systems::audio::update_bevy_audio_cmds;
use crate::systems::fighter::{clear_input_edges, fighter_tick_system, persist_fighter_stats};
use crate::systems::gamestate::{check_pending_state, state_is_menu, state_is_playing};
use crate::systems::menu::main_menu_system;
use crate::systems::round::{
    apply_round_decision, autopilot_decision_system, round_intro_system, round_outcome_system,
    round_over_menu_system,
};
use crate::systems::time::update_world_time;

/// Audio id of the background track.
pub const MUSIC_ID: &str = "theme";

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no characters defined")]
    NoCharacters,
    #[error("character '{name}' is invalid: {problems}")]
    InvalidCharacter { name: String, problems: String },
}

/// A character picked for one side of the match.
#[derive(Debug, Clone, PartialEq)]
pub struct Contender {
    pub character: String,
    pub definition: CharacterDefinition,
}

/// Both sides of the next match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPlan {
    pub user: Option<String>,
    pub player: Contender,
    pub opponent: Contender,
}

/// Random character other than `player`, or `player` itself when it is the
/// only one.
pub fn pick_opponent(characters: &[String], player: &str, rng: &mut fastrand::Rng) -> String {
    let others: Vec<&String> = characters.iter().filter(|c| *c != player).collect();
    if others.is_empty() {
        player.to_string()
    } else {
        others[rng.usize(..others.len())].clone()
    }
}

fn load_contender(storage: &Storage, character: String) -> Result<Contender, GameError> {
    let definition = storage.characters.get(&character)?;
    if let Err(problems) = definition.validate() {
        return Err(GameError::InvalidCharacter {
            name: character,
            problems: problems.join("; "),
        });
    }
    Ok(Contender {
        character,
        definition,
    })
}

/// Resolve both characters of `request`.
///
/// Player one plays the requested character, else the user's assigned
/// character, else the first one listed. The opponent is the requested one
/// or a random different character.
pub fn prepare_match(
    storage: &Storage,
    request: &MatchRequest,
    rng: &mut fastrand::Rng,
) -> Result<MatchPlan, GameError> {
    let characters = storage.characters.list()?;
    let Some(first) = characters.first() else {
        return Err(GameError::NoCharacters);
    };

    let assigned = match request.user.as_deref() {
        Some(user) => storage
            .users
            .get_user(user)?
            .and_then(|record| record.character_class),
        None => None,
    };
    let player = request
        .character
        .clone()
        .or(assigned)
        .unwrap_or_else(|| first.clone());
    let opponent = request
        .opponent
        .clone()
        .unwrap_or_else(|| pick_opponent(&characters, &player, rng));

    Ok(MatchPlan {
        user: request.user.clone(),
        player: load_contender(storage, player)?,
        opponent: load_contender(storage, opponent)?,
    })
}

fn controller_for(pilot: Pilot, slot: PlayerSlot, seed: Option<u64>) -> Controller {
    match (pilot, slot) {
        (Pilot::Human, PlayerSlot::One) => Controller::Human(PlayerBindings::player_one()),
        (Pilot::Human, PlayerSlot::Two) => Controller::Human(PlayerBindings::player_two()),
        (Pilot::Cpu, _) => match seed {
            Some(seed) => Controller::ai(RandomMovePolicy::with_seed(
                seed.wrapping_add(slot.index() as u64 + 1),
            )),
            None => Controller::ai(RandomMovePolicy::new()),
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn build_fighter(
    slot: PlayerSlot,
    contender: &Contender,
    pilot: Pilot,
    x: f32,
    request: &MatchRequest,
    config: &GameConfig,
    animations: &mut AnimationStore,
) -> Fighter {
    let sheet = animations.sheet_size(&contender.character);
    let clips = animations.get_or_build(&contender.character, &contender.definition, sheet);
    Fighter::new(
        slot,
        &contender.character,
        &contender.definition,
        clips,
        x,
        config.start_y,
        controller_for(pilot, slot, request.seed),
        config.fighter_tuning(),
    )
}

/// Build the two fighters of `plan` at their starting positions. Player one
/// carries the user's name; a fighter without an account is named after its
/// character.
pub fn build_fighters(
    plan: &MatchPlan,
    request: &MatchRequest,
    config: &GameConfig,
    animations: &mut AnimationStore,
) -> [Fighter; 2] {
    let p1_name = plan.user.as_ref().unwrap_or(&plan.player.character);
    let p1 = build_fighter(
        PlayerSlot::One,
        &plan.player,
        request.player_one,
        config.p1_start_x,
        request,
        config,
        animations,
    )
    .with_name(p1_name.clone());
    let p2 = build_fighter(
        PlayerSlot::Two,
        &plan.opponent,
        request.player_two,
        config.p2_start_x,
        request,
        config,
        animations,
    )
    .with_name(plan.opponent.character.clone());
    [p1, p2]
}

/// Enter hook of [`GameStates::Setup`].
///
/// Loads both characters, spawns the fighters and queues their sound
/// effects. The first successful setup also starts the background music. Any failure is fatal to the session and moves to `Quitting`.
pub fn setup(
    mut commands: Commands,
    mut next_state: ResMut<NextGameState>,
    storage: Option<Res<Storage>>,
    request: Res<MatchRequest>,
    config: Res<GameConfig>,
    mut animations: ResMut<AnimationStore>,
    mut audio_cmd_writer: MessageWriter<AudioCmd>,
    mut music_started: Local<bool>,
) {
    let Some(storage) = storage else {
        error!("No Storage resource; cannot load characters");
        next_state.set(GameStates::Quitting);
        return;
    };
    let mut rng = match request.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let plan = match prepare_match(&storage, &request, &mut rng) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Match setup failed: {}", e);
            next_state.set(GameStates::Quitting);
            return;
        }
    };

    for contender in [&plan.player, &plan.opponent] {
        if let Some(path) = &contender.definition.sound_path {
            audio_cmd_writer.write(AudioCmd::LoadFx {
                id: contender.character.clone(),
                path: path.clone(),
            });
        }
    }
    audio_cmd_writer.write(AudioCmd::VolumeFx {
        vol: config.fx_volume.min(100) as f32 / 100.0,
    });
    if !*music_started {
        *music_started = queue_music(&config, &mut audio_cmd_writer);
    }

    let fighters = build_fighters(&plan, &request, &config, &mut animations);
    info!(
        "Match: {} ({}) vs {} ({}){}",
        fighters[0].display_name(),
        plan.player.character,
        fighters[1].display_name(),
        plan.opponent.character,
        if request.ranked { " [ranked]" } else { "" }
    );
    for fighter in fighters {
        commands.spawn(fighter);
    }

    next_state.set(GameStates::Playing);
}

/// Start the looping background track. Returns `false` when music is off.
fn queue_music(config: &GameConfig, audio_cmd_writer: &mut MessageWriter<AudioCmd>) -> bool {
    let Some(path) = &config.music_path else {
        return false;
    };
    audio_cmd_writer.write(AudioCmd::LoadMusic {
        id: MUSIC_ID.to_string(),
        path: path.clone(),
    });
    audio_cmd_writer.write(AudioCmd::VolumeMusic {
        id: MUSIC_ID.to_string(),
        vol: config.music_volume.min(100) as f32 / 100.0,
    });
    audio_cmd_writer.write(AudioCmd::PlayMusic {
        id: MUSIC_ID.to_string(),
        looped: true,
    });
    true
}

/// Enter hook of [`GameStates::Playing`]: a new session with a zero score.
pub fn enter_play(mut commands: Commands, config: Res<GameConfig>, request: Res<MatchRequest>) {
    commands.insert_resource(MatchState::new(
        config.intro_seconds,
        config.round_cooldown_ms as f32 / 1000.0,
        request.ranked,
    ));
}

/// Enter hook of [`GameStates::Menu`]: the session is over.
pub fn enter_menu(
    mut commands: Commands,
    fighters: Query<Entity, With<Fighter>>,
    mut state: ResMut<MatchState>,
) {
    for entity in fighters.iter() {
        commands.entity(entity).despawn();
    }
    let summary = state.summary();
    info!(
        "Session over after {} round(s), score {} - {}",
        summary.rounds, summary.score[0], summary.score[1]
    );
    commands.insert_resource(summary);
    state.reset_session();
}

/// Enter hook of [`GameStates::Quitting`].
pub fn quit_game(mut audio_cmd_writer: MessageWriter<AudioCmd>) {
    info!("Quitting");
    audio_cmd_writer.write(AudioCmd::StopMusic {
        id: MUSIC_ID.to_string(),
    });
    audio_cmd_writer.write(AudioCmd::UnloadAllFx);
}

fn register_hooks(world: &mut World) -> StateHooks {
    let mut hooks = StateHooks::new();
    hooks.on_enter(GameStates::Setup, world.register_system(setup));
    hooks.on_enter(GameStates::Playing, world.register_system(enter_play));
    hooks.on_enter(GameStates::Menu, world.register_system(enter_menu));
    hooks.on_enter(GameStates::Quitting, world.register_system(quit_game));
    hooks
}

/// A world ready to play `request` once [`start`] is called.
pub fn build_world(config: GameConfig, storage: Storage, request: MatchRequest) -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(1.0));
    world.insert_resource(InputState::default());
    world.insert_resource(ArenaSize {
        width: config.arena_width,
        height: config.arena_height,
    });
    world.insert_resource(MatchState::new(
        config.intro_seconds,
        config.round_cooldown_ms as f32 / 1000.0,
        request.ranked,
    ));
    world.insert_resource(config);
    world.insert_resource(storage);
    world.insert_resource(request);
    world.insert_resource(AnimationStore::new());
    world.insert_resource(GameState::new());
    world.insert_resource(NextGameState::new());
    world.insert_resource(Messages::<AudioCmd>::default());

    world.spawn(Observer::new(observe_gamestate_change_event));
    world.spawn(Observer::new(observe_round_ended));

    let hooks = register_hooks(&mut world);
    world.insert_resource(hooks);
    world.flush();
    world
}

/// Request the `Setup` state and apply it immediately.
pub fn start(world: &mut World) {
    world.resource_mut::<NextGameState>().set(GameStates::Setup);
    world.trigger(GameStateChangedEvent {});
    world.flush();
}

/// The per-tick schedule.
///
/// While playing: intro countdown, fighter tick and KO detection run in that
/// order, followed by the round-over menu and stat persistence. Input edges
/// are cleared last.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(check_pending_state);
    update.add_systems(
        (
            round_intro_system,
            fighter_tick_system,
            round_outcome_system,
            (round_over_menu_system, autopilot_decision_system),
            apply_round_decision,
            persist_fighter_stats,
        )
            .chain()
            .run_if(state_is_playing)
            .after(check_pending_state),
    );
    update.add_systems(
        main_menu_system
            .run_if(state_is_menu)
            .after(check_pending_state),
    );
    update.add_systems(
        (update_bevy_audio_cmds, clear_input_edges)
            .after(persist_fighter_stats)
            .after(main_menu_system),
    );
    update
}

pub fn is_quitting(world: &World) -> bool {
    world.resource::<GameState>().is(GameStates::Quitting)
}

/// Tick `world` at the configured fixed step until the game quits or
/// `max_ticks` ticks ran. Returns the number of ticks run.
pub fn run_headless(world: &mut World, schedule: &mut Schedule, max_ticks: u64) -> u64 {
    let dt = world.resource::<GameConfig>().tick_seconds();
    let mut ticks = 0;
    while ticks < max_ticks && !is_quitting(world) {
        update_world_time(world, dt);
        schedule.run(world);
        world.clear_trackers();
        ticks += 1;
    }
    if !is_quitting(world) {
        warn!("Headless run stopped after {} ticks without finishing", ticks);
    }
    ticks
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy_ecs::system::SystemState;

    use super::*;
    use crate::resources::characters::tests::sample_definition;
    use crate::storage::MemoryRepository;
    use crate::storage::repo::{CharacterRepository, UserRepository};

    fn storage(names: &[&str]) -> (Arc<MemoryRepository>, Storage) {
        let mut repo = MemoryRepository::new();
        for name in names {
            repo = repo.with_character(name, sample_definition());
        }
        let repo = Arc::new(repo);
        (repo.clone(), Storage::from_store(repo))
    }

    #[test]
    fn opponent_differs_when_possible() {
        let characters = vec!["warrior".to_string(), "wizard".to_string()];
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..20 {
            assert_eq!(pick_opponent(&characters, "warrior", &mut rng), "wizard");
        }
        let alone = vec!["warrior".to_string()];
        assert_eq!(pick_opponent(&alone, "warrior", &mut rng), "warrior");
    }

    #[test]
    fn player_character_falls_back_to_user_then_first() {
        let (repo, storage) = storage(&["archer", "warrior", "wizard"]);
        let mut rng = fastrand::Rng::with_seed(1);

        let plan = prepare_match(&storage, &MatchRequest::default(), &mut rng).unwrap();
        assert_eq!(plan.player.character, "archer");
        assert_ne!(plan.opponent.character, "archer");

        repo.update_user("alice", &mut |u| {
            u.character_class = Some("wizard".to_string())
        })
        .unwrap();
        let request = MatchRequest {
            user: Some("alice".to_string()),
            ..MatchRequest::default()
        };
        let plan = prepare_match(&storage, &request, &mut rng).unwrap();
        assert_eq!(plan.player.character, "wizard");

        let request = MatchRequest {
            user: Some("alice".to_string()),
            character: Some("warrior".to_string()),
            opponent: Some("warrior".to_string()),
            ..MatchRequest::default()
        };
        let plan = prepare_match(&storage, &request, &mut rng).unwrap();
        assert_eq!(plan.player.character, "warrior");
        assert_eq!(plan.opponent.character, "warrior");
    }

    #[test]
    fn empty_roster_is_an_error() {
        let (_, storage) = storage(&[]);
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(matches!(
            prepare_match(&storage, &MatchRequest::default(), &mut rng),
            Err(GameError::NoCharacters)
        ));
    }

    #[test]
    fn unknown_or_invalid_character_is_an_error() {
        let (repo, storage) = storage(&["warrior"]);
        let mut rng = fastrand::Rng::with_seed(1);
        let request = MatchRequest {
            opponent: Some("ghost".to_string()),
            ..MatchRequest::default()
        };
        assert!(matches!(
            prepare_match(&storage, &request, &mut rng),
            Err(GameError::Store(StoreError::NotFound { .. }))
        ));

        let mut broken = sample_definition();
        broken.animation_steps.clear();
        repo.put("broken", &broken).unwrap();
        let request = MatchRequest {
            character: Some("broken".to_string()),
            ..MatchRequest::default()
        };
        assert!(matches!(
            prepare_match(&storage, &request, &mut rng),
            Err(GameError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn fighters_follow_pilots_and_user() {
        let (_, storage) = storage(&["warrior", "wizard"]);
        let mut rng = fastrand::Rng::with_seed(1);
        let request = MatchRequest {
            user: Some("alice".to_string()),
            player_two: Pilot::Cpu,
            seed: Some(5),
            ..MatchRequest::default()
        };
        let plan = prepare_match(&storage, &request, &mut rng).unwrap();
        let config = GameConfig::new();
        let mut animations = AnimationStore::new();
        let [p1, p2] = build_fighters(&plan, &request, &config, &mut animations);

        assert_eq!(p1.slot, PlayerSlot::One);
        assert_eq!(p1.name.as_deref(), Some("alice"));
        assert!(!p1.controller.is_ai());
        assert_eq!(p1.rect().x, config.p1_start_x);
        assert_eq!(p2.slot, PlayerSlot::Two);
        assert_eq!(p2.name.as_deref(), Some(plan.opponent.character.as_str()));
        let (key, _) = p2.dirty_snapshot().unwrap();
        assert_eq!(key, plan.opponent.character);
        assert!(p2.controller.is_ai());
        assert_eq!(p2.rect().x, config.p2_start_x);
        assert!(animations.get("warrior").is_some());
    }

    fn queued_music(
        reader: &mut SystemState<MessageReader<AudioCmd>>,
        world: &mut World,
    ) -> Vec<AudioCmd> {
        reader
            .get_mut(world)
            .read()
            .filter(|cmd| {
                matches!(
                    cmd,
                    AudioCmd::LoadMusic { .. }
                        | AudioCmd::VolumeMusic { .. }
                        | AudioCmd::PlayMusic { .. }
                )
            })
            .cloned()
            .collect()
    }

    #[test]
    fn music_starts_once_per_run() {
        let (_, storage) = storage(&["warrior", "wizard"]);
        let mut config = GameConfig::new();
        config.music_volume = 30;
        let mut world = build_world(config, storage, MatchRequest::default());
        let mut reader: SystemState<MessageReader<AudioCmd>> = SystemState::new(&mut world);
        start(&mut world);

        assert_eq!(
            queued_music(&mut reader, &mut world),
            vec![
                AudioCmd::LoadMusic {
                    id: MUSIC_ID.to_string(),
                    path: "assets/audio/music.mp3".to_string(),
                },
                AudioCmd::VolumeMusic {
                    id: MUSIC_ID.to_string(),
                    vol: 0.3,
                },
                AudioCmd::PlayMusic {
                    id: MUSIC_ID.to_string(),
                    looped: true,
                },
            ]
        );

        // a second match keeps the track running
        let hook = world
            .resource::<StateHooks>()
            .enter_hook(&GameStates::Setup)
            .unwrap();
        world.run_system(hook).unwrap();
        assert!(queued_music(&mut reader, &mut world).is_empty());
    }

    #[test]
    fn music_off_queues_nothing() {
        let (_, storage) = storage(&["warrior", "wizard"]);
        let mut config = GameConfig::new();
        config.music_path = None;
        let mut world = build_world(config, storage, MatchRequest::default());
        let mut reader: SystemState<MessageReader<AudioCmd>> = SystemState::new(&mut world);
        start(&mut world);
        assert!(queued_music(&mut reader, &mut world).is_empty());
    }

    #[test]
    fn setup_failure_quits() {
        let (_, storage) = storage(&[]);
        let mut world = build_world(GameConfig::new(), storage, MatchRequest::default());
        start(&mut world);
        let mut schedule = build_schedule();
        schedule.run(&mut world);
        assert!(is_quitting(&world));
    }

    #[test]
    fn setup_spawns_two_fighters_and_starts_playing() {
        let (_, storage) = storage(&["warrior", "wizard"]);
        let mut world = build_world(GameConfig::new(), storage, MatchRequest::default());
        start(&mut world);

        let mut fighters = world.query::<&Fighter>();
        assert_eq!(fighters.iter(&world).count(), 2);

        let mut schedule = build_schedule();
        schedule.run(&mut world);
        assert_eq!(world.resource::<GameState>().get(), &GameStates::Playing);
        assert_eq!(world.resource::<MatchState>().countdown(), Some(3));
    }
}
