//! Round lifecycle integration tests: setup, countdown, KO, round-over menu
//! and session end, run through the full tick schedule.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;

use duelstage::components::fighter::{Fighter, PlayerSlot};
use duelstage::events::round::{RoundResult, RoundResultSink};
use duelstage::game::{build_schedule, build_world, is_quitting, run_headless, start};
use duelstage::resources::characters::{
    BaseStats, CharacterDefinition, MoveDefinition, MoveEntry, rows,
};
use duelstage::resources::gameconfig::GameConfig;
use duelstage::resources::gamestate::{GameState, GameStates};
use duelstage::resources::input::{InputState, Key};
use duelstage::resources::matchstate::{
    AutoPilot, MatchRequest, MatchState, Pilot, RoundOption, SessionSummary,
};
use duelstage::resources::storage::Storage;
use duelstage::storage::repo::{HistoryRepository, UserRepository};
use duelstage::storage::{MemoryRepository, StoreError};
use duelstage::systems::time::update_world_time;

fn definition() -> CharacterDefinition {
    CharacterDefinition {
        sprite_sheet_path: "assets/images/knight.png".to_string(),
        sound_path: Some("assets/audio/slash.wav".to_string()),
        frame_width: 162.0,
        frame_height: 162.0,
        scale: 4.0,
        offset: [72.0, 56.0],
        animation_steps: vec![10, 8, 1, 7, 7, 3, 7],
        stats: BaseStats::default(),
        moves: vec![
            MoveEntry {
                key: Key::R,
                definition: MoveDefinition {
                    damage: 10,
                    cooldown: 20,
                    animation_row: rows::ATTACK,
                },
            },
            MoveEntry {
                key: Key::T,
                definition: MoveDefinition {
                    damage: 25,
                    cooldown: 60,
                    animation_row: rows::FALL,
                },
            },
        ],
    }
}

fn repository() -> Arc<MemoryRepository> {
    Arc::new(
        MemoryRepository::new()
            .with_character("knight", definition())
            .with_character("samurai", definition()),
    )
}

/// Result sink that only remembers what it was given.
#[derive(Default)]
struct CollectingSink {
    results: Mutex<Vec<RoundResult>>,
}

impl CollectingSink {
    fn results(&self) -> Vec<RoundResult> {
        self.results.lock().unwrap().clone()
    }
}

impl RoundResultSink for CollectingSink {
    fn record(&self, result: &RoundResult) -> Result<(), StoreError> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

struct Harness {
    world: World,
    schedule: Schedule,
    sink: Arc<CollectingSink>,
}

impl Harness {
    fn new(request: MatchRequest) -> Self {
        let sink = Arc::new(CollectingSink::default());
        let storage = Storage::with_results(repository(), sink.clone());
        Self::with_storage(storage, request, sink)
    }

    fn with_storage(storage: Storage, request: MatchRequest, sink: Arc<CollectingSink>) -> Self {
        let mut world = build_world(GameConfig::new(), storage, request);
        start(&mut world);
        Self {
            world,
            schedule: build_schedule(),
            sink,
        }
    }

    fn tick(&mut self) {
        let dt = self.world.resource::<GameConfig>().tick_seconds();
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn tick_until_live(&mut self) -> usize {
        let mut n = 0;
        while !self.state().is_live() {
            self.tick();
            n += 1;
            assert!(n < 1000, "round never went live");
        }
        n
    }

    fn state(&self) -> &MatchState {
        self.world.resource::<MatchState>()
    }

    fn game_state(&self) -> GameStates {
        self.world.resource::<GameState>().get().clone()
    }

    fn fighter(&mut self, slot: PlayerSlot) -> Mut<'_, Fighter> {
        let mut query = self.world.query::<(Entity, &Fighter)>();
        let entity = query
            .iter(&self.world)
            .find(|(_, f)| f.slot == slot)
            .map(|(e, _)| e)
            .unwrap();
        self.world.get_mut::<Fighter>(entity).unwrap()
    }

    fn fighter_count(&mut self) -> usize {
        let mut query = self.world.query::<&Fighter>();
        query.iter(&self.world).count()
    }

    fn knock_out(&mut self, slot: PlayerSlot) {
        self.fighter(slot).apply_damage(1000);
    }

    /// Tap `key` for exactly one tick.
    fn tap(&mut self, keys: &[Key]) {
        for key in keys {
            self.world.resource_mut::<InputState>().press(*key);
        }
        self.tick();
        for key in keys {
            self.world.resource_mut::<InputState>().release(*key);
        }
    }

    fn wait_out_cooldown(&mut self) {
        // default cooldown is two seconds at 60 ticks per second
        self.ticks(130);
    }
}

#[test]
fn countdown_goes_live_once_and_freezes_fighters() {
    let mut h = Harness::new(MatchRequest {
        player_two: Pilot::Cpu,
        seed: Some(3),
        ..MatchRequest::default()
    });
    assert_eq!(h.state().countdown(), Some(3));

    h.ticks(170);
    assert!(!h.state().is_live());
    assert_eq!(h.fighter(PlayerSlot::Two).rect().x, 700.0);

    let more = h.tick_until_live();
    assert!(more <= 15, "went live {} ticks late", more);
    assert_eq!(h.state().round, 1);

    // the CPU starts walking only once the round is live
    h.ticks(5);
    assert!(h.fighter(PlayerSlot::Two).rect().x < 700.0);
    assert!(h.state().is_live());
}

#[test]
fn knockout_scores_once_and_reports_once() {
    let mut h = Harness::new(MatchRequest {
        user: Some("alice".to_string()),
        ..MatchRequest::default()
    });
    h.tick_until_live();

    h.knock_out(PlayerSlot::Two);
    h.ticks(30);

    assert!(h.state().is_round_over());
    assert_eq!(h.state().score, [1, 0]);
    let results = h.sink.results();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.winner, Some(PlayerSlot::One));
    assert_eq!(result.winner_name(), Some("alice"));
    assert_eq!(result.p1_user.as_deref(), Some("alice"));
    assert!(result.perfect);
    assert_eq!(h.state().last_result.as_ref(), Some(result));
}

#[test]
fn anonymous_player_reports_no_account() {
    let mut h = Harness::new(MatchRequest::default());
    h.tick_until_live();
    h.knock_out(PlayerSlot::Two);
    h.ticks(30);

    let results = h.sink.results();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.p1_user, None);
    assert_eq!(result.p1_name, result.p1_character);
    assert_eq!(result.p2_name, result.p2_character);
}

#[test]
fn simultaneous_knockout_is_a_draw() {
    let mut h = Harness::new(MatchRequest::default());
    h.tick_until_live();

    h.knock_out(PlayerSlot::One);
    h.knock_out(PlayerSlot::Two);
    h.tick();

    assert!(h.state().is_round_over());
    assert_eq!(h.state().score, [0, 0]);
    let results = h.sink.results();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_draw());
    assert!(!results[0].perfect);
}

#[test]
fn menu_is_locked_until_cooldown_then_retry_restarts() {
    let mut h = Harness::new(MatchRequest::default());
    h.tick_until_live();
    h.knock_out(PlayerSlot::Two);
    h.tick();

    h.tap(&[Key::Enter]);
    assert!(h.state().is_round_over());
    assert_eq!(h.state().decision, None);

    h.wait_out_cooldown();
    h.tap(&[Key::Enter]);

    assert_eq!(h.state().countdown(), Some(3));
    assert_eq!(h.state().round, 2);
    assert_eq!(h.state().score, [1, 0]);
    let p2 = h.fighter(PlayerSlot::Two);
    assert_eq!(p2.health(), p2.base_health());
    assert!(p2.is_alive());
    assert_eq!(p2.rect().x, 700.0);
    assert_eq!(h.fighter(PlayerSlot::One).rect().x, 200.0);
    assert_eq!(h.game_state(), GameStates::Playing);
}

#[test]
fn exit_closes_the_session_and_enter_starts_another() {
    let mut h = Harness::new(MatchRequest::default());
    h.tick_until_live();
    h.knock_out(PlayerSlot::One);
    h.tick();
    h.wait_out_cooldown();

    h.tap(&[Key::S]);
    assert_eq!(h.state().selected, RoundOption::Exit);
    h.tap(&[Key::Enter]);
    h.tick();

    assert_eq!(h.game_state(), GameStates::Menu);
    assert_eq!(h.fighter_count(), 0);
    assert_eq!(
        *h.world.resource::<SessionSummary>(),
        SessionSummary {
            rounds: 1,
            score: [0, 1]
        }
    );

    h.tap(&[Key::Enter]);
    h.tick();
    assert_eq!(h.game_state(), GameStates::Setup);
    assert_eq!(h.fighter_count(), 2);
    h.tick();
    assert_eq!(h.game_state(), GameStates::Playing);
    assert_eq!(h.state().score, [0, 0]);
    assert_eq!(h.state().countdown(), Some(3));
}

#[test]
fn escape_in_menu_quits() {
    let mut h = Harness::new(MatchRequest::default());
    h.tick_until_live();
    h.knock_out(PlayerSlot::Two);
    h.tick();
    h.wait_out_cooldown();
    h.tap(&[Key::Down, Key::Enter]);
    h.tick();
    assert_eq!(h.game_state(), GameStates::Menu);

    h.tap(&[Key::Escape]);
    h.tick();
    assert!(is_quitting(&h.world));
}

#[test]
fn ranked_retry_ends_the_match() {
    let mut h = Harness::new(MatchRequest {
        ranked: true,
        ..MatchRequest::default()
    });
    h.tick_until_live();
    h.knock_out(PlayerSlot::Two);
    h.tick();
    assert!(h.sink.results()[0].ranked);

    h.wait_out_cooldown();
    assert_eq!(h.state().selected, RoundOption::Retry);
    h.tap(&[Key::Enter]);
    h.tick();

    assert_eq!(h.game_state(), GameStates::Menu);
    assert_eq!(h.world.resource::<SessionSummary>().score, [1, 0]);
}

#[test]
fn storage_failure_does_not_stop_the_round() {
    let repo = repository();
    let sink = Arc::new(CollectingSink::default());
    let storage = Storage::from_store(repo.clone());
    repo.set_read_only(true);
    let mut h = Harness::with_storage(
        storage,
        MatchRequest {
            user: Some("alice".to_string()),
            ..MatchRequest::default()
        },
        sink,
    );

    h.tick_until_live();
    h.knock_out(PlayerSlot::Two);
    h.ticks(10);
    assert!(h.state().is_round_over());
    assert_eq!(h.state().score, [1, 0]);
    assert!(repo.get_user("alice").unwrap().is_none());
    assert!(repo.history().unwrap().is_empty());

    // the stat snapshot is still dirty and goes out once writes work again
    repo.set_read_only(false);
    h.tick();
    let stats = repo.get_user("alice").unwrap().unwrap().stats.unwrap();
    assert_eq!(stats.health, 100);
    assert!(stats.alive);
}

#[test]
fn unattended_session_plays_all_rounds_and_quits() {
    let repo = repository();
    let storage = Storage::from_store(repo.clone());
    let config = GameConfig::new();
    let max_ticks = 2 * 300 * config.target_fps as u64;
    let mut world = build_world(
        config,
        storage,
        MatchRequest {
            player_one: Pilot::Cpu,
            player_two: Pilot::Cpu,
            seed: Some(11),
            ..MatchRequest::default()
        },
    );
    world.insert_resource(AutoPilot { rounds: 2 });
    start(&mut world);
    let mut schedule = build_schedule();

    let ticks = run_headless(&mut world, &mut schedule, max_ticks);

    assert!(ticks < max_ticks);
    assert!(is_quitting(&world));
    let summary = *world.resource::<SessionSummary>();
    assert_eq!(summary.rounds, 2);
    assert!(summary.score[0] + summary.score[1] <= 2);
    assert_eq!(repo.history().unwrap().len(), 2);
}
