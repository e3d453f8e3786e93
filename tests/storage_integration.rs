//! JSON repository integration tests against a temporary data directory.

use std::fs;
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use duelstage::components::fighter::StatSnapshot;
use duelstage::game::{build_schedule, build_world, is_quitting, run_headless, start};
use duelstage::resources::gameconfig::GameConfig;
use duelstage::resources::matchstate::{AutoPilot, MatchRequest, Pilot, SessionSummary};
use duelstage::resources::storage::Storage;
use duelstage::storage::json_repo::{CHARACTERS_FILE, HISTORY_FILE, USERS_FILE};
use duelstage::storage::repo::{
    BattleRecord, CharacterRepository, HISTORY_LIMIT, HistoryRepository, UserRepository,
    UserStatSink,
};
use duelstage::storage::{JsonRepository, StoreError};

fn characters_json() -> Value {
    let character = |sheet: &str| {
        json!({
            "sprite_sheet_path": sheet,
            "sound_path": "assets/audio/hit.wav",
            "frame_width": 162,
            "frame_height": 162,
            "scale": 4,
            "offset": [72, 56],
            "animation_steps": [10, 8, 1, 7, 7, 3, 7],
            "stats": {"health": 100, "speed": 10, "damage": 10},
            "moves": [
                {"key": "K_r", "damage": 10, "cooldown": 20, "animation_row": 4},
                {"key": "K_t", "damage": 25, "cooldown": 60, "animation_row": 3}
            ]
        })
    };
    json!({
        "wizard": character("assets/images/wizard.png"),
        "warrior": character("assets/images/warrior.png"),
    })
}

fn data_dir() -> (TempDir, JsonRepository) {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CHARACTERS_FILE),
        serde_json::to_string_pretty(&characters_json()).unwrap(),
    )
    .unwrap();
    let repo = JsonRepository::new(dir.path());
    (dir, repo)
}

fn read_json(dir: &TempDir, file: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.path().join(file)).unwrap()).unwrap()
}

fn record(i: usize) -> BattleRecord {
    BattleRecord {
        timestamp: format!("2026-03-01 10:{:02}:00", i),
        p1_char: "warrior".to_string(),
        p2_char: "wizard".to_string(),
        winner: Some(format!("player{}", i)),
    }
}

#[test]
fn missing_files_read_as_empty() {
    let dir = TempDir::new().unwrap();
    let repo = JsonRepository::new(dir.path().join("not-yet-created"));
    assert!(repo.list().unwrap().is_empty());
    assert!(repo.get_user("alice").unwrap().is_none());
    assert!(repo.history().unwrap().is_empty());
    assert!(matches!(
        repo.get("warrior"),
        Err(StoreError::NotFound { kind: "character", .. })
    ));
}

#[test]
fn characters_load_sorted_and_parsed() {
    let (_dir, repo) = data_dir();
    assert_eq!(repo.list().unwrap(), vec!["warrior", "wizard"]);
    let warrior = repo.get("warrior").unwrap();
    assert_eq!(warrior.sprite_sheet_path, "assets/images/warrior.png");
    assert_eq!(warrior.moves.len(), 2);
    assert!(warrior.validate().is_ok());
}

#[test]
fn broken_json_is_an_error() {
    let (dir, repo) = data_dir();
    fs::write(dir.path().join(CHARACTERS_FILE), "{ not json").unwrap();
    assert!(matches!(repo.list(), Err(StoreError::Json(_))));
}

#[test]
fn stat_persist_creates_user_on_first_write() {
    let (dir, repo) = data_dir();
    let snapshot = StatSnapshot {
        health: 60,
        attacks_done: 4,
        alive: true,
    };
    repo.persist("bob", snapshot).unwrap();

    let bob = repo.get_user("bob").unwrap().unwrap();
    assert_eq!(bob.name, "bob");
    assert_eq!(bob.stats, Some(snapshot));

    let users = read_json(&dir, USERS_FILE);
    assert_eq!(users["bob"]["stats"]["health"], 60);
    assert_eq!(users["bob"]["stats"]["attacks_done"], 4);
}

#[test]
fn unknown_user_fields_survive_updates() {
    let (dir, repo) = data_dir();
    fs::write(
        dir.path().join(USERS_FILE),
        json!({
            "alice": {
                "password": "hunter2",
                "email": "alice@example.org",
                "character_class": "wizard",
                "currency": 5
            }
        })
        .to_string(),
    )
    .unwrap();

    let alice = repo
        .update_user("alice", &mut |u| u.currency += 10)
        .unwrap();
    assert_eq!(alice.currency, 15);
    assert_eq!(alice.character_class.as_deref(), Some("wizard"));

    let users = read_json(&dir, USERS_FILE);
    assert_eq!(users["alice"]["password"], "hunter2");
    assert_eq!(users["alice"]["email"], "alice@example.org");
    assert_eq!(users["alice"]["currency"], 15);
}

#[test]
fn writes_leave_no_temporary_files() {
    let (dir, repo) = data_dir();
    repo.persist(
        "carol",
        StatSnapshot {
            health: 100,
            attacks_done: 0,
            alive: true,
        },
    )
    .unwrap();
    repo.push(record(0)).unwrap();

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec![HISTORY_FILE, CHARACTERS_FILE, USERS_FILE]);
}

#[test]
fn history_is_newest_first_and_capped() {
    let (dir, repo) = data_dir();
    for i in 0..HISTORY_LIMIT + 5 {
        repo.push(record(i)).unwrap();
    }

    let history = repo.history().unwrap();
    assert_eq!(history.len(), HISTORY_LIMIT);
    assert_eq!(history[0], record(HISTORY_LIMIT + 4));
    assert_eq!(history[HISTORY_LIMIT - 1], record(5));

    let on_disk = read_json(&dir, HISTORY_FILE);
    assert_eq!(on_disk.as_array().unwrap().len(), HISTORY_LIMIT);
}

#[test]
fn headless_session_writes_history_and_user_progress() {
    let (dir, repo) = data_dir();
    let storage = Storage::from_store(Arc::new(repo));
    let config = GameConfig::new();
    let max_ticks = 300 * config.target_fps as u64;
    let mut world = build_world(
        config,
        storage,
        MatchRequest {
            user: Some("dave".to_string()),
            character: Some("warrior".to_string()),
            player_one: Pilot::Cpu,
            player_two: Pilot::Cpu,
            seed: Some(21),
            ..MatchRequest::default()
        },
    );
    world.insert_resource(AutoPilot { rounds: 1 });
    start(&mut world);
    let mut schedule = build_schedule();
    run_headless(&mut world, &mut schedule, max_ticks);

    assert!(is_quitting(&world));
    assert_eq!(world.resource::<SessionSummary>().rounds, 1);

    let history = read_json(&dir, HISTORY_FILE);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["p1_char"], "warrior");
    assert_eq!(history[0]["p2_char"], "wizard");

    let users = read_json(&dir, USERS_FILE);
    assert_eq!(users["dave"]["profile_stats"]["matches_played"], 1);
    assert!(users["dave"]["stats"]["health"].is_u64());
    // the CPU opponent keeps its stats under its character name
    assert!(users["wizard"]["stats"]["health"].is_u64());
    assert!(users["wizard"]["stats"]["alive"].is_boolean());
}
