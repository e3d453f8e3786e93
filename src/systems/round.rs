//! Round controller systems.
//!
//! Run in this order while playing:
//! 1. [`round_intro_system`] – countdown, one step per elapsed second
//! 2. fighter tick
//! 3. [`round_outcome_system`] – KO detection, score, [`RoundEndedEvent`]
//! 4. [`round_over_menu_system`] / [`autopilot_decision_system`] – pick
//!    Retry or Exit once the cooldown elapsed
//! 5. [`apply_round_decision`] – restart the round or leave to the menu
//!
//! A simultaneous KO is a draw: nobody scores and the event carries no
//! winner.

use bevy_ecs::prelude::*;
use log::info;

use crate::components::fighter::{Fighter, PlayerSlot};
use crate::events::round::{RoundEndedEvent, RoundResult};
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::input::{InputState, Key};
use crate::resources::matchstate::{AutoPilot, MatchRequest, MatchState, RoundOption};
use crate::resources::worldtime::WorldTime;

pub fn round_intro_system(mut state: ResMut<MatchState>, time: Res<WorldTime>) {
    let before = state.countdown();
    if state.tick_intro(time.delta) {
        info!("Round {}: fight!", state.round);
    } else if let Some(remaining) = state.countdown().filter(|r| Some(*r) != before) {
        info!("Round {} starts in {}", state.round, remaining);
    }
}

/// Detect the end of a live round and fire its result exactly once.
pub fn round_outcome_system(
    mut commands: Commands,
    mut state: ResMut<MatchState>,
    fighters: Query<&Fighter>,
    time: Res<WorldTime>,
    request: Option<Res<MatchRequest>>,
) {
    if !state.is_live() {
        return;
    }
    let mut p1 = None;
    let mut p2 = None;
    for fighter in fighters.iter() {
        match fighter.slot {
            PlayerSlot::One => p1 = Some(fighter),
            PlayerSlot::Two => p2 = Some(fighter),
        }
    }
    let (Some(p1), Some(p2)) = (p1, p2) else {
        return;
    };

    let winner = match (p1.is_alive(), p2.is_alive()) {
        (true, true) => return,
        (true, false) => Some(PlayerSlot::One),
        (false, true) => Some(PlayerSlot::Two),
        (false, false) => None,
    };
    let perfect = match winner {
        Some(PlayerSlot::One) => p2.health() == 0 && p1.health() == p1.base_health(),
        Some(PlayerSlot::Two) => p1.health() == 0 && p2.health() == p2.base_health(),
        None => false,
    };

    state.finish_round(winner, time.elapsed);
    let result = RoundResult {
        round: state.round,
        winner,
        p1_name: p1.display_name().to_string(),
        p2_name: p2.display_name().to_string(),
        p1_character: p1.character.clone(),
        p2_character: p2.character.clone(),
        // progression follows the account, never the fallback name
        p1_user: request.and_then(|r| r.user.clone()),
        perfect,
        ranked: state.ranked,
        p1_attacks: p1.attacks_done(),
    };
    info!(
        "Round {} over, score {} - {}",
        state.round, state.score[0], state.score[1]
    );
    state.last_result = Some(result.clone());
    commands.trigger(RoundEndedEvent { result });
}

const MENU_TOGGLE_KEYS: [Key; 4] = [Key::W, Key::S, Key::Up, Key::Down];

/// Keyboard navigation of the round-over menu.
pub fn round_over_menu_system(
    mut state: ResMut<MatchState>,
    input: Res<InputState>,
    time: Res<WorldTime>,
) {
    if !state.menu_ready(time.elapsed) || state.decision.is_some() {
        return;
    }
    if MENU_TOGGLE_KEYS.iter().any(|key| input.just_pressed(*key)) {
        state.selected = state.selected.toggled();
    }
    if input.just_pressed(Key::Enter) || input.just_pressed(Key::Space) {
        state.decision = Some(state.selected);
    }
}

/// Unattended sessions: retry until the configured number of rounds was
/// played, then exit.
pub fn autopilot_decision_system(
    mut state: ResMut<MatchState>,
    autopilot: Option<Res<AutoPilot>>,
    time: Res<WorldTime>,
) {
    let Some(autopilot) = autopilot else {
        return;
    };
    if !state.menu_ready(time.elapsed) || state.decision.is_some() {
        return;
    }
    state.decision = Some(if state.round < autopilot.rounds {
        RoundOption::Retry
    } else {
        RoundOption::Exit
    });
}

/// Apply the confirmed round-over choice. Ranked matches are a single
/// round, so Retry leaves to the menu as well.
pub fn apply_round_decision(
    mut state: ResMut<MatchState>,
    mut next_state: ResMut<NextGameState>,
    mut fighters: Query<&mut Fighter>,
    config: Res<GameConfig>,
) {
    let Some(choice) = state.decision.take() else {
        return;
    };
    match choice {
        RoundOption::Retry if !state.ranked => {
            for mut fighter in fighters.iter_mut() {
                let x = match fighter.slot {
                    PlayerSlot::One => config.p1_start_x,
                    PlayerSlot::Two => config.p2_start_x,
                };
                fighter.reset_for_round(x, config.start_y);
            }
            state.restart_round();
            info!("Rematch: round {}", state.round);
        }
        RoundOption::Retry => {
            info!("Ranked match finished, back to menu");
            next_state.set(GameStates::Menu);
        }
        RoundOption::Exit => {
            info!(
                "Leaving match after {} round(s), final score {} - {}",
                state.round, state.score[0], state.score[1]
            );
            next_state.set(GameStates::Menu);
        }
    }
}
