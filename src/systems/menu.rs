//! Between-sessions menu.
//!
//! Reached after a match session ends. Enter starts another match with the
//! same [`MatchRequest`](crate::resources::matchstate::MatchRequest), Escape
//! quits. Unattended sessions quit right away.

use bevy_ecs::prelude::*;
use log::info;

use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::input::{InputState, Key};
use crate::resources::matchstate::AutoPilot;

pub fn main_menu_system(
    input: Res<InputState>,
    autopilot: Option<Res<AutoPilot>>,
    mut next_state: ResMut<NextGameState>,
) {
    if next_state.pending().is_some() {
        return;
    }
    if autopilot.is_some() || input.just_pressed(Key::Escape) {
        next_state.set(GameStates::Quitting);
    } else if input.just_pressed(Key::Enter) {
        info!("New match requested from the menu");
        next_state.set(GameStates::Setup);
    }
}
