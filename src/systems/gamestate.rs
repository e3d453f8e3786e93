//! Game state plumbing systems and run conditions.
use crate::events::gamestate::GameStateChangedEvent;
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use bevy_ecs::prelude::*;

/// Fire [`GameStateChangedEvent`] when a transition is pending.
pub fn check_pending_state(mut commands: Commands, next_state: Res<NextGameState>) {
    if next_state.pending().is_some() {
        commands.trigger(GameStateChangedEvent {});
    }
}

pub fn state_is_playing(state: Res<GameState>) -> bool {
    state.is(GameStates::Playing)
}

pub fn state_is_menu(state: Res<GameState>) -> bool {
    state.is(GameStates::Menu)
}
