//! Game state transition event and observer.
//!
//! Systems request a change of the high-level [`GameStates`] by updating
//! [`NextGameState`]. Emitting a [`GameStateChangedEvent`] then triggers
//! [`observe_gamestate_change_event`], which applies the transition to
//! [`GameState`] and runs the enter hook registered in [`StateHooks`].
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::statehooks::StateHooks;
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info, warn};

/// Apply the pending [`NextGameState`], if any.
#[derive(Event, Debug, Clone, Copy)]
pub struct GameStateChangedEvent {}

/// Observer that applies a pending game state transition.
///
/// Moves the pending value into [`GameState`] and runs the enter hook of the
/// new state. Missing resources are logged.
pub fn observe_gamestate_change_event(
    _trigger: On<GameStateChangedEvent>,
    mut commands: Commands,
    mut next_game_state: Option<ResMut<NextGameState>>,
    mut game_state: Option<ResMut<GameState>>,
    hooks: Option<Res<StateHooks>>,
) {
    debug!("GameStateChangedEvent triggered");

    let (Some(next_game_state), Some(game_state)) =
        (next_game_state.as_deref_mut(), game_state.as_deref_mut())
    else {
        warn!(
            "One or more resources missing in observe_gamestate_change_event. next_state: {:?}, game_state: {:?}",
            next_game_state.is_some(),
            game_state.is_some()
        );
        return;
    };

    let Some(new_state) = next_game_state.take() else {
        debug!("No state change pending.");
        return;
    };
    info!(
        "Transitioning from {:?} to {:?}",
        game_state.get(),
        new_state
    );
    game_state.set(new_state.clone());

    if new_state == GameStates::None {
        return;
    }
    match hooks.as_deref().and_then(|h| h.enter_hook(&new_state)) {
        Some(id) => commands.run_system(id),
        None => warn!("No enter hook for {:?}", new_state),
    }
}
