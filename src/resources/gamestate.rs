//! Top-level game state and the pending transition.
//!
//! Systems never write [`GameState`] directly. They call
//! [`NextGameState::set`]; `check_pending_state` then fires the change event
//! and the observer in [`crate::events::gamestate`] moves the value over and
//! runs the enter hook.

use bevy_ecs::prelude::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameStates {
    /// Before [`start`](crate::game::start).
    #[default]
    None,
    /// Loading characters and spawning the two fighters.
    Setup,
    /// A match session is running.
    Playing,
    /// The session ended; waiting for a new match or quit.
    Menu,
    Quitting,
}

#[derive(Resource, Debug, Clone, PartialEq, Eq, Default)]
pub struct GameState {
    current: GameStates,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> &GameStates {
        &self.current
    }

    pub fn is(&self, state: GameStates) -> bool {
        self.current == state
    }

    /// Only the transition observer should call this.
    pub fn set(&mut self, state: GameStates) {
        self.current = state;
    }
}

/// Requested state, applied at the start of the next tick. A later request
/// in the same tick replaces an earlier one.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Default)]
pub struct NextGameState {
    pending: Option<GameStates>,
}

impl NextGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, next: GameStates) {
        self.pending = Some(next);
    }

    pub fn pending(&self) -> Option<&GameStates> {
        self.pending.as_ref()
    }

    /// Remove and return the request.
    pub fn take(&mut self) -> Option<GameStates> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_request_wins_and_take_clears() {
        let mut next = NextGameState::new();
        assert_eq!(next.pending(), None);
        next.set(GameStates::Menu);
        next.set(GameStates::Quitting);
        assert_eq!(next.pending(), Some(&GameStates::Quitting));
        assert_eq!(next.take(), Some(GameStates::Quitting));
        assert_eq!(next.take(), None);
    }
}
