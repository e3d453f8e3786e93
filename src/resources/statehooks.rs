//! Enter hooks of the top-level game states.
//!
//! Each hook is a one-shot system registered with `World::register_system`
//! and run through `Commands::run_system` when its state is entered.

use bevy_ecs::prelude::Resource;
use bevy_ecs::system::SystemId;
use rustc_hash::FxHashMap;

use crate::resources::gamestate::GameStates;

#[derive(Resource, Default)]
pub struct StateHooks {
    on_enter: FxHashMap<GameStates, SystemId>,
}

impl StateHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` to run when `state` is entered, replacing any earlier
    /// hook of that state.
    pub fn on_enter(&mut self, state: GameStates, id: SystemId) {
        self.on_enter.insert(state, id);
    }

    pub fn enter_hook(&self, state: &GameStates) -> Option<SystemId> {
        self.on_enter.get(state).copied()
    }
}
