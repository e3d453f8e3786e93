//! Fighter action state machine.
//!
//! The visible action of a fighter is picked every tick from its combat
//! flags. The priority order lives in [`ACTION_PRIORITY`], a table of
//! (state, predicate) rules evaluated top-down; the first rule whose
//! predicate holds wins and [`ActionState::Idle`] is the fallback.

use serde::{Deserialize, Serialize};

use crate::resources::characters::rows;

/// Discrete visual states, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionState {
    Dying,
    TakingHit,
    Attacking,
    Jumping,
    Running,
    Idle,
}

impl ActionState {
    /// Animation row shown for this state. `attack_row` is the row of the
    /// move currently being performed.
    pub fn row(self, attack_row: usize) -> usize {
        match self {
            ActionState::Dying => rows::DEATH,
            ActionState::TakingHit => rows::TAKE_HIT,
            ActionState::Attacking => attack_row,
            ActionState::Jumping => rows::JUMP,
            ActionState::Running => rows::RUN,
            ActionState::Idle => rows::IDLE,
        }
    }

    /// Whether completing one loop of this state's clip ends it.
    pub fn is_one_shot(self) -> bool {
        matches!(self, ActionState::Attacking | ActionState::TakingHit)
    }
}

/// Inputs of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionFlags {
    pub dead: bool,
    pub hit: bool,
    pub attacking: bool,
    pub airborne: bool,
    pub running: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionRule {
    pub state: ActionState,
    pub when: fn(&ActionFlags) -> bool,
}

pub const ACTION_PRIORITY: [ActionRule; 5] = [
    ActionRule {
        state: ActionState::Dying,
        when: |f| f.dead,
    },
    ActionRule {
        state: ActionState::TakingHit,
        when: |f| f.hit,
    },
    ActionRule {
        state: ActionState::Attacking,
        when: |f| f.attacking,
    },
    ActionRule {
        state: ActionState::Jumping,
        when: |f| f.airborne,
    },
    ActionRule {
        state: ActionState::Running,
        when: |f| f.running,
    },
];

/// Evaluate [`ACTION_PRIORITY`] against `flags`.
pub fn resolve_action(flags: &ActionFlags) -> ActionState {
    ACTION_PRIORITY
        .iter()
        .find(|rule| (rule.when)(flags))
        .map(|rule| rule.state)
        .unwrap_or(ActionState::Idle)
}
