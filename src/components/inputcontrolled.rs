//! Fighter controllers.
//!
//! This module describes who drives a fighter:
//! - [`Controller::Human`] – keyboard-driven through [`PlayerBindings`]
//! - [`Controller::Ai`] – an [`AiPolicy`] chooses the attack to throw
//!
//! [`Fighter::move_fighter`](crate::components::fighter::Fighter::move_fighter)
//! reads the controller once per tick.

use std::fmt;

use crate::components::rect::Rect;
use crate::resources::characters::{MoveKey, MoveSet};
use crate::resources::input::{InputState, Key};

/// How a human player throws attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackKeys {
    /// Press the key each move is bound to in the character data.
    Character,
    /// Press `1..9` for the first nine moves, in list order.
    Digits,
}

/// Keys of one player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerBindings {
    pub left: Key,
    pub right: Key,
    pub jump: Key,
    pub attacks: AttackKeys,
}

impl PlayerBindings {
    /// WASD layout used by player one.
    pub fn player_one() -> Self {
        Self {
            left: Key::A,
            right: Key::D,
            jump: Key::W,
            attacks: AttackKeys::Character,
        }
    }

    /// Arrow layout used by player two, attacking on the digit row.
    pub fn player_two() -> Self {
        Self {
            left: Key::Left,
            right: Key::Right,
            jump: Key::Up,
            attacks: AttackKeys::Digits,
        }
    }

    /// First move of `moves` whose attack key was pressed this tick.
    pub fn pressed_move(&self, moves: &MoveSet, input: &InputState) -> Option<MoveKey> {
        match self.attacks {
            AttackKeys::Character => moves.keys().find(|key| input.just_pressed(*key)),
            AttackKeys::Digits => moves
                .keys()
                .zip(Key::DIGITS)
                .find(|(_, digit)| input.just_pressed(*digit))
                .map(|(key, _)| key),
        }
    }
}

/// What a policy can see when picking a move.
pub struct AiContext<'a> {
    pub moves: &'a MoveSet,
    pub own_rect: Rect,
    pub opponent_rect: Rect,
}

impl AiContext<'_> {
    pub fn distance(&self) -> f32 {
        (self.own_rect.center_x() - self.opponent_rect.center_x()).abs()
    }
}

/// Attack selection strategy of a CPU fighter.
pub trait AiPolicy: Send + Sync + fmt::Debug {
    /// Pick the move to throw, or `None` to hold off this tick.
    fn select_move(&mut self, ctx: &AiContext) -> Option<MoveKey>;
}

/// Always throws the first move of the character's list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMovePolicy;

impl AiPolicy for FirstMovePolicy {
    fn select_move(&mut self, ctx: &AiContext) -> Option<MoveKey> {
        ctx.moves.first()
    }
}

/// Throws the most damaging move; ties keep list order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrongestMovePolicy;

impl AiPolicy for StrongestMovePolicy {
    fn select_move(&mut self, ctx: &AiContext) -> Option<MoveKey> {
        let mut best: Option<(MoveKey, u32)> = None;
        for (key, def) in ctx.moves.iter() {
            if best.is_none_or(|(_, dmg)| def.damage > dmg) {
                best = Some((key, def.damage));
            }
        }
        best.map(|(key, _)| key)
    }
}

/// Picks a uniformly random move.
#[derive(Debug, Clone)]
pub struct RandomMovePolicy {
    rng: fastrand::Rng,
}

impl RandomMovePolicy {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomMovePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AiPolicy for RandomMovePolicy {
    fn select_move(&mut self, ctx: &AiContext) -> Option<MoveKey> {
        if ctx.moves.is_empty() {
            return None;
        }
        let pick = self.rng.usize(..ctx.moves.len());
        ctx.moves.keys().nth(pick)
    }
}

/// Who drives a fighter.
#[derive(Debug)]
pub enum Controller {
    Human(PlayerBindings),
    Ai(Box<dyn AiPolicy>),
}

impl Controller {
    pub fn ai(policy: impl AiPolicy + 'static) -> Self {
        Controller::Ai(Box::new(policy))
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Controller::Ai(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::characters::tests::sample_definition;

    fn ctx(moves: &MoveSet) -> AiContext<'_> {
        AiContext {
            moves,
            own_rect: Rect::new(0.0, 0.0, 80.0, 180.0),
            opponent_rect: Rect::new(100.0, 0.0, 80.0, 180.0),
        }
    }

    #[test]
    fn distance_between_centres() {
        let moves = MoveSet::default();
        assert_eq!(ctx(&moves).distance(), 100.0);
    }

    #[test]
    fn each_layout_reads_its_own_attack_keys() {
        let moves = MoveSet::from_entries(&sample_definition().moves);
        let mut input = InputState::default();
        input.press(Key::R);
        assert_eq!(PlayerBindings::player_one().pressed_move(&moves, &input), Some(Key::R));
        assert_eq!(PlayerBindings::player_two().pressed_move(&moves, &input), None);

        input.clear_edges();
        input.press(Key::Num2);
        assert_eq!(PlayerBindings::player_one().pressed_move(&moves, &input), None);
        assert_eq!(PlayerBindings::player_two().pressed_move(&moves, &input), Some(Key::T));
        input.press(Key::Num3);
        assert_eq!(PlayerBindings::player_two().pressed_move(&moves, &input), Some(Key::T));
    }

    #[test]
    fn first_move_policy() {
        let moves = MoveSet::from_entries(&sample_definition().moves);
        assert_eq!(FirstMovePolicy.select_move(&ctx(&moves)), Some(Key::R));
        assert_eq!(FirstMovePolicy.select_move(&ctx(&MoveSet::default())), None);
    }

    #[test]
    fn strongest_move_policy() {
        let moves = MoveSet::from_entries(&sample_definition().moves);
        assert_eq!(StrongestMovePolicy.select_move(&ctx(&moves)), Some(Key::T));
    }

    #[test]
    fn random_policy_only_returns_known_moves() {
        let moves = MoveSet::from_entries(&sample_definition().moves);
        let mut policy = RandomMovePolicy::with_seed(7);
        for _ in 0..32 {
            let key = policy.select_move(&ctx(&moves)).unwrap();
            assert!(moves.get(key).is_some());
        }
        assert_eq!(policy.select_move(&ctx(&MoveSet::default())), None);
    }

    #[test]
    fn bindings_per_slot() {
        assert_eq!(PlayerBindings::player_one().jump, Key::W);
        assert_eq!(PlayerBindings::player_two().left, Key::Left);
        assert!(Controller::ai(FirstMovePolicy).is_ai());
        assert!(!Controller::Human(PlayerBindings::player_one()).is_ai());
    }
}
