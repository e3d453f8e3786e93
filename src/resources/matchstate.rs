//! Round and match bookkeeping.
//!
//! [`MatchState`] is the round state machine:
//!
//! ```text
//! Intro(count) -> Live -> RoundOver -> { Retry -> Intro, Exit -> menu }
//! ```
//!
//! The score pair survives retries and is cleared when the session ends.

use bevy_ecs::prelude::Resource;

use crate::components::fighter::PlayerSlot;
use crate::events::round::RoundResult;

/// Logical arena used by fighter physics.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ArenaSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ArenaSize {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundPhase {
    /// Countdown before the fight; `remaining` whole seconds left.
    Intro { remaining: u32 },
    Live,
    /// `ended_at` is the [`WorldTime`](crate::resources::worldtime::WorldTime)
    /// elapsed value when the round ended.
    RoundOver { ended_at: f32 },
}

/// Entries of the round-over menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundOption {
    #[default]
    Retry,
    Exit,
}

impl RoundOption {
    pub fn toggled(self) -> Self {
        match self {
            RoundOption::Retry => RoundOption::Exit,
            RoundOption::Exit => RoundOption::Retry,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoundOption::Retry => "Retry",
            RoundOption::Exit => "Exit",
        }
    }
}

/// Who drives a player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pilot {
    #[default]
    Human,
    Cpu,
}

/// What the next match should look like. Consumed by the setup hook.
#[derive(Resource, Debug, Clone, Default)]
pub struct MatchRequest {
    /// Logged-in user playing slot one, if any.
    pub user: Option<String>,
    /// Player one's character; falls back to the user's assigned character.
    pub character: Option<String>,
    /// Player two's character; random when unset.
    pub opponent: Option<String>,
    pub ranked: bool,
    pub player_one: Pilot,
    pub player_two: Pilot,
    /// Seed for opponent selection and CPU move choice.
    pub seed: Option<u64>,
}

/// Present in unattended sessions: the round-over menu is answered
/// automatically, retrying until `rounds` rounds were played.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPilot {
    pub rounds: u32,
}

/// Score of the last finished session, kept after the match state resets.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub rounds: u32,
    pub score: [u32; 2],
}

#[derive(Resource, Debug, Clone)]
pub struct MatchState {
    pub phase: RoundPhase,
    /// Rounds won by player one and player two.
    pub score: [u32; 2],
    /// Rounds played in this session, including the current one.
    pub round: u32,
    pub intro_seconds: u32,
    /// Seconds accumulated towards the next countdown step.
    pub intro_elapsed: f32,
    /// Seconds the round-over menu stays locked.
    pub round_cooldown: f32,
    pub selected: RoundOption,
    /// Choice confirmed in the round-over menu, applied on the next tick.
    pub decision: Option<RoundOption>,
    pub ranked: bool,
    pub last_result: Option<RoundResult>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(3, 2.0, false)
    }
}

impl MatchState {
    pub fn new(intro_seconds: u32, round_cooldown: f32, ranked: bool) -> Self {
        Self {
            phase: RoundPhase::Intro {
                remaining: intro_seconds,
            },
            score: [0, 0],
            round: 1,
            intro_seconds,
            intro_elapsed: 0.0,
            round_cooldown,
            selected: RoundOption::Retry,
            decision: None,
            ranked,
            last_result: None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, RoundPhase::Live)
    }

    pub fn is_round_over(&self) -> bool {
        matches!(self.phase, RoundPhase::RoundOver { .. })
    }

    /// Remaining countdown, if the intro is running.
    pub fn countdown(&self) -> Option<u32> {
        match self.phase {
            RoundPhase::Intro { remaining } => Some(remaining),
            _ => None,
        }
    }

    /// Advance the intro countdown. Returns true on the tick the round
    /// becomes live.
    pub fn tick_intro(&mut self, dt: f32) -> bool {
        let RoundPhase::Intro { mut remaining } = self.phase else {
            return false;
        };
        if remaining == 0 {
            self.phase = RoundPhase::Live;
            return true;
        }
        self.intro_elapsed += dt;
        while self.intro_elapsed >= 1.0 && remaining > 0 {
            self.intro_elapsed -= 1.0;
            remaining -= 1;
        }
        if remaining == 0 {
            self.intro_elapsed = 0.0;
            self.phase = RoundPhase::Live;
            true
        } else {
            self.phase = RoundPhase::Intro { remaining };
            false
        }
    }

    /// Close the round. A `None` winner is a draw and leaves the score alone.
    pub fn finish_round(&mut self, winner: Option<PlayerSlot>, now: f32) {
        if let Some(slot) = winner {
            self.score[slot.index()] += 1;
        }
        self.phase = RoundPhase::RoundOver { ended_at: now };
        self.selected = RoundOption::Retry;
        self.decision = None;
    }

    /// Whether the round-over menu accepts input at time `now`.
    pub fn menu_ready(&self, now: f32) -> bool {
        match self.phase {
            RoundPhase::RoundOver { ended_at } => now - ended_at >= self.round_cooldown,
            _ => false,
        }
    }

    /// Start the next round of the same session.
    pub fn restart_round(&mut self) {
        self.phase = RoundPhase::Intro {
            remaining: self.intro_seconds,
        };
        self.intro_elapsed = 0.0;
        self.round += 1;
        self.selected = RoundOption::Retry;
        self.decision = None;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            rounds: self.round,
            score: self.score,
        }
    }

    /// End the session: score and round counter start over.
    pub fn reset_session(&mut self) {
        let (intro, cooldown, ranked) = (self.intro_seconds, self.round_cooldown, self.ranked);
        *self = Self::new(intro, cooldown, ranked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_counts_down_once_per_second() {
        let mut state = MatchState::new(3, 2.0, false);
        let mut went_live = 0;
        for _ in 0..11 {
            if state.tick_intro(0.25) {
                went_live += 1;
            }
        }
        assert_eq!(state.countdown(), Some(1));
        assert!(state.tick_intro(0.25));
        went_live += 1;
        assert!(state.is_live());
        assert!(!state.tick_intro(0.25));
        assert_eq!(went_live, 1);
    }

    #[test]
    fn zero_second_intro_goes_live_immediately() {
        let mut state = MatchState::new(0, 2.0, false);
        assert!(state.tick_intro(0.0));
        assert!(state.is_live());
    }

    #[test]
    fn finish_round_scores_winner_only() {
        let mut state = MatchState::new(3, 2.0, false);
        state.phase = RoundPhase::Live;
        state.finish_round(Some(PlayerSlot::Two), 10.0);
        assert_eq!(state.score, [0, 1]);
        assert!(state.is_round_over());

        state.restart_round();
        state.phase = RoundPhase::Live;
        state.finish_round(None, 20.0);
        assert_eq!(state.score, [0, 1]);
        assert_eq!(state.round, 2);
    }

    #[test]
    fn menu_locked_during_cooldown() {
        let mut state = MatchState::new(3, 2.0, false);
        state.finish_round(Some(PlayerSlot::One), 5.0);
        assert!(!state.menu_ready(6.5));
        assert!(state.menu_ready(7.0));
    }

    #[test]
    fn reset_session_clears_score() {
        let mut state = MatchState::new(3, 2.0, true);
        state.finish_round(Some(PlayerSlot::One), 1.0);
        state.restart_round();
        state.reset_session();
        assert_eq!(state.score, [0, 0]);
        assert_eq!(state.round, 1);
        assert!(state.ranked);
        assert_eq!(state.countdown(), Some(3));
    }

    #[test]
    fn option_toggle() {
        assert_eq!(RoundOption::Retry.toggled(), RoundOption::Exit);
        assert_eq!(RoundOption::Exit.toggled().label(), "Retry");
    }
}
