//! Round-end event and the observer that hands it to the result sink.
//!
//! The round controller triggers exactly one [`RoundEndedEvent`] per round.
//! [`observe_round_ended`] forwards the [`RoundResult`] to the
//! [`RoundResultSink`] registered in [`Storage`]; sink failures are logged
//! and never stop the match.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{info, warn};
use serde::Serialize;

use crate::components::fighter::PlayerSlot;
use crate::resources::storage::Storage;
use crate::storage::StoreError;

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    /// Round number within the session, starting at 1.
    pub round: u32,
    /// `None` when both fighters went down in the same tick.
    pub winner: Option<PlayerSlot>,
    pub p1_name: String,
    pub p2_name: String,
    pub p1_character: String,
    pub p2_character: String,
    /// User account behind player one, if a user is logged in.
    pub p1_user: Option<String>,
    /// Loser at zero health and winner untouched.
    pub perfect: bool,
    pub ranked: bool,
    /// Attacks thrown by player one this round.
    pub p1_attacks: u32,
}

impl RoundResult {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    fn name(&self, slot: PlayerSlot) -> &str {
        match slot {
            PlayerSlot::One => &self.p1_name,
            PlayerSlot::Two => &self.p2_name,
        }
    }

    pub fn winner_name(&self) -> Option<&str> {
        self.winner.map(|slot| self.name(slot))
    }

    pub fn loser_name(&self) -> Option<&str> {
        let loser = match self.winner? {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        };
        Some(self.name(loser))
    }

    /// Whether player one won.
    pub fn p1_won(&self) -> bool {
        self.winner == Some(PlayerSlot::One)
    }
}

/// Consumer of round results: ranking, missions, battle history.
pub trait RoundResultSink: Send + Sync {
    fn record(&self, result: &RoundResult) -> Result<(), StoreError>;
}

/// Fired once when a round ends.
#[derive(Event, Debug, Clone)]
pub struct RoundEndedEvent {
    pub result: RoundResult,
}

pub fn observe_round_ended(trigger: On<RoundEndedEvent>, storage: Option<Res<Storage>>) {
    let result = &trigger.event().result;
    match result.winner_name() {
        Some(winner) => info!("Round {} won by {}", result.round, winner),
        None => info!("Round {} is a draw", result.round),
    }
    let Some(storage) = storage else {
        return;
    };
    if let Err(e) = storage.results.record(result) {
        warn!("Failed to record round result: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(winner: Option<PlayerSlot>) -> RoundResult {
        RoundResult {
            round: 1,
            winner,
            p1_name: "alice".to_string(),
            p2_name: "wizard".to_string(),
            p1_character: "warrior".to_string(),
            p2_character: "wizard".to_string(),
            p1_user: Some("alice".to_string()),
            perfect: false,
            ranked: false,
            p1_attacks: 4,
        }
    }

    #[test]
    fn winner_and_loser_names() {
        let r = result(Some(PlayerSlot::Two));
        assert_eq!(r.winner_name(), Some("wizard"));
        assert_eq!(r.loser_name(), Some("alice"));
        assert!(!r.p1_won());
    }

    #[test]
    fn draw_has_no_names() {
        let r = result(None);
        assert!(r.is_draw());
        assert_eq!(r.winner_name(), None);
        assert_eq!(r.loser_name(), None);
    }
}
