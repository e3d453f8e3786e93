//! Ranked ladder.

use std::fmt;

use serde::{Deserialize, Serialize};

/// League points granted for a ranked win.
pub const LP_WIN: u32 = 15;
/// League points removed for a ranked loss.
pub const LP_LOSS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Rank {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
    Master,
}

impl Rank {
    /// Ladder from lowest to highest.
    pub const LADDER: [Rank; 5] = [
        Rank::Bronze,
        Rank::Silver,
        Rank::Gold,
        Rank::Platinum,
        Rank::Master,
    ];

    /// League points needed to reach this rank.
    pub fn threshold(self) -> u32 {
        match self {
            Rank::Bronze => 0,
            Rank::Silver => 100,
            Rank::Gold => 200,
            Rank::Platinum => 300,
            Rank::Master => 500,
        }
    }

    /// Highest rank whose threshold `lp` meets.
    pub fn for_points(lp: u32) -> Rank {
        Rank::LADDER
            .iter()
            .rev()
            .copied()
            .find(|rank| lp >= rank.threshold())
            .unwrap_or(Rank::Bronze)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rank::Bronze => "Bronze",
            Rank::Silver => "Silver",
            Rank::Gold => "Gold",
            Rank::Platinum => "Platinum",
            Rank::Master => "Master",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankedStats {
    pub league_points: u32,
    pub rank: Rank,
}

impl RankedStats {
    /// Apply a ranked result. Points never drop below zero.
    pub fn apply(&mut self, won: bool) {
        self.league_points = if won {
            self.league_points.saturating_add(LP_WIN)
        } else {
            self.league_points.saturating_sub(LP_LOSS)
        };
        self.rank = Rank::for_points(self.league_points);
    }
}
