//! Battle history records.

use chrono::{DateTime, Local};

use crate::events::round::RoundResult;
use crate::storage::repo::BattleRecord;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// History entry for `result`, stamped with `at`.
pub fn battle_record(result: &RoundResult, at: DateTime<Local>) -> BattleRecord {
    BattleRecord {
        timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        p1_char: result.p1_character.clone(),
        p2_char: result.p2_character.clone(),
        winner: result.winner_name().map(str::to_string),
    }
}
