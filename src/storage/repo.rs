//! Repository traits and stored records.
//!
//! The fight and the progression layer only talk to these traits; file
//! paths and formats belong to the implementations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use crate::components::fighter::StatSnapshot;
use crate::progression::rank::RankedStats;
use crate::resources::characters::CharacterDefinition;

/// Battle history keeps this many records, newest first.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    #[serde(default)]
    pub play_time_seconds: u64,
    #[serde(default)]
    pub matches_played: u32,
    #[serde(default)]
    pub matches_won: u32,
    #[serde(default)]
    pub matches_lost: u32,
}

/// Progress of one assigned daily mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgress {
    pub id: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub claimed: bool,
}

impl MissionProgress {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            progress: 0,
            completed: false,
            claimed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyMissions {
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
    #[serde(default)]
    pub missions: Vec<MissionProgress>,
}

/// A user account as seen by the game. Fields owned by other tools
/// (credentials, contact data) are carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserRecord {
    /// Key of the record; not stored inside the JSON object.
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub character_class: Option<String>,
    #[serde(default)]
    pub stats: Option<StatSnapshot>,
    #[serde(default)]
    pub ranked_stats: RankedStats,
    #[serde(default)]
    pub profile_stats: ProfileStats,
    #[serde(default)]
    pub daily_missions: DailyMissions,
    #[serde(default)]
    pub currency: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    PlayGames,
    WinGames,
    PlayWithChar,
    WinWithChar,
    /// Progress grows by the number of attacks thrown.
    UseSpecials,
    WinPerfect,
}

/// Entry of the mission master list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionDefinition {
    #[serde(rename = "type")]
    pub kind: MissionKind,
    pub target: u32,
    #[serde(default)]
    pub reward: u32,
    /// Character required by the `*_with_char` kinds.
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    pub p1_char: String,
    pub p2_char: String,
    /// Winner's display name; `None` for a draw.
    pub winner: Option<String>,
}

pub trait CharacterRepository: Send + Sync {
    fn get(&self, name: &str) -> Result<CharacterDefinition, StoreError>;
    fn put(&self, name: &str, def: &CharacterDefinition) -> Result<(), StoreError>;
    /// Character names in sorted order.
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

pub trait UserRepository: Send + Sync {
    fn get_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError>;
    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError>;
    /// Atomic read-modify-write of one user. A missing user is created
    /// first. Returns the record as written.
    fn update_user(
        &self,
        name: &str,
        apply: &mut dyn FnMut(&mut UserRecord),
    ) -> Result<UserRecord, StoreError>;
}

pub trait MissionRepository: Send + Sync {
    /// Master list keyed by mission id, sorted by id.
    fn missions(&self) -> Result<Vec<(String, MissionDefinition)>, StoreError>;
    fn put_mission(&self, id: &str, mission: &MissionDefinition) -> Result<(), StoreError>;
}

pub trait HistoryRepository: Send + Sync {
    /// Records, newest first.
    fn history(&self) -> Result<Vec<BattleRecord>, StoreError>;
    /// Prepend `record`, keeping at most [`HISTORY_LIMIT`] entries.
    fn push(&self, record: BattleRecord) -> Result<(), StoreError>;
}

/// Destination of per-tick fighter stat snapshots.
pub trait UserStatSink: Send + Sync {
    fn persist(&self, name: &str, snapshot: StatSnapshot) -> Result<(), StoreError>;
}

impl<T: UserRepository + ?Sized> UserStatSink for T {
    fn persist(&self, name: &str, snapshot: StatSnapshot) -> Result<(), StoreError> {
        self.update_user(name, &mut |user| user.stats = Some(snapshot))
            .map(|_| ())
    }
}

/// Everything the progression layer needs from storage.
pub trait ProgressStore: UserRepository + MissionRepository + HistoryRepository {}

impl<T: UserRepository + MissionRepository + HistoryRepository + ?Sized> ProgressStore for T {}

/// Insert `record` at the front and trim to [`HISTORY_LIMIT`].
pub(crate) fn prepend_capped(history: &mut Vec<BattleRecord>, record: BattleRecord) {
    history.insert(0, record);
    history.truncate(HISTORY_LIMIT);
}
