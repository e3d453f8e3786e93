//! Daily missions: assignment, progress and rewards.

use chrono::NaiveDate;
use log::debug;
use thiserror::Error;

use crate::storage::repo::{MissionDefinition, MissionKind, MissionProgress, UserRecord};

/// Missions assigned per day.
pub const DAILY_MISSIONS: usize = 3;

/// Something that happened in a finished round, from the user's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionEvent<'a> {
    PlayGames,
    WinGames,
    PlayWithChar(&'a str),
    WinWithChar(&'a str),
    /// Number of attacks thrown in the round.
    UseSpecials(u32),
    /// A won round; the flag tells whether it was perfect.
    WinPerfect(bool),
}

impl MissionEvent<'_> {
    fn kind(&self) -> MissionKind {
        match self {
            MissionEvent::PlayGames => MissionKind::PlayGames,
            MissionEvent::WinGames => MissionKind::WinGames,
            MissionEvent::PlayWithChar(_) => MissionKind::PlayWithChar,
            MissionEvent::WinWithChar(_) => MissionKind::WinWithChar,
            MissionEvent::UseSpecials(_) => MissionKind::UseSpecials,
            MissionEvent::WinPerfect(_) => MissionKind::WinPerfect,
        }
    }

    /// Progress this event adds to a matching mission, zero if it does not
    /// count.
    fn increment(&self, mission: &MissionDefinition) -> u32 {
        if mission.kind != self.kind() {
            return 0;
        }
        match self {
            MissionEvent::PlayGames | MissionEvent::WinGames => 1,
            MissionEvent::PlayWithChar(character) | MissionEvent::WinWithChar(character) => {
                u32::from(mission.character.as_deref() == Some(*character))
            }
            MissionEvent::UseSpecials(count) => *count,
            MissionEvent::WinPerfect(perfect) => u32::from(*perfect),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("no daily mission at index {0}")]
    NoSuchMission(usize),
    #[error("mission '{0}' is not completed yet")]
    NotCompleted(String),
    #[error("reward of mission '{0}' was already claimed")]
    AlreadyClaimed(String),
}

fn lookup<'m>(master: &'m [(String, MissionDefinition)], id: &str) -> Option<&'m MissionDefinition> {
    master.iter().find(|(mid, _)| mid == id).map(|(_, m)| m)
}

/// Assign fresh missions if the user's set is not from `today`.
/// Returns true when the set was replaced.
pub fn refresh_daily(
    user: &mut UserRecord,
    master: &[(String, MissionDefinition)],
    today: NaiveDate,
    rng: &mut fastrand::Rng,
) -> bool {
    if user.daily_missions.last_updated == Some(today) {
        return false;
    }
    let mut ids: Vec<&str> = master.iter().map(|(id, _)| id.as_str()).collect();
    rng.shuffle(&mut ids);
    ids.truncate(DAILY_MISSIONS);

    debug!("Daily missions for '{}' on {}: {:?}", user.name, today, ids);
    user.daily_missions.last_updated = Some(today);
    user.daily_missions.missions = ids.into_iter().map(MissionProgress::new).collect();
    true
}

/// Apply `event` to every open mission of the user. Progress saturates at
/// the mission target, which also marks it completed.
pub fn apply_event(user: &mut UserRecord, master: &[(String, MissionDefinition)], event: MissionEvent) {
    for mission in user.daily_missions.missions.iter_mut() {
        if mission.completed {
            continue;
        }
        let Some(definition) = lookup(master, &mission.id) else {
            continue;
        };
        let step = event.increment(definition);
        if step == 0 {
            continue;
        }
        mission.progress = mission.progress.saturating_add(step);
        if mission.progress >= definition.target {
            mission.progress = definition.target;
            mission.completed = true;
        }
    }
}

/// Credit the reward of the mission at `index`. Returns the amount credited.
pub fn claim_reward(
    user: &mut UserRecord,
    master: &[(String, MissionDefinition)],
    index: usize,
) -> Result<u32, ClaimError> {
    let mission = user
        .daily_missions
        .missions
        .get_mut(index)
        .ok_or(ClaimError::NoSuchMission(index))?;
    if mission.claimed {
        return Err(ClaimError::AlreadyClaimed(mission.id.clone()));
    }
    if !mission.completed {
        return Err(ClaimError::NotCompleted(mission.id.clone()));
    }
    let reward = lookup(master, &mission.id).map_or(0, |m| m.reward);
    mission.claimed = true;
    user.currency = user.currency.saturating_add(reward);
    Ok(reward)
}
