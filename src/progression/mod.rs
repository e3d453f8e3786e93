//! What happens to a user after a round: battle history, ranked points,
//! profile counters and daily missions.
//!
//! [`ProgressionRecorder`] is the production [`RoundResultSink`].

pub mod history;
pub mod missions;
pub mod rank;

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use log::{debug, warn};
use thiserror::Error;

use crate::events::round::{RoundResult, RoundResultSink};
use crate::storage::StoreError;
use crate::storage::repo::{DailyMissions, ProgressStore};
use missions::{ClaimError, MissionEvent};

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
}

pub struct ProgressionRecorder {
    store: Arc<dyn ProgressStore>,
    rng: Mutex<fastrand::Rng>,
    /// Fixed "today" for tests; `None` reads the local clock.
    today: Option<NaiveDate>,
}

impl ProgressionRecorder {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self {
            store,
            rng: Mutex::new(fastrand::Rng::new()),
            today: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(fastrand::Rng::with_seed(seed));
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn rng(&self) -> Result<std::sync::MutexGuard<'_, fastrand::Rng>, StoreError> {
        self.rng.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Today's missions of `user`, assigning a new set when the day changed.
    pub fn daily_missions(&self, user: &str) -> Result<DailyMissions, StoreError> {
        let master = self.store.missions()?;
        let today = self.today();
        let mut rng = self.rng()?;
        let record = self.store.update_user(user, &mut |u| {
            missions::refresh_daily(u, &master, today, &mut rng);
        })?;
        Ok(record.daily_missions)
    }

    /// Credit the reward of the user's mission at `index`.
    pub fn claim_reward(&self, user: &str, index: usize) -> Result<u32, ProgressionError> {
        let master = self.store.missions()?;
        let mut outcome = Err(ClaimError::NoSuchMission(index));
        self.store.update_user(user, &mut |u| {
            outcome = missions::claim_reward(u, &master, index);
        })?;
        Ok(outcome?)
    }
}

impl RoundResultSink for ProgressionRecorder {
    fn record(&self, result: &RoundResult) -> Result<(), StoreError> {
        let history = self
            .store
            .push(history::battle_record(result, Local::now()));
        if let Err(e) = &history {
            warn!("Failed to store battle record of round {}: {}", result.round, e);
        }

        let Some(user) = result.p1_user.as_deref() else {
            return history;
        };

        let master = self.store.missions()?;
        let today = self.today();
        let mut rng = self.rng()?;
        let won = result.p1_won();
        let character = result.p1_character.as_str();

        let record = self.store.update_user(user, &mut |u| {
            u.profile_stats.matches_played += 1;
            if !result.is_draw() {
                if won {
                    u.profile_stats.matches_won += 1;
                } else {
                    u.profile_stats.matches_lost += 1;
                }
                if result.ranked {
                    u.ranked_stats.apply(won);
                }
            }

            missions::refresh_daily(u, &master, today, &mut rng);
            missions::apply_event(u, &master, MissionEvent::PlayGames);
            missions::apply_event(u, &master, MissionEvent::PlayWithChar(character));
            missions::apply_event(u, &master, MissionEvent::UseSpecials(result.p1_attacks));
            if won {
                missions::apply_event(u, &master, MissionEvent::WinGames);
                missions::apply_event(u, &master, MissionEvent::WinWithChar(character));
                missions::apply_event(u, &master, MissionEvent::WinPerfect(result.perfect));
            }
        })?;

        debug!(
            "Progress for '{}': {} LP ({}), {} played",
            user,
            record.ranked_stats.league_points,
            record.ranked_stats.rank,
            record.profile_stats.matches_played
        );
        history
    }
}
