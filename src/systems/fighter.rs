//! Per-tick fighter systems.
//!
//! - [`fighter_tick_system`] – move both fighters (player one first), then
//!   advance both animations
//! - [`persist_fighter_stats`] – write changed stat snapshots to the store
//! - [`clear_input_edges`] – drop this tick's key-press edges
//!
//! The two fighters are fetched as a pair through
//! `iter_combinations_mut` and ordered by [`PlayerSlot`].

use bevy_ecs::prelude::*;
use log::{debug, error, warn};

use crate::components::fighter::{Fighter, PlayerSlot};
use crate::events::audio::AudioCmd;
use crate::resources::input::InputState;
use crate::resources::matchstate::{ArenaSize, MatchState, RoundPhase};
use crate::resources::storage::Storage;
use crate::resources::worldtime::WorldTime;

fn step_fighter(
    fighter: &mut Fighter,
    opponent: &mut Fighter,
    arena: ArenaSize,
    input: &InputState,
    round_over: bool,
    audio: &mut MessageWriter<AudioCmd>,
) {
    match fighter.move_fighter(arena, opponent, input, round_over) {
        Ok(Some(outcome)) => {
            debug!(
                "{} used {} ({}, {} damage)",
                fighter.display_name(),
                outcome.key,
                if outcome.connected { "hit" } else { "miss" },
                outcome.damage_dealt
            );
            if let Some(id) = outcome.sound {
                audio.write(AudioCmd::PlayFx { id });
            }
        }
        Ok(None) => {}
        Err(e) => error!("{}", e),
    }
}

/// Move and animate the two fighters.
///
/// During the intro fighters are only animated. Once live, player one moves
/// first, then player two, then both animations advance.
pub fn fighter_tick_system(
    mut fighters: Query<&mut Fighter>,
    input: Res<InputState>,
    arena: Res<ArenaSize>,
    time: Res<WorldTime>,
    state: Res<MatchState>,
    mut audio: MessageWriter<AudioCmd>,
) {
    let mut pairs = fighters.iter_combinations_mut();
    let Some([mut a, mut b]) = pairs.fetch_next() else {
        return;
    };
    let (p1, p2): (&mut Fighter, &mut Fighter) = if a.slot <= b.slot {
        (&mut *a, &mut *b)
    } else {
        (&mut *b, &mut *a)
    };
    debug_assert!(p1.slot == PlayerSlot::One && p2.slot == PlayerSlot::Two);

    if !matches!(state.phase, RoundPhase::Intro { .. }) {
        let round_over = state.is_round_over();
        step_fighter(p1, p2, *arena, &input, round_over, &mut audio);
        step_fighter(p2, p1, *arena, &input, round_over, &mut audio);
    }

    p1.update(time.delta);
    p2.update(time.delta);
}

/// Persist each named fighter's stats when they changed since the last
/// successful write. Failures are logged and retried on the next tick.
pub fn persist_fighter_stats(mut fighters: Query<&mut Fighter>, storage: Option<Res<Storage>>) {
    let Some(storage) = storage else {
        return;
    };
    for mut fighter in fighters.iter_mut() {
        let Some((name, snapshot)) = fighter.dirty_snapshot() else {
            continue;
        };
        let name = name.to_string();
        match storage.stats.persist(&name, snapshot) {
            Ok(()) => fighter.mark_persisted(snapshot),
            Err(e) => warn!("Could not persist stats of '{}': {}", name, e),
        }
    }
}

/// Last system of the tick.
pub fn clear_input_edges(mut input: ResMut<InputState>) {
    input.clear_edges();
}
