//! The fighter entity.
//!
//! A [`Fighter`] owns everything one combatant needs during a round:
//! physical state (rectangle, vertical velocity, facing), combat state
//! (health, attack/hit flags, cooldown) and animation state (action row,
//! frame index, frame timer). Its combat fields only change through
//! [`Fighter::move_fighter`], [`Fighter::attack`] and [`Fighter::update`].
//!
//! # Tick contract
//!
//! 1. `move_fighter` reads the controller (keyboard snapshot or AI policy),
//!    may start a jump or an attack, integrates gravity, clamps to the arena,
//!    re-derives facing and counts the attack cooldown down.
//! 2. `attack` performs exactly one hit-box test against the target.
//! 3. `update` resolves the visible action from the flags and advances the
//!    animation, clearing one-shot flags when their clip completes.

use std::sync::Arc;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::animation::{ActionFlags, ActionState, resolve_action};
use crate::components::inputcontrolled::{AiContext, Controller};
use crate::components::rect::Rect;
use crate::resources::animationstore::{AnimationClips, Frame};
use crate::resources::characters::{CharacterDefinition, MoveKey, MoveSet, rows};
use crate::resources::input::InputState;
use crate::resources::matchstate::ArenaSize;

/// Player slot of a fighter. Player one is always evaluated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    /// Index into score pairs.
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }
}

/// Physics and AI constants shared by every fighter of a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FighterTuning {
    /// Added to the vertical velocity every tick.
    pub gravity: f32,
    /// Vertical velocity set by a jump (negative is up).
    pub jump_impulse: f32,
    /// Distance between the arena bottom and the floor line.
    pub ground_offset: f32,
    pub width: f32,
    pub height: f32,
    /// The AI stops walking when this close to the opponent's centre.
    pub ai_dead_zone: f32,
    /// The AI attacks when the opponent is closer than this.
    pub ai_engage_distance: f32,
    /// Seconds a frame stays on screen.
    pub frame_duration: f32,
}

impl Default for FighterTuning {
    fn default() -> Self {
        Self {
            gravity: 2.0,
            jump_impulse: -30.0,
            ground_offset: 110.0,
            width: 80.0,
            height: 180.0,
            ai_dead_zone: 30.0,
            ai_engage_distance: 150.0,
            frame_duration: 0.05,
        }
    }
}

/// Stat record written to the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub health: u32,
    pub attacks_done: u32,
    #[serde(alias = "is_alive")]
    pub alive: bool,
}

/// Result of an attack that was actually performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub key: MoveKey,
    /// Whether the hit-box overlapped the target.
    pub connected: bool,
    /// Health actually removed from the target.
    pub damage_dealt: u32,
    /// Sound cue to fire, if the character has one.
    pub sound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("character '{character}' has no move bound to {key}")]
    UnknownMove { character: String, key: MoveKey },
}

/// How the current frame is placed on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteLayout {
    pub scale: f32,
    pub offset: [f32; 2],
}

#[derive(Component, Debug)]
pub struct Fighter {
    pub slot: PlayerSlot,
    /// Display name and stat key. Without an account this is the character name.
    pub name: Option<String>,
    pub character: String,
    pub controller: Controller,
    pub layout: SpriteLayout,

    rect: Rect,
    vel_y: f32,
    flip: bool,
    running: bool,
    airborne: bool,

    base_health: u32,
    health: u32,
    speed: f32,
    alive: bool,
    attacking: bool,
    hit: bool,
    attack_cooldown: u32,
    attack_row: usize,
    attacks_done: u32,

    state: ActionState,
    action: usize,
    frame_index: usize,
    frame_elapsed: f32,

    moves: MoveSet,
    clips: Arc<AnimationClips>,
    tuning: FighterTuning,
    sound: Option<String>,
    last_persisted: Option<StatSnapshot>,
}

impl Fighter {
    /// Build a fresh fighter at full health standing at `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        slot: PlayerSlot,
        character: &str,
        def: &CharacterDefinition,
        clips: Arc<AnimationClips>,
        x: f32,
        y: f32,
        controller: Controller,
        tuning: FighterTuning,
    ) -> Self {
        let base_health = def.stats.health;
        Self {
            slot,
            name: None,
            character: character.to_string(),
            controller,
            layout: SpriteLayout {
                scale: def.scale,
                offset: def.offset,
            },
            rect: Rect::new(x, y, tuning.width, tuning.height),
            vel_y: 0.0,
            flip: slot == PlayerSlot::Two,
            running: false,
            airborne: false,
            base_health,
            health: base_health,
            speed: def.stats.speed,
            alive: base_health > 0,
            attacking: false,
            hit: false,
            attack_cooldown: 0,
            attack_row: rows::ATTACK,
            attacks_done: 0,
            state: ActionState::Idle,
            action: rows::IDLE,
            frame_index: 0,
            frame_elapsed: 0.0,
            moves: MoveSet::from_entries(&def.moves),
            clips,
            tuning,
            sound: def.sound_path.as_ref().map(|_| character.to_string()),
            last_persisted: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Move the fighter's top-left corner. Used to stage a round.
    pub fn place(&mut self, x: f32, y: f32) {
        self.rect.x = x;
        self.rect.y = y;
    }

    /// Movement and AI step for one tick.
    ///
    /// Controller input is ignored while attacking, dead, or once the round
    /// is over; gravity, arena clamping, facing and the cooldown count-down
    /// always run. Returns the attack performed this tick, if any.
    pub fn move_fighter(
        &mut self,
        arena: ArenaSize,
        opponent: &mut Fighter,
        input: &InputState,
        round_over: bool,
    ) -> Result<Option<AttackOutcome>, CombatError> {
        let speed = self.speed;
        let mut dx = 0.0;
        let mut dy = 0.0;
        let mut jump = false;
        let mut wanted: Option<MoveKey> = None;
        self.running = false;

        if !self.attacking && self.alive && !round_over {
            match &mut self.controller {
                Controller::Human(bindings) => {
                    if input.is_down(bindings.left) {
                        dx = -speed;
                        self.running = true;
                    }
                    if input.is_down(bindings.right) {
                        dx = speed;
                        self.running = true;
                    }
                    jump = input.just_pressed(bindings.jump);
                    wanted = bindings.pressed_move(&self.moves, input);
                }
                Controller::Ai(policy) => {
                    let own_x = self.rect.center_x();
                    let target_x = opponent.rect.center_x();
                    if own_x < target_x - self.tuning.ai_dead_zone {
                        dx = speed;
                    } else if own_x > target_x + self.tuning.ai_dead_zone {
                        dx = -speed;
                    }
                    self.running = dx != 0.0;
                    if (own_x - target_x).abs() < self.tuning.ai_engage_distance && !self.attacking
                    {
                        let ctx = AiContext {
                            moves: &self.moves,
                            own_rect: self.rect,
                            opponent_rect: opponent.rect,
                        };
                        wanted = policy.select_move(&ctx);
                    }
                }
            }
        }

        if jump {
            self.jump();
        }
        // physics still runs when the attack fails
        let outcome = match wanted {
            Some(key) => self.attack(opponent, key),
            None => Ok(None),
        };

        self.vel_y += self.tuning.gravity;
        dy += self.vel_y;

        if self.rect.left() + dx < 0.0 {
            dx = -self.rect.left();
        }
        if self.rect.right() + dx > arena.width {
            dx = arena.width - self.rect.right();
        }

        let floor = arena.height - self.tuning.ground_offset;
        if self.rect.bottom() + dy > floor {
            self.vel_y = 0.0;
            self.airborne = false;
            dy = floor - self.rect.bottom();
        }

        self.flip = opponent.rect.center_x() < self.rect.center_x();

        if self.attack_cooldown > 0 {
            self.attack_cooldown -= 1;
        }

        self.rect.x += dx;
        self.rect.y += dy;

        outcome
    }

    /// Return to the starting state of a round at `(x, y)`. Character,
    /// controller and clips are kept.
    pub fn reset_for_round(&mut self, x: f32, y: f32) {
        self.rect = Rect::new(x, y, self.tuning.width, self.tuning.height);
        self.vel_y = 0.0;
        self.flip = self.slot == PlayerSlot::Two;
        self.running = false;
        self.airborne = false;
        self.health = self.base_health;
        self.alive = self.base_health > 0;
        self.attacking = false;
        self.hit = false;
        self.attack_cooldown = 0;
        self.attack_row = rows::ATTACK;
        self.attacks_done = 0;
        self.state = ActionState::Idle;
        self.action = rows::IDLE;
        self.frame_index = 0;
        self.frame_elapsed = 0.0;
        self.last_persisted = None;
    }

    /// Start a jump if standing on the floor.
    pub fn jump(&mut self) {
        if !self.airborne && self.alive {
            self.vel_y = self.tuning.jump_impulse;
            self.airborne = true;
        }
    }

    /// Throw the move bound to `key` at `target`.
    ///
    /// Unknown keys are an error. On cooldown, while already attacking or
    /// when dead the call does nothing and returns `Ok(None)`.
    pub fn attack(
        &mut self,
        target: &mut Fighter,
        key: MoveKey,
    ) -> Result<Option<AttackOutcome>, CombatError> {
        let definition = *self.moves.get(key).ok_or_else(|| CombatError::UnknownMove {
            character: self.character.clone(),
            key,
        })?;

        if self.attack_cooldown > 0 || self.attacking || !self.alive {
            return Ok(None);
        }

        self.attacking = true;
        self.attack_row = definition.animation_row;
        self.attacks_done += 1;

        let connected = self.attack_hitbox().overlaps(&target.rect);
        let damage_dealt = if connected {
            target.apply_damage(definition.damage)
        } else {
            0
        };

        self.attack_cooldown = definition.cooldown;

        Ok(Some(AttackOutcome {
            key,
            connected,
            damage_dealt,
            sound: self.sound.clone(),
        }))
    }

    /// Rectangle tested by an attack: from the centre, two widths towards
    /// the facing side, same height as the fighter.
    pub fn attack_hitbox(&self) -> Rect {
        let reach = 2.0 * self.rect.w;
        let x = if self.flip {
            self.rect.center_x() - reach
        } else {
            self.rect.center_x()
        };
        Rect::new(x, self.rect.y, reach, self.rect.h)
    }

    /// Remove health, flag the hit reaction and return the health removed.
    /// Health never goes below zero and `alive` never comes back.
    pub fn apply_damage(&mut self, damage: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_sub(damage);
        self.hit = true;
        if self.health == 0 {
            self.alive = false;
        }
        before - self.health
    }

    /// Resolve the visible action and advance the animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.health == 0 {
            self.alive = false;
        }

        let state = resolve_action(&self.flags());
        let row = state.row(self.attack_row);
        if state != self.state || row != self.action {
            self.state = state;
            self.action = row;
            self.frame_index = 0;
            self.frame_elapsed = 0.0;
        }

        let len = self.clips.len(self.action);
        if self.frame_index >= len {
            self.frame_index = 0;
        }

        self.frame_elapsed += dt;
        if self.frame_elapsed > self.tuning.frame_duration {
            self.frame_index += 1;
            self.frame_elapsed = 0.0;
        }

        if self.frame_index >= len {
            if !self.alive {
                self.frame_index = len - 1;
            } else {
                self.frame_index = 0;
                if self.state.is_one_shot() {
                    // a finished hit also cancels the interrupted attack
                    self.attacking = false;
                    if self.state == ActionState::TakingHit {
                        self.hit = false;
                    }
                }
            }
        }
    }

    fn flags(&self) -> ActionFlags {
        ActionFlags {
            dead: !self.alive,
            hit: self.hit,
            attacking: self.attacking,
            airborne: self.airborne,
            running: self.running,
        }
    }

    pub fn current_frame(&self) -> Frame {
        self.clips.frame(self.action, self.frame_index)
    }

    pub fn stat_snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            health: self.health,
            attacks_done: self.attacks_done,
            alive: self.alive,
        }
    }

    /// Snapshot to persist, if the fighter is named and changed since the
    /// last successful write.
    pub fn dirty_snapshot(&self) -> Option<(&str, StatSnapshot)> {
        let name = self.name.as_deref()?;
        let snapshot = self.stat_snapshot();
        if self.last_persisted == Some(snapshot) {
            None
        } else {
            Some((name, snapshot))
        }
    }

    pub fn mark_persisted(&mut self, snapshot: StatSnapshot) {
        self.last_persisted = Some(snapshot);
    }

    /// Name shown in the HUD and used for result bookkeeping.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.character)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn vel_y(&self) -> f32 {
        self.vel_y
    }

    pub fn flip(&self) -> bool {
        self.flip
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn base_health(&self) -> u32 {
        self.base_health
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn is_hit(&self) -> bool {
        self.hit
    }

    pub fn attack_cooldown(&self) -> u32 {
        self.attack_cooldown
    }

    pub fn attacks_done(&self) -> u32 {
        self.attacks_done
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn action(&self) -> usize {
        self.action
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn moves(&self) -> &MoveSet {
        &self.moves
    }

    pub fn clips(&self) -> &AnimationClips {
        &self.clips
    }
}
