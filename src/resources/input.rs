//! Per-frame keyboard input resource.
//!
//! Captures the subset of keyboard state the game cares about and exposes it
//! to systems via the [`InputState`] resource. The core never touches raw
//! hardware events: the front end (see `crate::systems::input`) fills this
//! snapshot once per frame, and tests fill it by hand.
//!
//! Keys are logical [`Key`] symbols. They serialize as `K_<name>` strings
//! (`"K_r"`, `"K_UP"`) which is also how character move bindings are stored.
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Logical key symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
}

impl Key {
    /// Every key the front end polls each frame.
    pub const ALL: [Key; 43] = [
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::E,
        Key::F,
        Key::G,
        Key::H,
        Key::I,
        Key::J,
        Key::K,
        Key::L,
        Key::M,
        Key::N,
        Key::O,
        Key::P,
        Key::Q,
        Key::R,
        Key::S,
        Key::T,
        Key::U,
        Key::V,
        Key::W,
        Key::X,
        Key::Y,
        Key::Z,
        Key::Num0,
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::Num4,
        Key::Num5,
        Key::Num6,
        Key::Num7,
        Key::Num8,
        Key::Num9,
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::Space,
        Key::Enter,
        Key::Escape,
    ];

    /// Short name without the `K_` prefix. Letters and digits are lowercase.
    pub fn name(self) -> &'static str {
        match self {
            Key::A => "a",
            Key::B => "b",
            Key::C => "c",
            Key::D => "d",
            Key::E => "e",
            Key::F => "f",
            Key::G => "g",
            Key::H => "h",
            Key::I => "i",
            Key::J => "j",
            Key::K => "k",
            Key::L => "l",
            Key::M => "m",
            Key::N => "n",
            Key::O => "o",
            Key::P => "p",
            Key::Q => "q",
            Key::R => "r",
            Key::S => "s",
            Key::T => "t",
            Key::U => "u",
            Key::V => "v",
            Key::W => "w",
            Key::X => "x",
            Key::Y => "y",
            Key::Z => "z",
            Key::Num0 => "0",
            Key::Num1 => "1",
            Key::Num2 => "2",
            Key::Num3 => "3",
            Key::Num4 => "4",
            Key::Num5 => "5",
            Key::Num6 => "6",
            Key::Num7 => "7",
            Key::Num8 => "8",
            Key::Num9 => "9",
            Key::Up => "UP",
            Key::Down => "DOWN",
            Key::Left => "LEFT",
            Key::Right => "RIGHT",
            Key::Space => "SPACE",
            Key::Enter => "RETURN",
            Key::Escape => "ESCAPE",
        }
    }

    /// Attack keys of player two; the n-th move sits on `DIGITS[n]`.
    pub const DIGITS: [Key; 9] = [
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::Num4,
        Key::Num5,
        Key::Num6,
        Key::Num7,
        Key::Num8,
        Key::Num9,
    ];

    pub fn is_digit(self) -> bool {
        matches!(
            self,
            Key::Num0
                | Key::Num1
                | Key::Num2
                | Key::Num3
                | Key::Num4
                | Key::Num5
                | Key::Num6
                | Key::Num7
                | Key::Num8
                | Key::Num9
        )
    }

    /// Keys reserved for movement; they can never be bound to a move.
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            Key::W | Key::A | Key::S | Key::D | Key::Up | Key::Down | Key::Left | Key::Right
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K_{}", self.name())
    }
}

impl FromStr for Key {
    type Err = String;

    /// Accepts `K_r`, `r`, `K_UP`, `up`, `K_RETURN`, `enter`...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let bare = raw.strip_prefix("K_").unwrap_or(raw);
        let lower = bare.to_ascii_lowercase();
        let key = match lower.as_str() {
            "return" | "enter" => Key::Enter,
            "escape" | "esc" => Key::Escape,
            other => Key::ALL
                .iter()
                .copied()
                .find(|k| k.name().eq_ignore_ascii_case(other))
                .ok_or_else(|| format!("Unknown key symbol '{}'", s))?,
        };
        Ok(key)
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Snapshot of the keyboard for the current frame.
///
/// `held` holds every key that is down; `just_pressed` only the keys that went
/// down this frame. Edges are cleared by
/// [`clear_input_edges`](crate::systems::fighter::clear_input_edges) at the end
/// of each tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    held: FxHashSet<Key>,
    just_pressed: FxHashSet<Key>,
}

impl InputState {
    /// Mark `key` as down. Produces a press edge if it was up.
    pub fn press(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    /// Mark `key` as up.
    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
        self.just_pressed.remove(&key);
    }

    /// Overwrite the state of one key from a hardware poll.
    pub fn set(&mut self, key: Key, down: bool, pressed: bool) {
        if down {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
        if pressed {
            self.just_pressed.insert(key);
        } else {
            self.just_pressed.remove(&key);
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Forget press edges; held keys stay down.
    pub fn clear_edges(&mut self) {
        self.just_pressed.clear();
    }
}
