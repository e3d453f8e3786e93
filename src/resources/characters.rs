//! Character data model.
//!
//! A [`CharacterDefinition`] is owned by the character repository and is
//! read-only to the fight: it carries sprite-sheet geometry, base stats and
//! the ordered move list. At fighter construction the move list is resolved
//! into a [`MoveSet`], a small dense table keyed by [`MoveKey`], so combat
//! never does string lookups.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::resources::input::Key;

/// Animation rows shared by every character sheet.
pub mod rows {
    pub const IDLE: usize = 0;
    pub const RUN: usize = 1;
    pub const JUMP: usize = 2;
    pub const FALL: usize = 3;
    pub const ATTACK: usize = 4;
    pub const TAKE_HIT: usize = 5;
    pub const DEATH: usize = 6;
}

/// Identifier of a move: the key it is bound to.
pub type MoveKey = Key;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub health: u32,
    pub speed: f32,
    pub damage: u32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            health: 100,
            speed: 10.0,
            damage: 10,
        }
    }
}

/// A single attack of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDefinition {
    pub damage: u32,
    /// Ticks before the fighter may attack again.
    pub cooldown: u32,
    pub animation_row: usize,
}

/// Serialized form of one entry of a character's move list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEntry {
    pub key: MoveKey,
    #[serde(flatten)]
    pub definition: MoveDefinition,
}

/// Character definition as stored in `characters.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub sprite_sheet_path: String,
    #[serde(default)]
    pub sound_path: Option<String>,
    pub frame_width: f32,
    pub frame_height: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub offset: [f32; 2],
    /// Frame count of each animation row, indexed by row.
    pub animation_steps: Vec<usize>,
    #[serde(default)]
    pub stats: BaseStats,
    #[serde(default)]
    pub moves: Vec<MoveEntry>,
}

/// Longest animation row a sheet may declare.
pub const MAX_ROW_FRAMES: usize = 64;

fn default_scale() -> f32 {
    1.0
}

impl CharacterDefinition {
    /// Check the invariants the fight relies on. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        if self.stats.health == 0 {
            problems.push("base health must be positive".to_string());
        }
        if self.frame_width <= 0.0 || self.frame_height <= 0.0 {
            problems.push("frame size must be positive".to_string());
        }
        if self.animation_steps.first().copied().unwrap_or(0) == 0 {
            problems.push("Idle row needs at least one frame".to_string());
        }
        for (row, &steps) in self.animation_steps.iter().enumerate() {
            if steps > MAX_ROW_FRAMES {
                problems.push(format!(
                    "animation row {row} declares {steps} frames (at most {MAX_ROW_FRAMES})"
                ));
            }
        }
        for (i, entry) in self.moves.iter().enumerate() {
            if entry.key.is_movement() {
                problems.push(format!("move key {} is reserved for movement", entry.key));
            }
            if entry.key.is_digit() {
                problems.push(format!("move key {} is reserved for player two", entry.key));
            }
            if self.moves[..i].iter().any(|e| e.key == entry.key) {
                problems.push(format!("move key {} is bound twice", entry.key));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Resolved move table of one fighter, in definition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveSet {
    moves: SmallVec<[(MoveKey, MoveDefinition); 8]>,
}

impl MoveSet {
    pub fn from_entries(entries: &[MoveEntry]) -> Self {
        let mut moves: SmallVec<[(MoveKey, MoveDefinition); 8]> = SmallVec::new();
        for entry in entries {
            // first binding wins
            if !moves.iter().any(|(k, _)| *k == entry.key) {
                moves.push((entry.key, entry.definition));
            }
        }
        Self { moves }
    }

    pub fn get(&self, key: MoveKey) -> Option<&MoveDefinition> {
        self.moves.iter().find(|(k, _)| *k == key).map(|(_, m)| m)
    }

    pub fn first(&self) -> Option<MoveKey> {
        self.moves.first().map(|(k, _)| *k)
    }

    pub fn keys(&self) -> impl Iterator<Item = MoveKey> + '_ {
        self.moves.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MoveKey, &MoveDefinition)> + '_ {
        self.moves.iter().map(|(k, m)| (*k, m))
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_definition() -> CharacterDefinition {
        CharacterDefinition {
            sprite_sheet_path: "assets/images/warrior/warrior.png".to_string(),
            sound_path: Some("assets/audio/sword.wav".to_string()),
            frame_width: 162.0,
            frame_height: 162.0,
            scale: 4.0,
            offset: [72.0, 56.0],
            animation_steps: vec![10, 8, 1, 7, 7, 3, 7],
            stats: BaseStats::default(),
            moves: vec![
                MoveEntry {
                    key: Key::R,
                    definition: MoveDefinition {
                        damage: 10,
                        cooldown: 20,
                        animation_row: rows::ATTACK,
                    },
                },
                MoveEntry {
                    key: Key::T,
                    definition: MoveDefinition {
                        damage: 25,
                        cooldown: 60,
                        animation_row: rows::FALL,
                    },
                },
            ],
        }
    }

    #[test]
    fn moveset_keeps_definition_order() {
        let def = sample_definition();
        let set = MoveSet::from_entries(&def.moves);
        assert_eq!(set.len(), 2);
        assert_eq!(set.first(), Some(Key::R));
        assert_eq!(set.keys().collect::<Vec<_>>(), vec![Key::R, Key::T]);
        assert_eq!(set.get(Key::T).unwrap().damage, 25);
        assert!(set.get(Key::Y).is_none());
    }

    #[test]
    fn moveset_first_binding_wins() {
        let entry = |damage| MoveEntry {
            key: Key::R,
            definition: MoveDefinition {
                damage,
                cooldown: 1,
                animation_row: rows::ATTACK,
            },
        };
        let set = MoveSet::from_entries(&[entry(5), entry(50)]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(Key::R).unwrap().damage, 5);
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(sample_definition().validate().is_ok());
    }

    #[test]
    fn validate_rejects_movement_bindings_and_empty_idle() {
        let mut def = sample_definition();
        def.moves[0].key = Key::A;
        def.animation_steps[0] = 0;
        let problems = def.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn validate_rejects_digit_bindings_and_oversized_rows() {
        let mut def = sample_definition();
        def.moves[1].key = Key::Num1;
        def.animation_steps[2] = usize::MAX;
        let problems = def.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("animation row 2"));
        assert!(problems[1].contains("player two"));
    }

    #[test]
    fn definition_json_roundtrip_shape() {
        let json = r#"{
            "sprite_sheet_path": "sheet.png",
            "frame_width": 100, "frame_height": 100,
            "animation_steps": [4, 8, 1],
            "stats": {"health": 120, "speed": 8, "damage": 12},
            "moves": [{"key": "K_r", "damage": 20, "cooldown": 5, "animation_row": 4}]
        }"#;
        let def: CharacterDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.scale, 1.0);
        assert_eq!(def.offset, [0.0, 0.0]);
        assert_eq!(def.stats.health, 120);
        assert_eq!(def.moves[0].key, Key::R);
        assert_eq!(def.moves[0].definition.cooldown, 5);
    }
}
