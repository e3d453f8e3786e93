//! Animation clip registry.
//!
//! This module provides a minimal store of per-character animation clips.
//! A clip is the ordered list of sprite-sheet frames of one action row. The
//! fight only ever asks for "frame `i` of row `r`", so lookups are bounds
//! checked and a malformed row resolves to a single placeholder frame instead
//! of panicking.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::warn;
use rustc_hash::FxHashMap;

use crate::components::rect::Rect;
use crate::resources::characters::{CharacterDefinition, MAX_ROW_FRAMES};

/// One renderable frame: the source rectangle inside the sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub src: Rect,
    /// Set on frames that stand in for missing sprite data.
    pub placeholder: bool,
}

impl Frame {
    pub fn placeholder() -> Self {
        Frame {
            src: Rect::new(0.0, 0.0, 1.0, 1.0),
            placeholder: true,
        }
    }
}

static PLACEHOLDER_CLIP: [Frame; 1] = [Frame {
    src: Rect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    },
    placeholder: true,
}];

/// Immutable clips of one character, indexed by action row.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClips {
    clips: Vec<Vec<Frame>>,
}

impl AnimationClips {
    /// Build clips from the character's row geometry.
    ///
    /// Rows are cut to [`MAX_ROW_FRAMES`]. When `sheet_size` is known,
    /// frames that fall outside the sheet are dropped. Rows left empty become one placeholder frame. Row 0 (Idle)
    /// always exists.
    pub fn from_definition(
        name: &str,
        def: &CharacterDefinition,
        sheet_size: Option<(f32, f32)>,
    ) -> Self {
        let (fw, fh) = (def.frame_width, def.frame_height);
        let mut clips = Vec::with_capacity(def.animation_steps.len().max(1));

        for (row, &steps) in def.animation_steps.iter().enumerate() {
            if steps > MAX_ROW_FRAMES {
                warn!(
                    "Character '{}' row {} declares {} frames; keeping {}",
                    name, row, steps, MAX_ROW_FRAMES
                );
            }
            let steps = steps.min(MAX_ROW_FRAMES);
            let mut frames = Vec::with_capacity(steps);
            if fw > 0.0 && fh > 0.0 {
                for col in 0..steps {
                    let src = Rect::new(col as f32 * fw, row as f32 * fh, fw, fh);
                    if let Some((sheet_w, sheet_h)) = sheet_size {
                        if src.right() > sheet_w || src.bottom() > sheet_h {
                            break;
                        }
                    }
                    frames.push(Frame {
                        src,
                        placeholder: false,
                    });
                }
            }
            if frames.is_empty() {
                warn!(
                    "Character '{}' has no usable frames for animation row {}; using placeholder",
                    name, row
                );
                frames.push(Frame::placeholder());
            }
            clips.push(frames);
        }

        if clips.is_empty() {
            warn!("Character '{}' has no animation rows; using placeholder Idle", name);
            clips.push(vec![Frame::placeholder()]);
        }

        Self { clips }
    }

    /// Frames of `row`. Unknown rows resolve to a one-frame placeholder clip.
    pub fn clip(&self, row: usize) -> &[Frame] {
        match self.clips.get(row) {
            Some(frames) if !frames.is_empty() => frames,
            _ => &PLACEHOLDER_CLIP,
        }
    }

    /// Frame `index` of `row`, or the placeholder when out of range.
    pub fn frame(&self, row: usize, index: usize) -> Frame {
        self.clip(row)
            .get(index)
            .copied()
            .unwrap_or_else(Frame::placeholder)
    }

    pub fn len(&self, row: usize) -> usize {
        self.clip(row).len()
    }

    pub fn rows(&self) -> usize {
        self.clips.len()
    }
}

/// Central registry of loaded clips keyed by character name.
#[derive(Resource, Default)]
pub struct AnimationStore {
    pub clips: FxHashMap<String, Arc<AnimationClips>>,
    /// Pixel size of each loaded sprite sheet, by character.
    sheet_sizes: FxHashMap<String, (f32, f32)>,
}

impl AnimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clips for `name`, building and caching them on first use.
    pub fn get_or_build(
        &mut self,
        name: &str,
        def: &CharacterDefinition,
        sheet_size: Option<(f32, f32)>,
    ) -> Arc<AnimationClips> {
        self.clips
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AnimationClips::from_definition(name, def, sheet_size)))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<AnimationClips>> {
        self.clips.get(name).cloned()
    }

    /// Drop cached clips, e.g. after a character was edited.
    pub fn invalidate(&mut self, name: &str) {
        self.clips.remove(name);
    }

    /// Record the real size of `name`'s sprite sheet. Clips built from now
    /// on are cut to it.
    pub fn set_sheet_size(&mut self, name: &str, width: f32, height: f32) {
        self.sheet_sizes.insert(name.to_string(), (width, height));
        self.invalidate(name);
    }

    pub fn sheet_size(&self, name: &str) -> Option<(f32, f32)> {
        self.sheet_sizes.get(name).copied()
    }
}
