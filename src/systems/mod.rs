//! Game systems.
//!
//! Submodules overview
//! - [`audio`] – audio command queue; the audio thread with `render`
//! - [`fighter`] – move and animate both fighters, persist their stats
//! - [`gamestate`] – check for pending state transitions and trigger events
//! - [`input`] – read the keyboard into [`crate::resources::input::InputState`] (`render`)
//! - [`menu`] – between-sessions menu
//! - [`render`] – draw the arena, fighters and HUD (`render`)
//! - [`round`] – intro countdown, KO detection and the round-over menu
//! - [`time`] – update simulation time and delta

pub mod audio;
pub mod fighter;
pub mod gamestate;
#[cfg(feature = "render")]
pub mod input;
pub mod menu;
#[cfg(feature = "render")]
pub mod render;
pub mod round;
pub mod time;
