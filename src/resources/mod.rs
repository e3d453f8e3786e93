//! ECS resources made available to systems.
//!
//! Overview
//! - `animationstore` – per-character animation clips
//! - `audio` – bridge and channels for the background audio thread (`render`)
//! - `characters` – character and move definitions
//! - `gameconfig` – INI-backed settings
//! - `gamestate` – authoritative and pending high-level game state
//! - `input` – per-frame keyboard snapshot
//! - `matchstate` – round state machine, score and match request
//! - `storage` – injected repositories and result sink
//! - `statehooks` – enter hooks of the game states
//! - `texturestore` – sprite sheets keyed by character (`render`)
//! - `worldtime` – simulation time and delta
pub mod animationstore;
#[cfg(feature = "render")]
pub mod audio;
pub mod characters;
pub mod gameconfig;
pub mod gamestate;
pub mod input;
pub mod matchstate;
pub mod statehooks;
pub mod storage;
#[cfg(feature = "render")]
pub mod texturestore;
pub mod worldtime;
