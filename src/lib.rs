//! Duel Stage library.
//!
//! A two-fighter arena brawler on `bevy_ecs`: fighters, the round state
//! machine, storage of characters and users, and post-round progression.
//! The binary adds a raylib front end behind the `render` feature and a
//! headless simulation mode.

pub mod components;
pub mod events;
pub mod game;
pub mod progression;
pub mod resources;
pub mod storage;
pub mod systems;
