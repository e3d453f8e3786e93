//! ECS components for entities.
//!
//! The fight has exactly two entities, one per player slot, each carrying a
//! [`fighter::Fighter`]. The other submodules hold the pieces the fighter is
//! built from.
//!
//! Submodules overview:
//! - [`animation`] – action states and the priority table that picks one
//! - [`fighter`] – movement, attacks and animation of one combatant
//! - [`inputcontrolled`] – human key bindings and CPU attack policies
//! - [`rect`] – axis-aligned rectangle used for bodies and hit-boxes

pub mod animation;
pub mod fighter;
pub mod inputcontrolled;
pub mod rect;
