//! Event types and observers.
//!
//! Submodules:
//! - [`audio`] – commands and replies of the audio backend
//! - [`gamestate`] – state transition notifications for the high-level game flow
//! - [`round`] – round results and the observer that records them
pub mod audio;
pub mod gamestate;
pub mod round;
