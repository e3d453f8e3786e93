//! Messages exchanged with the audio backend.
//!
//! Gameplay systems write [`AudioCmd`] messages and never wait on them. With
//! the `render` feature the commands are forwarded to the audio thread;
//! headless runs simply let them expire.

use bevy_ecs::message::Message;

/// Commands sent *to* the audio thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioCmd {
    LoadMusic { id: String, path: String },
    PlayMusic { id: String, looped: bool },
    StopMusic { id: String },
    /// Volume in `0.0..=1.0`.
    VolumeMusic { id: String, vol: f32 },
    LoadFx { id: String, path: String },
    PlayFx { id: String },
    /// Volume in `0.0..=1.0` applied to every loaded effect.
    VolumeFx { vol: f32 },
    UnloadAllFx,
    Shutdown,
}

/// Messages sent *back* from the audio thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioMessage {
    MusicLoaded { id: String },
    MusicLoadFailed { id: String, error: String },
    MusicFinished { id: String },
    FxLoaded { id: String },
    FxLoadFailed { id: String, error: String },
}
