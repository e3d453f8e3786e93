//! Audio systems.
//!
//! Gameplay writes [`AudioCmd`] messages (load a fighter's sound, play it on
//! a successful attack) and never waits for them. [`update_bevy_audio_cmds`]
//! advances that queue every tick so unread commands expire; headless runs
//! need nothing more.
//!
//! With the `render` feature a dedicated thread owns the raylib audio device:
//! - [`audio_thread`] processes commands and reports back with
//!   [`AudioMessage`]
//! - [`forward_audio_cmds`] sends this tick's commands over the channel
//! - [`poll_audio_messages`] drains the thread's replies into the ECS
//!
//! See [`crate::resources::audio`] for starting and stopping the thread.

use bevy_ecs::prelude::*;

use crate::events::audio::AudioCmd;

/// Advance the ECS message queue for AudioCmd so same-frame readers can observe writes.
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

#[cfg(feature = "render")]
pub use threaded::*;

#[cfg(feature = "render")]
mod threaded {
    use bevy_ecs::prelude::*;
    use crossbeam_channel::{Receiver, Sender};
    use log::{debug, error, info, warn};
    use raylib::core::audio::{Music, RaylibAudio, Sound};
    use rustc_hash::{FxHashMap, FxHashSet};

    use crate::events::audio::{AudioCmd, AudioMessage};
    use crate::resources::audio::AudioBridge;

    /// Drain pending replies of the audio thread into `Messages<AudioMessage>`.
    pub fn poll_audio_messages(bridge: Res<AudioBridge>, mut writer: MessageWriter<AudioMessage>) {
        writer.write_batch(bridge.rx_msg.try_iter());
    }

    pub fn update_bevy_audio_messages(mut msgs: ResMut<Messages<AudioMessage>>) {
        msgs.update();
    }

    /// Log failed loads; a fighter without its sound still fights.
    pub fn report_audio_messages(mut reader: MessageReader<AudioMessage>) {
        for msg in reader.read() {
            match msg {
                AudioMessage::MusicLoadFailed { id, error } => {
                    warn!("Music '{}' could not be loaded: {}", id, error)
                }
                AudioMessage::FxLoadFailed { id, error } => {
                    warn!("Sound '{}' could not be loaded: {}", id, error)
                }
                other => debug!("{:?}", other),
            }
        }
    }

    /// Forward this tick's AudioCmd messages to the audio thread.
    pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
        for cmd in reader.read() {
            // the thread may already be gone during shutdown
            let _ = bridge.tx_cmd.send(cmd.clone());
        }
    }

    /// Entry point of the dedicated audio thread.
    ///
    /// Owns every `Music` and `Sound` handle and blocks until it receives
    /// [`AudioCmd::Shutdown`]. Music streams are pumped between command
    /// batches; a finished non-looped track is reported once.
    pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_msg: Sender<AudioMessage>) {
        let audio = match RaylibAudio::init_audio_device() {
            Ok(device) => device,
            Err(e) => {
                error!("Failed to initialize audio device: {}", e);
                return;
            }
        };
        info!("Audio thread started");

        let mut musics: FxHashMap<String, Music> = FxHashMap::default();
        let mut playing: FxHashSet<String> = FxHashSet::default();
        let mut looped: FxHashSet<String> = FxHashSet::default();
        let mut sounds: FxHashMap<String, Sound> = FxHashMap::default();
        let mut fx_volume = 1.0;

        'run: loop {
            for cmd in rx_cmd.try_iter() {
                match cmd {
                    AudioCmd::LoadMusic { id, path } => match audio.new_music(&path) {
                        Ok(music) => {
                            debug!("Music '{}' loaded from {}", id, path);
                            musics.insert(id.clone(), music);
                            let _ = tx_msg.send(AudioMessage::MusicLoaded { id });
                        }
                        Err(e) => {
                            let _ = tx_msg.send(AudioMessage::MusicLoadFailed {
                                id,
                                error: e.to_string(),
                            });
                        }
                    },
                    AudioCmd::PlayMusic {
                        id,
                        looped: want_loop,
                    } => {
                        if let Some(music) = musics.get(&id) {
                            music.seek_stream(0.0);
                            music.play_stream();
                            if want_loop {
                                looped.insert(id.clone());
                            } else {
                                looped.remove(&id);
                            }
                            playing.insert(id);
                        }
                    }
                    AudioCmd::StopMusic { id } => {
                        if let Some(music) = musics.get(&id) {
                            music.stop_stream();
                            playing.remove(&id);
                            looped.remove(&id);
                        }
                    }
                    AudioCmd::VolumeMusic { id, vol } => {
                        if let Some(music) = musics.get(&id) {
                            music.set_volume(vol);
                        }
                    }
                    AudioCmd::LoadFx { id, path } => {
                        if sounds.contains_key(&id) {
                            continue;
                        }
                        match audio.new_sound(&path) {
                            Ok(sound) => {
                                debug!("Sound '{}' loaded from {}", id, path);
                                sound.set_volume(fx_volume);
                                sounds.insert(id.clone(), sound);
                                let _ = tx_msg.send(AudioMessage::FxLoaded { id });
                            }
                            Err(e) => {
                                let _ = tx_msg.send(AudioMessage::FxLoadFailed {
                                    id,
                                    error: e.to_string(),
                                });
                            }
                        }
                    }
                    AudioCmd::PlayFx { id } => match sounds.get(&id) {
                        Some(sound) => sound.play(),
                        None => debug!("Sound '{}' not loaded", id),
                    },
                    AudioCmd::VolumeFx { vol } => {
                        fx_volume = vol;
                        for sound in sounds.values() {
                            sound.set_volume(vol);
                        }
                    }
                    AudioCmd::UnloadAllFx => sounds.clear(),
                    AudioCmd::Shutdown => {
                        musics.clear();
                        sounds.clear();
                        break 'run;
                    }
                }
            }

            let mut ended: Vec<String> = Vec::new();
            for id in playing.iter() {
                if let Some(music) = musics.get(id) {
                    if music.is_stream_playing() {
                        music.update_stream();
                    } else if music.get_time_played() >= music.get_time_length() - 0.01 {
                        ended.push(id.clone());
                    }
                }
            }
            for id in ended {
                match musics.get(&id) {
                    Some(music) if looped.contains(&id) => {
                        music.seek_stream(0.0);
                        music.play_stream();
                    }
                    _ => {
                        playing.remove(&id);
                        let _ = tx_msg.send(AudioMessage::MusicFinished { id });
                    }
                }
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        info!("Audio thread exiting");
    }
}
