//! Game configuration resource.
//!
//! Manages game settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1000
//! height = 600
//! target_fps = 60
//! vsync = true
//! fullscreen = false
//!
//! [arena]
//! width = 1000
//! height = 600
//!
//! [combat]
//! gravity = 2
//! jump_impulse = -30
//! ground_offset = 110
//! fighter_width = 80
//! fighter_height = 180
//! ai_dead_zone = 30
//! ai_engage_distance = 150
//! animation_frame_ms = 50
//! p1_start_x = 200
//! p2_start_x = 700
//! start_y = 310
//!
//! [round]
//! intro_seconds = 3
//! round_cooldown_ms = 2000
//!
//! [audio]
//! music_path = assets/audio/music.mp3
//! music_volume = 50
//! fx_volume = 50
//!
//! [data]
//! dir = ./data
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::components::fighter::FighterTuning;

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1000;
const DEFAULT_WINDOW_HEIGHT: u32 = 600;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_VSYNC: bool = true;
const DEFAULT_FULLSCREEN: bool = false;
const DEFAULT_INTRO_SECONDS: u32 = 3;
const DEFAULT_ROUND_COOLDOWN_MS: u32 = 2000;
const DEFAULT_VOLUME: u32 = 50;
const DEFAULT_MUSIC_PATH: &str = "assets/audio/music.mp3";
const DEFAULT_ANIMATION_FRAME_MS: u32 = 50;
const DEFAULT_P1_START_X: f32 = 200.0;
const DEFAULT_P2_START_X: f32 = 700.0;
const DEFAULT_START_Y: f32 = 310.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_DATA_DIR: &str = "./data";

/// Game configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Target frames per second. Also the fixed tick rate of headless runs.
    pub target_fps: u32,
    /// Enable vertical sync.
    pub vsync: bool,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Logical arena width used by physics.
    pub arena_width: f32,
    /// Logical arena height used by physics.
    pub arena_height: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub ground_offset: f32,
    pub fighter_width: f32,
    pub fighter_height: f32,
    pub ai_dead_zone: f32,
    pub ai_engage_distance: f32,
    /// Milliseconds each animation frame stays on screen.
    pub animation_frame_ms: u32,
    pub p1_start_x: f32,
    pub p2_start_x: f32,
    pub start_y: f32,
    /// Intro countdown length in seconds.
    pub intro_seconds: u32,
    /// Delay before the round-over menu accepts input.
    pub round_cooldown_ms: u32,
    /// Background track; an empty `music_path` disables music.
    pub music_path: Option<String>,
    /// Music volume, 0..=100.
    pub music_volume: u32,
    /// Sound effect volume, 0..=100.
    pub fx_volume: u32,
    /// Directory holding the JSON repositories.
    pub data_dir: PathBuf,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        let tuning = FighterTuning::default();
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            vsync: DEFAULT_VSYNC,
            fullscreen: DEFAULT_FULLSCREEN,
            arena_width: DEFAULT_WINDOW_WIDTH as f32,
            arena_height: DEFAULT_WINDOW_HEIGHT as f32,
            gravity: tuning.gravity,
            jump_impulse: tuning.jump_impulse,
            ground_offset: tuning.ground_offset,
            fighter_width: tuning.width,
            fighter_height: tuning.height,
            ai_dead_zone: tuning.ai_dead_zone,
            ai_engage_distance: tuning.ai_engage_distance,
            animation_frame_ms: DEFAULT_ANIMATION_FRAME_MS,
            p1_start_x: DEFAULT_P1_START_X,
            p2_start_x: DEFAULT_P2_START_X,
            start_y: DEFAULT_START_Y,
            intro_seconds: DEFAULT_INTRO_SECONDS,
            round_cooldown_ms: DEFAULT_ROUND_COOLDOWN_MS,
            music_path: Some(DEFAULT_MUSIC_PATH.to_string()),
            music_volume: DEFAULT_VOLUME,
            fx_volume: DEFAULT_VOLUME,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply_ini(&config);

        info!(
            "Loaded config: {}x{} window, fps={}, vsync={}, fullscreen={}, arena {}x{}, data={:?}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.vsync,
            self.fullscreen,
            self.arena_width,
            self.arena_height,
            self.data_dir
        );

        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply_ini(&config);
        Ok(())
    }

    fn apply_ini(&mut self, config: &Ini) {
        let uint = |section: &str, key: &str| config.getuint(section, key).ok().flatten();
        let float = |section: &str, key: &str| config.getfloat(section, key).ok().flatten();
        let boolean = |section: &str, key: &str| config.getbool(section, key).ok().flatten();

        // [window] section
        if let Some(width) = uint("window", "width") {
            self.window_width = width as u32;
        }
        if let Some(height) = uint("window", "height") {
            self.window_height = height as u32;
        }
        if let Some(fps) = uint("window", "target_fps") {
            self.target_fps = (fps as u32).max(1);
        }
        if let Some(vsync) = boolean("window", "vsync") {
            self.vsync = vsync;
        }
        if let Some(fullscreen) = boolean("window", "fullscreen") {
            self.fullscreen = fullscreen;
        }

        // [arena] section
        if let Some(width) = float("arena", "width") {
            self.arena_width = width as f32;
        }
        if let Some(height) = float("arena", "height") {
            self.arena_height = height as f32;
        }

        // [combat] section
        let combat: [(&str, &mut f32); 10] = [
            ("gravity", &mut self.gravity),
            ("jump_impulse", &mut self.jump_impulse),
            ("ground_offset", &mut self.ground_offset),
            ("fighter_width", &mut self.fighter_width),
            ("fighter_height", &mut self.fighter_height),
            ("ai_dead_zone", &mut self.ai_dead_zone),
            ("ai_engage_distance", &mut self.ai_engage_distance),
            ("p1_start_x", &mut self.p1_start_x),
            ("p2_start_x", &mut self.p2_start_x),
            ("start_y", &mut self.start_y),
        ];
        for (key, slot) in combat {
            if let Some(value) = float("combat", key) {
                *slot = value as f32;
            }
        }
        if let Some(ms) = uint("combat", "animation_frame_ms") {
            self.animation_frame_ms = ms as u32;
        }

        // [round] section
        if let Some(seconds) = uint("round", "intro_seconds") {
            self.intro_seconds = seconds as u32;
        }
        if let Some(ms) = uint("round", "round_cooldown_ms") {
            self.round_cooldown_ms = ms as u32;
        }

        // [audio] section
        if let Some(path) = config.get("audio", "music_path") {
            let path = path.trim();
            self.music_path = (!path.is_empty()).then(|| path.to_string());
        }
        if let Some(vol) = uint("audio", "music_volume") {
            self.music_volume = (vol as u32).min(100);
        }
        if let Some(vol) = uint("audio", "fx_volume") {
            self.fx_volume = (vol as u32).min(100);
        }

        // [data] section
        if let Some(dir) = config.get("data", "dir") {
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let config = self.to_ini();
        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    fn to_ini(&self) -> Ini {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "vsync", Some(self.vsync.to_string()));
        config.set("window", "fullscreen", Some(self.fullscreen.to_string()));

        config.set("arena", "width", Some(self.arena_width.to_string()));
        config.set("arena", "height", Some(self.arena_height.to_string()));

        config.set("combat", "gravity", Some(self.gravity.to_string()));
        config.set("combat", "jump_impulse", Some(self.jump_impulse.to_string()));
        config.set("combat", "ground_offset", Some(self.ground_offset.to_string()));
        config.set("combat", "fighter_width", Some(self.fighter_width.to_string()));
        config.set("combat", "fighter_height", Some(self.fighter_height.to_string()));
        config.set("combat", "ai_dead_zone", Some(self.ai_dead_zone.to_string()));
        config.set(
            "combat",
            "ai_engage_distance",
            Some(self.ai_engage_distance.to_string()),
        );
        config.set(
            "combat",
            "animation_frame_ms",
            Some(self.animation_frame_ms.to_string()),
        );
        config.set("combat", "p1_start_x", Some(self.p1_start_x.to_string()));
        config.set("combat", "p2_start_x", Some(self.p2_start_x.to_string()));
        config.set("combat", "start_y", Some(self.start_y.to_string()));

        config.set("round", "intro_seconds", Some(self.intro_seconds.to_string()));
        config.set(
            "round",
            "round_cooldown_ms",
            Some(self.round_cooldown_ms.to_string()),
        );

        config.set(
            "audio",
            "music_path",
            Some(self.music_path.clone().unwrap_or_default()),
        );
        config.set("audio", "music_volume", Some(self.music_volume.to_string()));
        config.set("audio", "fx_volume", Some(self.fx_volume.to_string()));

        config.set("data", "dir", Some(self.data_dir.display().to_string()));

        config
    }

    /// Physics and AI constants handed to every fighter.
    pub fn fighter_tuning(&self) -> FighterTuning {
        FighterTuning {
            gravity: self.gravity,
            jump_impulse: self.jump_impulse,
            ground_offset: self.ground_offset,
            width: self.fighter_width,
            height: self.fighter_height,
            ai_dead_zone: self.ai_dead_zone,
            ai_engage_distance: self.ai_engage_distance,
            frame_duration: self.animation_frame_ms as f32 / 1000.0,
        }
    }

    /// Fixed simulation step in seconds.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tuning() {
        let config = GameConfig::new();
        assert_eq!(config.fighter_tuning(), FighterTuning::default());
        assert_eq!(config.intro_seconds, 3);
        assert_eq!(config.round_cooldown_ms, 2000);
        assert_eq!(config.window_size(), (1000, 600));
    }

    #[test]
    fn partial_ini_keeps_defaults() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[combat]\ngravity = 3\nanimation_frame_ms = 100\n[data]\ndir = /tmp/duel\n")
            .unwrap();
        assert_eq!(config.gravity, 3.0);
        assert_eq!(config.jump_impulse, -30.0);
        assert_eq!(config.fighter_tuning().frame_duration, 0.1);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/duel"));
        assert_eq!(config.target_fps, 60);
    }

    #[test]
    fn volumes_are_clamped() {
        let mut config = GameConfig::new();
        config.load_from_str("[audio]\nfx_volume = 250\n").unwrap();
        assert_eq!(config.fx_volume, 100);
    }

    #[test]
    fn empty_music_path_disables_music() {
        let mut config = GameConfig::new();
        assert_eq!(config.music_path.as_deref(), Some("assets/audio/music.mp3"));
        config
            .load_from_str("[audio]\nmusic_path =\nmusic_volume = 30\n")
            .unwrap();
        assert_eq!(config.music_path, None);
        assert_eq!(config.music_volume, 30);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut config = GameConfig::with_path("/nonexistent/duelstage.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.target_fps, 60);
    }

    #[test]
    fn saved_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        let mut config = GameConfig::with_path(&path);
        config.p2_start_x = 650.0;
        config.round_cooldown_ms = 1500;
        config.save_to_file().unwrap();

        let mut loaded = GameConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.p2_start_x, 650.0);
        assert_eq!(loaded.round_cooldown_ms, 1500);
        assert_eq!(loaded.music_path, config.music_path);
    }
}
