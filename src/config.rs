// src/config.rs - Controller settings, built-in profiles and JSON loading
use crate::dispatch::Binding;
use crate::gesture::{Command, Gesture};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Longest agreement window a config may ask for.
pub const MAX_STABLE_WINDOW: usize = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The two reference control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Per-gesture cooldowns, every other frame classified, no idle lock.
    #[default]
    Player,
    /// Idle auto-lock, half-second cooldowns, pinch drives volume by direction.
    Desktop,
}

impl Profile {
    pub fn config(&self) -> ControllerConfig {
        match self {
            Self::Player => ControllerConfig::player(),
            Self::Desktop => ControllerConfig::desktop(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub confidence_floor: f64,
    pub stable_window: usize,
    /// Classify every n-th frame; 1 classifies all of them.
    pub frame_skip: usize,
    pub unlock_gesture: Gesture,
    pub idle_lock_secs: Option<f64>,
    pub default_cooldown_secs: f64,
    pub cooldown_secs: BTreeMap<Gesture, f64>,
    pub bindings: BTreeMap<Gesture, Binding>,
    /// Minimum fingertip travel (normalized image units) for directional bindings.
    pub direction_threshold: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::player()
    }
}

impl ControllerConfig {
    pub fn player() -> Self {
        Self {
            confidence_floor: 0.60,
            stable_window: 2,
            frame_skip: 2,
            unlock_gesture: Gesture::Palm,
            idle_lock_secs: None,
            default_cooldown_secs: 1.0,
            cooldown_secs: BTreeMap::from([
                (Gesture::Fist, 1.5),
                (Gesture::Palm, 1.5),
                (Gesture::Pinch, 0.1),
                (Gesture::Point, 0.1),
                (Gesture::ThumbLeft, 0.8),
                (Gesture::ThumbRight, 0.8),
            ]),
            bindings: BTreeMap::from([
                (Gesture::Fist, Binding::Command(Command::TogglePlayPause)),
                (Gesture::Palm, Binding::Command(Command::TogglePlayPause)),
                (Gesture::Pinch, Binding::Command(Command::VolumeUp)),
                (Gesture::Point, Binding::Command(Command::VolumeDown)),
                (Gesture::ThumbLeft, Binding::Command(Command::Rewind)),
                (Gesture::ThumbRight, Binding::Command(Command::FastForward)),
            ]),
            direction_threshold: 0.03,
        }
    }

    pub fn desktop() -> Self {
        Self {
            confidence_floor: 0.50,
            stable_window: 2,
            frame_skip: 1,
            unlock_gesture: Gesture::Palm,
            idle_lock_secs: Some(10.0),
            default_cooldown_secs: 0.5,
            cooldown_secs: BTreeMap::new(),
            bindings: BTreeMap::from([
                (Gesture::Fist, Binding::Command(Command::TogglePlayPause)),
                (Gesture::Point, Binding::Command(Command::SeekForward)),
                (
                    Gesture::Pinch,
                    Binding::Directional {
                        up: Command::VolumeUp,
                        down: Command::VolumeDown,
                    },
                ),
            ]),
            direction_threshold: 0.03,
        }
    }

    /// `<config dir>/gesture_remote/config.json` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "gesture_remote")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads a JSON file whose top-level keys override `profile`'s defaults.
    pub fn load(path: impl AsRef<Path>, profile: Profile) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_err = |source: serde_json::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let overrides: serde_json::Value = serde_json::from_str(&raw).map_err(parse_err)?;
        let serde_json::Value::Object(overrides) = overrides else {
            return Err(ConfigError::Invalid(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        };

        let mut merged = serde_json::to_value(profile.config()).map_err(parse_err)?;
        if let serde_json::Value::Object(base) = &mut merged {
            base.extend(overrides);
        }
        let config: Self = serde_json::from_value(merged).map_err(parse_err)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path, else the default path when it exists, else the profile.
    pub fn resolve(path: Option<&Path>, profile: Profile) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path, profile),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load(path, profile),
                None => Ok(profile.config()),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return invalid(format!(
                "confidence_floor {} outside [0, 1]",
                self.confidence_floor
            ));
        }
        if !(1..=MAX_STABLE_WINDOW).contains(&self.stable_window) {
            return invalid(format!(
                "stable_window {} outside [1, {MAX_STABLE_WINDOW}]",
                self.stable_window
            ));
        }
        if self.frame_skip == 0 {
            return invalid("frame_skip must be at least 1".into());
        }
        if !is_duration(self.default_cooldown_secs) {
            return invalid(format!(
                "default_cooldown_secs {} is not a valid duration",
                self.default_cooldown_secs
            ));
        }
        if let Some((gesture, secs)) = self.cooldown_secs.iter().find(|(_, s)| !is_duration(**s)) {
            return invalid(format!("cooldown for {gesture} ({secs}) is not a valid duration"));
        }
        if let Some(secs) = self.idle_lock_secs.filter(|s| !is_duration(*s)) {
            return invalid(format!("idle_lock_secs {secs} is not a valid duration"));
        }
        if self.unlock_gesture == Gesture::NoHand {
            return invalid("NO_HAND cannot be the unlock gesture".into());
        }
        if self.bindings.contains_key(&Gesture::NoHand) {
            return invalid("NO_HAND cannot be bound to a command".into());
        }
        if !self.direction_threshold.is_finite() || self.direction_threshold < 0.0 {
            return invalid(format!(
                "direction_threshold {} must be a non-negative number",
                self.direction_threshold
            ));
        }
        Ok(())
    }

    pub fn idle_lock(&self) -> Option<Duration> {
        self.idle_lock_secs.map(to_duration)
    }

    pub fn default_cooldown(&self) -> Duration {
        to_duration(self.default_cooldown_secs)
    }

    pub fn cooldowns(&self) -> HashMap<Gesture, Duration> {
        self.cooldown_secs
            .iter()
            .map(|(gesture, secs)| (*gesture, to_duration(*secs)))
            .collect()
    }

    pub fn binding_table(&self) -> HashMap<Gesture, Binding> {
        self.bindings.iter().map(|(g, b)| (*g, *b)).collect()
    }
}

fn is_duration(secs: f64) -> bool {
    secs.is_finite() && secs >= 0.0
}

// validate() rejects anything that would not convert
fn to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
