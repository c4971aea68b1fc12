// src/lib.rs
//! Turns per-frame hand-gesture predictions into debounced media-player
//! commands: landmark normalization, a stabilization window, a lock/unlock
//! session gate and per-gesture cooldowns.

pub mod classifier;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod gesture;
pub mod landmarks;
pub mod pipeline;
pub mod session;
pub mod sink;
pub mod source;
pub mod stabilizer;

pub use classifier::{Classification, GestureClassifier, LinearModel, ModelError};
pub use config::{ConfigError, ControllerConfig, Profile};
pub use controller::{DisplayStatus, FrameReport, GestureController, Observation};
pub use gesture::{Command, Gesture};
pub use pipeline::{Pipeline, RunSummary, StepOutcome};
pub use session::SessionState;
