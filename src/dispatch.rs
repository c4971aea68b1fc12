// src/dispatch.rs - Gesture to command mapping with per-gesture cooldowns
use crate::gesture::{Command, Gesture};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// What a stable gesture does once the session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Binding {
    Command(Command),
    /// Chooses between two commands by the vertical movement of the index
    /// fingertip since the previous evaluation: up (smaller y) or down.
    Directional { up: Command, down: Command },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    Fired(Command),
    CoolingDown { remaining: Duration },
    /// First directional evaluation; only records the fingertip position.
    Primed,
    /// Fingertip moved less than the noise threshold.
    NoMovement { delta: f64 },
    Unbound,
}

impl Dispatch {
    pub fn command(&self) -> Option<Command> {
        match self {
            Self::Fired(command) => Some(*command),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CooldownDispatcher {
    bindings: HashMap<Gesture, Binding>,
    cooldowns: HashMap<Gesture, Duration>,
    default_cooldown: Duration,
    direction_threshold: f64,
    last_fired: HashMap<Gesture, Instant>,
    last_fingertip_y: HashMap<Gesture, f64>,
}

impl CooldownDispatcher {
    pub fn new(
        bindings: HashMap<Gesture, Binding>,
        cooldowns: HashMap<Gesture, Duration>,
        default_cooldown: Duration,
        direction_threshold: f64,
    ) -> Self {
        Self {
            bindings,
            cooldowns,
            default_cooldown,
            direction_threshold,
            last_fired: HashMap::new(),
            last_fingertip_y: HashMap::new(),
        }
    }

    pub fn cooldown(&self, gesture: Gesture) -> Duration {
        self.cooldowns
            .get(&gesture)
            .copied()
            .unwrap_or(self.default_cooldown)
    }

    pub fn last_fired(&self, gesture: Gesture) -> Option<Instant> {
        self.last_fired.get(&gesture).copied()
    }

    /// Maps a stable gesture from an open session to at most one command.
    /// Suppressed events leave the cooldown table untouched.
    pub fn dispatch(&mut self, gesture: Gesture, fingertip_y: f64, now: Instant) -> Dispatch {
        if gesture == Gesture::NoHand {
            return Dispatch::Unbound;
        }
        let Some(binding) = self.bindings.get(&gesture).copied() else {
            return Dispatch::Unbound;
        };

        let cooldown = self.cooldown(gesture);
        if let Some(last) = self.last_fired.get(&gesture) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < cooldown {
                let remaining = cooldown - elapsed;
                debug!(gesture = %gesture, remaining_ms = remaining.as_millis() as u64, "cooling down");
                return Dispatch::CoolingDown { remaining };
            }
        }

        let command = match binding {
            Binding::Command(command) => command,
            Binding::Directional { up, down } => {
                let Some(previous) = self.last_fingertip_y.insert(gesture, fingertip_y) else {
                    return Dispatch::Primed;
                };
                let delta = fingertip_y - previous;
                if delta.abs() < self.direction_threshold {
                    debug!(gesture = %gesture, delta, "fingertip movement below threshold");
                    return Dispatch::NoMovement { delta };
                }
                if delta < 0.0 {
                    up
                } else {
                    down
                }
            }
        };

        self.last_fired.insert(gesture, now);
        Dispatch::Fired(command)
    }
}
