// src/session.rs - Lock/unlock gate with an optional idle watchdog
use crate::gesture::Gesture;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The unlock gesture opened the session; nothing to dispatch.
    Unlocked,
    /// Session is open; hand the gesture to the dispatcher.
    Forward(Gesture),
    /// Session is locked and the gesture is not the unlock gesture.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    state: SessionState,
    unlock_gesture: Gesture,
    idle_timeout: Option<Duration>,
    last_hand_seen: Option<Instant>,
}

impl SessionGate {
    pub fn new(unlock_gesture: Gesture, idle_timeout: Option<Duration>) -> Self {
        Self {
            state: SessionState::Locked,
            unlock_gesture,
            idle_timeout,
            last_hand_seen: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == SessionState::Locked
    }

    /// Watchdog check, run on every processed frame before anything else.
    /// Returns true when this call moved an open session to LOCKED.
    pub fn check_idle(&mut self, now: Instant) -> bool {
        let Some(timeout) = self.idle_timeout else {
            return false;
        };
        let last = *self.last_hand_seen.get_or_insert(now);
        if now.saturating_duration_since(last) < timeout {
            return false;
        }

        let was_unlocked = self.state == SessionState::Unlocked;
        self.state = SessionState::Locked;
        if was_unlocked {
            info!(idle_secs = timeout.as_secs_f64(), "no hand seen, session locked");
        }
        was_unlocked
    }

    /// Re-arms the watchdog.
    pub fn hand_seen(&mut self, now: Instant) {
        self.last_hand_seen = Some(now);
    }

    pub fn admit(&mut self, gesture: Gesture) -> GateDecision {
        match self.state {
            SessionState::Locked if gesture == self.unlock_gesture => {
                self.state = SessionState::Unlocked;
                info!(gesture = %gesture, "session unlocked");
                GateDecision::Unlocked
            }
            SessionState::Locked => GateDecision::Discarded,
            // the unlock gesture is an ordinary command once open
            SessionState::Unlocked => GateDecision::Forward(gesture),
        }
    }
}
