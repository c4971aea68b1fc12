// src/controller.rs - Per-frame control state: stabilize, gate, dispatch
use crate::classifier::Classification;
use crate::config::ControllerConfig;
use crate::dispatch::{CooldownDispatcher, Dispatch};
use crate::gesture::{Command, Gesture};
use crate::session::{GateDecision, SessionGate, SessionState};
use crate::stabilizer::Stabilizer;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// What the controller sees on a classified frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    NoHand,
    Hand {
        classification: Classification,
        /// Index fingertip y in normalized image coordinates.
        fingertip_y: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub auto_locked: bool,
    pub stable: Option<Gesture>,
    pub gate: Option<GateDecision>,
    pub dispatch: Option<Dispatch>,
}

impl FrameReport {
    pub fn command(&self) -> Option<Command> {
        self.dispatch.and_then(|d| d.command())
    }

    pub fn unlocked(&self) -> bool {
        self.gate == Some(GateDecision::Unlocked)
    }
}

/// Read-only snapshot for an overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayStatus {
    pub state: SessionState,
    pub hand_present: bool,
    pub last_gesture: Option<Gesture>,
    pub confidence_percent: u8,
}

impl DisplayStatus {
    pub fn headline(&self) -> String {
        match (self.state, self.last_gesture) {
            (SessionState::Locked, _) => "SYSTEM LOCKED (Show Palm)".to_string(),
            (SessionState::Unlocked, _) if !self.hand_present => "CMD: NO HAND".to_string(),
            (SessionState::Unlocked, Some(gesture)) => format!("CMD: {gesture}"),
            (SessionState::Unlocked, None) => "CMD: SEARCHING...".to_string(),
        }
    }
}

/// Owns all state that survives between frames. Each call to [`step`]
/// is one classified frame; skipped frames must not call it.
///
/// [`step`]: GestureController::step
#[derive(Debug, Clone)]
pub struct GestureController {
    stabilizer: Stabilizer,
    gate: SessionGate,
    dispatcher: CooldownDispatcher,
    status: DisplayStatus,
}

impl GestureController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            stabilizer: Stabilizer::new(config.stable_window, config.confidence_floor),
            gate: SessionGate::new(config.unlock_gesture, config.idle_lock()),
            dispatcher: CooldownDispatcher::new(
                config.binding_table(),
                config.cooldowns(),
                config.default_cooldown(),
                config.direction_threshold,
            ),
            status: DisplayStatus {
                state: SessionState::Locked,
                hand_present: false,
                last_gesture: None,
                confidence_percent: 0,
            },
        }
    }

    pub fn step(&mut self, observation: Observation, now: Instant) -> FrameReport {
        let mut report = FrameReport {
            // the watchdog runs before this frame's hand can re-arm it
            auto_locked: self.gate.check_idle(now),
            ..FrameReport::default()
        };
        if report.auto_locked {
            // history from before the idle gap must not unlock this frame
            self.stabilizer.clear();
        }

        match observation {
            Observation::NoHand => {
                self.status.hand_present = false;
                self.status.confidence_percent = 0;
            }
            Observation::Hand {
                classification,
                fingertip_y,
            } => {
                self.gate.hand_seen(now);
                self.status.hand_present = true;
                self.status.confidence_percent = classification.confidence_percent();

                if let Some(gesture) = self.stabilizer.push(&classification) {
                    debug!(gesture = %gesture, confidence = classification.confidence, "stable gesture");
                    self.status.last_gesture = Some(gesture);
                    report.stable = Some(gesture);
                    let decision = self.gate.admit(gesture);
                    report.gate = Some(decision);

                    match decision {
                        GateDecision::Unlocked => self.stabilizer.clear(),
                        GateDecision::Forward(gesture) => {
                            let dispatch = self.dispatcher.dispatch(gesture, fingertip_y, now);
                            if let Dispatch::Fired(command) = dispatch {
                                info!(
                                    gesture = %gesture,
                                    confidence = classification.confidence_percent(),
                                    "action: {command}"
                                );
                            }
                            report.dispatch = Some(dispatch);
                        }
                        GateDecision::Discarded => {
                            debug!(gesture = %gesture, "session locked, gesture ignored");
                        }
                    }
                }
            }
        }

        self.status.state = self.gate.state();
        report
    }

    pub fn session_state(&self) -> SessionState {
        self.gate.state()
    }

    pub fn status(&self) -> &DisplayStatus {
        &self.status
    }

    pub fn dispatcher(&self) -> &CooldownDispatcher {
        &self.dispatcher
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use std::time::Duration;

    fn hand(label: Gesture, confidence: f64) -> Observation {
        Observation::Hand {
            classification: Classification::certain(label, confidence),
            fingertip_y: 0.5,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn unlocked(config: &ControllerConfig, t0: Instant) -> GestureController {
        let mut controller = GestureController::new(config);
        controller.step(hand(Gesture::Palm, 0.9), t0);
        assert!(controller.step(hand(Gesture::Palm, 0.9), t0 + ms(33)).unlocked());
        controller
    }

    #[test]
    fn locked_session_ignores_commands() {
        let t0 = Instant::now();
        let mut controller = GestureController::new(&ControllerConfig::player());
        controller.step(hand(Gesture::Fist, 0.9), t0);
        let report = controller.step(hand(Gesture::Fist, 0.9), t0 + ms(33));
        assert_eq!(report.stable, Some(Gesture::Fist));
        assert_eq!(report.gate, Some(GateDecision::Discarded));
        assert_eq!(report.command(), None);
        assert_eq!(controller.dispatcher().last_fired(Gesture::Fist), None);
        assert_eq!(controller.session_state(), SessionState::Locked);
    }

    #[test]
    fn unlock_clears_history_and_emits_nothing() {
        let t0 = Instant::now();
        let config = ControllerConfig::player();
        let mut controller = unlocked(&config, t0);
        assert_eq!(controller.stabilizer().history().count(), 0);

        // stale palm history cannot re-fire on the very next frame
        let report = controller.step(hand(Gesture::Palm, 0.9), t0 + ms(66));
        assert_eq!(report.stable, None);
        let report = controller.step(hand(Gesture::Palm, 0.9), t0 + ms(99));
        assert_eq!(report.command(), Some(Command::TogglePlayPause));
    }

    #[test]
    fn no_hand_frames_never_fire() {
        let t0 = Instant::now();
        let mut controller = unlocked(&ControllerConfig::player(), t0);
        controller.step(hand(Gesture::Fist, 0.9), t0 + ms(100));
        let report = controller.step(Observation::NoHand, t0 + ms(133));
        assert_eq!(report, FrameReport::default());
        assert!(!controller.status().hand_present);
    }

    #[test]
    fn cooldown_spacing_per_gesture() {
        let t0 = Instant::now();
        let mut controller = unlocked(&ControllerConfig::player(), t0);
        controller.step(hand(Gesture::Fist, 0.9), t0 + ms(100));
        let first = controller.step(hand(Gesture::Fist, 0.9), t0 + ms(200));
        assert_eq!(first.command(), Some(Command::TogglePlayPause));

        let held = controller.step(hand(Gesture::Fist, 0.9), t0 + ms(1200));
        assert!(matches!(held.dispatch, Some(Dispatch::CoolingDown { .. })));

        let again = controller.step(hand(Gesture::Fist, 0.9), t0 + ms(1800));
        assert_eq!(again.command(), Some(Command::TogglePlayPause));
    }

    #[test]
    fn idle_watchdog_relocks_before_pending_gesture() {
        let t0 = Instant::now();
        let mut controller = unlocked(&ControllerConfig::desktop(), t0);
        controller.step(hand(Gesture::Fist, 0.9), t0 + ms(100));
        controller.step(Observation::NoHand, t0 + ms(5_000));

        // the stale fist entry is dropped with the lock
        let report = controller.step(hand(Gesture::Fist, 0.9), t0 + ms(10_200));
        assert!(report.auto_locked);
        assert_eq!(report.stable, None);
        assert_eq!(report.gate, None);
        assert_eq!(report.command(), None);
        assert_eq!(controller.session_state(), SessionState::Locked);
        assert_eq!(controller.stabilizer().history().count(), 1);
    }

    #[test]
    fn stale_palm_cannot_undo_idle_lock() {
        let t0 = Instant::now();
        let mut controller = unlocked(&ControllerConfig::desktop(), t0);
        controller.step(hand(Gesture::Palm, 0.9), t0 + ms(100));

        let report = controller.step(hand(Gesture::Palm, 0.9), t0 + ms(10_200));
        assert!(report.auto_locked);
        assert_eq!(report.stable, None);
        assert!(!report.unlocked());
        assert_eq!(controller.session_state(), SessionState::Locked);

        // a fresh run after the lock unlocks as usual
        let report = controller.step(hand(Gesture::Palm, 0.9), t0 + ms(10_233));
        assert!(report.unlocked());
        assert_eq!(controller.session_state(), SessionState::Unlocked);
    }

    #[test]
    fn palm_overload_unlocks_then_commands() {
        let t0 = Instant::now();
        let config = Profile::Player.config();
        let mut controller = unlocked(&config, t0);
        controller.step(hand(Gesture::Palm, 0.9), t0 + ms(2_000));
        let report = controller.step(hand(Gesture::Palm, 0.9), t0 + ms(2_033));
        assert_eq!(report.gate, Some(GateDecision::Forward(Gesture::Palm)));
        assert_eq!(report.command(), Some(Command::TogglePlayPause));
    }

    #[test]
    fn status_tracks_last_stable_gesture() {
        let t0 = Instant::now();
        let mut controller = GestureController::new(&ControllerConfig::player());
        assert_eq!(controller.status().headline(), "SYSTEM LOCKED (Show Palm)");
        controller.step(hand(Gesture::Palm, 0.87), t0);
        controller.step(hand(Gesture::Palm, 0.87), t0 + ms(33));
        let status = controller.status();
        assert_eq!(status.state, SessionState::Unlocked);
        assert_eq!(status.confidence_percent, 87);
        assert_eq!(status.headline(), "CMD: PALM");
    }
}
