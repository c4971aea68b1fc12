// src/pipeline.rs - Frame loop: source -> normalize -> classify -> control -> sink
use crate::classifier::GestureClassifier;
use crate::config::ControllerConfig;
use crate::controller::{DisplayStatus, FrameReport, GestureController, Observation};
use crate::gesture::Command;
use crate::landmarks::HandKeypoints;
use crate::session::SessionState;
use crate::sink::CommandSink;
use crate::source::{LandmarkSource, SourceError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TIMING_WINDOW: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Classified(FrameReport),
    /// Frame-skip: nothing persistent was touched.
    Skipped,
    /// Landmarks failed validation; nothing persistent was touched.
    Malformed,
    EndOfStream,
}

/// Rolling per-frame processing time over the last few classified frames.
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    pub avg_processing_ms: f64,
    pub avg_fps: f64,
    frame_times: VecDeque<Duration>,
}

impl PerformanceMetrics {
    fn record(&mut self, elapsed: Duration) {
        self.frame_times.push_front(elapsed);
        if self.frame_times.len() > TIMING_WINDOW {
            self.frame_times.pop_back();
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg = total.as_secs_f64() / self.frame_times.len() as f64;
        self.avg_processing_ms = avg * 1000.0;
        self.avg_fps = if avg > 0.0 { 1.0 / avg } else { 0.0 };
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub frames_read: u64,
    pub frames_classified: u64,
    pub frames_skipped: u64,
    pub frames_malformed: u64,
    pub stable_events: u64,
    pub unlocks: u64,
    pub auto_locks: u64,
    pub commands: BTreeMap<Command, u64>,
    /// Stable events on frames that carried a ground-truth label.
    pub labelled_stable_events: u64,
    pub stable_matches: u64,
    pub avg_processing_ms: f64,
    pub final_state: SessionState,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            started_at: Local::now(),
            frames_read: 0,
            frames_classified: 0,
            frames_skipped: 0,
            frames_malformed: 0,
            stable_events: 0,
            unlocks: 0,
            auto_locks: 0,
            commands: BTreeMap::new(),
            labelled_stable_events: 0,
            stable_matches: 0,
            avg_processing_ms: 0.0,
            final_state: SessionState::Locked,
        }
    }

    pub fn commands_issued(&self) -> u64 {
        self.commands.values().sum()
    }

    /// Share of labelled stable events that agreed with the label.
    pub fn stable_accuracy(&self) -> Option<f64> {
        (self.labelled_stable_events > 0)
            .then(|| self.stable_matches as f64 / self.labelled_stable_events as f64)
    }
}

pub struct Pipeline<S, C, K> {
    source: S,
    classifier: C,
    sink: K,
    controller: GestureController,
    frame_skip: u64,
    frame_count: u64,
    summary: RunSummary,
    metrics: PerformanceMetrics,
}

impl<S, C, K> Pipeline<S, C, K>
where
    S: LandmarkSource,
    C: GestureClassifier,
    K: CommandSink,
{
    pub fn new(source: S, classifier: C, sink: K, config: &ControllerConfig) -> Self {
        Self {
            source,
            classifier,
            sink,
            controller: GestureController::new(config),
            frame_skip: config.frame_skip.max(1) as u64,
            frame_count: 0,
            summary: RunSummary::new(),
            metrics: PerformanceMetrics::default(),
        }
    }

    /// Pulls one frame and, unless it is skipped, runs it through the controller.
    pub fn step(&mut self, now: Instant) -> Result<StepOutcome, SourceError> {
        let Some(frame) = self.source.next_frame()? else {
            return Ok(StepOutcome::EndOfStream);
        };
        self.frame_count += 1;
        self.summary.frames_read += 1;

        if self.frame_count % self.frame_skip != 0 {
            self.summary.frames_skipped += 1;
            return Ok(StepOutcome::Skipped);
        }

        let started = Instant::now();
        let observation = match frame.hand {
            None => Observation::NoHand,
            Some(coords) => match HandKeypoints::from_flat(&coords) {
                Ok(hand) => Observation::Hand {
                    classification: self.classifier.classify(&hand.normalize()),
                    fingertip_y: hand.index_tip().y,
                },
                Err(err) => {
                    warn!(frame = self.frame_count, "skipping frame with malformed landmarks: {err}");
                    self.summary.frames_malformed += 1;
                    return Ok(StepOutcome::Malformed);
                }
            },
        };

        let report = self.controller.step(observation, now);
        self.summary.frames_classified += 1;

        if let Some(command) = report.command() {
            self.sink.execute(command);
            *self.summary.commands.entry(command).or_insert(0) += 1;
        }
        if report.auto_locked {
            self.summary.auto_locks += 1;
        }
        if report.unlocked() {
            self.summary.unlocks += 1;
        }
        if let Some(stable) = report.stable {
            self.summary.stable_events += 1;
            if let Some(truth) = frame.label {
                self.summary.labelled_stable_events += 1;
                if truth == stable {
                    self.summary.stable_matches += 1;
                } else {
                    debug!(frame = self.frame_count, %stable, %truth, "stable gesture disagrees with label");
                }
            }
        }

        self.metrics.record(started.elapsed());
        Ok(StepOutcome::Classified(report))
    }

    /// Runs until the source is exhausted or `shutdown` is raised. The flag
    /// is checked once per iteration, before the next frame is pulled.
    pub fn run<F>(&mut self, mut clock: F, shutdown: &AtomicBool) -> Result<RunSummary, SourceError>
    where
        F: FnMut() -> Instant,
    {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!(frames = self.frame_count, "shutdown requested");
                break;
            }
            if self.step(clock())? == StepOutcome::EndOfStream {
                break;
            }
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = self.summary.clone();
        summary.avg_processing_ms = self.metrics.avg_processing_ms;
        summary.final_state = self.controller.session_state();
        summary
    }

    pub fn status(&self) -> &DisplayStatus {
        self.controller.status()
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn controller(&self) -> &GestureController {
        &self.controller
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}
