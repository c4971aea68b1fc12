// src/stabilizer.rs - Rolling agreement window over per-frame predictions
use crate::classifier::Classification;
use crate::gesture::Gesture;
use std::collections::VecDeque;

const PREALLOCATED: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryToken {
    Label(Gesture),
    Uncertain,
}

/// Emits a gesture only once the last `window` classified frames agree on
/// it with confidence at or above the floor.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    history: VecDeque<HistoryToken>, // most recent first
    window: usize,
    confidence_floor: f64,
}

impl Stabilizer {
    pub fn new(window: usize, confidence_floor: f64) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window.min(PREALLOCATED)),
            window,
            confidence_floor,
        }
    }

    /// Records one classified frame and returns the stable gesture, if any.
    /// Frames without a hand must not be pushed.
    pub fn push(&mut self, classification: &Classification) -> Option<Gesture> {
        let token = if classification.confidence >= self.confidence_floor {
            HistoryToken::Label(classification.label)
        } else {
            HistoryToken::Uncertain
        };

        self.history.push_front(token);
        if self.history.len() > self.window {
            self.history.pop_back();
        }

        self.stable()
    }

    fn stable(&self) -> Option<Gesture> {
        if self.history.len() < self.window {
            return None;
        }
        match self.history.front() {
            Some(&HistoryToken::Label(gesture))
                if self.history.iter().all(|t| *t == HistoryToken::Label(gesture)) =>
            {
                Some(gesture)
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryToken> {
        self.history.iter()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
