// src/source.rs - Landmark sources: recorded CSV sessions and scripted frames
use crate::gesture::{Gesture, UnknownGesture};
use csv::{ReaderBuilder, StringRecord};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open landmark file {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read landmark rows from {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
    #[error("{origin} row {row}: '{value}' is not a coordinate")]
    Coordinate {
        origin: String,
        row: u64,
        value: String,
    },
    #[error("{origin} row {row}: {source}")]
    Label {
        origin: String,
        row: u64,
        #[source]
        source: UnknownGesture,
    },
}

/// One frame from the landmark detector.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFrame {
    /// Flat `x0, y0, ..., x20, y20` coordinates, `None` when no hand was found.
    /// The count is not validated here.
    pub hand: Option<Vec<f64>>,
    /// Ground-truth label, when the recording carries one.
    pub label: Option<Gesture>,
}

impl SourceFrame {
    pub fn no_hand() -> Self {
        Self {
            hand: None,
            label: None,
        }
    }

    pub fn with_hand(coords: Vec<f64>) -> Self {
        Self {
            hand: Some(coords),
            label: None,
        }
    }

    pub fn labelled(mut self, label: Gesture) -> Self {
        self.label = Some(label);
        self
    }
}

pub trait LandmarkSource {
    /// `Ok(None)` marks the end of the stream.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, SourceError>;
}

/// Reads the recorder layout `x0,y0,...,x20,y20[,Label]` with a header row.
/// All-zero rows are the recorder's NO_HAND samples.
pub struct CsvLandmarkSource<R: Read> {
    reader: csv::Reader<R>,
    label_column: Option<usize>,
    origin: String,
    record: StringRecord,
    row: u64,
}

impl CsvLandmarkSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| SourceError::Io {
            origin: origin.clone(),
            source,
        })?;
        Self::from_reader(file, origin)
    }
}

impl<R: Read> CsvLandmarkSource<R> {
    pub fn from_reader(reader: R, origin: impl Into<String>) -> Result<Self, SourceError> {
        let origin = origin.into();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let label_column = reader
            .headers()
            .map_err(|source| SourceError::Csv {
                origin: origin.clone(),
                source,
            })?
            .iter()
            .position(|h| h.eq_ignore_ascii_case("label"));

        Ok(Self {
            reader,
            label_column,
            origin,
            record: StringRecord::new(),
            row: 0,
        })
    }

    fn parse_record(&self) -> Result<SourceFrame, SourceError> {
        let mut coords = Vec::with_capacity(self.record.len());
        let mut label = None;

        for (i, field) in self.record.iter().enumerate() {
            if Some(i) == self.label_column {
                if !field.is_empty() {
                    label = Some(field.parse::<Gesture>().map_err(|source| SourceError::Label {
                        origin: self.origin.clone(),
                        row: self.row,
                        source,
                    })?);
                }
                continue;
            }
            let value = field.parse::<f64>().map_err(|_| SourceError::Coordinate {
                origin: self.origin.clone(),
                row: self.row,
                value: field.to_string(),
            })?;
            coords.push(value);
        }

        let hand = if coords.iter().all(|v| *v == 0.0) {
            None
        } else {
            Some(coords)
        };
        Ok(SourceFrame { hand, label })
    }
}

impl<R: Read> LandmarkSource for CsvLandmarkSource<R> {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, SourceError> {
        let more = self
            .reader
            .read_record(&mut self.record)
            .map_err(|source| SourceError::Csv {
                origin: self.origin.clone(),
                source,
            })?;
        if !more {
            return Ok(None);
        }
        self.row += 1;
        self.parse_record().map(Some)
    }
}

/// Replays a fixed list of frames.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    frames: VecDeque<SourceFrame>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = SourceFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, SourceError> {
        Ok(self.frames.pop_front())
    }
}
